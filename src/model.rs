use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

/// Pre-trained regression model.
pub trait Regressor: Send + Sync {
    /// Runs one forward pass over a scaled feature row and returns the
    /// flattened output.
    fn predict(&self, x: &[f64]) -> Result<Vec<f64>>;
}

/// TorchScript export of the yield regressor.
pub struct TorchRegressor {
    model: CModule,
    device: Device,
    in_dim: usize,
}

impl TorchRegressor {
    pub fn load(model_path: &Path, in_dim: usize) -> Result<Self> {
        let device = Device::Cpu;

        let model = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;

        // Probe output shape with a dummy forward; expect a single value per row
        let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy])?;
        if t.numel() == 0 {
            bail!("model produced an empty output for in_dim={}", in_dim);
        }

        Ok(Self {
            model,
            device,
            in_dim,
        })
    }
}

impl Regressor for TorchRegressor {
    fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.in_dim {
            bail!(
                "feature length mismatch: got {}, expected {}",
                x.len(),
                self.in_dim
            );
        }

        let row: Vec<f32> = x.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&row)
            .reshape([1, self.in_dim as i64])
            .to_device(self.device);

        let t = self.model.forward_ts(&[input])?;
        let flat = t.to_kind(Kind::Double).flatten(0, -1);
        let out = Vec::<f64>::try_from(&flat)?;
        Ok(out)
    }
}
