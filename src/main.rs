use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crop_yield_server::{api, config::Config, Artifacts, PredictionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_yield_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // A failed load keeps the server up; /predict then answers 500.
    let service = match Artifacts::load(&config.artifacts) {
        Ok(artifacts) => {
            tracing::info!(
                "loaded model {} and scaler {}; {} feature columns",
                config.artifacts.model.display(),
                config.artifacts.scaler.display(),
                artifacts.schema.len()
            );
            PredictionService::ready(artifacts)
        }
        Err(e) => {
            tracing::error!("could not load model artifacts: {:#}", e);
            PredictionService::unloaded(format!("{:#}", e))
        }
    };

    let app = api::router(service);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
