//! Feature schema of the trained crop model.
//!
//! The column order is fixed by the training data: four numeric columns,
//! then the one-hot `Area_*` and `Item_*` columns. Every inference input
//! has to be laid out in exactly this order.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};
use thiserror::Error;

pub const YEAR_COLUMN: &str = "Year";
pub const RAINFALL_COLUMN: &str = "average_rain_fall_mm_per_year";
pub const PESTICIDES_COLUMN: &str = "pesticides_tonnes";
pub const AVG_TEMP_COLUMN: &str = "avg_temp";

/// Numeric columns, always the first four slots.
pub const NUMERIC_COLUMNS: [&str; 4] = [
    YEAR_COLUMN,
    RAINFALL_COLUMN,
    PESTICIDES_COLUMN,
    AVG_TEMP_COLUMN,
];

pub const AREA_PREFIX: &str = "Area_";
pub const ITEM_PREFIX: &str = "Item_";

/// Columns of `X_train` the shipped model was fitted on.
pub const TRAINING_COLUMNS: &[&str] = &[
    YEAR_COLUMN,
    RAINFALL_COLUMN,
    PESTICIDES_COLUMN,
    AVG_TEMP_COLUMN,
    "Area_Algeria",
    "Area_Angola",
    "Area_Argentina",
    "Area_Armenia",
    "Area_Australia",
    "Area_Austria",
    "Area_Azerbaijan",
    "Area_Bahamas",
    "Area_Bahrain",
    "Area_Bangladesh",
    "Area_Belarus",
    "Area_Belgium",
    "Area_Botswana",
    "Area_Brazil",
    "Area_Bulgaria",
    "Area_Burkina Faso",
    "Area_Burundi",
    "Area_Cameroon",
    "Area_Canada",
    "Area_Central African Republic",
    "Area_Chile",
    "Area_Colombia",
    "Area_Croatia",
    "Area_Denmark",
    "Area_Dominican Republic",
    "Area_Ecuador",
    "Area_Egypt",
    "Area_El Salvador",
    "Area_Eritrea",
    "Area_Estonia",
    "Area_Finland",
    "Area_France",
    "Area_Germany",
    "Area_Ghana",
    "Area_Greece",
    "Area_Guatemala",
    "Area_Guinea",
    "Area_Guyana",
    "Area_Haiti",
    "Area_Honduras",
    "Area_Hungary",
    "Area_India",
    "Area_Indonesia",
    "Area_Iraq",
    "Area_Ireland",
    "Area_Italy",
    "Area_Jamaica",
    "Area_Japan",
    "Area_Kazakhstan",
    "Area_Kenya",
    "Area_Latvia",
    "Area_Lebanon",
    "Area_Lesotho",
    "Area_Libya",
    "Area_Lithuania",
    "Area_Madagascar",
    "Area_Malawi",
    "Area_Malaysia",
    "Area_Mali",
    "Area_Mauritania",
    "Area_Mauritius",
    "Area_Mexico",
    "Area_Montenegro",
    "Area_Morocco",
    "Area_Mozambique",
    "Area_Namibia",
    "Area_Nepal",
    "Area_Netherlands",
    "Area_New Zealand",
    "Area_Nicaragua",
    "Area_Niger",
    "Area_Norway",
    "Area_Pakistan",
    "Area_Papua New Guinea",
    "Area_Peru",
    "Area_Poland",
    "Area_Portugal",
    "Area_Qatar",
    "Area_Romania",
    "Area_Rwanda",
    "Area_Saudi Arabia",
    "Area_Senegal",
    "Area_Slovenia",
    "Area_South Africa",
    "Area_Spain",
    "Area_Sri Lanka",
    "Area_Sudan",
    "Area_Suriname",
    "Area_Sweden",
    "Area_Switzerland",
    "Area_Tajikistan",
    "Area_Thailand",
    "Area_Tunisia",
    "Area_Turkey",
    "Area_Uganda",
    "Area_Ukraine",
    "Area_United Kingdom",
    "Area_Uruguay",
    "Area_Zambia",
    "Area_Zimbabwe",
    "Item_Maize",
    "Item_Plantains and others",
    "Item_Potatoes",
    "Item_Rice, paddy",
    "Item_Sorghum",
    "Item_Soybeans",
    "Item_Sweet potatoes",
    "Item_Wheat",
    "Item_Yams",
];

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("column {index} must be {expected:?}, found {found:?}")]
    NumericColumn {
        index: usize,
        expected: &'static str,
        found: Option<String>,
    },
    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),
    #[error("schema has {actual} columns, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

// Same shape as the training pipeline's meta.json.
#[derive(Deserialize)]
struct MetaJson {
    feat_list: Vec<String>,
    in_dim: Option<usize>,
}

/// Ordered, immutable list of feature columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Validates `columns` and builds the schema. `expected_len` is the
    /// model input width when known.
    pub fn new(columns: Vec<String>, expected_len: Option<usize>) -> Result<Self, SchemaError> {
        for (index, &expected) in NUMERIC_COLUMNS.iter().enumerate() {
            match columns.get(index) {
                Some(found) if found == expected => {}
                found => {
                    return Err(SchemaError::NumericColumn {
                        index,
                        expected,
                        found: found.cloned(),
                    })
                }
            }
        }
        if let Some(expected) = expected_len {
            if columns.len() != expected {
                return Err(SchemaError::LengthMismatch {
                    expected,
                    actual: columns.len(),
                });
            }
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { columns, positions })
    }

    /// The schema compiled into the binary.
    pub fn builtin() -> Self {
        let columns: Vec<String> = TRAINING_COLUMNS.iter().map(|c| c.to_string()).collect();
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { columns, positions }
    }

    /// Loads `{"feat_list": [...], "in_dim": N}` from disk.
    pub fn from_meta_file(path: &Path) -> Result<Self> {
        let meta_txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read meta at {}", path.display()))?;
        let meta: MetaJson =
            serde_json::from_str(&meta_txt).with_context(|| "failed to parse schema meta")?;
        let schema = Self::new(meta.feat_list, meta.in_dim)
            .with_context(|| format!("invalid schema in {}", path.display()))?;
        Ok(schema)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Columns carrying the given one-hot prefix, in schema order.
    pub fn category_columns<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, name)| name.starts_with(prefix))
            .map(|(i, name)| (i, name.as_str()))
    }
}
