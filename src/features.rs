//! One-hot alignment of a request onto the feature schema.
//!
//! Unknown `area`/`item` labels are not an error: the label simply has no
//! column, so its one-hot segment stays all zero and the model sees "no
//! category". [`category_match`] reports when that happens.

use crate::schema::{FeatureSchema, AREA_PREFIX, ITEM_PREFIX, NUMERIC_COLUMNS};
use crate::types::PredictionRequest;

/// Feature values laid out in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatureVector(Vec<f64>);

impl AlignedFeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nonzero(&self) -> usize {
        self.0.iter().filter(|x| **x != 0.0).count()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Whether each category label found a column in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMatch {
    pub area: bool,
    pub item: bool,
}

pub fn area_column(area: &str) -> String {
    format!("{AREA_PREFIX}{area}")
}

pub fn item_column(item: &str) -> String {
    format!("{ITEM_PREFIX}{item}")
}

/// Builds the model input for `req`. Never fails.
pub fn align(req: &PredictionRequest, schema: &FeatureSchema) -> AlignedFeatureVector {
    let mut v = vec![0.0; schema.len()];

    let numeric = [
        req.year as f64,
        req.rainfall_mm_per_year,
        req.pesticides_tonnes,
        req.avg_temp,
    ];
    for (name, value) in NUMERIC_COLUMNS.iter().zip(numeric) {
        if let Some(i) = schema.position(name) {
            v[i] = value;
        }
    }

    for key in [area_column(&req.area), item_column(&req.item)] {
        if let Some(i) = schema.position(&key) {
            v[i] = 1.0;
        }
    }

    AlignedFeatureVector(v)
}

pub fn category_match(req: &PredictionRequest, schema: &FeatureSchema) -> CategoryMatch {
    CategoryMatch {
        area: schema.contains(&area_column(&req.area)),
        item: schema.contains(&item_column(&req.item)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(area: &str, item: &str) -> PredictionRequest {
        PredictionRequest {
            year: 2024,
            rainfall_mm_per_year: 1100.0,
            pesticides_tonnes: 6000.0,
            avg_temp: 21.0,
            area: area.to_string(),
            item: item.to_string(),
        }
    }

    fn ones_with_prefix(v: &AlignedFeatureVector, schema: &FeatureSchema, prefix: &str) -> Vec<String> {
        schema
            .category_columns(prefix)
            .filter(|(i, _)| v.as_slice()[*i] == 1.0)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    #[test]
    fn test_numeric_slots_copy_inputs() {
        let schema = FeatureSchema::builtin();
        let req = PredictionRequest {
            year: 1990,
            rainfall_mm_per_year: -3.5,
            pesticides_tonnes: 0.125,
            avg_temp: 40.75,
            ..request("India", "Wheat")
        };
        let v = align(&req, &schema);
        assert_eq!(v.len(), schema.len());
        assert_eq!(&v.as_slice()[..4], &[1990.0, -3.5, 0.125, 40.75]);
    }

    #[test]
    fn test_known_labels_set_exactly_two_slots() {
        let schema = FeatureSchema::builtin();
        let v = align(&request("India", "Wheat"), &schema);

        assert_eq!(ones_with_prefix(&v, &schema, AREA_PREFIX), vec!["Area_India"]);
        assert_eq!(ones_with_prefix(&v, &schema, ITEM_PREFIX), vec!["Item_Wheat"]);
        let categorical_sum: f64 = v.as_slice()[4..].iter().sum();
        assert_eq!(categorical_sum, 2.0);
        assert_eq!(v.nonzero(), 6);
    }

    #[test]
    fn test_labels_with_spaces_and_commas() {
        let schema = FeatureSchema::builtin();
        let v = align(&request("Papua New Guinea", "Rice, paddy"), &schema);
        assert_eq!(ones_with_prefix(&v, &schema, AREA_PREFIX), vec!["Area_Papua New Guinea"]);
        assert_eq!(ones_with_prefix(&v, &schema, ITEM_PREFIX), vec!["Item_Rice, paddy"]);
    }

    #[test]
    fn test_unknown_area_leaves_segment_zero() {
        let schema = FeatureSchema::builtin();
        let req = request("Atlantis", "Wheat");
        let v = align(&req, &schema);

        assert!(ones_with_prefix(&v, &schema, AREA_PREFIX).is_empty());
        assert_eq!(ones_with_prefix(&v, &schema, ITEM_PREFIX), vec!["Item_Wheat"]);
        assert_eq!(category_match(&req, &schema), CategoryMatch { area: false, item: true });
    }

    #[test]
    fn test_unknown_item_leaves_segment_zero() {
        let schema = FeatureSchema::builtin();
        // Labels are case sensitive.
        let req = request("India", "wheat");
        let v = align(&req, &schema);

        assert!(ones_with_prefix(&v, &schema, ITEM_PREFIX).is_empty());
        assert_eq!(v.nonzero(), 5);
        assert_eq!(category_match(&req, &schema), CategoryMatch { area: true, item: false });
    }

    #[test]
    fn test_small_schema_order() {
        let cols = [
            "Year",
            "average_rain_fall_mm_per_year",
            "pesticides_tonnes",
            "avg_temp",
            "Area_Kenya",
            "Area_India",
            "Item_Wheat",
            "Item_Maize",
        ];
        let schema = FeatureSchema::new(cols.iter().map(|c| c.to_string()).collect(), Some(8)).unwrap();
        let v = align(&request("India", "Maize"), &schema);
        assert_eq!(
            v.into_inner(),
            vec![2024.0, 1100.0, 6000.0, 21.0, 0.0, 1.0, 0.0, 1.0]
        );
    }
}
