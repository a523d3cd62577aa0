pub mod builtin;
pub mod schema;

use crate::error::CropwiseError;
use schema::CropTable;
use std::collections::HashSet;
use std::path::Path;

pub use schema::{
    CropFamily, CropProfile, Economics, Footprint, Requirements, Season,
    DEFAULT_SUSTAINABILITY_SCORE,
};

/// Load a crop table from a JSON file.
pub fn load_table(path: &Path) -> Result<CropTable, CropwiseError> {
    let content = std::fs::read_to_string(path).map_err(|e| CropwiseError::CropTableLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_table(&content, path)
}

/// Parse a crop table from a JSON string.
pub fn parse_table(json: &str, source: &Path) -> Result<CropTable, CropwiseError> {
    let table: CropTable = serde_json::from_str(json).map_err(|e| CropwiseError::CropTableLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_table(&table)?;
    Ok(table)
}

/// Parse a crop table from a JSON string (no file path context).
pub fn parse_table_str(json: &str) -> Result<CropTable, CropwiseError> {
    let table: CropTable = serde_json::from_str(json).map_err(CropwiseError::Json)?;
    validate_table(&table)?;
    Ok(table)
}

/// Validate that a crop table is well-formed.
pub fn validate_table(table: &CropTable) -> Result<(), CropwiseError> {
    if table.crops.is_empty() {
        return Err(CropwiseError::CropTableInvalid(
            "crops must not be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for crop in &table.crops {
        if crop.name.trim().is_empty() {
            return Err(CropwiseError::CropTableInvalid(
                "crop name must not be empty".into(),
            ));
        }
        if !seen.insert(crop.name.as_str()) {
            return Err(CropwiseError::CropTableInvalid(format!(
                "crop '{}' is listed more than once",
                crop.name
            )));
        }

        let req = &crop.requirements;
        if req.ph_min > req.ph_max {
            return Err(CropwiseError::CropTableInvalid(format!(
                "crop '{}' has ph_min {} above ph_max {}",
                crop.name, req.ph_min, req.ph_max
            )));
        }
        if req.temperature_min > req.temperature_max {
            return Err(CropwiseError::CropTableInvalid(format!(
                "crop '{}' has temperature_min {} above temperature_max {}",
                crop.name, req.temperature_min, req.temperature_max
            )));
        }
        if req.seasons.is_empty() {
            return Err(CropwiseError::CropTableInvalid(format!(
                "crop '{}' has no seasons",
                crop.name
            )));
        }

        let econ = &crop.economics;
        if !(0.0..=1.0).contains(&econ.risk_factor) {
            return Err(CropwiseError::CropTableInvalid(format!(
                "crop '{}' has risk_factor {} outside 0-1",
                crop.name, econ.risk_factor
            )));
        }
        let non_negative = [
            ("market_price", econ.market_price),
            ("input_cost", econ.input_cost),
            ("labor_cost", econ.labor_cost),
            ("water_usage", crop.footprint.water_usage),
            ("carbon_footprint", crop.footprint.carbon_footprint),
            ("average_yield", crop.average_yield),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(CropwiseError::CropTableInvalid(format!(
                    "crop '{}' has negative {}",
                    crop.name, field
                )));
            }
        }

        let impacts = [
            ("soil_health_impact", crop.footprint.soil_health_impact),
            ("biodiversity_impact", crop.footprint.biodiversity_impact),
        ];
        for (field, value) in impacts {
            if !(-100.0..=100.0).contains(&value) {
                return Err(CropwiseError::CropTableInvalid(format!(
                    "crop '{}' has {} {} outside -100..100",
                    crop.name, field, value
                )));
            }
        }

        if !(0.0..=100.0).contains(&crop.sustainability_score) {
            return Err(CropwiseError::CropTableInvalid(format!(
                "crop '{}' has sustainability_score {} outside 0-100",
                crop.name, crop.sustainability_score
            )));
        }
    }

    for (label, rotations) in [
        ("compatible_rotations", &table.compatible_rotations),
        ("incompatible_crops", &table.incompatible_crops),
    ] {
        for crop in rotations.keys() {
            if !seen.contains(crop.as_str()) {
                return Err(CropwiseError::CropTableInvalid(format!(
                    "{} references unknown crop '{}'",
                    label, crop
                )));
            }
        }
    }

    Ok(())
}
