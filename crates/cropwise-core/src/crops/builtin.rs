use crate::crops::schema::CropTable;
use crate::error::CropwiseError;

const DEFAULT_CROPS_JSON: &str = include_str!("../../../../data/crops.json");

/// Available predefined crop tables.
pub const PRESETS: &[&str] = &["default"];

/// Load the built-in twelve-crop reference table.
pub fn load_default() -> Result<CropTable, CropwiseError> {
    let table: CropTable = serde_json::from_str(DEFAULT_CROPS_JSON)?;
    Ok(table)
}

/// Load a predefined crop table by name.
pub fn load_preset(name: &str) -> Result<CropTable, CropwiseError> {
    match name {
        "default" => load_default(),
        _ => Err(CropwiseError::CropTableInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::schema::{CropFamily, Season};
    use crate::crops::validate_table;

    #[test]
    fn test_load_default_preset() {
        let table = load_preset("default").unwrap();
        let names: Vec<&str> = table.crop_names().collect();
        assert_eq!(
            names,
            vec![
                "Rice",
                "Wheat",
                "Maize",
                "Cotton",
                "Sugarcane",
                "Potato",
                "Tomato",
                "Onion",
                "Chilli",
                "Groundnut",
                "Soybean",
                "Pigeon Pea"
            ]
        );
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = load_default().unwrap();
        validate_table(&table).unwrap();
    }

    #[test]
    fn test_rice_profile() {
        let table = load_default().unwrap();
        let rice = table.get("Rice").unwrap();
        assert_eq!(rice.family, CropFamily::Cereal);
        assert_eq!(rice.requirements.seasons, vec![Season::Kharif]);
        assert_eq!(rice.requirements.ph_min, 5.0);
        assert_eq!(rice.economics.market_price, 25.0);
        assert_eq!(rice.footprint.water_usage, 2_500_000.0);
        assert_eq!(rice.average_yield, 3000.0);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }
}
