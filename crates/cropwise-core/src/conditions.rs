use crate::crops::Season;
use serde::{Deserialize, Serialize};

/// Litres per hectare delivered by one millimetre of rain.
const LITRES_PER_HA_PER_MM: f64 = 10_000.0;

/// Soil, weather and location conditions for one field at request time.
///
/// Every value is optional: `None` means "not measured", which the scorers
/// treat differently from a measured zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConditions {
    pub ph: Option<f64>,
    /// Nitrogen, kg/ha.
    pub n: Option<f64>,
    /// Phosphorus, kg/ha.
    pub p: Option<f64>,
    /// Potassium, kg/ha.
    pub k: Option<f64>,
    /// Soil moisture, %.
    pub moisture: Option<f64>,
    /// Degrees C.
    pub temperature: Option<f64>,
    /// mm.
    pub rainfall: Option<f64>,
    /// %.
    pub humidity: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub season: Option<Season>,
}

impl FieldConditions {
    /// Build conditions from the field record, its latest soil reading and
    /// the latest weather observation for its location.
    pub fn assemble(
        field: &FieldRecord,
        soil: Option<&SoilReading>,
        weather: Option<&WeatherObservation>,
    ) -> FieldConditions {
        let mut conditions = FieldConditions {
            ph: field.soil_ph,
            n: field.n_content,
            p: field.p_content,
            k: field.k_content,
            moisture: field.soil_moisture,
            ..FieldConditions::default()
        };

        // A soil reading overrides the field's stored values one by one.
        if let Some(reading) = soil {
            conditions.ph = reading.ph.or(conditions.ph);
            conditions.n = reading.n.or(conditions.n);
            conditions.p = reading.p.or(conditions.p);
            conditions.k = reading.k.or(conditions.k);
            conditions.moisture = reading.moisture.or(conditions.moisture);
        }

        let location = match (field.latitude, field.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => field.farm.as_ref().and_then(|farm| match (farm.latitude, farm.longitude) {
                (Some(lat), Some(lon)) => Some((lat, lon)),
                _ => None,
            }),
        };
        if let Some((lat, lon)) = location {
            conditions.latitude = Some(lat);
            conditions.longitude = Some(lon);
        }

        if let Some(obs) = weather {
            conditions.temperature = obs.temperature;
            conditions.rainfall = obs.rainfall;
            conditions.humidity = obs.humidity;
        }

        conditions
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    /// Water available to the crop, litres per hectare, estimated from rainfall.
    pub fn water_availability(&self) -> Option<f64> {
        self.rainfall.map(|mm| mm * LITRES_PER_HA_PER_MM)
    }
}

/// Farm-level coordinates, used when a field has none of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The stored field record as supplied by the farm collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub soil_ph: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub n_content: Option<f64>,
    pub p_content: Option<f64>,
    pub k_content: Option<f64>,
    pub farm: Option<FarmLocation>,
}

/// A soil test result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilReading {
    pub ph: Option<f64>,
    pub moisture: Option<f64>,
    pub n: Option<f64>,
    pub p: Option<f64>,
    pub k: Option<f64>,
}

/// A weather observation for the field's location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherObservation {
    pub temperature: Option<f64>,
    pub rainfall: Option<f64>,
    pub humidity: Option<f64>,
}

/// One past planting on a field.
///
/// Fields are optional because history comes from user-entered records;
/// entries without a crop name or year are skipped by the rotation analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropHistoryEntry {
    pub crop_name: Option<String>,
    pub year: Option<i32>,
    pub season: Option<Season>,
}

impl CropHistoryEntry {
    pub fn new(crop_name: &str, year: i32, season: Season) -> Self {
        CropHistoryEntry {
            crop_name: Some(crop_name.to_string()),
            year: Some(year),
            season: Some(season),
        }
    }

    /// Crop name and year, if both are present and the name is non-blank.
    pub fn planting(&self) -> Option<(&str, i32)> {
        let name = self.crop_name.as_deref().map(str::trim)?;
        if name.is_empty() {
            return None;
        }
        Some((name, self.year?))
    }
}
