//! Feature-vector assembly for model-backed predictors.
//!
//! Missing condition values are replaced by typical field values, a set of
//! engineered features is derived, and the vector is emitted in whatever
//! order the model's feature list names.

use crate::conditions::FieldConditions;

/// Guards nutrient ratios against division by zero.
const RATIO_EPSILON: f64 = 1e-6;

const DEFAULT_PH: f64 = 7.0;
const DEFAULT_MOISTURE: f64 = 50.0;
const DEFAULT_N: f64 = 100.0;
const DEFAULT_P: f64 = 30.0;
const DEFAULT_K: f64 = 50.0;
const DEFAULT_TEMPERATURE: f64 = 25.0;
const DEFAULT_RAINFALL: f64 = 500.0;
const DEFAULT_HUMIDITY: f64 = 60.0;

/// Latitude/longitude bounds used for location normalisation.
const LAT_RANGE: (f64, f64) = (8.0, 37.0);
const LON_RANGE: (f64, f64) = (68.0, 97.0);

/// Feature name for the encoded crop, used by yield models.
pub const CROP_CODE_FEATURE: &str = "crop_encoded";

/// All derivable features for one set of conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub ph: f64,
    pub moisture: f64,
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
    pub np_ratio: f64,
    pub nk_ratio: f64,
    pub pk_ratio: f64,
    pub total_nutrients: f64,
    pub n_sufficient: f64,
    pub p_sufficient: f64,
    pub k_sufficient: f64,
    pub lat_norm: f64,
    pub lon_norm: f64,
    pub ph_category: f64,
    pub temp_category: f64,
    pub rainfall_category: f64,
}

fn normalize(value: Option<f64>, (lo, hi): (f64, f64)) -> f64 {
    match value {
        Some(v) => (v - lo) / (hi - lo),
        None => 0.5,
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Category code: index of the first upper bound the value falls below.
fn category(value: f64, bounds: &[f64; 3]) -> f64 {
    bounds.iter().position(|b| value < *b).unwrap_or(bounds.len()) as f64
}

impl FeatureSet {
    pub fn from_conditions(conditions: &FieldConditions) -> FeatureSet {
        let ph = conditions.ph.unwrap_or(DEFAULT_PH);
        let moisture = conditions.moisture.unwrap_or(DEFAULT_MOISTURE);
        let n = conditions.n.unwrap_or(DEFAULT_N);
        let p = conditions.p.unwrap_or(DEFAULT_P);
        let k = conditions.k.unwrap_or(DEFAULT_K);
        let temperature = conditions.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        let rainfall = conditions.rainfall.unwrap_or(DEFAULT_RAINFALL);
        let humidity = conditions.humidity.unwrap_or(DEFAULT_HUMIDITY);

        FeatureSet {
            ph,
            moisture,
            n,
            p,
            k,
            temperature,
            rainfall,
            humidity,
            np_ratio: n / (p + RATIO_EPSILON),
            nk_ratio: n / (k + RATIO_EPSILON),
            pk_ratio: p / (k + RATIO_EPSILON),
            total_nutrients: n + p + k,
            n_sufficient: flag(n >= 100.0),
            p_sufficient: flag(p >= 30.0),
            k_sufficient: flag(k >= 50.0),
            lat_norm: normalize(conditions.latitude, LAT_RANGE),
            lon_norm: normalize(conditions.longitude, LON_RANGE),
            // acidic / slightly acidic / neutral / alkaline
            ph_category: category(ph, &[5.5, 6.5, 7.5]),
            // cold / moderate / warm / hot
            temp_category: category(temperature, &[15.0, 25.0, 35.0]),
            // low / moderate / high / very high
            rainfall_category: category(rainfall, &[400.0, 800.0, 1200.0]),
        }
    }

    /// Value of a named feature; unknown names yield `None`.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "ph" => self.ph,
            "moisture" => self.moisture,
            "n" => self.n,
            "p" => self.p,
            "k" => self.k,
            "temperature" => self.temperature,
            "rainfall" => self.rainfall,
            "humidity" => self.humidity,
            "np_ratio" => self.np_ratio,
            "nk_ratio" => self.nk_ratio,
            "pk_ratio" => self.pk_ratio,
            "total_nutrients" => self.total_nutrients,
            "n_sufficient" => self.n_sufficient,
            "p_sufficient" => self.p_sufficient,
            "k_sufficient" => self.k_sufficient,
            "lat_norm" => self.lat_norm,
            "lon_norm" => self.lon_norm,
            "ph_category_encoded" => self.ph_category,
            "temp_category_encoded" => self.temp_category,
            "rainfall_category_encoded" => self.rainfall_category,
            _ => return None,
        };
        Some(value)
    }

    /// Emit a vector in `feature_names` order.
    ///
    /// `crop_code` fills the crop feature for yield models. Names the set
    /// does not know become 0.0.
    pub fn to_vector(&self, feature_names: &[String], crop_code: Option<f64>) -> Vec<f64> {
        feature_names
            .iter()
            .map(|name| {
                if name == CROP_CODE_FEATURE {
                    crop_code.unwrap_or(0.0)
                } else {
                    self.get(name).unwrap_or(0.0)
                }
            })
            .collect()
    }
}
