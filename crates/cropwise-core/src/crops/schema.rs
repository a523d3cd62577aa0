use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Indian cropping seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// Monsoon season, June to October.
    Kharif,
    /// Winter season, November to March.
    Rabi,
    /// Summer season, April and May.
    Zaid,
    YearRound,
}

impl Season {
    /// Season for a calendar month (1-12).
    pub fn for_month(month: u32) -> Season {
        match month {
            6..=10 => Season::Kharif,
            11 | 12 | 1..=3 => Season::Rabi,
            _ => Season::Zaid,
        }
    }

    pub fn for_date(date: NaiveDate) -> Season {
        Season::for_month(date.month())
    }

    /// Season for today's local date.
    pub fn current() -> Season {
        Season::for_date(Local::now().date_naive())
    }

    pub fn from_str_loose(s: &str) -> Option<Season> {
        let lower = s.trim().to_lowercase().replace(['-', ' '], "_");
        match lower.as_str() {
            "kharif" | "monsoon" => Some(Season::Kharif),
            "rabi" | "winter" => Some(Season::Rabi),
            "zaid" | "summer" => Some(Season::Zaid),
            "year_round" | "yearround" | "perennial" => Some(Season::YearRound),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Kharif => write!(f, "kharif"),
            Season::Rabi => write!(f, "rabi"),
            Season::Zaid => write!(f, "zaid"),
            Season::YearRound => write!(f, "year_round"),
        }
    }
}

/// Rotation-relevant crop grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropFamily {
    Cereal,
    Legume,
    Fiber,
    Cash,
    Root,
    Solanaceae,
    Allium,
    #[default]
    Unknown,
}

impl fmt::Display for CropFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CropFamily::Cereal => "cereal",
            CropFamily::Legume => "legume",
            CropFamily::Fiber => "fiber",
            CropFamily::Cash => "cash",
            CropFamily::Root => "root",
            CropFamily::Solanaceae => "solanaceae",
            CropFamily::Allium => "allium",
            CropFamily::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Agronomic requirement band for a crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    pub ph_min: f64,
    pub ph_max: f64,
    /// Minimum nitrogen, kg/ha.
    pub n_min: f64,
    /// Minimum phosphorus, kg/ha.
    pub p_min: f64,
    /// Minimum potassium, kg/ha.
    pub k_min: f64,
    /// Minimum soil moisture, %.
    pub moisture_min: f64,
    /// Temperature band, degrees C.
    pub temperature_min: f64,
    pub temperature_max: f64,
    /// Minimum seasonal rainfall, mm. Informational; not scored.
    pub rainfall_min: f64,
    pub seasons: Vec<Season>,
}

impl Requirements {
    /// True if the crop can be sown in `season`.
    pub fn allows_season(&self, season: Season) -> bool {
        self.seasons.contains(&season) || self.seasons.contains(&Season::YearRound)
    }
}

/// Market and cost figures, per hectare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Economics {
    /// Price per kg.
    pub market_price: f64,
    /// Seeds, fertiliser, pesticide.
    pub input_cost: f64,
    pub labor_cost: f64,
    /// Production risk, 0 (none) to 1 (highest).
    pub risk_factor: f64,
}

impl Economics {
    /// Used for crops absent from the reference table.
    pub const DEFAULT: Economics = Economics {
        market_price: 20.0,
        input_cost: 40_000.0,
        labor_cost: 20_000.0,
        risk_factor: 0.3,
    };

    pub fn total_costs(&self) -> f64 {
        self.input_cost + self.labor_cost
    }
}

impl Default for Economics {
    fn default() -> Self {
        Economics::DEFAULT
    }
}

/// Environmental footprint, per hectare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Litres per hectare per season.
    pub water_usage: f64,
    /// -100 (degrading) to 100 (restoring).
    pub soil_health_impact: f64,
    /// kg CO2e per hectare.
    pub carbon_footprint: f64,
    /// -100 to 100.
    pub biodiversity_impact: f64,
}

impl Footprint {
    /// Used for crops absent from the reference table.
    pub const DEFAULT: Footprint = Footprint {
        water_usage: 1_000_000.0,
        soil_health_impact: 0.0,
        carbon_footprint: 3000.0,
        biodiversity_impact: 0.0,
    };
}

impl Default for Footprint {
    fn default() -> Self {
        Footprint::DEFAULT
    }
}

/// Baseline sustainability score for crops absent from the reference table.
pub const DEFAULT_SUSTAINABILITY_SCORE: f64 = 70.0;

fn default_sustainability_score() -> f64 {
    DEFAULT_SUSTAINABILITY_SCORE
}

/// Static reference data for one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub name: String,
    #[serde(default)]
    pub family: CropFamily,
    pub requirements: Requirements,
    #[serde(default)]
    pub economics: Economics,
    #[serde(default)]
    pub footprint: Footprint,
    /// Baseline sustainability score, 0-100.
    #[serde(default = "default_sustainability_score")]
    pub sustainability_score: f64,
    /// Typical yield under good conditions, kg/ha.
    #[serde(default)]
    pub average_yield: f64,
    /// Typical profit under good conditions, per hectare.
    #[serde(default)]
    pub average_profit: f64,
}

/// A crop reference table: requirement profiles plus rotation knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropTable {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered; the order is the tie-break order when ranking.
    pub crops: Vec<CropProfile>,
    /// Crop -> predecessors that make a good rotation.
    #[serde(default)]
    pub compatible_rotations: BTreeMap<String, Vec<String>>,
    /// Crop -> predecessors that should not precede it.
    #[serde(default)]
    pub incompatible_crops: BTreeMap<String, Vec<String>>,
}

impl CropTable {
    pub fn get(&self, name: &str) -> Option<&CropProfile> {
        self.crops.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn crop_names(&self) -> impl Iterator<Item = &str> {
        self.crops.iter().map(|c| c.name.as_str())
    }

    pub fn economics_for(&self, name: &str) -> Economics {
        self.get(name).map(|c| c.economics).unwrap_or_default()
    }

    pub fn footprint_for(&self, name: &str) -> Footprint {
        self.get(name).map(|c| c.footprint).unwrap_or_default()
    }

    pub fn family_of(&self, name: &str) -> CropFamily {
        self.get(name).map(|c| c.family).unwrap_or_default()
    }

    pub fn sustainability_baseline(&self, name: &str) -> f64 {
        self.get(name)
            .map(|c| c.sustainability_score)
            .unwrap_or(DEFAULT_SUSTAINABILITY_SCORE)
    }

    pub fn compatible_predecessors(&self, name: &str) -> &[String] {
        self.compatible_rotations
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn incompatible_predecessors(&self, name: &str) -> &[String] {
        self.incompatible_crops
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
