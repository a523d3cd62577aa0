mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use cropwise_core::crops::Season;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cropwise",
    version,
    about = "Crop recommendations from soil, weather and planting history"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend crops for a set of field conditions
    Recommend(RecommendArgs),
    /// Inspect and validate crop reference tables
    Crops {
        #[command(subcommand)]
        action: CropsAction,
    },
}

/// Field conditions; omitted values are treated as not measured.
#[derive(Args, Debug, Default)]
pub struct ConditionArgs {
    /// Soil pH
    #[arg(long)]
    pub ph: Option<f64>,
    /// Nitrogen, kg/ha
    #[arg(long)]
    pub n: Option<f64>,
    /// Phosphorus, kg/ha
    #[arg(long)]
    pub p: Option<f64>,
    /// Potassium, kg/ha
    #[arg(long)]
    pub k: Option<f64>,
    /// Soil moisture, %
    #[arg(long)]
    pub moisture: Option<f64>,
    /// Temperature, degrees C
    #[arg(long)]
    pub temperature: Option<f64>,
    /// Rainfall, mm
    #[arg(long)]
    pub rainfall: Option<f64>,
    /// Relative humidity, %
    #[arg(long)]
    pub humidity: Option<f64>,
    #[arg(long = "lat", allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    #[arg(long = "lon", allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    /// kharif, rabi, zaid or year_round (default: inferred from the date)
    #[arg(long, value_parser = parse_season)]
    pub season: Option<Season>,
}

#[derive(Args, Debug)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub conditions: ConditionArgs,

    /// JSON file with the field's planting history
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Maximum number of recommendations
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Custom crop table (default: built-in table)
    #[arg(long, value_name = "FILE")]
    pub crops: Option<PathBuf>,

    /// Engine options JSON
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Linear model artifact JSON used as the external predictor
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Order by: confidence (default) or composite
    #[arg(long, value_name = "ORDER")]
    pub rank_by: Option<String>,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, value_name = "DATE")]
    pub date: Option<chrono::NaiveDate>,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    pub output: String,

    /// Show per-crop reasoning
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum CropsAction {
    /// List crops in the built-in table
    List,
    /// Explain one crop's requirements and economics
    Explain {
        /// Crop name (e.g., "Rice")
        crop: String,
    },
    /// Validate a custom crop table
    Validate {
        /// Path to JSON crop table
        file: PathBuf,
    },
}

fn parse_season(s: &str) -> Result<Season, String> {
    Season::from_str_loose(s).ok_or_else(|| format!("unknown season '{s}'"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recommend(args) => commands::recommend::run(args),
        Commands::Crops { action } => match action {
            CropsAction::List => commands::crops::list(),
            CropsAction::Explain { crop } => commands::crops::explain(&crop),
            CropsAction::Validate { file } => commands::crops::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
