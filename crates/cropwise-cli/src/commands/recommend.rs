use cropwise_core::conditions::{CropHistoryEntry, FieldConditions};
use cropwise_core::crops::{self, builtin};
use cropwise_core::engine::{self, RecommendationEngine};
use cropwise_core::error::CropwiseError;
use cropwise_core::predictor::{CropPredictor, LazyPredictor, LinearModelPredictor, NullPredictor};
use cropwise_core::{EngineOptions, RankBy};
use std::sync::Arc;

use crate::output;
use crate::{ConditionArgs, RecommendArgs};

fn conditions_from(args: &ConditionArgs) -> FieldConditions {
    FieldConditions {
        ph: args.ph,
        n: args.n,
        p: args.p,
        k: args.k,
        moisture: args.moisture,
        temperature: args.temperature,
        rainfall: args.rainfall,
        humidity: args.humidity,
        latitude: args.latitude,
        longitude: args.longitude,
        season: args.season,
    }
}

fn parse_rank_by(s: &str) -> Result<RankBy, CropwiseError> {
    match s.to_lowercase().as_str() {
        "confidence" => Ok(RankBy::Confidence),
        "composite" => Ok(RankBy::Composite),
        other => Err(CropwiseError::OptionsLoad {
            path: "--rank-by".into(),
            reason: format!("unknown order '{}'. Use confidence or composite", other),
        }),
    }
}

pub fn run(args: RecommendArgs) -> Result<(), CropwiseError> {
    let table = match &args.crops {
        Some(path) => crops::load_table(path)?,
        None => builtin::load_default()?,
    };

    let mut options = match &args.config {
        Some(path) => engine::load_options(path)?,
        None => EngineOptions::default(),
    };
    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    if let Some(order) = &args.rank_by {
        options.rank_by = parse_rank_by(order)?;
    }

    // Loaded on first use; a broken artifact degrades to rule-based scoring.
    let predictor: Arc<dyn CropPredictor> = match args.model.clone() {
        Some(path) => Arc::new(LazyPredictor::new("linear-model", move || {
            Ok(Arc::new(LinearModelPredictor::load(&path)?) as Arc<dyn CropPredictor>)
        })),
        None => Arc::new(NullPredictor),
    };

    let history: Option<Vec<CropHistoryEntry>> = match &args.history {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Some(serde_json::from_str(&content)?)
        }
        None => None,
    };

    let mut engine = RecommendationEngine::new(table, predictor, options);
    if let Some(date) = args.date {
        engine = engine.with_reference_date(date);
    }

    let conditions = conditions_from(&args.conditions);
    let recommendations = engine.get_recommendations(&conditions, history.as_deref());

    match args.output.as_str() {
        "json" => output::json::print(&recommendations)?,
        _ => output::table::print(&recommendations, args.verbose),
    }

    Ok(())
}
