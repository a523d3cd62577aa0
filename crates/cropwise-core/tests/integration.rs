//! Integration tests for the recommendation pipeline.
//!
//! Predictor behaviour is simulated with mock backends so these tests run
//! without any trained model on disk.

use chrono::NaiveDate;
use cropwise_core::conditions::{
    CropHistoryEntry, FieldConditions, FieldRecord, SoilReading, WeatherObservation,
};
use cropwise_core::crops::builtin::load_default;
use cropwise_core::crops::Season;
use cropwise_core::engine::RecommendationEngine;
use cropwise_core::error::CropwiseError;
use cropwise_core::predictor::{
    CropPrediction, CropPredictor, LazyPredictor, LinearModelPredictor, NullPredictor,
};
use cropwise_core::store::{MemoryStore, UpsertOutcome};
use cropwise_core::{recommend_and_persist, recommend_for_field, EngineOptions, RankBy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Returns fixed predictions, or an error from the chosen call.
struct MockPredictor {
    predictions: Vec<CropPrediction>,
    yields: Vec<(&'static str, f64)>,
    fail_predict: bool,
    fail_yield: bool,
    delay: Duration,
    yield_delay: Duration,
    predict_calls: AtomicUsize,
}

impl MockPredictor {
    fn with(predictions: &[(&str, f64)]) -> Self {
        MockPredictor {
            predictions: predictions
                .iter()
                .map(|(name, confidence)| CropPrediction {
                    crop_name: name.to_string(),
                    confidence_score: *confidence,
                })
                .collect(),
            yields: Vec::new(),
            fail_predict: false,
            fail_yield: false,
            delay: Duration::ZERO,
            yield_delay: Duration::ZERO,
            predict_calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        MockPredictor {
            fail_predict: true,
            ..MockPredictor::with(&[])
        }
    }
}

impl CropPredictor for MockPredictor {
    fn is_available(&self) -> bool {
        true
    }

    fn predict(
        &self,
        _conditions: &FieldConditions,
        limit: usize,
    ) -> Result<Vec<CropPrediction>, CropwiseError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.fail_predict {
            return Err(CropwiseError::Predictor {
                backend: "mock".into(),
                reason: "model exploded".into(),
            });
        }
        Ok(self.predictions.iter().take(limit).cloned().collect())
    }

    fn predict_yield(
        &self,
        crop_name: &str,
        _conditions: &FieldConditions,
    ) -> Result<Option<f64>, CropwiseError> {
        std::thread::sleep(self.yield_delay);
        if self.fail_yield {
            return Err(CropwiseError::Predictor {
                backend: "mock".into(),
                reason: "regressor missing".into(),
            });
        }
        Ok(self
            .yields
            .iter()
            .find(|(name, _)| *name == crop_name)
            .map(|(_, y)| *y))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn engine_with(predictor: Arc<dyn CropPredictor>, options: EngineOptions) -> RecommendationEngine {
    RecommendationEngine::new(load_default().unwrap(), predictor, options)
        .with_reference_date(NaiveDate::from_ymd_opt(2025, 7, 15).unwrap())
}

fn rice_conditions() -> FieldConditions {
    FieldConditions {
        ph: Some(6.2),
        n: Some(120.0),
        p: Some(25.0),
        k: Some(45.0),
        moisture: Some(65.0),
        temperature: Some(28.0),
        rainfall: Some(1100.0),
        season: Some(Season::Kharif),
        ..FieldConditions::default()
    }
}

fn assert_rule_based(recs: &[cropwise_core::engine::Recommendation], limit: usize) {
    assert!(!recs.is_empty());
    assert!(recs.len() <= limit);
    assert!(recs.iter().all(|r| !r.ml_prediction));
    for pair in recs.windows(2) {
        assert!(pair[0].confidence_score >= pair[1].confidence_score);
    }
}

// ---------------------------------------------------------------------------
// Predictor path
// ---------------------------------------------------------------------------

#[test]
fn predictor_path_builds_records() {
    let mut mock = MockPredictor::with(&[("Soybean", 70.0), ("Rice", 85.0), ("Quinoa", 50.0)]);
    mock.yields = vec![("Rice", 4200.0)];
    let engine = engine_with(Arc::new(mock), EngineOptions::default());

    let recs = engine.get_recommendations(&rice_conditions(), None);
    let names: Vec<&str> = recs.iter().map(|r| r.crop_name.as_str()).collect();
    assert_eq!(names, vec!["Rice", "Soybean", "Quinoa"]);
    assert!(recs.iter().all(|r| r.ml_prediction));

    // Predicted yield; profit per kg from the averages (50000 / 3000).
    assert_eq!(recs[0].expected_yield, 4200.0);
    assert_eq!(recs[0].profit_margin, 70_000.0);
    assert_eq!(recs[0].sustainability_score, 75.0);

    // No predicted yield: average scaled by confidence.
    assert_eq!(recs[1].expected_yield, 1750.0);
    assert_eq!(recs[1].profit_margin, 42_000.0);
    assert_eq!(
        recs[1].reasoning.reasons,
        vec!["Model prediction with 70.0% confidence".to_string()]
    );

    // Unknown crop: zero averages and the default sustainability.
    assert_eq!(recs[2].expected_yield, 0.0);
    assert_eq!(recs[2].profit_margin, 0.0);
    assert_eq!(recs[2].sustainability_score, 70.0);
}

#[test]
fn predictor_disabled_by_flag() {
    let mock = MockPredictor::with(&[("Rice", 85.0)]);
    let engine = engine_with(Arc::new(mock), EngineOptions::default());
    let recs = engine.get_recommendations_with(&rice_conditions(), None, 4, false);
    assert_rule_based(&recs, 4);
}

// ---------------------------------------------------------------------------
// Fallback to rule-based scoring
// ---------------------------------------------------------------------------

#[test]
fn failing_predictor_falls_back() {
    let engine = engine_with(
        Arc::new(MockPredictor::failing()),
        EngineOptions {
            limit: 6,
            ..EngineOptions::default()
        },
    );
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 6);
    assert_eq!(recs.len(), 6);
    assert_eq!(recs[0].crop_name, "Rice");
}

#[test]
fn empty_prediction_falls_back() {
    let engine = engine_with(Arc::new(MockPredictor::with(&[])), EngineOptions::default());
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 10);
}

#[test]
fn yield_failure_falls_back() {
    let mut mock = MockPredictor::with(&[("Rice", 85.0)]);
    mock.fail_yield = true;
    let engine = engine_with(Arc::new(mock), EngineOptions::default());
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 10);
}

#[test]
fn slow_predictor_times_out() {
    let mut mock = MockPredictor::with(&[("Rice", 85.0)]);
    mock.delay = Duration::from_millis(500);
    let engine = engine_with(
        Arc::new(mock),
        EngineOptions {
            predictor_timeout_ms: Some(20),
            ..EngineOptions::default()
        },
    );
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 10);
}

#[test]
fn null_predictor_uses_rules() {
    let engine = engine_with(Arc::new(NullPredictor), EngineOptions::default());
    let recs = engine.get_recommendations(&FieldConditions::default(), None);
    assert_rule_based(&recs, 10);
    for rec in &recs {
        assert!((0.0..=100.0).contains(&rec.confidence_score));
    }
}

#[test]
fn hung_predictor_is_not_called_again() {
    let mut mock = MockPredictor::with(&[("Rice", 85.0)]);
    mock.delay = Duration::from_secs(2);
    let mock = Arc::new(mock);
    let engine = engine_with(
        mock.clone(),
        EngineOptions {
            predictor_timeout_ms: Some(10),
            ..EngineOptions::default()
        },
    );
    let start = Instant::now();
    for _ in 0..20 {
        let recs = engine.get_recommendations(&rice_conditions(), None);
        assert_rule_based(&recs, 10);
    }
    // One worker hangs; later requests are refused instead of spawning more.
    assert_eq!(mock.predict_calls.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn whole_predictor_path_shares_one_deadline() {
    let crops: Vec<(&str, f64)> = vec![
        ("Rice", 90.0),
        ("Wheat", 80.0),
        ("Maize", 70.0),
        ("Cotton", 60.0),
        ("Potato", 50.0),
        ("Onion", 40.0),
    ];
    let mut mock = MockPredictor::with(&crops);
    // Each yield call is well inside the deadline; all six together are not.
    mock.yield_delay = Duration::from_millis(40);
    let engine = engine_with(
        Arc::new(mock),
        EngineOptions {
            predictor_timeout_ms: Some(120),
            ..EngineOptions::default()
        },
    );
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 10);
}

// ---------------------------------------------------------------------------
// Predictor output validation
// ---------------------------------------------------------------------------

#[test]
fn non_finite_confidence_falls_back() {
    let mock = MockPredictor::with(&[("Rice", 80.0), ("Wheat", f64::NAN), ("Maize", 250.0)]);
    let engine = engine_with(Arc::new(mock), EngineOptions::default());
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 10);
    assert!(recs.iter().all(|r| r.confidence_score.is_finite()));
}

#[test]
fn out_of_range_predictor_values_are_clamped() {
    let mut mock = MockPredictor::with(&[("Maize", 250.0), ("Rice", 80.0), ("Wheat", -5.0)]);
    mock.yields = vec![("Rice", -100.0)];
    let engine = engine_with(Arc::new(mock), EngineOptions::default());
    let recs = engine.get_recommendations(&rice_conditions(), None);

    let names: Vec<&str> = recs.iter().map(|r| r.crop_name.as_str()).collect();
    assert_eq!(names, vec!["Maize", "Rice", "Wheat"]);
    assert!(recs.iter().all(|r| r.ml_prediction));
    assert_eq!(recs[0].confidence_score, 100.0);
    assert_eq!(recs[2].confidence_score, 0.0);
    assert_eq!(recs[2].expected_yield, 0.0);
    // A negative predicted yield floors at zero.
    assert_eq!(recs[1].expected_yield, 0.0);
    assert_eq!(recs[1].profit_margin, 0.0);
}

#[test]
fn non_finite_yield_falls_back_and_persists() {
    let mut mock = MockPredictor::with(&[("Rice", 85.0)]);
    mock.yields = vec![("Rice", f64::NAN)];
    let engine = engine_with(Arc::new(mock), EngineOptions::default());
    let store = MemoryStore::new();

    let (recs, outcomes) =
        recommend_and_persist(&engine, &store, "user-1", "field-1", &rice_conditions(), None)
            .unwrap();
    assert_rule_based(&recs, 10);
    assert_eq!(outcomes.len(), 5);
}

#[test]
fn predictor_records_are_marked_in_reasoning() {
    let engine = engine_with(
        Arc::new(MockPredictor::with(&[("Rice", 85.0)])),
        EngineOptions::default(),
    );
    let store = MemoryStore::new();
    recommend_and_persist(&engine, &store, "user-1", "field-1", &rice_conditions(), None).unwrap();
    let rows = store.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reasoning["ml_prediction"], true);
}

// ---------------------------------------------------------------------------
// Lazy predictor
// ---------------------------------------------------------------------------

#[test]
fn lazy_load_failure_is_cached_across_requests() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let lazy = LazyPredictor::new("model", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(CropwiseError::ModelLoad {
            path: "/models/crop.json".into(),
            reason: "not found".into(),
        })
    });
    let engine = engine_with(Arc::new(lazy), EngineOptions::default());
    for _ in 0..3 {
        let recs = engine.get_recommendations(&rice_conditions(), None);
        assert_rule_based(&recs, 10);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn lazy_linear_model_serves_predictions() {
    const MODEL: &str = r#"{
        "feature_names": ["rainfall"],
        "classes": [
            {"crop_name": "Wheat", "weights": [-0.01]},
            {"crop_name": "Rice", "weights": [0.01]}
        ]
    }"#;
    let lazy = LazyPredictor::new("linear", || {
        Ok(Arc::new(LinearModelPredictor::parse_str(MODEL)?) as Arc<dyn CropPredictor>)
    });
    let engine = engine_with(Arc::new(lazy), EngineOptions::default());
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].crop_name, "Rice");
    assert!(recs[0].ml_prediction);
    assert!(recs[0].confidence_score > 99.0);
}

#[test]
fn hanging_lazy_loader_is_bounded() {
    let lazy = LazyPredictor::new("model", || {
        std::thread::sleep(Duration::from_secs(2));
        Ok(Arc::new(NullPredictor) as Arc<dyn CropPredictor>)
    });
    let engine = engine_with(
        Arc::new(lazy),
        EngineOptions {
            predictor_timeout_ms: Some(20),
            ..EngineOptions::default()
        },
    );
    let start = Instant::now();
    let recs = engine.get_recommendations(&rice_conditions(), None);
    assert_rule_based(&recs, 10);
    assert!(start.elapsed() < Duration::from_secs(1));
}

// ---------------------------------------------------------------------------
// Field assembly, rotation and ranking
// ---------------------------------------------------------------------------

#[test]
fn field_record_assembly() {
    let engine = engine_with(Arc::new(NullPredictor), EngineOptions::default());
    let field = FieldRecord {
        soil_ph: Some(8.5),
        n_content: Some(120.0),
        p_content: Some(25.0),
        k_content: Some(45.0),
        soil_moisture: Some(65.0),
        ..FieldRecord::default()
    };
    // The soil reading corrects the stored pH.
    let soil = SoilReading {
        ph: Some(6.2),
        ..SoilReading::default()
    };
    let weather = WeatherObservation {
        temperature: Some(28.0),
        rainfall: Some(1100.0),
        humidity: Some(80.0),
    };
    let recs = recommend_for_field(&engine, &field, Some(&soil), Some(&weather), None);
    // Mid-July is kharif, so Rice matches fully.
    assert_eq!(recs[0].crop_name, "Rice");
    assert_eq!(recs[0].confidence_score, 100.0);
}

#[test]
fn rotation_history_shapes_composite_ranking() {
    let engine = engine_with(
        Arc::new(NullPredictor),
        EngineOptions {
            rank_by: RankBy::Composite,
            limit: 12,
            ..EngineOptions::default()
        },
    );
    let history = vec![
        CropHistoryEntry::new("Rice", 2024, Season::Kharif),
        CropHistoryEntry::new("Rice", 2023, Season::Kharif),
        CropHistoryEntry::default(),
    ];
    let with_history = engine.get_recommendations(&rice_conditions(), Some(&history));
    let without = engine.get_recommendations(&rice_conditions(), None);

    let composite = |recs: &[cropwise_core::engine::Recommendation], crop: &str| {
        recs.iter()
            .find(|r| r.crop_name == crop)
            .and_then(|r| r.composite_score)
            .unwrap()
    };
    assert!(composite(&with_history, "Rice") < composite(&without, "Rice"));
    for pair in with_history.windows(2) {
        assert!(pair[0].composite_score >= pair[1].composite_score);
    }
    let rice = with_history.iter().find(|r| r.crop_name == "Rice").unwrap();
    let rotation = rice.reasoning.rotation_analysis.as_ref().unwrap();
    // Two repeats (capped at 50) and two incompatible plantings (2 x 15).
    assert_eq!(rotation.rotation_score, 20.0);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn persist_top_five_then_update() {
    let engine = engine_with(Arc::new(NullPredictor), EngineOptions::default());
    let store = MemoryStore::new();

    let (recs, first) =
        recommend_and_persist(&engine, &store, "user-1", "field-1", &rice_conditions(), None)
            .unwrap();
    assert_eq!(recs.len(), 10);
    assert_eq!(first.len(), 5);
    assert!(first.iter().all(|(_, o)| *o == UpsertOutcome::Inserted));

    let (_, second) =
        recommend_and_persist(&engine, &store, "user-1", "field-1", &rice_conditions(), None)
            .unwrap();
    assert!(second.iter().all(|(_, o)| *o == UpsertOutcome::Updated));

    let rows = store.rows().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.revision == 2));
}
