use tracing::debug;

use crate::artifacts::{
    Artifacts, FeatureScaler, ProbabilityClassifier, RiskPipeline, TextClassifier,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BenchmarkGap, Contribution, Direction, Explanation, Feature, FeatureVector, Habit,
    RiskAssessment, RiskBand, StressInput, WhatIfOutcome, WhatIfScenario,
};

/// Probabilities at or below this are always Low.
pub const MEDIUM_FLOOR: f64 = 0.3;

/// Stress probabilities above this count as elevated.
pub const STRESS_ALERT: f64 = 0.5;

/// Default nudge used by the plan builder.
pub const DEFAULT_STEP: f64 = 1.0;

/// Features the simulator may perturb and the direction that lowers risk.
pub const IMPROVEMENT_DIRECTIONS: [(Feature, Direction); 4] = [
    (Feature::EffortScore, Direction::Increases),
    (Feature::AttendancePct, Direction::Increases),
    (Feature::SocialMediaHoursPerDay, Direction::Decreases),
    (Feature::SleepDeviation, Direction::Decreases),
];

pub fn improvement_direction(feature: Feature) -> Option<Direction> {
    IMPROVEMENT_DIRECTIONS
        .iter()
        .find(|(candidate, _)| *candidate == feature)
        .map(|(_, direction)| *direction)
}

pub fn score(
    features: &FeatureVector,
    scaler: &dyn FeatureScaler,
    classifier: &dyn ProbabilityClassifier,
) -> EngineResult<f64> {
    let scaled = scaler.transform(&features.to_array())?;
    let probability = classifier.predict_proba(&scaled)?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(EngineError::configuration(format!(
            "classifier returned {probability}, outside [0, 1]"
        )));
    }
    debug!(probability, "scored feature vector");
    Ok(probability)
}

pub fn classify_text(input: &StressInput, classifier: &dyn TextClassifier) -> EngineResult<f64> {
    let probability = classifier.predict_proba(input.as_text())?;
    if !(0.0..=1.0).contains(&probability) {
        return Err(EngineError::configuration(format!(
            "stress classifier returned {probability}, outside [0, 1]"
        )));
    }
    debug!(probability, preset = input.free_text().is_none(), "classified mood");
    Ok(probability)
}

pub fn band(probability: f64, threshold: f64) -> RiskBand {
    if probability > threshold {
        RiskBand::High
    } else if probability > MEDIUM_FLOOR {
        RiskBand::Medium
    } else {
        RiskBand::Low
    }
}

pub fn assess(
    features: &FeatureVector,
    pipeline: &RiskPipeline,
    threshold: f64,
) -> EngineResult<RiskAssessment> {
    let probability = score(features, pipeline.scaler.as_ref(), pipeline.classifier.as_ref())?;
    Ok(RiskAssessment {
        probability,
        decision_threshold: threshold,
        band: band(probability, threshold),
    })
}

/// Scores a copy of `features` with `delta` added to `field`. The caller picks the sign.
pub fn simulate(
    features: &FeatureVector,
    field: Feature,
    delta: f64,
    scaler: &dyn FeatureScaler,
    classifier: &dyn ProbabilityClassifier,
) -> EngineResult<f64> {
    if improvement_direction(field).is_none() {
        return Err(EngineError::input_shape(format!("{field} cannot be simulated")));
    }
    if !delta.is_finite() {
        return Err(EngineError::input_shape("what-if delta is not a number"));
    }
    let adjusted = features.with_delta(field, delta);
    debug!(%field, delta, "simulating what-if");
    score(&adjusted, scaler, classifier)
}

/// Moves one habit `step` units in its improving direction and compares risk.
pub fn improve(
    features: &FeatureVector,
    habit: Habit,
    step: f64,
    artifacts: &Artifacts,
) -> EngineResult<WhatIfOutcome> {
    if !step.is_finite() || step <= 0.0 {
        return Err(EngineError::input_shape(format!(
            "improvement step must be positive, got {step}"
        )));
    }
    let field = habit.feature();
    let delta = match improvement_direction(field) {
        Some(Direction::Increases) => step,
        Some(Direction::Decreases) => -step,
        None => return Err(EngineError::input_shape(format!("{field} cannot be simulated"))),
    };

    let threshold = artifacts.threshold();
    let pipeline = &artifacts.risk;
    let baseline = assess(features, pipeline, threshold)?;
    let probability = simulate(
        features,
        field,
        delta,
        pipeline.scaler.as_ref(),
        pipeline.classifier.as_ref(),
    )?;

    Ok(WhatIfOutcome {
        scenario: WhatIfScenario { field, delta },
        baseline,
        adjusted: RiskAssessment {
            probability,
            decision_threshold: threshold,
            band: band(probability, threshold),
        },
        reaches_safe_zone: probability < threshold,
    })
}

/// Per-feature logit contributions, largest magnitude first.
///
/// Returns `None` when the pipeline classifier is not linear.
pub fn explain(
    features: &FeatureVector,
    pipeline: &RiskPipeline,
) -> EngineResult<Option<Explanation>> {
    let Some(model) = pipeline.linear.as_ref() else {
        return Ok(None);
    };
    let scaled = pipeline.scaler.transform(&features.to_array())?;
    let mut contributions: Vec<Contribution> = pipeline
        .features
        .iter()
        .zip(scaled.iter().zip(&model.coefficients))
        .map(|(feature, (value, weight))| Contribution {
            feature: *feature,
            scaled_value: *value,
            weight: *weight,
            contribution: value * weight,
        })
        .collect();
    contributions.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(Some(Explanation {
        base_value: model.intercept,
        contributions,
    }))
}

/// Compares each habit feature against its benchmark median.
pub fn benchmark_gaps(features: &FeatureVector, artifacts: &Artifacts) -> Vec<BenchmarkGap> {
    IMPROVEMENT_DIRECTIONS
        .iter()
        .filter_map(|(feature, direction)| {
            let benchmark = artifacts.meta.benchmark(*feature)?;
            let value = features.get(*feature);
            let shortfall = match direction {
                Direction::Increases => (benchmark - value).max(0.0),
                Direction::Decreases => (value - benchmark).max(0.0),
            };
            Some(BenchmarkGap {
                feature: *feature,
                value,
                benchmark,
                direction: *direction,
                shortfall,
            })
        })
        .collect()
}
