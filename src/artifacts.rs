//! Pre-fit model artifacts: the risk pipeline (scaler + logistic model), the
//! stress text model, and the metadata bundle.
//!
//! All three are read once from JSON files in an artifact directory and are
//! read-only afterwards. The scoring core only talks to them through the
//! [`FeatureScaler`], [`ProbabilityClassifier`] and [`TextClassifier`] traits.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::Feature;

pub const ACADEMIC_PIPELINE_FILE: &str = "academic_pipeline.json";
pub const STRESS_PIPELINE_FILE: &str = "stress_pipeline.json";
pub const META_FILE: &str = "meta.json";

pub trait FeatureScaler: Send + Sync {
    fn transform(&self, values: &[f64]) -> EngineResult<Vec<f64>>;
}

pub trait ProbabilityClassifier: Send + Sync {
    /// Probability of the positive class.
    fn predict_proba(&self, values: &[f64]) -> EngineResult<f64>;
}

pub trait TextClassifier: Send + Sync {
    fn predict_proba(&self, text: &str) -> EngineResult<f64>;
}

fn check_vector(expected: usize, values: &[f64], who: &str) -> EngineResult<()> {
    if values.len() != expected {
        return Err(EngineError::input_shape(format!(
            "{who} expects {expected} values, got {}",
            values.len()
        )));
    }
    if let Some(position) = values.iter().position(|value| !value.is_finite()) {
        return Err(EngineError::input_shape(format!(
            "{who} received a non-numeric value at position {position}"
        )));
    }
    Ok(())
}

fn sigmoid(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn validate(&self, width: usize) -> EngineResult<()> {
        if self.mean.len() != width || self.scale.len() != width {
            return Err(EngineError::configuration(format!(
                "scaler has {} means and {} scales for {width} features",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(EngineError::configuration("scaler contains a zero or non-finite scale"));
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, values: &[f64]) -> EngineResult<Vec<f64>> {
        check_vector(self.mean.len(), values, "scaler")?;
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }
}

/// Pass-through used when a pipeline ships without a scaler.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler;

impl FeatureScaler for IdentityScaler {
    fn transform(&self, values: &[f64]) -> EngineResult<Vec<f64>> {
        check_vector(values.len(), values, "scaler")?;
        Ok(values.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn logit(&self, values: &[f64]) -> EngineResult<f64> {
        check_vector(self.coefficients.len(), values, "classifier")?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(values)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}

impl ProbabilityClassifier for LogisticModel {
    fn predict_proba(&self, values: &[f64]) -> EngineResult<f64> {
        Ok(sigmoid(self.logit(values)?))
    }
}

/// Bag-of-words logistic text model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextModel {
    pub vocabulary: HashMap<String, f64>,
    pub intercept: f64,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
}

fn default_lowercase() -> bool {
    true
}

impl TextModel {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| {
                if self.lowercase {
                    token.to_lowercase()
                } else {
                    token.to_string()
                }
            })
            .collect()
    }
}

impl TextClassifier for TextModel {
    fn predict_proba(&self, text: &str) -> EngineResult<f64> {
        let weights: Vec<f64> = self
            .tokenize(text)
            .iter()
            .filter_map(|token| self.vocabulary.get(token).copied())
            .collect();
        let signal = if weights.is_empty() {
            0.0
        } else {
            weights.iter().sum::<f64>() / weights.len() as f64
        };
        Ok(sigmoid(self.intercept + signal))
    }
}

#[derive(Debug, Deserialize)]
struct PipelineFile {
    features: Vec<String>,
    scaler: Option<StandardScaler>,
    model: LogisticModel,
}

/// The academic risk pipeline: optional scaler, classifier and feature order.
pub struct RiskPipeline {
    pub scaler: Box<dyn FeatureScaler>,
    pub classifier: Box<dyn ProbabilityClassifier>,
    pub features: Vec<Feature>,
    /// Kept for linear explanations when the classifier is the logistic model.
    pub linear: Option<LogisticModel>,
}

impl RiskPipeline {
    pub fn new(
        scaler: Box<dyn FeatureScaler>,
        classifier: Box<dyn ProbabilityClassifier>,
    ) -> Self {
        Self {
            scaler,
            classifier,
            features: Feature::ORDER.to_vec(),
            linear: None,
        }
    }

    pub fn from_logistic(
        scaler: Option<StandardScaler>,
        model: LogisticModel,
    ) -> EngineResult<Self> {
        let width = Feature::ORDER.len();
        if model.coefficients.len() != width {
            return Err(EngineError::configuration(format!(
                "risk model has {} coefficients for {width} features",
                model.coefficients.len()
            )));
        }
        let scaler: Box<dyn FeatureScaler> = match scaler {
            Some(scaler) => {
                scaler.validate(width)?;
                Box::new(scaler)
            }
            None => Box::new(IdentityScaler),
        };
        Ok(Self {
            scaler,
            classifier: Box::new(model.clone()),
            features: Feature::ORDER.to_vec(),
            linear: Some(model),
        })
    }

    fn from_file(file: PipelineFile) -> EngineResult<Self> {
        let features = file
            .features
            .iter()
            .map(|name| name.parse::<Feature>().map_err(EngineError::configuration))
            .collect::<EngineResult<Vec<_>>>()?;
        if features != Feature::ORDER {
            return Err(EngineError::configuration(format!(
                "risk pipeline feature order {:?} does not match the derived vector order",
                file.features
            )));
        }
        Self::from_logistic(file.scaler, file.model)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelMeta {
    pub optimal_threshold: f64,
    #[serde(default)]
    pub benchmarks: BTreeMap<String, f64>,
    #[serde(default)]
    pub science_facts: Vec<String>,
}

impl ModelMeta {
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.optimal_threshold) {
            return Err(EngineError::configuration(format!(
                "decision threshold {} is outside [0, 1]",
                self.optimal_threshold
            )));
        }
        for (name, value) in &self.benchmarks {
            name.parse::<Feature>().map_err(EngineError::configuration)?;
            if !value.is_finite() {
                return Err(EngineError::configuration(format!(
                    "benchmark for {name} is not a number"
                )));
            }
        }
        Ok(())
    }

    pub fn benchmark(&self, feature: Feature) -> Option<f64> {
        self.benchmarks.get(feature.name()).copied()
    }
}

/// Everything loaded at startup.
pub struct Artifacts {
    pub risk: RiskPipeline,
    pub stress: Box<dyn TextClassifier>,
    pub meta: ModelMeta,
}

impl Artifacts {
    pub fn load(dir: &Path) -> EngineResult<Self> {
        let pipeline: PipelineFile = read_json(&dir.join(ACADEMIC_PIPELINE_FILE))?;
        let risk = RiskPipeline::from_file(pipeline)?;
        let stress: TextModel = read_json(&dir.join(STRESS_PIPELINE_FILE))?;
        let meta: ModelMeta = read_json(&dir.join(META_FILE))?;
        meta.validate()?;

        info!(
            dir = %dir.display(),
            threshold = meta.optimal_threshold,
            benchmarks = meta.benchmarks.len(),
            vocabulary = stress.vocabulary.len(),
            "model artifacts loaded"
        );

        Ok(Self {
            risk,
            stress: Box::new(stress),
            meta,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.meta.optimal_threshold
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
    debug!(path = %path.display(), "reading artifact");
    let raw = std::fs::read_to_string(path).map_err(|err| {
        EngineError::configuration(format!("cannot read {}: {err}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        EngineError::configuration(format!("malformed {}: {err}", path.display()))
    })
}
