//! Wizard state for one student: welcome, survey, results, plan.
//!
//! The value is owned by the caller and threaded through each transition; the
//! scoring engine never holds on to it.

use thiserror::Error;
use tracing::info;

use crate::artifacts::Artifacts;
use crate::engine;
use crate::error::EngineError;
use crate::features;
use crate::models::{Explanation, FeatureVector, PlanItem, RawSurvey, RiskAssessment, StressInput};
use crate::plan;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while in the {stage} stage")]
    UnexpectedStage {
        action: &'static str,
        stage: &'static str,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Outcome of a submitted survey.
#[derive(Debug, Clone)]
pub struct Results {
    pub survey: RawSurvey,
    pub stress_input: StressInput,
    pub features: FeatureVector,
    pub risk: RiskAssessment,
    pub stress_probability: f64,
    pub explanation: Option<Explanation>,
}

#[derive(Debug, Clone)]
pub enum Stage {
    Welcome,
    Survey,
    Results(Results),
    Plan(Results, Vec<PlanItem>),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Welcome => "welcome",
            Stage::Survey => "survey",
            Stage::Results(_) => "results",
            Stage::Plan(_, _) => "plan",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub student: String,
    pub stage: Stage,
}

impl Session {
    pub fn new(student: impl Into<String>) -> Self {
        Self {
            student: student.into(),
            stage: Stage::Welcome,
        }
    }

    fn unexpected(&self, action: &'static str) -> SessionError {
        SessionError::UnexpectedStage {
            action,
            stage: self.stage.name(),
        }
    }

    pub fn begin(self) -> Result<Self, SessionError> {
        match self.stage {
            Stage::Welcome => Ok(Self {
                stage: Stage::Survey,
                ..self
            }),
            _ => Err(self.unexpected("begin")),
        }
    }

    pub fn submit(
        self,
        survey: RawSurvey,
        stress_input: StressInput,
        artifacts: &Artifacts,
    ) -> Result<Self, SessionError> {
        if !matches!(self.stage, Stage::Survey) {
            return Err(self.unexpected("submit a survey"));
        }

        let features = features::derive(&survey);
        let risk = engine::assess(&features, &artifacts.risk, artifacts.threshold())?;
        let stress_probability = engine::classify_text(&stress_input, artifacts.stress.as_ref())?;
        let explanation = engine::explain(&features, &artifacts.risk)?;

        info!(
            student = %self.student,
            risk = risk.probability,
            band = %risk.band,
            stress = stress_probability,
            "survey scored"
        );

        Ok(Self {
            stage: Stage::Results(Results {
                survey,
                stress_input,
                features,
                risk,
                stress_probability,
                explanation,
            }),
            ..self
        })
    }

    pub fn build_plan(self, artifacts: &Artifacts) -> Result<Self, SessionError> {
        let results = match self.stage {
            Stage::Results(results) => results,
            stage => {
                return Err(Self {
                    stage,
                    ..self
                }
                .unexpected("build a plan"))
            }
        };
        let items = plan::build_plan(&results, artifacts)?;
        Ok(Self {
            student: self.student,
            stage: Stage::Plan(results, items),
        })
    }

    /// Back to the survey, dropping any results.
    pub fn restart(self) -> Self {
        Self {
            stage: Stage::Survey,
            ..self
        }
    }

    pub fn results(&self) -> Option<&Results> {
        match &self.stage {
            Stage::Results(results) | Stage::Plan(results, _) => Some(results),
            _ => None,
        }
    }

    pub fn plan(&self) -> Option<&[PlanItem]> {
        match &self.stage {
            Stage::Plan(_, items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::tests::sample_artifacts;
    use crate::models::MoodPreset;

    #[test]
    fn walks_through_every_stage() {
        let artifacts = sample_artifacts();
        let session = Session::new("Alex").begin().expect("begin");
        assert_eq!(session.stage.name(), "survey");

        let session = session
            .submit(
                RawSurvey::default(),
                StressInput::Preset(MoodPreset::Managing),
                &artifacts,
            )
            .expect("submit");
        assert_eq!(session.stage.name(), "results");
        let results = session.results().expect("results");
        assert_eq!(results.features.academic_risk, 6.0);
        assert!(results.explanation.is_some());

        let session = session.build_plan(&artifacts).expect("plan");
        assert!(!session.plan().expect("items").is_empty());
        assert!(session.results().is_some());

        let session = session.restart();
        assert_eq!(session.stage.name(), "survey");
        assert!(session.results().is_none());
    }

    #[test]
    fn rejects_out_of_order_transitions() {
        let artifacts = sample_artifacts();
        let err = Session::new("Alex")
            .submit(RawSurvey::default(), StressInput::Text("ok".into()), &artifacts)
            .err()
            .expect("should fail");
        assert!(matches!(
            err,
            SessionError::UnexpectedStage { stage: "welcome", .. }
        ));

        let err = Session::new("Alex")
            .begin()
            .expect("begin")
            .build_plan(&artifacts)
            .err()
            .expect("should fail");
        assert!(matches!(err, SessionError::UnexpectedStage { stage: "survey", .. }));

        let err = Session::new("Alex").begin().expect("begin").begin().err().expect("should fail");
        assert!(matches!(err, SessionError::UnexpectedStage { .. }));
    }
}
