use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One submission of the nine measured inputs plus the mood description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSurvey {
    pub prev_gpa: f64,
    pub last_test: f64,
    pub backlog: u32,
    pub study_hours: f64,
    pub library_hours: f64,
    pub attendance: f64,
    pub social_media_hours: f64,
    pub sleep_hours: f64,
    pub extracurricular: u32,
    #[serde(default)]
    pub mood: Option<String>,
}

impl Default for RawSurvey {
    fn default() -> Self {
        Self {
            prev_gpa: 7.0,
            last_test: 70.0,
            backlog: 0,
            study_hours: 3.0,
            library_hours: 10.0,
            attendance: 80.0,
            social_media_hours: 2.5,
            sleep_hours: 6.5,
            extracurricular: 5,
            mood: Some(DEFAULT_MOOD.to_string()),
        }
    }
}

pub const DEFAULT_MOOD: &str = "lots of assignments and slightly nervous but managing";

/// Derived model features, in the order the risk classifier consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub academic_risk: f64,
    pub effort_score: f64,
    pub attendance_pct: f64,
    pub social_media_hours_per_day: f64,
    pub extracurricular_engagement_score: f64,
    pub sleep_deviation: f64,
    pub is_backlog: f64,
    pub academic_strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AcademicRisk,
    EffortScore,
    AttendancePct,
    SocialMediaHoursPerDay,
    ExtracurricularEngagementScore,
    SleepDeviation,
    IsBacklog,
    AcademicStrength,
}

impl Feature {
    /// Positional order expected by the risk classifier.
    pub const ORDER: [Feature; 8] = [
        Feature::AcademicRisk,
        Feature::EffortScore,
        Feature::AttendancePct,
        Feature::SocialMediaHoursPerDay,
        Feature::ExtracurricularEngagementScore,
        Feature::SleepDeviation,
        Feature::IsBacklog,
        Feature::AcademicStrength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::AcademicRisk => "academic_risk",
            Feature::EffortScore => "effort_score",
            Feature::AttendancePct => "attendance_pct",
            Feature::SocialMediaHoursPerDay => "social_media_hours_per_day",
            Feature::ExtracurricularEngagementScore => "extracurricular_engagement_score",
            Feature::SleepDeviation => "sleep_deviation",
            Feature::IsBacklog => "is_backlog",
            Feature::AcademicStrength => "academic_strength",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Feature::ORDER
            .iter()
            .copied()
            .find(|feature| feature.name() == value)
            .ok_or_else(|| format!("unknown feature '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low Risk",
            RiskBand::Medium => "Medium Risk",
            RiskBand::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub probability: f64,
    pub decision_threshold: f64,
    pub band: RiskBand,
}

/// A single-field perturbation of an existing feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WhatIfScenario {
    pub field: Feature,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WhatIfOutcome {
    pub scenario: WhatIfScenario,
    pub baseline: RiskAssessment,
    pub adjusted: RiskAssessment,
    pub reaches_safe_zone: bool,
}

/// Which way a habit feature has to move for risk to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increases,
    Decreases,
}

/// Habits the what-if simulator can nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Habit {
    Study,
    Attendance,
    Social,
    Sleep,
}

impl Habit {
    pub const ALL: [Habit; 4] = [Habit::Study, Habit::Attendance, Habit::Social, Habit::Sleep];

    pub fn feature(self) -> Feature {
        match self {
            Habit::Study => Feature::EffortScore,
            Habit::Attendance => Feature::AttendancePct,
            Habit::Social => Feature::SocialMediaHoursPerDay,
            Habit::Sleep => Feature::SleepDeviation,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Habit::Study => "Study hours",
            Habit::Attendance => "Attendance",
            Habit::Social => "Social-media cut",
            Habit::Sleep => "Sleep regularity",
        }
    }
}

/// Closed set of mood phrases offered instead of free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MoodPreset {
    Calm,
    Motivated,
    Managing,
    Tired,
    Distracted,
    Behind,
    Nervous,
    Overwhelmed,
    Lonely,
    Burnout,
    Panicking,
    Hopeless,
}

impl MoodPreset {
    pub const ALL: [MoodPreset; 12] = [
        MoodPreset::Calm,
        MoodPreset::Motivated,
        MoodPreset::Managing,
        MoodPreset::Tired,
        MoodPreset::Distracted,
        MoodPreset::Behind,
        MoodPreset::Nervous,
        MoodPreset::Overwhelmed,
        MoodPreset::Lonely,
        MoodPreset::Burnout,
        MoodPreset::Panicking,
        MoodPreset::Hopeless,
    ];

    pub fn phrase(self) -> &'static str {
        match self {
            MoodPreset::Calm => "feeling calm and on top of things",
            MoodPreset::Motivated => "motivated and enjoying my classes",
            MoodPreset::Managing => "busy week but managing fine",
            MoodPreset::Tired => "tired and not sleeping well",
            MoodPreset::Distracted => "easily distracted and procrastinating",
            MoodPreset::Behind => "falling behind on assignments",
            MoodPreset::Nervous => "nervous about upcoming exams",
            MoodPreset::Overwhelmed => "overwhelmed by deadlines and workload",
            MoodPreset::Lonely => "lonely and isolated from friends",
            MoodPreset::Burnout => "exhausted and burnt out",
            MoodPreset::Panicking => "anxious and panicking about grades",
            MoodPreset::Hopeless => "hopeless and thinking of dropping out",
        }
    }
}

/// What the stress classifier is fed: free text or one of the preset phrases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StressInput {
    Text(String),
    Preset(MoodPreset),
}

impl StressInput {
    pub fn as_text(&self) -> &str {
        match self {
            StressInput::Text(text) => text,
            StressInput::Preset(preset) => preset.phrase(),
        }
    }

    pub fn free_text(&self) -> Option<&str> {
        match self {
            StressInput::Text(text) => Some(text),
            StressInput::Preset(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: Feature,
    pub scaled_value: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub base_value: f64,
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BenchmarkGap {
    pub feature: Feature,
    pub value: f64,
    pub benchmark: f64,
    pub direction: Direction,
    /// Distance to the benchmark on the wrong side; zero when at or past it.
    pub shortfall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    pub title: String,
    pub detail: String,
}
