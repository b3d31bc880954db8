use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use student_success_radar::artifacts::Artifacts;
use student_success_radar::models::{
    self, Habit, MoodPreset, RawSurvey, StressInput, DEFAULT_MOOD,
};
use student_success_radar::session::Session;
use student_success_radar::{engine, features, intake, logging, report};

#[derive(Parser)]
#[command(name = "success-radar")]
#[command(about = "Student academic-risk and stress early-warning radar", long_about = None)]
struct Cli {
    /// Directory holding academic_pipeline.json, stress_pipeline.json and meta.json
    #[arg(long, global = true, env = "RADAR_ARTIFACTS", default_value = "artifacts")]
    artifacts: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("mood_source")
        .args(["mood_text", "mood_preset"])
        .multiple(false)
))]
#[command(group(
    ArgGroup::new("sliders")
        .args([
            "gpa",
            "last_test",
            "backlog",
            "study_hours",
            "library_hours",
            "attendance",
            "social_media_hours",
            "sleep_hours",
            "extracurricular",
        ])
        .multiple(true)
))]
struct SurveyArgs {
    /// Read the survey from a JSON file instead of the flags below
    #[arg(long, conflicts_with = "sliders")]
    survey: Option<PathBuf>,
    #[arg(long, default_value_t = 7.0)]
    gpa: f64,
    #[arg(long, default_value_t = 70.0)]
    last_test: f64,
    #[arg(long, default_value_t = 0)]
    backlog: u32,
    #[arg(long, default_value_t = 3.0)]
    study_hours: f64,
    #[arg(long, default_value_t = 10.0)]
    library_hours: f64,
    #[arg(long, default_value_t = 80.0)]
    attendance: f64,
    #[arg(long, default_value_t = 2.5)]
    social_media_hours: f64,
    #[arg(long, default_value_t = 6.5)]
    sleep_hours: f64,
    #[arg(long, default_value_t = 5)]
    extracurricular: u32,
    /// How the week feels, in your own words
    #[arg(long)]
    mood_text: Option<String>,
    /// Pick a preset mood instead of free text
    #[arg(long, value_enum)]
    mood_preset: Option<MoodPreset>,
}

impl SurveyArgs {
    fn collect(self) -> anyhow::Result<(RawSurvey, StressInput)> {
        let survey = match &self.survey {
            Some(path) => intake::read_survey(path)?,
            None => RawSurvey {
                prev_gpa: self.gpa,
                last_test: self.last_test,
                backlog: self.backlog,
                study_hours: self.study_hours,
                library_hours: self.library_hours,
                attendance: self.attendance,
                social_media_hours: self.social_media_hours,
                sleep_hours: self.sleep_hours,
                extracurricular: self.extracurricular,
                mood: self.mood_text.clone(),
            },
        };

        let stress_input = match (self.mood_preset, self.mood_text) {
            (Some(preset), _) => StressInput::Preset(preset),
            (None, Some(text)) => StressInput::Text(text),
            (None, None) => StressInput::Text(
                survey
                    .mood
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MOOD.to_string()),
            ),
        };

        Ok((survey, stress_input))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score one survey for academic risk and stress
    Assess {
        #[command(flatten)]
        survey: SurveyArgs,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// See how one habit change moves the risk
    Simulate {
        #[command(flatten)]
        survey: SurveyArgs,
        #[arg(long, value_enum)]
        habit: Habit,
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },
    /// Write a markdown action-plan report
    Report {
        #[command(flatten)]
        survey: SurveyArgs,
        #[arg(long, default_value = "Alex")]
        name: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score every survey in a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List the preset mood phrases
    Moods,
}

fn load_artifacts(dir: &std::path::Path) -> anyhow::Result<Artifacts> {
    Artifacts::load(dir)
        .with_context(|| format!("failed to load model artifacts from {}", dir.display()))
}

fn scored_session(
    name: &str,
    survey: RawSurvey,
    stress_input: StressInput,
    artifacts: &Artifacts,
) -> anyhow::Result<Session> {
    let session = Session::new(name)
        .begin()?
        .submit(survey, stress_input, artifacts)?;
    Ok(session)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init("info")?;

    match cli.command {
        Commands::Moods => {
            for preset in MoodPreset::ALL {
                let value = format!("{preset:?}").to_lowercase();
                println!("- {value}: {}", preset.phrase());
            }
        }
        Commands::Assess { survey, json } => {
            let artifacts = load_artifacts(&cli.artifacts)?;
            let (survey, stress_input) = survey.collect()?;
            let session = scored_session("student", survey, stress_input, &artifacts)?;
            let results = session.results().context("survey produced no results")?;

            if json {
                let payload = serde_json::json!({
                    "features": results.features,
                    "risk": results.risk,
                    "stress_probability": results.stress_probability,
                    "explanation": results.explanation,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            println!("Features:");
            for feature in models::Feature::ORDER {
                println!("- {feature}: {:.2}", results.features.get(feature));
            }
            println!(
                "Academic risk: {:.1}% ({}, threshold {:.1}%)",
                results.risk.probability * 100.0,
                results.risk.band,
                results.risk.decision_threshold * 100.0
            );
            println!("Stress level: {:.1}%", results.stress_probability * 100.0);
        }
        Commands::Simulate {
            survey,
            habit,
            step,
        } => {
            let artifacts = load_artifacts(&cli.artifacts)?;
            let (survey, _) = survey.collect()?;
            let features = features::derive(&survey);
            let outcome = engine::improve(&features, habit, step, &artifacts)?;

            println!(
                "{} ({:+.1} {}): new risk probability {:.1}% (was {:.1}%)",
                habit.label(),
                outcome.scenario.delta,
                outcome.scenario.field,
                outcome.adjusted.probability * 100.0,
                outcome.baseline.probability * 100.0
            );
            if outcome.reaches_safe_zone {
                println!("You are now in the SAFE zone!");
            } else {
                println!("Try combining two habits.");
            }
        }
        Commands::Report { survey, name, out } => {
            let artifacts = load_artifacts(&cli.artifacts)?;
            let (survey, stress_input) = survey.collect()?;
            let session = scored_session(&name, survey, stress_input, &artifacts)?
                .build_plan(&artifacts)?;
            let results = session.results().context("session has no results")?;
            let items = session.plan().context("session has no plan")?;

            let report = report::build_report(
                &session.student,
                Uuid::new_v4(),
                chrono::Local::now().naive_local(),
                results,
                items,
            );
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{name}_report.md")));
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), items = items.len(), "report written");
            println!("Report written to {}.", out.display());
        }
        Commands::Batch { csv, limit } => {
            let artifacts = load_artifacts(&cli.artifacts)?;
            let rows = intake::read_batch_file(&csv)?;
            let mut scored = Vec::with_capacity(rows.len());

            for (index, row) in rows.into_iter().enumerate() {
                let mood = row
                    .survey
                    .mood
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MOOD.to_string());
                let stress_input = StressInput::Text(mood);
                let session = scored_session(&row.name, row.survey, stress_input, &artifacts)
                    .with_context(|| format!("failed to score row {} ({})", index + 1, row.name))?;
                if let Some(results) = session.results() {
                    scored.push((
                        session.student.clone(),
                        results.risk,
                        results.stress_probability,
                    ));
                }
            }

            if scored.is_empty() {
                println!("No surveys found in {}.", csv.display());
                return Ok(());
            }

            scored.sort_by(|a, b| {
                b.1.probability
                    .partial_cmp(&a.1.probability)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            println!("Top students by academic risk:");
            for (name, risk, stress) in scored.iter().take(limit) {
                println!(
                    "- {} risk {:.1}% ({}) stress {:.1}%",
                    name,
                    risk.probability * 100.0,
                    risk.band,
                    stress * 100.0
                );
            }
        }
    }

    Ok(())
}
