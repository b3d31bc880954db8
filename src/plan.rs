use crate::artifacts::Artifacts;
use crate::engine::{self, DEFAULT_STEP, STRESS_ALERT};
use crate::error::EngineResult;
use crate::models::{BenchmarkGap, Direction, Feature, Habit, PlanItem, RiskBand};
use crate::session::Results;

fn headline(results: &Results) -> PlanItem {
    let risk = &results.risk;
    let detail = match risk.band {
        RiskBand::High => format!(
            "Your risk of falling behind is {:.1}%, above the {:.1}% alert line. \
             Start with the steps below this week.",
            risk.probability * 100.0,
            risk.decision_threshold * 100.0
        ),
        RiskBand::Medium => format!(
            "Your risk sits at {:.1}%, under the {:.1}% alert line but above the low band. \
             Closing the gaps below keeps you under it.",
            risk.probability * 100.0,
            risk.decision_threshold * 100.0
        ),
        RiskBand::Low => format!(
            "Your risk is {:.1}%. Keep your current routine and protect what is working.",
            risk.probability * 100.0
        ),
    };
    PlanItem {
        title: risk.band.label().to_string(),
        detail,
    }
}

fn gap_item(gap: &BenchmarkGap) -> PlanItem {
    let (title, unit) = match gap.feature {
        Feature::EffortScore => ("Study effort", "effort points"),
        Feature::AttendancePct => ("Attendance", "percentage points"),
        Feature::SocialMediaHoursPerDay => ("Social media", "hours per day"),
        Feature::SleepDeviation => ("Sleep rhythm", "hours away from 7h"),
        other => (other.name(), "units"),
    };
    let verb = match gap.direction {
        Direction::Increases => "Raise",
        Direction::Decreases => "Cut",
    };
    PlanItem {
        title: title.to_string(),
        detail: format!(
            "{verb} by {:.1} {unit} to reach the typical student ({:.1} now, median {:.1}).",
            gap.shortfall, gap.value, gap.benchmark
        ),
    }
}

/// Ordered action plan for a scored survey.
pub fn build_plan(results: &Results, artifacts: &Artifacts) -> EngineResult<Vec<PlanItem>> {
    let mut items = vec![headline(results)];

    let mut gaps: Vec<BenchmarkGap> = engine::benchmark_gaps(&results.features, artifacts)
        .into_iter()
        .filter(|gap| gap.shortfall > 0.0)
        .collect();
    gaps.sort_by(|a, b| {
        let ra = a.shortfall / a.benchmark.abs().max(1.0);
        let rb = b.shortfall / b.benchmark.abs().max(1.0);
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    items.extend(gaps.iter().map(gap_item));

    // Quick wins must cross the threshold, so only students at or above it get them.
    if results.risk.probability >= results.risk.decision_threshold {
        for habit in Habit::ALL {
            let outcome = engine::improve(&results.features, habit, DEFAULT_STEP, artifacts)?;
            if outcome.reaches_safe_zone {
                items.push(PlanItem {
                    title: format!("Quick win: {}", habit.label()),
                    detail: format!(
                        "Changing this by {DEFAULT_STEP:.1} drops your risk from {:.1}% to {:.1}%, \
                         inside the safe zone.",
                        outcome.baseline.probability * 100.0,
                        outcome.adjusted.probability * 100.0
                    ),
                });
            }
        }
    }

    if results.stress_probability > STRESS_ALERT {
        items.push(PlanItem {
            title: "Stress check".to_string(),
            detail: format!(
                "Your stress reading is {:.1}%. Book a counselling slot and schedule one \
                 screen-free break a day.",
                results.stress_probability * 100.0
            ),
        });
    }

    if let Some(fact) = artifacts.meta.science_facts.first() {
        items.push(PlanItem {
            title: "Did you know".to_string(),
            detail: fact.clone(),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::tests::sample_artifacts;
    use crate::features::derive;
    use crate::models::{RawSurvey, StressInput};

    fn results_for(survey: RawSurvey, mood: &str, artifacts: &Artifacts) -> Results {
        let features = derive(&survey);
        let stress_input = StressInput::Text(mood.to_string());
        Results {
            risk: engine::assess(&features, &artifacts.risk, artifacts.threshold())
                .expect("assess"),
            stress_probability: engine::classify_text(&stress_input, artifacts.stress.as_ref())
                .expect("classify"),
            explanation: None,
            survey,
            stress_input,
            features,
        }
    }

    #[test]
    fn plan_starts_with_band_and_ends_with_fact() {
        let artifacts = sample_artifacts();
        let results = results_for(RawSurvey::default(), "calm", &artifacts);
        let plan = build_plan(&results, &artifacts).expect("plan");
        assert_eq!(plan[0].title, results.risk.band.label());
        assert_eq!(plan.last().expect("fact").title, "Did you know");
    }

    #[test]
    fn gaps_are_listed_largest_first() {
        let artifacts = sample_artifacts();
        let survey = RawSurvey {
            social_media_hours: 6.0,
            attendance: 84.0,
            ..RawSurvey::default()
        };
        let results = results_for(survey, "calm", &artifacts);
        let plan = build_plan(&results, &artifacts).expect("plan");
        let titles: Vec<&str> = plan.iter().map(|item| item.title.as_str()).collect();
        let social = titles.iter().position(|t| *t == "Social media").expect("social");
        let attendance = titles.iter().position(|t| *t == "Attendance").expect("attendance");
        assert!(social < attendance);
        assert!(!titles.contains(&"Sleep rhythm"));
    }

    #[test]
    fn elevated_stress_adds_check_in() {
        let artifacts = sample_artifacts();
        let stressed = results_for(RawSurvey::default(), "panicking and overwhelmed", &artifacts);
        let relaxed = results_for(RawSurvey::default(), "calm", &artifacts);
        let has_check = |items: &[PlanItem]| items.iter().any(|i| i.title == "Stress check");
        assert!(has_check(&build_plan(&stressed, &artifacts).expect("plan")));
        assert!(!has_check(&build_plan(&relaxed, &artifacts).expect("plan")));
    }

    fn quick_wins(plan: &[PlanItem]) -> Vec<&str> {
        plan.iter()
            .filter_map(|item| item.title.strip_prefix("Quick win: "))
            .collect()
    }

    #[test]
    fn high_band_gets_quick_wins_that_cross_the_threshold() {
        let artifacts = sample_artifacts();
        let survey = RawSurvey {
            attendance: 65.0,
            social_media_hours: 4.5,
            ..RawSurvey::default()
        };
        let results = results_for(survey, "calm", &artifacts);
        assert_eq!(results.risk.band, RiskBand::High);

        let plan = build_plan(&results, &artifacts).expect("plan");
        let wins = quick_wins(&plan);
        assert!(wins.contains(&"Study hours"));
        assert!(wins.contains(&"Sleep regularity"));
        // one extra attendance point is not enough to cross 45%
        assert!(!wins.contains(&"Attendance"));
    }

    #[test]
    fn medium_band_gets_no_quick_wins() {
        let artifacts = sample_artifacts();
        let survey = RawSurvey {
            attendance: 65.0,
            ..RawSurvey::default()
        };
        let results = results_for(survey, "calm", &artifacts);
        assert_eq!(results.risk.band, RiskBand::Medium);

        let plan = build_plan(&results, &artifacts).expect("plan");
        assert!(quick_wins(&plan).is_empty());
        assert!(!plan[0].detail.contains("move you into the safe zone"));
    }
}
