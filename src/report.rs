use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::engine::STRESS_ALERT;
use crate::models::{Explanation, PlanItem};
use crate::session::Results;

const STOPWORDS: &[&str] = &[
    "about", "and", "are", "but", "for", "from", "just", "the", "this", "very", "was", "week",
    "with",
];

/// Most frequent non-stopword terms in `text`, ties broken alphabetically.
pub fn stress_keywords(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|token| token.len() > 2 && !STOPWORDS.contains(&token.as_str()))
    {
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut keywords: Vec<(String, usize)> = counts.into_iter().collect();
    keywords.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    keywords.truncate(limit);
    keywords
}

fn write_drivers(output: &mut String, explanation: &Explanation) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## What Pushed Your Risk");
    for contribution in explanation.contributions.iter().take(3) {
        let arrow = if contribution.contribution >= 0.0 { "up" } else { "down" };
        let _ = writeln!(
            output,
            "- {} pushed risk {} ({:+.2})",
            contribution.feature, arrow, contribution.contribution
        );
    }
}

pub fn build_report(
    student: &str,
    report_id: Uuid,
    generated_at: NaiveDateTime,
    results: &Results,
    plan: &[PlanItem],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Success Report - {student}");
    let _ = writeln!(output, "Generated on: {}", generated_at.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(output, "Report id: {report_id}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Scores");
    let _ = writeln!(
        output,
        "- Academic Risk: {:.1}% ({})",
        results.risk.probability * 100.0,
        results.risk.band
    );
    let _ = writeln!(output, "- Stress Level: {:.1}%", results.stress_probability * 100.0);

    if let Some(explanation) = &results.explanation {
        write_drivers(&mut output, explanation);
    }

    if results.stress_probability > STRESS_ALERT {
        if let Some(text) = results.stress_input.free_text() {
            let keywords = stress_keywords(text, 8);
            if !keywords.is_empty() {
                let _ = writeln!(output);
                let _ = writeln!(output, "## Stress Keywords");
                let words: Vec<String> = keywords
                    .iter()
                    .map(|(word, count)| format!("{word} ({count})"))
                    .collect();
                let _ = writeln!(output, "{}", words.join(", "));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Action Plan");

    if plan.is_empty() {
        let _ = writeln!(output, "No plan items for this report.");
    } else {
        for (index, item) in plan.iter().enumerate() {
            let _ = writeln!(output, "{}. **{}**: {}", index + 1, item.title, item.detail);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::tests::sample_artifacts;
    use crate::models::{MoodPreset, RawSurvey, StressInput};
    use crate::session::Session;
    use chrono::NaiveDate;

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn keywords_skip_stopwords_and_rank_by_count() {
        let keywords = stress_keywords(
            "Deadlines, deadlines and the exam. I am so tired of deadlines",
            3,
        );
        assert_eq!(keywords[0], ("deadlines".to_string(), 3));
        assert_eq!(keywords.len(), 3);
        assert!(keywords.iter().all(|(word, _)| word != "the" && word != "and"));
    }

    #[test]
    fn report_carries_required_fields() {
        let artifacts = sample_artifacts();
        let session = Session::new("Alex")
            .begin()
            .and_then(|s| {
                s.submit(
                    RawSurvey::default(),
                    StressInput::Text("overwhelmed and nervous, overwhelmed by exams".into()),
                    &artifacts,
                )
            })
            .and_then(|s| s.build_plan(&artifacts))
            .expect("session");
        let results = session.results().expect("results");
        let plan = session.plan().expect("plan");
        let id = Uuid::new_v4();

        let report = build_report("Alex", id, generated_at(), results, plan);
        assert!(report.starts_with("# Student Success Report - Alex"));
        assert!(report.contains("Generated on: 2026-03-09 14:05"));
        assert!(report.contains(&id.to_string()));
        let risk_line = format!("Academic Risk: {:.1}%", results.risk.probability * 100.0);
        assert!(report.contains(&risk_line));
        assert!(report.contains("Stress Level:"));
        assert!(report.contains("## Stress Keywords"));
        assert!(report.contains("overwhelmed (2)"));
        assert!(report.contains(&format!("1. **{}**", plan[0].title)));
    }

    #[test]
    fn preset_moods_have_no_keyword_section() {
        let artifacts = sample_artifacts();
        let session = Session::new("Sam")
            .begin()
            .and_then(|s| {
                s.submit(
                    RawSurvey::default(),
                    StressInput::Preset(MoodPreset::Panicking),
                    &artifacts,
                )
            })
            .expect("session");
        let results = session.results().expect("results");
        let report = build_report("Sam", Uuid::new_v4(), generated_at(), results, &[]);
        assert!(!report.contains("## Stress Keywords"));
        assert!(report.contains("No plan items for this report."));
    }
}
