use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::RawSurvey;

/// A named survey row from a batch file.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSurvey {
    pub name: String,
    pub survey: RawSurvey,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    prev_gpa: f64,
    last_test: f64,
    backlog: u32,
    study_hours: f64,
    library_hours: f64,
    attendance: f64,
    social_media_hours: f64,
    sleep_hours: f64,
    extracurricular: u32,
    mood: Option<String>,
}

impl From<CsvRow> for NamedSurvey {
    fn from(row: CsvRow) -> Self {
        NamedSurvey {
            name: row.name,
            survey: RawSurvey {
                prev_gpa: row.prev_gpa,
                last_test: row.last_test,
                backlog: row.backlog,
                study_hours: row.study_hours,
                library_hours: row.library_hours,
                attendance: row.attendance,
                social_media_hours: row.social_media_hours,
                sleep_hours: row.sleep_hours,
                extracurricular: row.extracurricular,
                mood: row.mood.filter(|mood| !mood.trim().is_empty()),
            },
        }
    }
}

pub fn read_survey(path: &Path) -> anyhow::Result<RawSurvey> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read survey {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed survey {}", path.display()))
}

pub fn read_batch<R: std::io::Read>(reader: R) -> anyhow::Result<Vec<NamedSurvey>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut surveys = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid survey row {}", index + 1))?;
        surveys.push(row.into());
    }

    Ok(surveys)
}

pub fn read_batch_file(path: &Path) -> anyhow::Result<Vec<NamedSurvey>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_batch(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = "\
name,prev_gpa,last_test,backlog,study_hours,library_hours,attendance,social_media_hours,sleep_hours,extracurricular,mood
Avery Lee,7.0,70,0,3.0,10,80,2.5,6.5,5,managing fine
Jules Moreno,5.5,48,2,1.0,2,61,5.0,5.0,2,
";

    #[test]
    fn reads_batch_rows() {
        let surveys = read_batch(BATCH.as_bytes()).expect("batch");
        assert_eq!(surveys.len(), 2);
        assert_eq!(surveys[0].name, "Avery Lee");
        assert_eq!(
            surveys[0].survey,
            RawSurvey {
                mood: Some("managing fine".to_string()),
                ..RawSurvey::default()
            }
        );
        assert_eq!(surveys[1].survey.backlog, 2);
        assert_eq!(surveys[1].survey.mood, None);
    }

    #[test]
    fn reports_bad_row_number() {
        let bad = "\
name,prev_gpa,last_test,backlog,study_hours,library_hours,attendance,social_media_hours,sleep_hours,extracurricular,mood
Avery Lee,seven,70,0,3.0,10,80,2.5,6.5,5,ok
";
        let err = read_batch(bad.as_bytes()).err().expect("should fail");
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn reads_json_survey() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = tmp.path().join("survey.json");
        std::fs::write(
            &path,
            r#"{"prev_gpa": 8.2, "last_test": 91, "backlog": 0, "study_hours": 4,
                "library_hours": 14, "attendance": 95, "social_media_hours": 1.5,
                "sleep_hours": 7.5, "extracurricular": 7}"#,
        )
        .expect("write");
        let survey = read_survey(&path).expect("survey");
        assert_eq!(survey.last_test, 91.0);
        assert_eq!(survey.mood, None);
    }
}
