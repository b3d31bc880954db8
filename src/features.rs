use crate::models::{Feature, FeatureVector, RawSurvey};

pub fn derive(raw: &RawSurvey) -> FeatureVector {
    let is_backlog = if raw.backlog > 0 { 1.0 } else { 0.0 };
    let academic_strength = (raw.prev_gpa + raw.last_test / 10.0) / 2.0;
    let effort_score = raw.study_hours + raw.library_hours / 7.0;
    let academic_risk = is_backlog + (10.0 - raw.prev_gpa) + (10.0 - raw.last_test / 10.0);
    let sleep_deviation = (raw.sleep_hours - 7.0).abs();

    FeatureVector {
        academic_risk,
        effort_score,
        attendance_pct: raw.attendance,
        social_media_hours_per_day: raw.social_media_hours,
        extracurricular_engagement_score: f64::from(raw.extracurricular),
        sleep_deviation,
        is_backlog,
        academic_strength,
    }
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::AcademicRisk => self.academic_risk,
            Feature::EffortScore => self.effort_score,
            Feature::AttendancePct => self.attendance_pct,
            Feature::SocialMediaHoursPerDay => self.social_media_hours_per_day,
            Feature::ExtracurricularEngagementScore => self.extracurricular_engagement_score,
            Feature::SleepDeviation => self.sleep_deviation,
            Feature::IsBacklog => self.is_backlog,
            Feature::AcademicStrength => self.academic_strength,
        }
    }

    fn slot(&mut self, feature: Feature) -> &mut f64 {
        match feature {
            Feature::AcademicRisk => &mut self.academic_risk,
            Feature::EffortScore => &mut self.effort_score,
            Feature::AttendancePct => &mut self.attendance_pct,
            Feature::SocialMediaHoursPerDay => &mut self.social_media_hours_per_day,
            Feature::ExtracurricularEngagementScore => {
                &mut self.extracurricular_engagement_score
            }
            Feature::SleepDeviation => &mut self.sleep_deviation,
            Feature::IsBacklog => &mut self.is_backlog,
            Feature::AcademicStrength => &mut self.academic_strength,
        }
    }

    /// Copy of `self` with `delta` added to one field.
    pub fn with_delta(&self, feature: Feature, delta: f64) -> FeatureVector {
        let mut copy = *self;
        *copy.slot(feature) += delta;
        copy
    }

    /// Values in classifier order.
    pub fn to_array(&self) -> [f64; 8] {
        Feature::ORDER.map(|feature| self.get(feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_survey() -> RawSurvey {
        RawSurvey {
            prev_gpa: 7.0,
            last_test: 70.0,
            backlog: 0,
            study_hours: 3.0,
            library_hours: 10.0,
            attendance: 80.0,
            social_media_hours: 2.5,
            sleep_hours: 6.5,
            extracurricular: 5,
            mood: None,
        }
    }

    #[test]
    fn derives_dashboard_example() {
        let features = derive(&sample_survey());
        assert_eq!(features.academic_risk, 6.0);
        assert!((features.effort_score - (3.0 + 10.0 / 7.0)).abs() < 1e-12);
        assert_eq!(features.attendance_pct, 80.0);
        assert_eq!(features.social_media_hours_per_day, 2.5);
        assert_eq!(features.extracurricular_engagement_score, 5.0);
        assert_eq!(features.sleep_deviation, 0.5);
        assert_eq!(features.is_backlog, 0.0);
        assert_eq!(features.academic_strength, 7.0);
    }

    #[test]
    fn derive_is_deterministic() {
        let survey = sample_survey();
        let first = derive(&survey);
        let second = derive(&survey);
        assert_eq!(first.to_array().map(f64::to_bits), second.to_array().map(f64::to_bits));
    }

    #[test]
    fn backlog_flag_is_set_for_any_backlog() {
        for count in 0..=10u32 {
            let survey = RawSurvey {
                backlog: count,
                ..sample_survey()
            };
            let expected = if count > 0 { 1.0 } else { 0.0 };
            assert_eq!(derive(&survey).is_backlog, expected);
        }
    }

    #[test]
    fn backlog_adds_one_to_academic_risk() {
        let clean = derive(&sample_survey());
        let behind = derive(&RawSurvey {
            backlog: 3,
            ..sample_survey()
        });
        assert_eq!(behind.academic_risk - clean.academic_risk, 1.0);
    }

    #[test]
    fn sleep_deviation_is_symmetric_around_seven() {
        for x in [0.0, 0.5, 1.5, 3.0, 5.0] {
            let short = derive(&RawSurvey {
                sleep_hours: 7.0 - x,
                ..sample_survey()
            });
            let long = derive(&RawSurvey {
                sleep_hours: 7.0 + x,
                ..sample_survey()
            });
            assert_eq!(short.sleep_deviation, long.sleep_deviation);
        }
    }

    #[test]
    fn test_score_divides_before_subtracting() {
        let features = derive(&RawSurvey {
            last_test: 40.0,
            ..sample_survey()
        });
        // 0 + (10 - 7) + (10 - 4)
        assert_eq!(features.academic_risk, 9.0);
    }

    #[test]
    fn higher_gpa_never_raises_academic_risk() {
        let mut previous = derive(&RawSurvey {
            prev_gpa: 0.0,
            ..sample_survey()
        });
        for step in 1..=100 {
            let gpa = f64::from(step) / 10.0;
            let current = derive(&RawSurvey {
                prev_gpa: gpa,
                ..sample_survey()
            });
            assert!(current.academic_risk <= previous.academic_risk);
            assert!(current.academic_strength >= previous.academic_strength);
            previous = current;
        }
    }

    #[test]
    fn higher_test_score_never_raises_academic_risk() {
        let mut previous = derive(&RawSurvey {
            last_test: 0.0,
            ..sample_survey()
        });
        for score in 1..=100 {
            let current = derive(&RawSurvey {
                last_test: f64::from(score),
                ..sample_survey()
            });
            assert!(current.academic_risk <= previous.academic_risk);
            assert!(current.academic_strength >= previous.academic_strength);
            previous = current;
        }
    }

    #[test]
    fn with_delta_touches_one_field_of_a_copy() {
        let original = derive(&sample_survey());
        let nudged = original.with_delta(Feature::AttendancePct, 5.0);
        assert_eq!(original.attendance_pct, 80.0);
        assert_eq!(nudged.attendance_pct, 85.0);
        for feature in Feature::ORDER {
            if feature != Feature::AttendancePct {
                assert_eq!(nudged.get(feature), original.get(feature));
            }
        }
    }

    #[test]
    fn array_follows_classifier_order() {
        let features = derive(&sample_survey());
        let values = features.to_array();
        assert_eq!(values[0], features.academic_risk);
        assert_eq!(values[2], 80.0);
        assert_eq!(values[7], features.academic_strength);
    }
}
