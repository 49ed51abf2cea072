// src/exercises/plank.rs
use crate::config::{
    ExerciseConfig, PipelineSettings, PLANK_BODY_ANGLE_MIN, PLANK_ELBOW_ANGLE_MAX,
    PLANK_ELBOW_ANGLE_MIN, PLANK_STABILITY_DURATION,
};
use crate::error::Result;
use crate::exercise::{ExerciseAnalyzer, HoldAnalyzer, HoldProfile};
use crate::feedback::FeedbackEngine;
use crate::keypoints::{BilateralTriple, SideSelection};
use crate::tracking::FusionPolicy;

pub const NAME: &str = "plank";

pub const ERR_HIPS: &str = "plank_err_hips";
pub const ERR_ELBOWS: &str = "plank_err_elbows";

pub fn profile(settings: &PipelineSettings) -> HoldProfile {
    HoldProfile {
        name: NAME,
        body: BilateralTriple::SHOULDER_HIP_ANKLE,
        elbow: BilateralTriple::SHOULDER_ELBOW_WRIST,
        default_side: SideSelection::Left,
        policy: FusionPolicy::ConfidenceWeighted {
            margin: settings.fusion_margin,
        },
        stability_duration: PLANK_STABILITY_DURATION,
        done_key: "plank_feedback_done",
        hold_key: "plank_feedback_hold",
        stay_still_key: "plank_feedback_stay_still",
        countdown_prefix: "plank_countdown_",
    }
}

pub fn rules(body_angle_min: f64) -> FeedbackEngine {
    let mut rules = FeedbackEngine::new();
    rules.add_rule(10, ERR_HIPS, move |ctx| {
        ctx.body_angle.is_some_and(|body| body < body_angle_min)
    });
    rules.add_rule(5, ERR_ELBOWS, |ctx| {
        ctx.elbow_angle
            .is_some_and(|e| !(PLANK_ELBOW_ANGLE_MIN..=PLANK_ELBOW_ANGLE_MAX).contains(&e))
    });
    rules
}

pub fn build(config: &ExerciseConfig, settings: &PipelineSettings) -> Result<Box<dyn ExerciseAnalyzer>> {
    let body_min = config.form_angle_min_or(NAME, PLANK_BODY_ANGLE_MIN)?;
    let rules = super::without_disabled(rules(body_min), config)?;
    Ok(Box::new(HoldAnalyzer::new(profile(settings), rules, config.clone(), settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackContext;

    fn ctx(body: f64, elbow: f64) -> FeedbackContext {
        FeedbackContext {
            angle: body,
            body_angle: Some(body),
            elbow_angle: Some(elbow),
            stage: "waiting".into(),
        }
    }

    #[test]
    fn hips_outrank_elbows() {
        let rules = rules(PLANK_BODY_ANGLE_MIN);
        assert_eq!(rules.check(&ctx(140.0, 130.0)).message_key, ERR_HIPS);
        assert_eq!(rules.check(&ctx(175.0, 130.0)).message_key, ERR_ELBOWS);
        assert!(rules.check(&ctx(175.0, 90.0)).is_valid);
    }

    #[test]
    fn elbow_range_is_inclusive() {
        let rules = rules(PLANK_BODY_ANGLE_MIN);
        assert!(rules.check(&ctx(170.0, 70.0)).is_valid);
        assert!(rules.check(&ctx(170.0, 110.0)).is_valid);
    }
}
