// src/exercises/pushup.rs
use crate::config::{
    ExerciseConfig, PipelineSettings, PUSHUP_DOWN_ANGLE, PUSHUP_FORM_ANGLE_MIN, PUSHUP_UP_ANGLE,
};
use crate::error::Result;
use crate::exercise::{CyclicAnalyzer, CyclicProfile, ExerciseAnalyzer};
use crate::feedback::FeedbackEngine;
use crate::keypoints::{BilateralTriple, SideSelection};
use crate::tracking::FusionPolicy;

pub const NAME: &str = "push up";
pub const ALIAS: &str = "pushup";

pub const WARN_BACK: &str = "pushup_warn_back";

pub fn profile(settings: &PipelineSettings) -> CyclicProfile {
    CyclicProfile {
        name: NAME,
        state_prefix: "pushup",
        primary: BilateralTriple::SHOULDER_ELBOW_WRIST,
        secondary: Some(BilateralTriple::SHOULDER_HIP_ANKLE),
        // side-on camera, left side towards it
        default_side: SideSelection::Left,
        policy: FusionPolicy::ConfidenceWeighted {
            margin: settings.fusion_margin,
        },
        up_angle: PUSHUP_UP_ANGLE,
        down_angle: PUSHUP_DOWN_ANGLE,
        inverted: false,
        perfect_key: "pushup_perfect_form",
    }
}

/// Sagging hips: the shoulder-hip-ankle line bends below `form_angle_min`.
pub fn rules(form_angle_min: f64) -> FeedbackEngine {
    let mut rules = FeedbackEngine::new();
    rules.add_rule(10, WARN_BACK, move |ctx| {
        ctx.body_angle.is_some_and(|body| body < form_angle_min)
    });
    rules
}

pub fn build(config: &ExerciseConfig, settings: &PipelineSettings) -> Result<Box<dyn ExerciseAnalyzer>> {
    let form_angle_min = config.form_angle_min_or(NAME, PUSHUP_FORM_ANGLE_MIN)?;
    let rules = super::without_disabled(rules(form_angle_min), config)?;
    Ok(Box::new(CyclicAnalyzer::new(profile(settings), rules, config.clone(), settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackContext;

    fn body(angle: f64) -> FeedbackContext {
        FeedbackContext {
            angle: 150.0,
            body_angle: Some(angle),
            ..Default::default()
        }
    }

    #[test]
    fn sagging_back_warns() {
        let rules = rules(160.0);
        let v = rules.check(&body(140.0));
        assert_eq!(v.message_key, WARN_BACK);
        assert!(!v.is_valid);
        assert!(rules.check(&body(175.0)).is_valid);
    }

    #[test]
    fn form_threshold_is_configurable() {
        let rules = rules(130.0);
        assert!(rules.check(&body(140.0)).is_valid);
    }
}
