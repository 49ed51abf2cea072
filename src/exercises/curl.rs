// src/exercises/curl.rs - Bicep curl, counted on elbow flexion
use crate::config::{ExerciseConfig, PipelineSettings, CURL_DOWN_ANGLE, CURL_UP_ANGLE};
use crate::error::Result;
use crate::exercise::{CyclicAnalyzer, CyclicProfile, ExerciseAnalyzer};
use crate::feedback::FeedbackEngine;
use crate::keypoints::{BilateralTriple, SideSelection};
use crate::tracking::FusionPolicy;

pub const NAME: &str = "bicep curl";
pub const ALIAS: &str = "curl";

pub const ERR_FLEXION: &str = "curl_err_flexion";

/// Elbow angle above which a rep reported as "up" was not really curled.
const FLEXION_LIMIT: f64 = 90.0;

pub fn profile() -> CyclicProfile {
    CyclicProfile {
        name: NAME,
        state_prefix: "curl",
        primary: BilateralTriple::SHOULDER_ELBOW_WRIST,
        secondary: None,
        default_side: SideSelection::Right,
        policy: FusionPolicy::AllSides,
        up_angle: CURL_UP_ANGLE,
        down_angle: CURL_DOWN_ANGLE,
        inverted: true,
        perfect_key: "curl_perfect_form",
    }
}

pub fn rules() -> FeedbackEngine {
    let mut rules = FeedbackEngine::new();
    rules.add_rule(5, ERR_FLEXION, |ctx| ctx.stage == "curl_up" && ctx.angle > FLEXION_LIMIT);
    rules
}

pub fn build(config: &ExerciseConfig, settings: &PipelineSettings) -> Result<Box<dyn ExerciseAnalyzer>> {
    let rules = super::without_disabled(rules(), config)?;
    Ok(Box::new(CyclicAnalyzer::new(profile(), rules, config.clone(), settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackContext;

    #[test]
    fn flexion_rule_only_fires_in_up_stage() {
        let rules = rules();
        let ctx = |stage: &str, angle: f64| FeedbackContext {
            angle,
            stage: stage.to_string(),
            ..Default::default()
        };
        assert_eq!(rules.check(&ctx("curl_up", 120.0)).message_key, ERR_FLEXION);
        assert!(rules.check(&ctx("curl_up", 40.0)).is_valid);
        assert!(rules.check(&ctx("curl_down", 120.0)).is_valid);
    }
}
