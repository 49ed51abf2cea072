// src/exercises/squat.rs
use crate::config::{ExerciseConfig, PipelineSettings, SQUAT_DOWN_ANGLE, SQUAT_UP_ANGLE};
use crate::error::Result;
use crate::exercise::{CyclicAnalyzer, CyclicProfile, ExerciseAnalyzer};
use crate::feedback::FeedbackEngine;
use crate::keypoints::{BilateralTriple, SideSelection};
use crate::tracking::FusionPolicy;

pub const NAME: &str = "squat";

pub fn profile() -> CyclicProfile {
    CyclicProfile {
        name: NAME,
        state_prefix: "squat",
        primary: BilateralTriple::HIP_KNEE_ANKLE,
        secondary: None,
        default_side: SideSelection::Right,
        policy: FusionPolicy::AllSides,
        up_angle: SQUAT_UP_ANGLE,
        down_angle: SQUAT_DOWN_ANGLE,
        inverted: false,
        perfect_key: "squat_perfect_form",
    }
}

pub fn build(config: &ExerciseConfig, settings: &PipelineSettings) -> Result<Box<dyn ExerciseAnalyzer>> {
    // No squat-specific form rules yet; depth is judged by the counter alone.
    let rules = super::without_disabled(FeedbackEngine::new(), config)?;
    Ok(Box::new(CyclicAnalyzer::new(profile(), rules, config.clone(), settings)?))
}
