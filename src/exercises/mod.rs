// src/exercises/mod.rs - Built-in exercise definitions
use crate::config::ExerciseConfig;
use crate::error::Result;
use crate::feedback::FeedbackEngine;

pub mod curl;
pub mod plank;
pub mod pushup;
pub mod squat;

/// Drop the rules the configuration switched off. Unknown keys are an error.
fn without_disabled(mut rules: FeedbackEngine, config: &ExerciseConfig) -> Result<FeedbackEngine> {
    for key in &config.disabled_rules {
        rules.remove_rule(key)?;
    }
    Ok(rules)
}
