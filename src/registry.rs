// src/registry.rs - Exercise name -> analyzer constructor
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{ExerciseConfig, PipelineSettings};
use crate::error::{Result, SpotterError};
use crate::exercise::ExerciseAnalyzer;
use crate::exercises::{curl, plank, pushup, squat};

pub type AnalyzerFactory =
    fn(&ExerciseConfig, &PipelineSettings) -> Result<Box<dyn ExerciseAnalyzer>>;

/// Built once at startup and passed to whatever needs to create analyzers.
/// Names are matched case-insensitively.
#[derive(Clone, Default)]
pub struct ExerciseRegistry {
    factories: BTreeMap<String, AnalyzerFactory>,
}

impl fmt::Debug for ExerciseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl ExerciseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(squat::NAME, squat::build);
        registry.register(curl::NAME, curl::build);
        registry.register(curl::ALIAS, curl::build);
        registry.register(pushup::NAME, pushup::build);
        registry.register(pushup::ALIAS, pushup::build);
        registry.register(plank::NAME, plank::build);
        registry
    }

    /// Register or replace a constructor.
    pub fn register(&mut self, name: &str, factory: AnalyzerFactory) {
        self.factories.insert(name.trim().to_lowercase(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.trim().to_lowercase())
    }

    pub fn create(
        &self,
        name: &str,
        config: &ExerciseConfig,
        settings: &PipelineSettings,
    ) -> Result<Box<dyn ExerciseAnalyzer>> {
        let factory = self
            .factories
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| SpotterError::UnknownExercise {
                name: name.to_string(),
                available: self.available().join(", "),
            })?;
        factory(config, settings)
    }

    /// Registered names, sorted.
    pub fn available(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
