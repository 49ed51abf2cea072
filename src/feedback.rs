// src/feedback.rs - Priority-ordered form rules
use std::fmt;

use crate::error::{Result, SpotterError};

/// Message key returned when no rule fires.
pub const FEEDBACK_PERFECT: &str = "feedback_perfect";

/// Everything a form rule may look at for the current frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackContext {
    pub angle: f64,
    pub body_angle: Option<f64>,
    pub elbow_angle: Option<f64>,
    pub stage: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackVerdict {
    pub message_key: String,
    pub is_valid: bool,
}

impl FeedbackVerdict {
    pub fn is_perfect(&self) -> bool {
        self.message_key == FEEDBACK_PERFECT
    }
}

type Predicate = Box<dyn Fn(&FeedbackContext) -> bool + Send + Sync>;

struct FeedbackRule {
    priority: i32,
    message_key: String,
    predicate: Predicate,
}

impl fmt::Debug for FeedbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackRule")
            .field("priority", &self.priority)
            .field("message_key", &self.message_key)
            .finish_non_exhaustive()
    }
}

/// Rules are kept sorted by priority; `check` walks them from the top and
/// reports the first one that fires. Equal priorities keep registration order.
#[derive(Debug, Default)]
pub struct FeedbackEngine {
    rules: Vec<FeedbackRule>,
}

impl FeedbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule<F>(&mut self, priority: i32, message_key: impl Into<String>, predicate: F)
    where
        F: Fn(&FeedbackContext) -> bool + Send + Sync + 'static,
    {
        // Highest priority is scanned first from the back, so an equal-priority
        // newcomer goes in front of the existing ones.
        let at = self.rules.partition_point(|r| r.priority < priority);
        self.rules.insert(
            at,
            FeedbackRule {
                priority,
                message_key: message_key.into(),
                predicate: Box::new(predicate),
            },
        );
    }

    /// Remove every rule registered under `message_key`.
    pub fn remove_rule(&mut self, message_key: &str) -> Result<()> {
        let before = self.rules.len();
        self.rules.retain(|r| r.message_key != message_key);
        if self.rules.len() == before {
            return Err(SpotterError::UnknownRule(message_key.to_string()));
        }
        Ok(())
    }

    pub fn check(&self, ctx: &FeedbackContext) -> FeedbackVerdict {
        self.rules
            .iter()
            .rev()
            .find(|r| (r.predicate)(ctx))
            .map(|r| FeedbackVerdict {
                message_key: r.message_key.clone(),
                is_valid: false,
            })
            .unwrap_or_else(|| FeedbackVerdict {
                message_key: FEEDBACK_PERFECT.to_string(),
                is_valid: true,
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules hold no per-frame state.
    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(angle: f64) -> FeedbackContext {
        FeedbackContext {
            angle,
            ..Default::default()
        }
    }

    #[test]
    fn no_rules_is_perfect() {
        let engine = FeedbackEngine::new();
        let v = engine.check(&ctx(90.0));
        assert_eq!(v.message_key, FEEDBACK_PERFECT);
        assert!(v.is_valid);
        assert!(v.is_perfect());
    }

    #[test]
    fn higher_priority_wins_regardless_of_order() {
        let mut engine = FeedbackEngine::new();
        engine.add_rule(5, "low", |c| c.angle > 10.0);
        engine.add_rule(10, "high", |c| c.angle > 10.0);
        assert_eq!(engine.check(&ctx(50.0)).message_key, "high");

        let mut engine = FeedbackEngine::new();
        engine.add_rule(10, "high", |c| c.angle > 10.0);
        engine.add_rule(5, "low", |c| c.angle > 10.0);
        assert_eq!(engine.check(&ctx(50.0)).message_key, "high");
    }

    #[test]
    fn lower_priority_fires_when_higher_does_not() {
        let mut engine = FeedbackEngine::new();
        engine.add_rule(10, "hips", |c| c.body_angle.is_some_and(|b| b < 160.0));
        engine.add_rule(5, "elbows", |c| c.elbow_angle.is_some_and(|e| !(70.0..=110.0).contains(&e)));

        let c = FeedbackContext {
            angle: 170.0,
            body_angle: Some(170.0),
            elbow_angle: Some(130.0),
            stage: String::new(),
        };
        let v = engine.check(&c);
        assert_eq!(v.message_key, "elbows");
        assert!(!v.is_valid);
    }

    #[test]
    fn equal_priority_prefers_first_registered() {
        let mut engine = FeedbackEngine::new();
        engine.add_rule(7, "first", |_| true);
        engine.add_rule(7, "second", |_| true);
        assert_eq!(engine.check(&ctx(0.0)).message_key, "first");
        engine.remove_rule("first").unwrap();
        assert_eq!(engine.check(&ctx(0.0)).message_key, "second");
    }

    #[test]
    fn remove_rule() {
        let mut engine = FeedbackEngine::new();
        engine.add_rule(10, "always", |_| true);
        assert_eq!(engine.len(), 1);
        engine.remove_rule("always").unwrap();
        assert!(engine.is_empty());
        assert!(engine.check(&ctx(0.0)).is_valid);
        assert!(matches!(
            engine.remove_rule("always"),
            Err(SpotterError::UnknownRule(k)) if k == "always"
        ));
    }
}
