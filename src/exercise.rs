// src/exercise.rs - Analyzer trait and the two generic analyzer shapes
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ExerciseConfig, PipelineSettings};
use crate::error::Result;
use crate::feedback::{FeedbackContext, FeedbackEngine};
use crate::fsm::{CounterConfig, RepetitionCounter};
use crate::history::{HistoryBuffer, HistoryEntry};
use crate::hold::{HoldPhase, HoldTimer};
use crate::keypoints::{BilateralTriple, PoseFrame, SideSelection};
use crate::tracking::{FusionPolicy, JointTracker};

pub const ERR_BODY_NOT_VISIBLE: &str = "err_body_not_visible";

/// Per-frame output handed to the renderer and the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub reps: u32,
    pub stage: String,
    pub correction: String,
    pub angle: f64,
    pub is_valid: bool,
}

impl AnalysisResult {
    fn not_visible(reps: u32) -> Self {
        Self {
            reps,
            stage: "unknown".to_string(),
            correction: ERR_BODY_NOT_VISIBLE.to_string(),
            angle: 0.0,
            is_valid: false,
        }
    }
}

/// What the `reps` field of a result measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    Repetitions,
    /// Whole seconds held
    Duration,
}

pub trait ExerciseAnalyzer: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> CounterKind;

    /// Analyze one frame. Never fails: unusable input yields an invalid result.
    fn process_frame(&mut self, frame: &PoseFrame, timestamp: f64) -> AnalysisResult;

    /// Clear reps, stage, history and filter state. Thresholds are kept.
    fn reset(&mut self);

    fn reps(&self) -> u32;

    fn stage(&self) -> String;

    fn history(&self) -> &HistoryBuffer;

    fn config(&self) -> &ExerciseConfig;

    /// True once a duration exercise can no longer progress until reset.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Static description of a cyclic (repetition) exercise.
#[derive(Debug, Clone)]
pub struct CyclicProfile {
    pub name: &'static str,
    pub state_prefix: &'static str,
    pub primary: BilateralTriple,
    /// Body line fed to form rules as `body_angle`
    pub secondary: Option<BilateralTriple>,
    pub default_side: SideSelection,
    pub policy: FusionPolicy,
    pub up_angle: f64,
    pub down_angle: f64,
    pub inverted: bool,
    pub perfect_key: &'static str,
}

pub struct CyclicAnalyzer {
    profile: CyclicProfile,
    config: ExerciseConfig,
    tracker: JointTracker,
    counter: RepetitionCounter,
    rules: FeedbackEngine,
    history: HistoryBuffer,
}

impl CyclicAnalyzer {
    pub fn new(
        profile: CyclicProfile,
        rules: FeedbackEngine,
        config: ExerciseConfig,
        settings: &PipelineSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let up = config.up_angle_or(profile.name, profile.up_angle, settings)?;
        let down = config.down_angle_or(profile.name, profile.down_angle, settings)?;

        let mut counter_config = CounterConfig::new(up, down)
            .with_prefix(profile.state_prefix)
            .with_debounce(settings.hysteresis_tolerance, settings.stability_frames);
        if profile.inverted {
            counter_config = counter_config.inverted();
        }
        let counter = RepetitionCounter::new(counter_config)?;

        let tracker = JointTracker::new(
            profile.primary,
            profile.secondary,
            config.side.unwrap_or(profile.default_side),
            profile.policy,
            settings.confidence_threshold,
            settings.filter,
        );

        debug!(exercise = profile.name, up, down, inverted = profile.inverted, "cyclic analyzer ready");

        Ok(Self {
            profile,
            config,
            tracker,
            counter,
            rules,
            history: HistoryBuffer::new(settings.history_capacity),
        })
    }

}

impl ExerciseAnalyzer for CyclicAnalyzer {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn kind(&self) -> CounterKind {
        CounterKind::Repetitions
    }

    fn process_frame(&mut self, frame: &PoseFrame, timestamp: f64) -> AnalysisResult {
        let Some(reading) = self.tracker.measure(frame, timestamp) else {
            return AnalysisResult::not_visible(self.counter.reps());
        };

        let before = self.counter.phase();
        let (reps, stage) = self.counter.process(reading.primary);
        if self.counter.phase() != before {
            debug!(
                exercise = self.profile.name,
                %stage,
                reps,
                angle = reading.primary,
                side = ?reading.side,
                "phase change"
            );
        }

        let verdict = self.rules.check(&FeedbackContext {
            angle: reading.primary,
            body_angle: reading.secondary,
            elbow_angle: None,
            stage: stage.clone(),
        });
        let correction = if verdict.is_perfect() {
            self.profile.perfect_key.to_string()
        } else {
            verdict.message_key
        };

        self.history.push(HistoryEntry {
            angle: reading.primary,
            body_angle: reading.secondary,
            stage: stage.clone(),
            reps,
            is_valid: verdict.is_valid,
        });

        AnalysisResult {
            reps,
            stage,
            correction,
            angle: reading.primary,
            is_valid: verdict.is_valid,
        }
    }

    fn reset(&mut self) {
        self.counter.reset();
        self.rules.reset();
        self.tracker.reset();
        self.history.clear();
    }

    fn reps(&self) -> u32 {
        self.counter.reps()
    }

    fn stage(&self) -> String {
        self.counter.stage()
    }

    fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    fn config(&self) -> &ExerciseConfig {
        &self.config
    }
}

/// Static description of a timed hold.
#[derive(Debug, Clone)]
pub struct HoldProfile {
    pub name: &'static str,
    /// Counted angle, reported in results and fed to rules as `body_angle`
    pub body: BilateralTriple,
    pub elbow: BilateralTriple,
    pub default_side: SideSelection,
    pub policy: FusionPolicy,
    pub stability_duration: f64,
    pub done_key: &'static str,
    pub hold_key: &'static str,
    pub stay_still_key: &'static str,
    pub countdown_prefix: &'static str,
}

pub struct HoldAnalyzer {
    profile: HoldProfile,
    config: ExerciseConfig,
    tracker: JointTracker,
    timer: HoldTimer,
    rules: FeedbackEngine,
    history: HistoryBuffer,
}

impl HoldAnalyzer {
    pub fn new(
        profile: HoldProfile,
        rules: FeedbackEngine,
        config: ExerciseConfig,
        settings: &PipelineSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let duration = config.stability_duration_or(profile.name, profile.stability_duration)?;
        let tracker = JointTracker::new(
            profile.body,
            Some(profile.elbow),
            config.side.unwrap_or(profile.default_side),
            profile.policy,
            settings.confidence_threshold,
            settings.filter,
        );

        debug!(exercise = profile.name, duration, "hold analyzer ready");

        Ok(Self {
            profile,
            config,
            tracker,
            timer: HoldTimer::new(duration)?,
            rules,
            history: HistoryBuffer::new(settings.history_capacity),
        })
    }

}

impl ExerciseAnalyzer for HoldAnalyzer {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn kind(&self) -> CounterKind {
        CounterKind::Duration
    }

    fn process_frame(&mut self, frame: &PoseFrame, timestamp: f64) -> AnalysisResult {
        let Some(reading) = self.tracker.measure(frame, timestamp) else {
            return AnalysisResult::not_visible(self.timer.elapsed_secs());
        };
        let body = reading.primary;

        let verdict = self.rules.check(&FeedbackContext {
            angle: body,
            body_angle: Some(body),
            elbow_angle: reading.secondary,
            stage: self.timer.phase().as_str().to_string(),
        });

        let before = self.timer.phase();
        let status = self.timer.process(verdict.is_valid, timestamp);
        if status.phase != before {
            debug!(
                exercise = self.profile.name,
                phase = status.phase.as_str(),
                elapsed = status.elapsed,
                side = ?reading.side,
                "hold phase change"
            );
        }

        let p = &self.profile;
        // With valid form the timer has always left WAITING.
        let correction = match (status.phase, self.timer.countdown_remaining()) {
            (HoldPhase::Finished, _) => p.done_key.to_string(),
            _ if !verdict.is_valid => verdict.message_key,
            (HoldPhase::Active, _) => p.stay_still_key.to_string(),
            (_, Some(n)) if !status.countdown_started => format!("{}{n}", p.countdown_prefix),
            _ => p.hold_key.to_string(),
        };

        let reps = status.elapsed_secs();
        let stage = status.phase.as_str().to_string();
        self.history.push(HistoryEntry {
            angle: body,
            body_angle: Some(body),
            stage: stage.clone(),
            reps,
            is_valid: verdict.is_valid,
        });

        AnalysisResult {
            reps,
            stage,
            correction,
            angle: body,
            is_valid: verdict.is_valid,
        }
    }

    fn reset(&mut self) {
        self.timer.reset();
        self.rules.reset();
        self.tracker.reset();
        self.history.clear();
    }

    fn reps(&self) -> u32 {
        self.timer.elapsed_secs()
    }

    fn stage(&self) -> String {
        self.timer.phase().as_str().to_string()
    }

    fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    fn is_finished(&self) -> bool {
        self.timer.phase() == HoldPhase::Finished
    }
}
