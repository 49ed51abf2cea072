// src/session.rs - Sets, rest periods and the records they produce
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::{ExerciseConfig, PipelineSettings};
use crate::error::{Result, SpotterError};
use crate::exercise::{AnalysisResult, CounterKind, ExerciseAnalyzer};
use crate::gesture::{GestureConfig, GestureHandler, SessionAction};
use crate::keypoints::PoseFrame;
use crate::registry::ExerciseRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkoutState {
    Exercise,
    Rest,
    Finished,
}

impl WorkoutState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutState::Exercise => "EXERCISE",
            WorkoutState::Rest => "REST",
            WorkoutState::Finished => "FINISHED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub exercise_name: String,
    #[serde(default)]
    pub config: ExerciseConfig,
    pub target_sets: u32,
    /// Repetitions per set; seconds held for duration exercises
    pub target_reps: u32,
}

impl WorkoutPlan {
    pub fn new(exercise_name: impl Into<String>, target_sets: u32, target_reps: u32) -> Self {
        Self {
            exercise_name: exercise_name.into(),
            config: ExerciseConfig::default(),
            target_sets,
            target_reps,
        }
    }

    pub fn with_config(mut self, config: ExerciseConfig) -> Self {
        self.config = config;
        self
    }
}

/// One completed set, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub exercise_name: String,
    pub set_index: u32,
    pub reps: u32,
    pub config: ExerciseConfig,
    pub completed_at: DateTime<Local>,
}

/// Everything a renderer needs after one `update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub exercise_name: String,
    pub reps: u32,
    pub target_reps: u32,
    pub current_set: u32,
    pub target_sets: u32,
    pub stage: String,
    pub feedback_key: String,
    pub workout_state: WorkoutState,
    /// Form has been off for the last `stability_frames` analyzed frames
    pub form_alert: bool,
    /// Present only when a frame was analyzed this update
    pub analysis: Option<AnalysisResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub exercise_name: String,
    pub kind: CounterKind,
    pub target_sets: u32,
    pub target_reps: u32,
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub sets: Vec<SetRecord>,
    pub total_reps: u32,
}

pub struct WorkoutSession {
    id: Uuid,
    plan: WorkoutPlan,
    analyzer: Box<dyn ExerciseAnalyzer>,
    gestures: GestureHandler,
    form_window: usize,
    state: WorkoutState,
    current_set: u32,
    sets: Vec<SetRecord>,
    started_at: DateTime<Local>,
    ended_at: Option<DateTime<Local>>,
}

impl WorkoutSession {
    pub fn new(registry: &ExerciseRegistry, plan: WorkoutPlan, settings: &PipelineSettings) -> Result<Self> {
        if plan.target_sets == 0 || plan.target_reps == 0 {
            return Err(SpotterError::InvalidConfig(format!(
                "workout needs at least one set and one rep, got {} x {}",
                plan.target_sets, plan.target_reps
            )));
        }
        let analyzer = registry.create(&plan.exercise_name, &plan.config, settings)?;
        let id = Uuid::new_v4();

        info!(
            session = %id,
            exercise = analyzer.name(),
            sets = plan.target_sets,
            reps = plan.target_reps,
            "workout session created"
        );

        Ok(Self {
            id,
            plan,
            analyzer,
            gestures: GestureHandler::default(),
            form_window: settings.stability_frames,
            state: WorkoutState::Exercise,
            current_set: 1,
            sets: Vec::new(),
            started_at: Local::now(),
            ended_at: None,
        })
    }

    pub fn with_gestures(mut self, config: GestureConfig) -> Self {
        self.gestures = GestureHandler::new(config);
        self
    }

    /// Advance the session by one detector output. `None` means nobody was detected.
    pub fn update(&mut self, frame: Option<&PoseFrame>, timestamp: f64) -> SessionStatus {
        let mut reps = self.analyzer.reps();
        let mut stage = self.analyzer.stage();
        let mut feedback_key = String::new();
        let mut form_alert = false;
        let mut analysis = None;

        match (self.state, frame) {
            (WorkoutState::Exercise, Some(frame)) => {
                let result = self.analyzer.process_frame(frame, timestamp);
                reps = result.reps;
                stage = result.stage.clone();
                feedback_key = result.correction.clone();
                form_alert = self
                    .analyzer
                    .history()
                    .holds_for(self.form_window, |entry| !entry.is_valid);

                let hold_over = self.analyzer.kind() == CounterKind::Duration && self.analyzer.is_finished();
                if result.reps >= self.plan.target_reps || hold_over {
                    self.complete_set(result.reps);
                }
                analysis = Some(result);
            }
            (WorkoutState::Rest, frame) => {
                if let Some(action) = self.gestures.process(frame, true) {
                    self.handle_action(action);
                }
            }
            _ => {}
        }

        SessionStatus {
            exercise_name: self.analyzer.name().to_string(),
            reps,
            target_reps: self.plan.target_reps,
            current_set: self.current_set.min(self.plan.target_sets),
            target_sets: self.plan.target_sets,
            stage,
            feedback_key,
            workout_state: self.state,
            form_alert,
            analysis,
        }
    }

    fn complete_set(&mut self, reps: u32) {
        info!(set = self.current_set, reps, exercise = %self.plan.exercise_name, "set completed");

        self.sets.push(SetRecord {
            exercise_name: self.plan.exercise_name.clone(),
            set_index: self.current_set,
            reps,
            config: self.analyzer.config().clone(),
            completed_at: Local::now(),
        });

        if self.current_set >= self.plan.target_sets {
            self.state = WorkoutState::Finished;
            self.end();
        } else {
            self.state = WorkoutState::Rest;
            self.gestures.reset();
        }

        // thresholds survive, counts do not
        self.analyzer.reset();
    }

    /// Apply a user action. Anything not valid in the current state is ignored.
    pub fn handle_action(&mut self, action: SessionAction) {
        match (action, self.state) {
            (SessionAction::Continue, WorkoutState::Rest) => {
                self.current_set += 1;
                self.state = WorkoutState::Exercise;
                info!(set = self.current_set, "resuming workout");
            }
            (SessionAction::Continue, _) => {}
        }
    }

    /// Stamp the end time once; later calls keep the first value.
    pub fn end(&mut self) {
        if self.ended_at.is_none() {
            self.ended_at = Some(Local::now());
            info!(session = %self.id, sets = self.sets.len(), "workout session ended");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == WorkoutState::Finished
    }

    pub fn state(&self) -> WorkoutState {
        self.state
    }

    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn sets(&self) -> &[SetRecord] {
        &self.sets
    }

    pub fn analyzer(&self) -> &dyn ExerciseAnalyzer {
        self.analyzer.as_ref()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            exercise_name: self.plan.exercise_name.clone(),
            kind: self.analyzer.kind(),
            target_sets: self.plan.target_sets,
            target_reps: self.plan.target_reps,
            started_at: self.started_at,
            ended_at: self.ended_at,
            sets: self.sets.clone(),
            total_reps: self.sets.iter().map(|s| s.reps).sum(),
        }
    }
}
