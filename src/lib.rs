// src/lib.rs - Rep counting and form feedback from 2D pose keypoints
pub mod config;
pub mod data;
pub mod error;
pub mod exercise;
pub mod exercises;
pub mod feedback;
pub mod fsm;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod hold;
pub mod keypoints;
pub mod registry;
pub mod session;
pub mod smoothing;
pub mod synth;
pub mod tracking;

pub use config::{ExerciseConfig, PipelineSettings};
pub use error::{Result, SpotterError};
pub use exercise::{AnalysisResult, CounterKind, ExerciseAnalyzer};
pub use keypoints::{JointSample, Keypoint, PoseFrame, RawKeypoints, Side, SideSelection};
pub use registry::ExerciseRegistry;
pub use session::{SessionStatus, WorkoutPlan, WorkoutSession, WorkoutState};
