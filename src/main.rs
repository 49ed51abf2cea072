// src/main.rs - Replay a recorded keypoint stream through a workout session
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rep_spotter::data::{default_output_dir, SessionExporter};
use rep_spotter::gesture::{GestureConfig, SessionAction};
use rep_spotter::{
    ExerciseConfig, ExerciseRegistry, PipelineSettings, RawKeypoints, WorkoutPlan, WorkoutSession,
    WorkoutState,
};

#[derive(Parser)]
#[command(
    name = "rep_spotter",
    about = "Count reps and check form from recorded pose keypoints",
    long_about = "Replays a JSONL keypoint recording (one detector frame per line) through the \
                  exercise analyzer and writes per-frame results plus a session summary"
)]
struct Args {
    /// Exercise to analyze (see --list)
    #[arg(long, short = 'e', default_value = "squat")]
    exercise: String,

    /// JSONL recording: {"timestamp": f64, "keypoints": [[x, y, conf] x17] | {"left_knee": [x, y, conf], ..} | null}
    #[arg(long, short = 'f')]
    frames: Option<PathBuf>,

    /// Exercise configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pipeline settings (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    sets: u32,

    /// Reps per set, or seconds for hold exercises
    #[arg(long, default_value_t = 10)]
    reps: u32,

    /// Output directory [default: <Documents>/RepSpotter]
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Start the next set right away instead of waiting for a raised arm
    #[arg(long)]
    auto_continue: bool,

    /// Frames in the raised-arm gesture window
    #[arg(long, default_value_t = 10)]
    gesture_frames: usize,

    /// List registered exercises and exit
    #[arg(long)]
    list: bool,
}

#[derive(Deserialize)]
struct FrameLine {
    timestamp: f64,
    keypoints: Option<RawKeypoints>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let registry = ExerciseRegistry::with_defaults();

    if args.list {
        for name in registry.available() {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(frames_path) = args.frames.as_ref() else {
        bail!("--frames is required unless --list is given");
    };

    let settings = match &args.settings {
        Some(path) => PipelineSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => PipelineSettings::default(),
    };
    let config = match &args.config {
        Some(path) => ExerciseConfig::load(path)
            .with_context(|| format!("loading exercise config from {}", path.display()))?,
        None => ExerciseConfig::default(),
    };

    let plan = WorkoutPlan::new(&args.exercise, args.sets, args.reps).with_config(config);
    let gestures = GestureConfig {
        stability_frames: args.gesture_frames,
        ..Default::default()
    };
    let mut session = WorkoutSession::new(&registry, plan, &settings)?.with_gestures(gestures);
    let output_dir = args.output.clone().unwrap_or_else(default_output_dir);
    let mut exporter = SessionExporter::new(&output_dir, None);

    let file = File::open(frames_path)
        .with_context(|| format!("opening recording {}", frames_path.display()))?;
    let mut last_reps = 0;
    let mut last_alert: Option<String> = None;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: FrameLine = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping malformed line");
                continue;
            }
        };
        let frame = match record.keypoints.as_ref().map(RawKeypoints::to_frame).transpose() {
            Ok(f) => f,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping frame");
                continue;
            }
        };

        let status = session.update(frame.as_ref(), record.timestamp);
        if let Some(result) = &status.analysis {
            exporter.add_frame(record.timestamp, result);
            if result.reps != last_reps {
                println!(
                    "[set {}/{}] {} {} ({})",
                    status.current_set, status.target_sets, status.exercise_name, result.reps, result.correction
                );
                last_reps = result.reps;
            }
        }
        if status.form_alert {
            if last_alert.as_deref() != Some(status.feedback_key.as_str()) {
                println!("  form: {}", status.feedback_key);
                last_alert = Some(status.feedback_key.clone());
            }
        } else {
            last_alert = None;
        }

        match status.workout_state {
            WorkoutState::Rest if args.auto_continue => {
                session.handle_action(SessionAction::Continue);
                last_reps = 0;
            }
            WorkoutState::Rest => last_reps = 0,
            WorkoutState::Finished => break,
            WorkoutState::Exercise => {}
        }
    }

    session.end();
    let summary = session.summary();

    let csv_path = exporter.export_csv().context("writing frame data")?;
    let summary_path = exporter.export_summary(&summary).context("writing summary")?;
    info!(
        session = exporter.session_name(),
        frames = exporter.frame_count(),
        csv = %csv_path.display(),
        summary = %summary_path.display(),
        "export complete"
    );

    println!(
        "{}: {} of {} sets, {} total",
        summary.exercise_name,
        summary.sets.len(),
        summary.target_sets,
        summary.total_reps
    );
    for set in &summary.sets {
        println!("  set {}: {}", set.set_index, set.reps);
    }

    Ok(())
}
