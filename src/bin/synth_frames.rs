// Writes a synthetic keypoint recording that rep_spotter can replay.
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rep_spotter::synth;
use rep_spotter::PoseFrame;

#[derive(Parser)]
#[command(name = "synth_frames", about = "Generate a synthetic JSONL pose recording")]
struct Args {
    /// squat, curl, pushup or plank
    #[arg(long, short = 'e', default_value = "squat")]
    exercise: String,

    /// Reps per set, or seconds to hold for plank
    #[arg(long, default_value_t = 5)]
    reps: u32,

    #[arg(long, default_value_t = 1)]
    sets: u32,

    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Peak positional wobble in pixels
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Output file (stdout when omitted)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct FrameLine {
    timestamp: f64,
    keypoints: Option<Vec<[f64; 3]>>,
}

struct Recorder<W: Write> {
    out: W,
    fps: f64,
    jitter: f64,
    frame: usize,
}

impl<W: Write> Recorder<W> {
    fn emit(&mut self, pose: Option<&PoseFrame>) -> Result<()> {
        let t = self.frame as f64 / self.fps;
        let wobble = self.jitter * (t * 7.3).sin();
        let keypoints = pose.map(|p| {
            p.joints()
                .iter()
                .map(|j| [j.x + wobble, j.y - wobble, j.confidence])
                .collect()
        });
        serde_json::to_writer(&mut self.out, &FrameLine { timestamp: t, keypoints })?;
        self.out.write_all(b"\n")?;
        self.frame += 1;
        Ok(())
    }

    fn hold(&mut self, pose: &PoseFrame, frames: usize) -> Result<()> {
        for _ in 0..frames {
            self.emit(Some(pose))?;
        }
        Ok(())
    }

    fn sweep(&mut self, from: f64, to: f64, frames: usize, pose: impl Fn(f64) -> PoseFrame) -> Result<()> {
        for angle in synth::ramp(from, to, frames) {
            self.emit(Some(&pose(angle)))?;
        }
        Ok(())
    }

    fn cyclic_set(&mut self, reps: u32, top: f64, bottom: f64, pose: impl Fn(f64) -> PoseFrame) -> Result<()> {
        for _ in 0..reps {
            self.hold(&pose(top), 10)?;
            self.sweep(top, bottom, 8, &pose)?;
            self.hold(&pose(bottom), 6)?;
            self.sweep(bottom, top, 8, &pose)?;
        }
        self.hold(&pose(top), 10)
    }

    fn plank_set(&mut self, seconds: u32) -> Result<()> {
        // countdown, the hold itself, then a hip sag that ends it
        let frames = ((3.0 + f64::from(seconds) + 0.5) * self.fps).ceil() as usize;
        self.hold(&synth::prone(90.0, 175.0, 0.9), frames)?;
        self.sweep(175.0, 130.0, 10, |body| synth::prone(90.0, body, 0.9))
    }

    fn rest(&mut self) -> Result<()> {
        let gap = self.fps as usize / 2;
        for _ in 0..gap {
            self.emit(None)?;
        }
        self.hold(&synth::raised_arm(0.9), 15)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.fps <= 0.0 {
        bail!("--fps must be positive");
    }

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut rec = Recorder {
        out: BufWriter::new(out),
        fps: args.fps,
        jitter: args.jitter,
        frame: 0,
    };

    for set in 0..args.sets {
        if set > 0 {
            rec.rest()?;
        }
        match args.exercise.to_lowercase().as_str() {
            "squat" => rec.cyclic_set(args.reps, 170.0, 75.0, |a| synth::squat(a, 0.9))?,
            "curl" | "bicep curl" => rec.cyclic_set(args.reps, 165.0, 25.0, |a| synth::curl(a, 0.9))?,
            "pushup" | "push up" => {
                rec.cyclic_set(args.reps, 170.0, 80.0, |a| synth::prone(a, 175.0, 0.9))?
            }
            "plank" => rec.plank_set(args.reps)?,
            other => bail!("no generator for exercise '{other}'"),
        }
    }

    rec.out.flush()?;
    info!(frames = rec.frame, exercise = %args.exercise, "recording written");
    Ok(())
}
