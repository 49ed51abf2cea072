// src/data.rs
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::exercise::AnalysisResult;
use crate::session::SessionSummary;

#[derive(Debug, Serialize)]
struct FrameRecord<'a> {
    frame: usize,
    timestamp: f64,
    reps: u32,
    stage: &'a str,
    correction: &'a str,
    angle: f64,
    is_valid: bool,
}

/// `<Documents>/RepSpotter`, or `./output` when there is no documents folder.
pub fn default_output_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("RepSpotter")))
        .unwrap_or_else(|| PathBuf::from("./output"))
}

/// Collects per-frame results and writes them under `<output_dir>/<session_name>/`.
pub struct SessionExporter {
    output_dir: PathBuf,
    session_name: String,
    frames: Vec<(f64, AnalysisResult)>,
}

impl SessionExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            frames: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_frame(&mut self, timestamp: f64, result: &AnalysisResult) {
        self.frames.push((timestamp, result.clone()));
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("frames.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for (i, (timestamp, result)) in self.frames.iter().enumerate() {
            writer.serialize(FrameRecord {
                frame: i,
                timestamp: *timestamp,
                reps: result.reps,
                stage: &result.stage,
                correction: &result.correction,
                angle: result.angle,
                is_valid: result.is_valid,
            })?;
        }

        writer.flush()?;
        info!(path = %csv_path.display(), frames = self.frames.len(), "frame data exported");
        Ok(csv_path)
    }

    pub fn export_summary(&self, summary: &SessionSummary) -> Result<PathBuf> {
        let summary_path = self.session_dir().join("summary.json");
        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&summary_path)?;
        serde_json::to_writer_pretty(file, summary)?;
        info!(path = %summary_path.display(), "session summary exported");
        Ok(summary_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(reps: u32, stage: &str) -> AnalysisResult {
        AnalysisResult {
            reps,
            stage: stage.into(),
            correction: "squat_perfect_form".into(),
            angle: 120.5,
            is_valid: true,
        }
    }

    #[test]
    fn default_session_name_is_timestamped() {
        let exporter = SessionExporter::new("out", None);
        assert!(exporter.session_name().starts_with("session_"));
        assert_eq!(exporter.session_name().len(), "session_20240101_120000".len());
    }

    #[test]
    fn csv_has_header_and_one_row_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = SessionExporter::new(dir.path(), Some("test".into()));
        exporter.add_frame(0.0, &result(0, "start"));
        exporter.add_frame(0.033, &result(1, "squat_up"));

        let path = exporter.export_csv().unwrap();
        assert_eq!(path, dir.path().join("test").join("frames.csv"));

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "frame,timestamp,reps,stage,correction,angle,is_valid");
        assert!(lines[2].starts_with("1,0.033,1,squat_up,"));
    }
}
