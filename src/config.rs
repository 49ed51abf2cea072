// src/config.rs
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SpotterError};
use crate::keypoints::SideSelection;
use crate::smoothing::FilterParams;

pub const SQUAT_UP_ANGLE: f64 = 160.0; // Legs nearly straight (standing)
pub const SQUAT_DOWN_ANGLE: f64 = 90.0; // Thighs parallel

pub const CURL_UP_ANGLE: f64 = 30.0; // Full contraction
pub const CURL_DOWN_ANGLE: f64 = 160.0; // Arm extended

pub const PUSHUP_UP_ANGLE: f64 = 160.0;
pub const PUSHUP_DOWN_ANGLE: f64 = 90.0;
pub const PUSHUP_FORM_ANGLE_MIN: f64 = 160.0; // Shoulder-hip-ankle line

pub const PLANK_BODY_ANGLE_MIN: f64 = 160.0;
pub const PLANK_ELBOW_ANGLE_MIN: f64 = 70.0;
pub const PLANK_ELBOW_ANGLE_MAX: f64 = 110.0;
pub const PLANK_STABILITY_DURATION: f64 = 3.0;

pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Knobs shared by every analyzer in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub confidence_threshold: f64,
    pub hysteresis_tolerance: f64, // degrees, applied on both thresholds
    pub stability_frames: usize,
    pub history_capacity: usize, // ~1s at 30fps
    pub fusion_margin: f64,      // confidence gap before one side wins outright
    pub filter: FilterParams,
    pub require_explicit_thresholds: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            hysteresis_tolerance: 5.0,
            stability_frames: 2,
            history_capacity: 30,
            fusion_margin: 0.1,
            filter: FilterParams::responsive(),
            require_explicit_thresholds: false,
        }
    }
}

impl PipelineSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SpotterError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !self.hysteresis_tolerance.is_finite() || self.hysteresis_tolerance < 0.0 {
            return Err(SpotterError::InvalidConfig(format!(
                "hysteresis_tolerance must be a non-negative number, got {}",
                self.hysteresis_tolerance
            )));
        }
        if self.stability_frames == 0 {
            return Err(SpotterError::InvalidConfig(
                "stability_frames must be at least 1".into(),
            ));
        }
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(SpotterError::InvalidConfig(format!(
                "history_capacity must be within [1, {MAX_HISTORY_CAPACITY}], got {}",
                self.history_capacity
            )));
        }
        if self.stability_frames > self.history_capacity {
            return Err(SpotterError::InvalidConfig(format!(
                "stability_frames ({}) cannot exceed history_capacity ({})",
                self.stability_frames, self.history_capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.fusion_margin) {
            return Err(SpotterError::InvalidConfig(format!(
                "fusion_margin must be within [0, 1], got {}",
                self.fusion_margin
            )));
        }
        let f = &self.filter;
        if !(f.min_cutoff > 0.0 && f.d_cutoff > 0.0 && f.beta >= 0.0) {
            return Err(SpotterError::InvalidConfig(format!(
                "filter cutoffs must be positive and beta non-negative, got {f:?}"
            )));
        }
        Ok(())
    }
}

/// Flat per-exercise configuration; absent keys fall back to the exercise defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<SideSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_angle_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability_duration: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_rules: Vec<String>,
}

impl ExerciseConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_side(mut self, side: SideSelection) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_angles(mut self, up: f64, down: f64) -> Self {
        self.up_angle = Some(up);
        self.down_angle = Some(down);
        self
    }

    pub fn up_angle_or(&self, exercise: &str, default: f64, settings: &PipelineSettings) -> Result<f64> {
        resolve_angle(exercise, "up_angle", self.up_angle, default, settings)
    }

    pub fn down_angle_or(&self, exercise: &str, default: f64, settings: &PipelineSettings) -> Result<f64> {
        resolve_angle(exercise, "down_angle", self.down_angle, default, settings)
    }

    /// Form thresholds always have a default; strict mode only applies to the counting angles.
    pub fn form_angle_min_or(&self, exercise: &str, default: f64) -> Result<f64> {
        check_angle(exercise, "form_angle_min", self.form_angle_min.unwrap_or(default))
    }

    pub fn stability_duration_or(&self, exercise: &str, default: f64) -> Result<f64> {
        let duration = self.stability_duration.unwrap_or(default);
        if !duration.is_finite() || duration < 0.0 {
            return Err(SpotterError::InvalidThresholds {
                exercise: exercise.to_string(),
                reason: format!("stability_duration must be >= 0, got {duration}"),
            });
        }
        Ok(duration)
    }
}

/// Resolve an angle threshold from the config or the exercise default.
///
/// With `require_explicit_thresholds` set, a missing key is an error instead.
fn resolve_angle(
    exercise: &str,
    key: &'static str,
    value: Option<f64>,
    default: f64,
    settings: &PipelineSettings,
) -> Result<f64> {
    let angle = match value {
        Some(v) => v,
        None if settings.require_explicit_thresholds => {
            return Err(SpotterError::MissingThreshold {
                exercise: exercise.to_string(),
                key,
            })
        }
        None => default,
    };
    check_angle(exercise, key, angle)
}

fn check_angle(exercise: &str, key: &'static str, angle: f64) -> Result<f64> {
    if !angle.is_finite() || angle <= 0.0 || angle > 180.0 {
        return Err(SpotterError::InvalidThresholds {
            exercise: exercise.to_string(),
            reason: format!("{key} must be within (0, 180], got {angle}"),
        });
    }
    Ok(angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = PipelineSettings::default();
        assert_eq!(s.confidence_threshold, 0.5);
        assert_eq!(s.hysteresis_tolerance, 5.0);
        assert_eq!(s.stability_frames, 2);
        assert_eq!(s.history_capacity, 30);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let s: PipelineSettings = serde_json::from_str(r#"{"stability_frames": 4}"#).unwrap();
        assert_eq!(s.stability_frames, 4);
        assert_eq!(s.confidence_threshold, 0.5);
        assert_eq!(s.filter, FilterParams::responsive());
    }

    #[test]
    fn invalid_settings_rejected() {
        let s = PipelineSettings {
            stability_frames: 0,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(SpotterError::InvalidConfig(_))));
    }

    #[test]
    fn oversized_buffers_rejected() {
        let s: PipelineSettings =
            serde_json::from_str(r#"{"history_capacity": 18446744073709551615}"#).unwrap();
        assert!(matches!(s.validate(), Err(SpotterError::InvalidConfig(_))));

        let s = PipelineSettings {
            stability_frames: 31,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(SpotterError::InvalidConfig(_))));
    }

    #[test]
    fn nan_values_rejected() {
        let s = PipelineSettings {
            confidence_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        let mut s = PipelineSettings::default();
        s.filter.min_cutoff = f64::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn exercise_config_parses_flat_map() {
        let c: ExerciseConfig =
            serde_json::from_str(r#"{"side": "both", "up_angle": 150, "down_angle": 100}"#).unwrap();
        assert_eq!(c.side, Some(SideSelection::Both));
        assert_eq!(c.up_angle, Some(150.0));
        assert_eq!(c.stability_duration, None);
    }

    #[test]
    fn missing_angle_uses_default_unless_strict() {
        let c = ExerciseConfig::default();
        let lenient = PipelineSettings::default();
        assert_eq!(c.up_angle_or("squat", 160.0, &lenient).unwrap(), 160.0);

        let strict = PipelineSettings {
            require_explicit_thresholds: true,
            ..Default::default()
        };
        assert!(matches!(
            c.up_angle_or("squat", 160.0, &strict),
            Err(SpotterError::MissingThreshold { key: "up_angle", .. })
        ));
    }

    #[test]
    fn out_of_range_angle_rejected() {
        let c = ExerciseConfig::default().with_angles(200.0, 90.0);
        let s = PipelineSettings::default();
        assert!(matches!(
            c.up_angle_or("squat", 160.0, &s),
            Err(SpotterError::InvalidThresholds { .. })
        ));
    }
}
