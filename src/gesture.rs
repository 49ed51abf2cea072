// src/gesture.rs - Hands-free control from pose keypoints
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::keypoints::{Keypoint, PoseFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// Either wrist clearly above its shoulder
    RaisedArm,
}

/// Actions a gesture can trigger in a workout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Continue,
}

impl Gesture {
    pub fn action(self) -> SessionAction {
        match self {
            Gesture::RaisedArm => SessionAction::Continue,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureConfig {
    pub stability_frames: usize,
    pub confidence_threshold: f64,
    /// Minimum shoulder-to-wrist rise in image units (pixels for detector output)
    pub raise_margin: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            stability_frames: 10,
            confidence_threshold: 0.6,
            raise_margin: 50.0,
        }
    }
}

/// Reports a gesture once it shows up in at least half of a full window of frames.
#[derive(Debug, Clone)]
pub struct GestureDetector {
    config: GestureConfig,
    window: VecDeque<Option<Gesture>>,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            window: VecDeque::new(),
        }
    }

    pub fn detect(&mut self, frame: &PoseFrame) -> Option<Gesture> {
        let seen = self.raised_arm(frame).then_some(Gesture::RaisedArm);
        if self.window.len() == self.config.stability_frames.max(1) {
            self.window.pop_front();
        }
        self.window.push_back(seen);
        self.stable()
    }

    fn raised_arm(&self, frame: &PoseFrame) -> bool {
        let arms = [
            (Keypoint::RightWrist, Keypoint::RightShoulder),
            (Keypoint::LeftWrist, Keypoint::LeftShoulder),
        ];
        arms.iter().any(|&(wrist, shoulder)| {
            let w = frame.get(wrist);
            let s = frame.get(shoulder);
            // image y grows downward
            w.confidence > self.config.confidence_threshold
                && s.confidence > self.config.confidence_threshold
                && s.y - w.y > self.config.raise_margin
        })
    }

    fn stable(&self) -> Option<Gesture> {
        let n = self.config.stability_frames.max(1);
        if self.window.len() < n {
            return None;
        }
        let hits = self
            .window
            .iter()
            .filter(|g| **g == Some(Gesture::RaisedArm))
            .count();
        (hits as f64 >= n as f64 * 0.5).then_some(Gesture::RaisedArm)
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

/// Maps stable gestures to session actions, honouring them only while resting.
#[derive(Debug, Clone, Default)]
pub struct GestureHandler {
    detector: GestureDetector,
}

impl GestureHandler {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            detector: GestureDetector::new(config),
        }
    }

    pub fn process(&mut self, frame: Option<&PoseFrame>, resting: bool) -> Option<SessionAction> {
        let gesture = self.detector.detect(frame?)?;
        debug!(?gesture, resting, "gesture detected");
        match gesture.action() {
            SessionAction::Continue if resting => {
                info!("continue triggered by gesture");
                Some(SessionAction::Continue)
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.detector.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm_up(up: bool) -> PoseFrame {
        let wrist_y = if up { 100.0 } else { 400.0 };
        PoseFrame::empty()
            .with(Keypoint::RightShoulder, 300.0, 250.0, 0.9)
            .with(Keypoint::RightWrist, 310.0, wrist_y, 0.9)
    }

    #[test]
    fn needs_a_full_window() {
        let mut d = GestureDetector::default();
        for _ in 0..9 {
            assert_eq!(d.detect(&arm_up(true)), None);
        }
        assert_eq!(d.detect(&arm_up(true)), Some(Gesture::RaisedArm));
    }

    #[test]
    fn half_the_window_is_enough() {
        let mut d = GestureDetector::default();
        for i in 0..10 {
            d.detect(&arm_up(i % 2 == 0));
        }
        assert_eq!(d.stable(), Some(Gesture::RaisedArm));

        let mut d = GestureDetector::default();
        for i in 0..10 {
            d.detect(&arm_up(i < 4));
        }
        assert_eq!(d.stable(), None);
    }

    #[test]
    fn low_confidence_or_small_rise_is_ignored() {
        let d = GestureDetector::default();
        let shy = PoseFrame::empty()
            .with(Keypoint::LeftShoulder, 300.0, 250.0, 0.9)
            .with(Keypoint::LeftWrist, 300.0, 220.0, 0.9);
        assert!(!d.raised_arm(&shy));

        let faint = PoseFrame::empty()
            .with(Keypoint::LeftShoulder, 300.0, 250.0, 0.6)
            .with(Keypoint::LeftWrist, 300.0, 50.0, 0.9);
        assert!(!d.raised_arm(&faint));
    }

    #[test]
    fn handler_only_continues_while_resting() {
        let mut h = GestureHandler::default();
        for _ in 0..10 {
            assert_eq!(h.process(Some(&arm_up(true)), false), None);
        }
        assert_eq!(h.process(Some(&arm_up(true)), true), Some(SessionAction::Continue));
        assert_eq!(h.process(None, true), None);
    }
}
