// src/fsm.rs - Debounced repetition counter
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::error::{Result, SpotterError};

/// Minimum length of the rolling angle buffer, regardless of the debounce window.
const MIN_BUFFER_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepPhase {
    Start,
    Up,
    Down,
    Unknown,
}

impl RepPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RepPhase::Start => "start",
            RepPhase::Up => "up",
            RepPhase::Down => "down",
            RepPhase::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterConfig {
    pub up_threshold: f64,
    pub down_threshold: f64,
    pub hysteresis: f64,
    pub stability_frames: usize,
    /// Up = small angle, down = large angle (curls)
    pub inverted: bool,
    pub state_prefix: String,
}

impl CounterConfig {
    pub fn new(up_threshold: f64, down_threshold: f64) -> Self {
        Self {
            up_threshold,
            down_threshold,
            hysteresis: 5.0,
            stability_frames: 2,
            inverted: false,
            state_prefix: String::new(),
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.state_prefix = prefix.into();
        self
    }

    pub fn with_debounce(mut self, hysteresis: f64, stability_frames: usize) -> Self {
        self.hysteresis = hysteresis;
        self.stability_frames = stability_frames;
        self
    }

    // Standard: bottom of the movement is a small angle. Inverted: a large one.
    fn in_down_zone(&self, angle: f64) -> bool {
        if self.inverted {
            angle > self.down_threshold - self.hysteresis
        } else {
            angle < self.down_threshold + self.hysteresis
        }
    }

    fn in_up_zone(&self, angle: f64) -> bool {
        if self.inverted {
            angle < self.up_threshold + self.hysteresis
        } else {
            angle > self.up_threshold - self.hysteresis
        }
    }

    fn validate(&self) -> Result<()> {
        let name = if self.state_prefix.is_empty() {
            "counter".to_string()
        } else {
            self.state_prefix.clone()
        };
        let invalid = |reason: String| SpotterError::InvalidThresholds {
            exercise: name.clone(),
            reason,
        };

        if self.stability_frames == 0 {
            return Err(invalid("stability_frames must be at least 1".into()));
        }
        if !self.up_threshold.is_finite() || !self.down_threshold.is_finite() {
            return Err(invalid("thresholds must be finite".into()));
        }
        if self.inverted && self.down_threshold <= self.up_threshold {
            return Err(invalid(format!(
                "inverted counter needs down_angle ({}) > up_angle ({})",
                self.down_threshold, self.up_threshold
            )));
        }
        if !self.inverted && self.up_threshold <= self.down_threshold {
            return Err(invalid(format!(
                "counter needs up_angle ({}) > down_angle ({})",
                self.up_threshold, self.down_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct CounterState {
    phase: RepPhase,
    reps: u32,
    history: VecDeque<f64>,
}

/// Counts DOWN -> UP cycles of a joint angle.
///
/// A transition only commits once its condition has held for the last
/// `stability_frames` samples, so a single outlier frame cannot toggle the
/// phase or add a rep. State sits behind a mutex so `process` can be shared.
#[derive(Debug)]
pub struct RepetitionCounter {
    config: CounterConfig,
    buffer_len: usize,
    state: Mutex<CounterState>,
}

impl RepetitionCounter {
    pub fn new(config: CounterConfig) -> Result<Self> {
        config.validate()?;
        let buffer_len = config.stability_frames.max(MIN_BUFFER_LEN);
        Ok(Self {
            config,
            buffer_len,
            state: Mutex::new(CounterState {
                phase: RepPhase::Start,
                reps: 0,
                history: VecDeque::new(),
            }),
        })
    }

    /// Feed one angle sample, returning `(reps, stage)`.
    pub fn process(&self, angle: f64) -> (u32, String) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.history.len() == self.buffer_len {
            state.history.pop_front();
        }
        state.history.push_back(angle);

        let cfg = &self.config;
        if cfg.in_down_zone(angle) {
            if self.is_stable(&state.history, |a| cfg.in_down_zone(a)) {
                state.phase = RepPhase::Down;
            }
        } else if cfg.in_up_zone(angle) && self.is_stable(&state.history, |a| cfg.in_up_zone(a)) {
            match state.phase {
                RepPhase::Down => {
                    state.reps += 1;
                    state.phase = RepPhase::Up;
                }
                RepPhase::Start => state.phase = RepPhase::Up,
                RepPhase::Up | RepPhase::Unknown => {}
            }
        }

        (state.reps, self.prefixed(state.phase))
    }

    fn is_stable(&self, history: &VecDeque<f64>, predicate: impl Fn(f64) -> bool) -> bool {
        let n = self.config.stability_frames;
        history.len() >= n && history.iter().rev().take(n).all(|&a| predicate(a))
    }

    fn prefixed(&self, phase: RepPhase) -> String {
        match phase {
            RepPhase::Start | RepPhase::Unknown => phase.as_str().to_string(),
            _ if self.config.state_prefix.is_empty() => phase.as_str().to_string(),
            _ => format!("{}_{}", self.config.state_prefix, phase.as_str()),
        }
    }

    pub fn reps(&self) -> u32 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).reps
    }

    pub fn phase(&self) -> RepPhase {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).phase
    }

    pub fn stage(&self) -> String {
        self.prefixed(self.phase())
    }

    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.reps = 0;
        state.phase = RepPhase::Start;
        state.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn feed(counter: &RepetitionCounter, angle: f64, frames: usize) -> (u32, String) {
        let mut last = (0, String::new());
        for _ in 0..frames {
            last = counter.process(angle);
        }
        last
    }

    fn squat_counter() -> RepetitionCounter {
        RepetitionCounter::new(CounterConfig::new(160.0, 90.0).with_prefix("squat")).unwrap()
    }

    #[test]
    fn standard_cycle_counts_one_rep() {
        let c = squat_counter();
        assert_eq!(feed(&c, 170.0, 3), (0, "squat_up".to_string()));
        assert_eq!(feed(&c, 80.0, 3), (0, "squat_down".to_string()));
        assert_eq!(feed(&c, 170.0, 3), (1, "squat_up".to_string()));
        assert_eq!(c.phase(), RepPhase::Up);
    }

    #[test]
    fn start_to_up_does_not_count() {
        let c = squat_counter();
        feed(&c, 175.0, 10);
        assert_eq!(c.reps(), 0);
        assert_eq!(c.phase(), RepPhase::Up);
    }

    #[test]
    fn single_frame_spike_is_ignored() {
        let c = squat_counter();
        feed(&c, 170.0, 5);
        let (reps, stage) = c.process(0.0);
        assert_eq!((reps, stage.as_str()), (0, "squat_up"));
        let (reps, stage) = feed(&c, 170.0, 5);
        assert_eq!((reps, stage.as_str()), (0, "squat_up"));
        assert_eq!(c.phase(), RepPhase::Up);
    }

    #[test]
    fn first_sample_alone_is_not_stable() {
        let c = squat_counter();
        assert_eq!(c.process(60.0), (0, "start".to_string()));
        assert_eq!(c.process(60.0), (0, "squat_down".to_string()));
    }

    #[test]
    fn hysteresis_widens_thresholds() {
        // 93 is above the raw down threshold but inside the 5 degree band
        let c = squat_counter();
        feed(&c, 93.0, 2);
        assert_eq!(c.phase(), RepPhase::Down);
        feed(&c, 157.0, 2);
        assert_eq!(c.reps(), 1);
    }

    #[test]
    fn inverted_cycle_counts_on_flexion() {
        let c = RepetitionCounter::new(CounterConfig::new(30.0, 160.0).inverted().with_prefix("curl"))
            .unwrap();
        assert_eq!(feed(&c, 170.0, 3).1, "curl_down");
        assert_eq!(feed(&c, 20.0, 3), (1, "curl_up".to_string()));
        assert_eq!(feed(&c, 170.0, 3), (1, "curl_down".to_string()));
        assert_eq!(c.phase(), RepPhase::Down);
    }

    #[test]
    fn no_prefix_uses_plain_phase_names() {
        let c = RepetitionCounter::new(CounterConfig::new(160.0, 90.0)).unwrap();
        assert_eq!(feed(&c, 170.0, 2).1, "up");
    }

    #[test]
    fn reset_restores_start() {
        let c = squat_counter();
        feed(&c, 170.0, 3);
        feed(&c, 80.0, 3);
        feed(&c, 170.0, 3);
        c.reset();
        assert_eq!(c.reps(), 0);
        assert_eq!(c.stage(), "start");
        // buffer was cleared: one sample is not enough to transition again
        assert_eq!(c.process(80.0).1, "start");
    }

    #[test]
    fn inconsistent_thresholds_rejected() {
        assert!(RepetitionCounter::new(CounterConfig::new(90.0, 160.0)).is_err());
        assert!(RepetitionCounter::new(CounterConfig::new(160.0, 30.0).inverted()).is_err());
        assert!(RepetitionCounter::new(CounterConfig::new(160.0, 90.0).with_debounce(5.0, 0)).is_err());
    }

    #[test]
    fn concurrent_callers_are_serialized() {
        let c = Arc::new(squat_counter());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    for _ in 0..50 {
                        c.process(170.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.reps(), 0);
        assert_eq!(c.phase(), RepPhase::Up);
    }
}
