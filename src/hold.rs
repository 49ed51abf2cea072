// src/hold.rs - Static hold timer (planks and friends)
//
// Unlike the repetition counter, losing form while ACTIVE ends the hold on the
// very first invalid frame. Breaking form is the event being measured here.
use crate::error::{Result, SpotterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Waiting,
    Countdown,
    Active,
    Finished,
}

impl HoldPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            HoldPhase::Waiting => "waiting",
            HoldPhase::Countdown => "countdown",
            HoldPhase::Active => "active",
            HoldPhase::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldStatus {
    pub phase: HoldPhase,
    /// Seconds spent in ACTIVE, frozen once the hold finishes
    pub elapsed: f64,
    /// Set only on the frame that moved WAITING -> COUNTDOWN
    pub countdown_started: bool,
}

impl HoldStatus {
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed.max(0.0) as u32
    }
}

#[derive(Debug, Clone)]
pub struct HoldTimer {
    stability_duration: f64,
    phase: HoldPhase,
    countdown_start: Option<f64>,
    active_start: Option<f64>,
    elapsed: f64,
    remaining: f64,
}

impl HoldTimer {
    pub fn new(stability_duration: f64) -> Result<Self> {
        if !stability_duration.is_finite() || stability_duration < 0.0 {
            return Err(SpotterError::InvalidThresholds {
                exercise: "hold".to_string(),
                reason: format!("stability_duration must be >= 0, got {stability_duration}"),
            });
        }
        Ok(Self {
            stability_duration,
            phase: HoldPhase::Waiting,
            countdown_start: None,
            active_start: None,
            elapsed: 0.0,
            remaining: stability_duration,
        })
    }

    pub fn process(&mut self, valid: bool, timestamp: f64) -> HoldStatus {
        let mut countdown_started = false;

        match self.phase {
            HoldPhase::Waiting => {
                if valid {
                    self.phase = HoldPhase::Countdown;
                    self.countdown_start = Some(timestamp);
                    self.remaining = self.stability_duration;
                    countdown_started = true;
                }
            }
            HoldPhase::Countdown => match (valid, self.countdown_start) {
                (true, Some(start)) => {
                    let held = timestamp - start;
                    if held >= self.stability_duration {
                        self.phase = HoldPhase::Active;
                        self.active_start = Some(timestamp);
                        self.elapsed = 0.0;
                        self.remaining = 0.0;
                    } else {
                        self.remaining = self.stability_duration - held;
                    }
                }
                _ => {
                    // countdown never carries over a break in form
                    self.phase = HoldPhase::Waiting;
                    self.countdown_start = None;
                    self.remaining = self.stability_duration;
                }
            },
            HoldPhase::Active => match (valid, self.active_start) {
                (true, Some(start)) => self.elapsed = timestamp - start,
                _ => self.phase = HoldPhase::Finished,
            },
            HoldPhase::Finished => {}
        }

        HoldStatus {
            phase: self.phase,
            elapsed: self.elapsed,
            countdown_started,
        }
    }

    /// Whole seconds left before the hold starts counting, while in COUNTDOWN.
    pub fn countdown_remaining(&self) -> Option<u32> {
        (self.phase == HoldPhase::Countdown).then(|| self.remaining.max(0.0) as u32 + 1)
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed.max(0.0) as u32
    }

    pub fn reset(&mut self) {
        self.phase = HoldPhase::Waiting;
        self.countdown_start = None;
        self.active_start = None;
        self.elapsed = 0.0;
        self.remaining = self.stability_duration;
    }
}
