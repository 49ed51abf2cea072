// src/smoothing.rs - One Euro filter for keypoint jitter
//
// Smooth when the joint is nearly still, responsive when it moves fast.
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Cutoff (Hz) when the signal is static; lower = smoother at rest
    pub min_cutoff: f64,
    /// How fast the cutoff grows with speed; higher = less lag in motion
    pub beta: f64,
    /// Cutoff (Hz) for the derivative estimate
    pub d_cutoff: f64,
}

impl FilterParams {
    pub const fn new(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
        }
    }

    /// Preset used by the exercise analyzers: heavy smoothing at rest,
    /// opening up quickly once a limb starts travelling.
    pub const fn responsive() -> Self {
        Self::new(0.1, 0.05, 1.0)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new(1.0, 0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct FilterState {
    x_prev: f64,
    dx_prev: f64,
    t_prev: f64,
}

#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: FilterParams,
    state: Option<FilterState>,
}

impl OneEuroFilter {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    fn smoothing_factor(dt: f64, cutoff: f64) -> f64 {
        let r = 2.0 * PI * cutoff * dt;
        r / (r + 1.0)
    }

    /// Filter sample `x` taken at time `t` (seconds).
    pub fn filter(&mut self, x: f64, t: f64) -> f64 {
        let Some(state) = self.state else {
            self.state = Some(FilterState {
                x_prev: x,
                dx_prev: 0.0,
                t_prev: t,
            });
            return x;
        };

        let dt = t - state.t_prev;
        if dt <= 0.0 {
            return state.x_prev;
        }

        let a_d = Self::smoothing_factor(dt, self.params.d_cutoff);
        let dx = (x - state.x_prev) / dt;
        let dx_hat = a_d * dx + (1.0 - a_d) * state.dx_prev;

        let cutoff = self.params.min_cutoff + self.params.beta * dx_hat.abs();
        let a = Self::smoothing_factor(dt, cutoff);
        let x_hat = a * x + (1.0 - a) * state.x_prev;

        self.state = Some(FilterState {
            x_prev: x_hat,
            dx_prev: dx_hat,
            t_prev: t,
        });
        x_hat
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

impl Default for OneEuroFilter {
    fn default() -> Self {
        Self::new(FilterParams::default())
    }
}

/// Two independent One Euro filters, one per axis.
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    x: OneEuroFilter,
    y: OneEuroFilter,
}

impl PointFilter {
    pub fn new(params: FilterParams) -> Self {
        Self {
            x: OneEuroFilter::new(params),
            y: OneEuroFilter::new(params),
        }
    }

    pub fn filter(&mut self, point: Vector2<f64>, t: f64) -> Vector2<f64> {
        Vector2::new(self.x.filter(point.x, t), self.y.filter(point.y, t))
    }

    pub fn is_initialized(&self) -> bool {
        self.x.is_initialized() && self.y.is_initialized()
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_passes_through() {
        let mut f = OneEuroFilter::default();
        assert_eq!(f.filter(42.0, 0.0), 42.0);
        assert!(f.is_initialized());
    }

    #[test]
    fn non_increasing_timestamp_returns_previous() {
        let mut f = OneEuroFilter::default();
        f.filter(10.0, 1.0);
        let smoothed = f.filter(20.0, 1.1);
        assert_eq!(f.filter(500.0, 1.1), smoothed);
        assert_eq!(f.filter(-500.0, 0.5), smoothed);
    }

    #[test]
    fn output_lags_behind_step() {
        let mut f = OneEuroFilter::new(FilterParams::new(1.0, 0.0, 1.0));
        f.filter(0.0, 0.0);
        let y = f.filter(100.0, 1.0 / 30.0);
        assert!(y > 0.0 && y < 100.0);
    }

    #[test]
    fn beta_reduces_lag() {
        let mut slow = OneEuroFilter::new(FilterParams::new(1.0, 0.0, 1.0));
        let mut fast = OneEuroFilter::new(FilterParams::new(1.0, 0.5, 1.0));
        slow.filter(0.0, 0.0);
        fast.filter(0.0, 0.0);
        let dt = 1.0 / 30.0;
        let mut s = 0.0;
        let mut q = 0.0;
        for i in 1..=5 {
            s = slow.filter(100.0, dt * i as f64);
            q = fast.filter(100.0, dt * i as f64);
        }
        assert!(q > s);
    }

    #[test]
    fn converges_on_constant_signal() {
        let mut f = OneEuroFilter::new(FilterParams::responsive());
        f.filter(0.0, 0.0);
        let mut y = 0.0;
        for i in 1..=300 {
            y = f.filter(50.0, i as f64 / 30.0);
        }
        assert!((y - 50.0).abs() < 1.0);
    }

    #[test]
    fn reset_makes_next_sample_first() {
        let mut f = PointFilter::new(FilterParams::responsive());
        f.filter(Vector2::new(0.0, 0.0), 0.0);
        f.filter(Vector2::new(10.0, 10.0), 0.1);
        f.reset();
        assert!(!f.is_initialized());
        let out = f.filter(Vector2::new(300.0, -20.0), 0.2);
        assert_eq!(out, Vector2::new(300.0, -20.0));
    }
}
