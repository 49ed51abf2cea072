// src/tracking.rs - Per-joint smoothing, confidence gating and side fusion
use nalgebra::Vector2;
use std::collections::HashMap;
use tracing::trace;

use crate::geometry::calculate_angle;
use crate::keypoints::{BilateralTriple, Keypoint, PoseFrame, Side, SideSelection};
use crate::smoothing::{FilterParams, PointFilter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedJoint {
    pub position: Vector2<f64>,
    /// Raw detector confidence; smoothing never touches it
    pub confidence: f64,
}

/// Smoothed positions for the joints a tracker follows.
#[derive(Debug, Clone, Default)]
pub struct SmoothedPose {
    joints: HashMap<Keypoint, SmoothedJoint>,
}

impl SmoothedPose {
    pub fn get(&self, keypoint: Keypoint) -> Option<&SmoothedJoint> {
        self.joints.get(&keypoint)
    }

    pub fn position(&self, keypoint: Keypoint) -> Option<Vector2<f64>> {
        self.get(keypoint).map(|j| j.position)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Angles measured on one side of the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideReading {
    pub side: Side,
    pub primary: f64,
    pub secondary: Option<f64>,
    /// Mean raw confidence over every joint the side needed
    pub confidence: f64,
}

/// Result of merging the per-side readings into one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedReading {
    pub primary: f64,
    pub secondary: Option<f64>,
    /// `None` when both sides were averaged
    pub side: Option<Side>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FusionPolicy {
    /// Every requested side must be visible; angles are averaged.
    AllSides,
    /// Use whatever is visible. With two sides, the clearly more confident
    /// one wins outright, otherwise the two are averaged.
    ConfidenceWeighted { margin: f64 },
}

impl FusionPolicy {
    pub fn fuse(self, requested: usize, readings: &[SideReading]) -> Option<FusedReading> {
        match (self, readings) {
            (_, []) => None,
            (FusionPolicy::AllSides, r) if r.len() < requested => None,
            (_, [only]) => Some(FusedReading {
                primary: only.primary,
                secondary: only.secondary,
                side: Some(only.side),
            }),
            (FusionPolicy::ConfidenceWeighted { margin }, [a, b])
                if (a.confidence - b.confidence).abs() > margin =>
            {
                let winner = if a.confidence > b.confidence { a } else { b };
                trace!(side = winner.side.as_str(), "confidence winner");
                Some(FusedReading {
                    primary: winner.primary,
                    secondary: winner.secondary,
                    side: Some(winner.side),
                })
            }
            (_, r) => Some(average(r)),
        }
    }
}

fn average(readings: &[SideReading]) -> FusedReading {
    let n = readings.len() as f64;
    let primary = readings.iter().map(|r| r.primary).sum::<f64>() / n;
    let secondaries: Option<Vec<f64>> = readings.iter().map(|r| r.secondary).collect();
    FusedReading {
        primary,
        secondary: secondaries.map(|s| s.iter().sum::<f64>() / n),
        side: None,
    }
}

/// Smooths the joints of one or two angle triples and turns a pose into a
/// single fused angle reading.
#[derive(Debug, Clone)]
pub struct JointTracker {
    primary: BilateralTriple,
    secondary: Option<BilateralTriple>,
    sides: SideSelection,
    policy: FusionPolicy,
    confidence_threshold: f64,
    params: FilterParams,
    filters: HashMap<Keypoint, PointFilter>,
}

impl JointTracker {
    pub fn new(
        primary: BilateralTriple,
        secondary: Option<BilateralTriple>,
        sides: SideSelection,
        policy: FusionPolicy,
        confidence_threshold: f64,
        params: FilterParams,
    ) -> Self {
        Self {
            primary,
            secondary,
            sides,
            policy,
            confidence_threshold,
            params,
            filters: HashMap::new(),
        }
    }

    fn tracked(&self) -> impl Iterator<Item = Keypoint> + '_ {
        self.primary
            .keypoints()
            .chain(self.secondary.iter().flat_map(|t| t.keypoints()))
    }

    /// Run every tracked joint through its filter, creating filters lazily.
    pub fn smooth(&mut self, frame: &PoseFrame, timestamp: f64) -> SmoothedPose {
        let keypoints: Vec<Keypoint> = self.tracked().collect();
        let mut joints = HashMap::with_capacity(keypoints.len());

        for kp in keypoints {
            let sample = frame.get(kp);
            let filter = self
                .filters
                .entry(kp)
                .or_insert_with(|| PointFilter::new(self.params));
            joints.insert(
                kp,
                SmoothedJoint {
                    position: filter.filter(sample.position(), timestamp),
                    confidence: sample.confidence,
                },
            );
        }

        SmoothedPose { joints }
    }

    /// Measure one side, or `None` when any joint it needs is below the
    /// confidence threshold. Gating uses the raw frame.
    pub fn read_side(&self, raw: &PoseFrame, smoothed: &SmoothedPose, side: Side) -> Option<SideReading> {
        let primary = self.primary.for_side(side);
        let secondary = self.secondary.map(|t| t.for_side(side));

        let mut needed: Vec<Keypoint> = primary.to_vec();
        if let Some(s) = secondary {
            for kp in s {
                if !needed.contains(&kp) {
                    needed.push(kp);
                }
            }
        }

        let confidences: Vec<f64> = needed.iter().map(|&kp| raw.get(kp).confidence).collect();
        if confidences.iter().any(|&c| c < self.confidence_threshold) {
            return None;
        }

        let angle = |[a, b, c]: [Keypoint; 3]| -> Option<f64> {
            Some(calculate_angle(
                smoothed.position(a)?,
                smoothed.position(b)?,
                smoothed.position(c)?,
            ))
        };

        let primary = angle(primary)?;
        let secondary = match secondary {
            Some(triple) => Some(angle(triple)?),
            None => None,
        };

        Some(SideReading {
            side,
            primary,
            secondary,
            confidence: confidences.iter().sum::<f64>() / confidences.len() as f64,
        })
    }

    /// Smooth, gate and fuse in one go.
    pub fn measure(&mut self, frame: &PoseFrame, timestamp: f64) -> Option<FusedReading> {
        let smoothed = self.smooth(frame, timestamp);
        let requested = self.sides.sides();
        let readings: Vec<SideReading> = requested
            .iter()
            .filter_map(|&side| self.read_side(frame, &smoothed, side))
            .collect();
        self.policy.fuse(requested.len(), &readings)
    }

    pub fn reset(&mut self) {
        self.filters.clear();
    }
}
