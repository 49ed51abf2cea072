// src/keypoints.rs - COCO-17 keypoint layout shared by the detector and the analyzers
use nalgebra::Vector2;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SpotterError};

pub const KEYPOINT_COUNT: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keypoint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

const ALL_KEYPOINTS: [Keypoint; KEYPOINT_COUNT] = [
    Keypoint::Nose,
    Keypoint::LeftEye,
    Keypoint::RightEye,
    Keypoint::LeftEar,
    Keypoint::RightEar,
    Keypoint::LeftShoulder,
    Keypoint::RightShoulder,
    Keypoint::LeftElbow,
    Keypoint::RightElbow,
    Keypoint::LeftWrist,
    Keypoint::RightWrist,
    Keypoint::LeftHip,
    Keypoint::RightHip,
    Keypoint::LeftKnee,
    Keypoint::RightKnee,
    Keypoint::LeftAnkle,
    Keypoint::RightAnkle,
];

static KEYPOINTS_BY_NAME: Lazy<HashMap<&'static str, Keypoint>> = Lazy::new(|| {
    ALL_KEYPOINTS.iter().map(|kp| (kp.name(), *kp)).collect()
});

impl Keypoint {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn all() -> &'static [Keypoint] {
        &ALL_KEYPOINTS
    }

    pub fn name(self) -> &'static str {
        match self {
            Keypoint::Nose => "nose",
            Keypoint::LeftEye => "left_eye",
            Keypoint::RightEye => "right_eye",
            Keypoint::LeftEar => "left_ear",
            Keypoint::RightEar => "right_ear",
            Keypoint::LeftShoulder => "left_shoulder",
            Keypoint::RightShoulder => "right_shoulder",
            Keypoint::LeftElbow => "left_elbow",
            Keypoint::RightElbow => "right_elbow",
            Keypoint::LeftWrist => "left_wrist",
            Keypoint::RightWrist => "right_wrist",
            Keypoint::LeftHip => "left_hip",
            Keypoint::RightHip => "right_hip",
            Keypoint::LeftKnee => "left_knee",
            Keypoint::RightKnee => "right_knee",
            Keypoint::LeftAnkle => "left_ankle",
            Keypoint::RightAnkle => "right_ankle",
        }
    }

    pub fn from_name(name: &str) -> Option<Keypoint> {
        KEYPOINTS_BY_NAME.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Which body side(s) an analyzer evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideSelection {
    Left,
    Right,
    Both,
}

impl SideSelection {
    pub fn sides(self) -> &'static [Side] {
        match self {
            SideSelection::Left => &[Side::Left],
            SideSelection::Right => &[Side::Right],
            SideSelection::Both => &[Side::Left, Side::Right],
        }
    }
}

/// A joint triple defined on both sides of the body; the middle joint is the vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BilateralTriple {
    pub left: [Keypoint; 3],
    pub right: [Keypoint; 3],
}

impl BilateralTriple {
    pub const SHOULDER_ELBOW_WRIST: BilateralTriple = BilateralTriple {
        left: [Keypoint::LeftShoulder, Keypoint::LeftElbow, Keypoint::LeftWrist],
        right: [Keypoint::RightShoulder, Keypoint::RightElbow, Keypoint::RightWrist],
    };

    pub const HIP_KNEE_ANKLE: BilateralTriple = BilateralTriple {
        left: [Keypoint::LeftHip, Keypoint::LeftKnee, Keypoint::LeftAnkle],
        right: [Keypoint::RightHip, Keypoint::RightKnee, Keypoint::RightAnkle],
    };

    pub const SHOULDER_HIP_ANKLE: BilateralTriple = BilateralTriple {
        left: [Keypoint::LeftShoulder, Keypoint::LeftHip, Keypoint::LeftAnkle],
        right: [Keypoint::RightShoulder, Keypoint::RightHip, Keypoint::RightAnkle],
    };

    pub fn for_side(&self, side: Side) -> [Keypoint; 3] {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn keypoints(&self) -> impl Iterator<Item = Keypoint> + '_ {
        self.left.iter().chain(self.right.iter()).copied()
    }
}

/// One detected joint as reported by the pose detector.
///
/// Deserializes from either `{"x":..,"y":..,"confidence":..}` or `[x, y, confidence]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointSample {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl JointSample {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// The 17 joints of a single detected person for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseFrame {
    joints: [JointSample; KEYPOINT_COUNT],
}

impl PoseFrame {
    pub fn new(joints: [JointSample; KEYPOINT_COUNT]) -> Self {
        Self { joints }
    }

    /// Frame with every joint at the origin and zero confidence.
    pub fn empty() -> Self {
        Self {
            joints: [JointSample::default(); KEYPOINT_COUNT],
        }
    }

    pub fn from_rows(rows: &[[f64; 3]]) -> Result<Self> {
        if rows.len() != KEYPOINT_COUNT {
            return Err(SpotterError::InvalidFrame {
                expected: KEYPOINT_COUNT,
                actual: rows.len(),
            });
        }
        let mut frame = Self::empty();
        for (joint, row) in frame.joints.iter_mut().zip(rows) {
            *joint = JointSample::new(row[0], row[1], row[2]);
        }
        Ok(frame)
    }

    /// Build a frame from joints keyed by COCO name (`"left_knee"`). Joints
    /// that are not listed stay at zero confidence.
    pub fn from_named<'a>(joints: impl IntoIterator<Item = (&'a str, [f64; 3])>) -> Result<Self> {
        let mut frame = Self::empty();
        for (name, [x, y, confidence]) in joints {
            let keypoint =
                Keypoint::from_name(name).ok_or_else(|| SpotterError::UnknownKeypoint(name.to_string()))?;
            frame.set(keypoint, JointSample::new(x, y, confidence));
        }
        Ok(frame)
    }

    pub fn get(&self, keypoint: Keypoint) -> &JointSample {
        &self.joints[keypoint.index()]
    }

    pub fn set(&mut self, keypoint: Keypoint, sample: JointSample) {
        self.joints[keypoint.index()] = sample;
    }

    /// Builder-style variant of [`PoseFrame::set`].
    pub fn with(mut self, keypoint: Keypoint, x: f64, y: f64, confidence: f64) -> Self {
        self.set(keypoint, JointSample::new(x, y, confidence));
        self
    }

    pub fn joints(&self) -> &[JointSample; KEYPOINT_COUNT] {
        &self.joints
    }
}

/// Detector output as it appears in recordings: either 17 `[x, y, confidence]`
/// rows in COCO order or an object keyed by joint name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawKeypoints {
    Rows(Vec<[f64; 3]>),
    Named(BTreeMap<String, [f64; 3]>),
}

impl RawKeypoints {
    pub fn to_frame(&self) -> Result<PoseFrame> {
        match self {
            RawKeypoints::Rows(rows) => PoseFrame::from_rows(rows),
            RawKeypoints::Named(joints) => {
                PoseFrame::from_named(joints.iter().map(|(name, row)| (name.as_str(), *row)))
            }
        }
    }
}

impl Default for PoseFrame {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_coco_order() {
        assert_eq!(Keypoint::LeftShoulder.index(), 5);
        assert_eq!(Keypoint::RightWrist.index(), 10);
        assert_eq!(Keypoint::RightAnkle.index(), 16);
        for (i, kp) in Keypoint::all().iter().enumerate() {
            assert_eq!(kp.index(), i);
        }
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(Keypoint::from_name("left_knee"), Some(Keypoint::LeftKnee));
        assert_eq!(Keypoint::from_name("tail"), None);
    }

    #[test]
    fn from_rows_rejects_wrong_length() {
        let rows = vec![[0.0, 0.0, 1.0]; 16];
        assert!(matches!(
            PoseFrame::from_rows(&rows),
            Err(SpotterError::InvalidFrame { expected: 17, actual: 16 })
        ));
    }

    #[test]
    fn frame_deserializes_from_nested_arrays() {
        let rows: Vec<[f64; 3]> = (0..17).map(|i| [i as f64, 2.0 * i as f64, 0.9]).collect();
        let json = serde_json::to_string(&rows).unwrap();
        let frame: PoseFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame.get(Keypoint::LeftHip).x, 11.0);
        assert_eq!(frame.get(Keypoint::LeftHip).y, 22.0);
    }

    #[test]
    fn named_joints_build_a_frame() {
        let raw: RawKeypoints = serde_json::from_str(
            r#"{"left_knee": [10.0, 20.0, 0.8], "right_wrist": [30.0, 40.0, 0.6]}"#,
        )
        .unwrap();
        let frame = raw.to_frame().unwrap();
        assert_eq!(*frame.get(Keypoint::LeftKnee), JointSample::new(10.0, 20.0, 0.8));
        assert_eq!(frame.get(Keypoint::RightWrist).confidence, 0.6);
        assert_eq!(frame.get(Keypoint::Nose).confidence, 0.0);
    }

    #[test]
    fn row_keypoints_still_parse() {
        let rows: Vec<[f64; 3]> = vec![[1.0, 2.0, 0.9]; 17];
        let raw: RawKeypoints = serde_json::from_str(&serde_json::to_string(&rows).unwrap()).unwrap();
        assert_eq!(raw.to_frame().unwrap().get(Keypoint::RightAnkle).y, 2.0);
    }

    #[test]
    fn unknown_joint_name_rejected() {
        let raw: RawKeypoints = serde_json::from_str(r#"{"left_tail": [1.0, 2.0, 0.9]}"#).unwrap();
        assert!(matches!(raw.to_frame(), Err(SpotterError::UnknownKeypoint(name)) if name == "left_tail"));
    }

    #[test]
    fn side_selection_expands() {
        assert_eq!(SideSelection::Both.sides(), &[Side::Left, Side::Right]);
        assert_eq!(SideSelection::Right.sides(), &[Side::Right]);
    }
}
