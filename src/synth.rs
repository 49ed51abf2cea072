// src/synth.rs - Synthetic poses for demos, smoke tests and replay fixtures
//
// Coordinates are in detector pixels (640x480 frame, y grows downward).
// Both body sides get the same joint angles, the left side shifted right.
use nalgebra::{Rotation2, Vector2};

use crate::keypoints::{Keypoint, PoseFrame, Side};

const LEFT_SHIFT: f64 = 20.0;

/// Point at `len` from `vertex` such that the angle between it and
/// `vertex + toward` measured at `vertex` is `angle_deg`.
fn joint_at(vertex: Vector2<f64>, toward: Vector2<f64>, angle_deg: f64, len: f64) -> Vector2<f64> {
    vertex + Rotation2::new(angle_deg.to_radians()) * toward.normalize() * len
}

fn side_joint(side: Side, left: Keypoint, right: Keypoint) -> Keypoint {
    match side {
        Side::Left => left,
        Side::Right => right,
    }
}

fn place(frame: PoseFrame, side: Side, kp: Keypoint, p: Vector2<f64>, confidence: f64) -> PoseFrame {
    let shift = if side == Side::Left { LEFT_SHIFT } else { 0.0 };
    frame.with(kp, p.x + shift, p.y, confidence)
}

/// Standing person seen from the side, knees bent to `knee_angle`.
pub fn squat(knee_angle: f64, confidence: f64) -> PoseFrame {
    let knee = Vector2::new(300.0, 360.0);
    let ankle = Vector2::new(300.0, 460.0);
    let hip = joint_at(knee, ankle - knee, knee_angle, 100.0);
    let shoulder = hip + Vector2::new(0.0, -130.0);

    let mut frame = PoseFrame::empty();
    for side in [Side::Left, Side::Right] {
        use Keypoint::*;
        frame = place(frame, side, side_joint(side, LeftHip, RightHip), hip, confidence);
        frame = place(frame, side, side_joint(side, LeftKnee, RightKnee), knee, confidence);
        frame = place(frame, side, side_joint(side, LeftAnkle, RightAnkle), ankle, confidence);
        frame = place(frame, side, side_joint(side, LeftShoulder, RightShoulder), shoulder, confidence);
    }
    frame
}

/// Upper arm hanging straight down, elbow flexed to `elbow_angle`.
pub fn curl(elbow_angle: f64, confidence: f64) -> PoseFrame {
    let shoulder = Vector2::new(300.0, 150.0);
    let elbow = Vector2::new(300.0, 260.0);
    let wrist = joint_at(elbow, shoulder - elbow, elbow_angle, 100.0);

    let mut frame = PoseFrame::empty();
    for side in [Side::Left, Side::Right] {
        use Keypoint::*;
        frame = place(frame, side, side_joint(side, LeftShoulder, RightShoulder), shoulder, confidence);
        frame = place(frame, side, side_joint(side, LeftElbow, RightElbow), elbow, confidence);
        frame = place(frame, side, side_joint(side, LeftWrist, RightWrist), wrist, confidence);
    }
    frame
}

/// Horizontal body seen from the side: shoulder-elbow-wrist at `elbow_angle`,
/// shoulder-hip-ankle at `body_angle`.
pub fn prone(elbow_angle: f64, body_angle: f64, confidence: f64) -> PoseFrame {
    let shoulder = Vector2::new(200.0, 300.0);
    let hip = Vector2::new(350.0, 300.0);
    let ankle = joint_at(hip, shoulder - hip, body_angle, 150.0);
    let elbow = Vector2::new(200.0, 380.0);
    let wrist = joint_at(elbow, shoulder - elbow, elbow_angle, 80.0);

    let mut frame = PoseFrame::empty();
    for side in [Side::Left, Side::Right] {
        use Keypoint::*;
        frame = place(frame, side, side_joint(side, LeftShoulder, RightShoulder), shoulder, confidence);
        frame = place(frame, side, side_joint(side, LeftElbow, RightElbow), elbow, confidence);
        frame = place(frame, side, side_joint(side, LeftWrist, RightWrist), wrist, confidence);
        frame = place(frame, side, side_joint(side, LeftHip, RightHip), hip, confidence);
        frame = place(frame, side, side_joint(side, LeftAnkle, RightAnkle), ankle, confidence);
    }
    frame
}

/// Standing person with the right wrist held well above the shoulder.
pub fn raised_arm(confidence: f64) -> PoseFrame {
    squat(175.0, confidence)
        .with(Keypoint::RightElbow, 300.0, 60.0, confidence)
        .with(Keypoint::RightWrist, 300.0, 10.0, confidence)
}

/// `frames` samples moving linearly from `from` to `to`, both ends included.
pub fn ramp(from: f64, to: f64, frames: usize) -> Vec<f64> {
    match frames {
        0 => Vec::new(),
        1 => vec![to],
        n => (0..n)
            .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::calculate_angle;

    fn angle(frame: &PoseFrame, a: Keypoint, b: Keypoint, c: Keypoint) -> f64 {
        calculate_angle(frame.get(a).position(), frame.get(b).position(), frame.get(c).position())
    }

    #[test]
    fn generated_angles_match_request() {
        use Keypoint::*;
        let f = squat(95.0, 0.9);
        assert!((angle(&f, RightHip, RightKnee, RightAnkle) - 95.0).abs() < 0.01);
        assert!((angle(&f, LeftHip, LeftKnee, LeftAnkle) - 95.0).abs() < 0.01);

        let f = curl(35.0, 0.9);
        assert!((angle(&f, RightShoulder, RightElbow, RightWrist) - 35.0).abs() < 0.01);

        let f = prone(90.0, 172.0, 0.9);
        assert!((angle(&f, LeftShoulder, LeftElbow, LeftWrist) - 90.0).abs() < 0.01);
        assert!((angle(&f, LeftShoulder, LeftHip, LeftAnkle) - 172.0).abs() < 0.01);
    }

    #[test]
    fn ramp_includes_both_ends() {
        assert_eq!(ramp(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
        assert_eq!(ramp(0.0, 10.0, 1), vec![10.0]);
        assert!(ramp(0.0, 10.0, 0).is_empty());
    }
}
