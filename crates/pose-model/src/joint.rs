//! Skeletal joint catalog and per-joint keypoints.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A skeletal landmark reported by the pose estimator.
///
/// Variant order is the estimator's catalog order and defines the iteration
/// order of [`JointMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// Number of joints in the catalog.
    pub const COUNT: usize = 17;

    /// Every joint, in catalog order.
    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Stable snake_case name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }

    /// Parse a snake_case joint name.
    pub fn from_name(name: &str) -> Option<Joint> {
        Joint::ALL.into_iter().find(|joint| joint.as_str() == name)
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and confidence of a single joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointPoint {
    /// Normalized X coordinate.
    pub x: f32,
    /// Normalized Y coordinate (origin at the bottom edge).
    pub y: f32,
    /// Detection confidence in `[0.0, 1.0]`; 0 means absent.
    #[serde(rename = "c")]
    pub confidence: f32,
}

impl JointPoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// A joint is valid when its confidence is strictly above `min_confidence`.
    ///
    /// With a non-negative threshold a zero-confidence joint is never valid.
    pub fn is_valid(&self, min_confidence: f32) -> bool {
        self.confidence > min_confidence && self.x.is_finite() && self.y.is_finite()
    }

    /// `alpha * self + (1 - alpha) * previous`, per coordinate and confidence.
    pub fn blend(&self, previous: &JointPoint, alpha: f32) -> JointPoint {
        let keep = 1.0 - alpha;
        JointPoint {
            x: alpha * self.x + keep * previous.x,
            y: alpha * self.y + keep * previous.y,
            confidence: alpha * self.confidence + keep * previous.confidence,
        }
    }

    /// Midpoint of two joints, with the weaker of the two confidences.
    pub fn midpoint(a: &JointPoint, b: &JointPoint) -> JointPoint {
        JointPoint {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
            confidence: a.confidence.min(b.confidence),
        }
    }
}

/// Ordered mapping from joint identity to its keypoint.
pub type JointMap = BTreeMap<Joint, JointPoint>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seventeen_unique_joints() {
        assert_eq!(Joint::ALL.len(), 17);
        let mut sorted = Joint::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 17);
        assert_eq!(sorted, Joint::ALL.to_vec());
    }

    #[test]
    fn test_name_roundtrip() {
        for joint in Joint::ALL {
            assert_eq!(Joint::from_name(joint.as_str()), Some(joint));
            let json = serde_json::to_string(&joint).unwrap();
            assert_eq!(json, format!("\"{}\"", joint.as_str()));
        }
        assert_eq!(Joint::from_name("neck"), None);
    }

    #[test]
    fn test_validity_gate() {
        let point = JointPoint::new(0.5, 0.5, 0.5);
        assert!(!point.is_valid(0.5));
        assert!(point.is_valid(0.4));
        assert!(!JointPoint::new(0.5, 0.5, 0.0).is_valid(0.0));
    }

    #[test]
    fn test_blend_weights_newest_sample() {
        let previous = JointPoint::new(0.0, 0.0, 1.0);
        let current = JointPoint::new(10.0, 0.0, 1.0);
        let blended = current.blend(&previous, 0.7);
        assert!((blended.x - 7.0).abs() < 1e-5);
        assert_eq!(blended.y, 0.0);
        assert!((blended.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_midpoint_takes_min_confidence() {
        let left = JointPoint::new(0.0, 0.0, 0.8);
        let right = JointPoint::new(10.0, 0.0, 0.6);
        let neck = JointPoint::midpoint(&left, &right);
        assert_eq!(neck.x, 5.0);
        assert_eq!(neck.y, 0.0);
        assert_eq!(neck.confidence, 0.6);
    }

    #[test]
    fn test_joint_point_serializes_confidence_as_c() {
        let json = serde_json::to_string(&JointPoint::new(0.25, 0.75, 0.5)).unwrap();
        assert_eq!(json, r#"{"x":0.25,"y":0.75,"c":0.5}"#);
    }
}
