//! Skeleton topology and screen projection for display consumers.

use serde::{Deserialize, Serialize};

use crate::joint::{Joint, JointMap};

/// Bones drawn between joints (parent, child).
pub const SKELETON_EDGES: [(Joint, Joint); 16] = [
    // Face
    (Joint::LeftEar, Joint::LeftEye),
    (Joint::LeftEye, Joint::Nose),
    (Joint::Nose, Joint::RightEye),
    (Joint::RightEye, Joint::RightEar),
    // Upper body
    (Joint::LeftShoulder, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    // Torso
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftHip, Joint::RightHip),
    // Lower body
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
];

/// A joint projected into screen space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub joint: Joint,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Project displayable joints onto a `width` x `height` surface.
///
/// Joints at or below `min_confidence` are dropped. The estimator's y axis
/// points up, so it is flipped for screen space.
pub fn display_points(
    joints: &JointMap,
    width: f32,
    height: f32,
    min_confidence: f32,
) -> Vec<DisplayPoint> {
    joints
        .iter()
        .filter(|(_, point)| point.is_valid(min_confidence))
        .map(|(&joint, point)| DisplayPoint {
            joint,
            x: point.x * width,
            y: (1.0 - point.y) * height,
            confidence: point.confidence,
        })
        .collect()
}

/// Edges whose two endpoints are both displayable.
pub fn visible_edges(joints: &JointMap, min_confidence: f32) -> Vec<(Joint, Joint)> {
    let shown = |joint: &Joint| {
        joints
            .get(joint)
            .is_some_and(|point| point.is_valid(min_confidence))
    };

    SKELETON_EDGES
        .iter()
        .filter(|(parent, child)| shown(parent) && shown(child))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointPoint;
    use proptest::prelude::*;

    fn arm() -> JointMap {
        let mut joints = JointMap::new();
        joints.insert(Joint::LeftShoulder, JointPoint::new(0.25, 0.75, 0.9));
        joints.insert(Joint::LeftElbow, JointPoint::new(0.5, 0.5, 0.8));
        joints.insert(Joint::LeftWrist, JointPoint::new(0.75, 0.25, 0.3));
        joints
    }

    #[test]
    fn test_every_joint_is_on_an_edge() {
        for joint in Joint::ALL {
            assert!(
                SKELETON_EDGES
                    .iter()
                    .any(|(a, b)| *a == joint || *b == joint),
                "{joint} has no edge"
            );
        }
    }

    #[test]
    fn test_display_points_flip_y_and_filter() {
        let points = display_points(&arm(), 200.0, 400.0, 0.5);
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].joint, Joint::LeftShoulder);
        assert_eq!(points[0].x, 50.0);
        assert_eq!(points[0].y, 100.0);

        assert_eq!(points[1].joint, Joint::LeftElbow);
        assert_eq!(points[1].y, 200.0);
    }

    #[test]
    fn test_visible_edges_require_both_endpoints() {
        let edges = visible_edges(&arm(), 0.5);
        assert_eq!(edges, vec![(Joint::LeftShoulder, Joint::LeftElbow)]);

        let edges = visible_edges(&arm(), 0.1);
        assert_eq!(edges.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_projection_stays_on_surface(
            coords in proptest::collection::vec((0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0), Joint::COUNT),
            width in 1.0f32..4000.0,
            height in 1.0f32..4000.0,
        ) {
            let joints: JointMap = Joint::ALL
                .into_iter()
                .zip(coords)
                .map(|(joint, (x, y, c))| (joint, JointPoint::new(x, y, c)))
                .collect();
            let expected = joints.values().filter(|p| p.is_valid(0.5)).count();

            let points = display_points(&joints, width, height, 0.5);
            prop_assert_eq!(points.len(), expected);
            for point in points {
                prop_assert!(point.confidence > 0.5);
                prop_assert!((0.0..=width).contains(&point.x));
                prop_assert!((0.0..=height).contains(&point.y));
            }
        }
    }
}
