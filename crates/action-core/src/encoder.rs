//! Feature encoding of an observation window into the classifier tensor.
//!
//! The classifier consumes a `[frames, 3, 18]` tensor: channel 0 holds x,
//! channel 1 holds y and channel 2 holds confidence for each of 18 joint
//! slots. The slot order is fixed by the trained model and must never change.

use serde::{Serialize, Serializer};

use posewatch_pose_model::joint::{Joint, JointPoint};
use posewatch_pose_model::observation::KeypointObservation;

/// Number of channels per joint slot (x, y, confidence).
pub const CHANNELS: usize = 3;

/// Number of joint slots: the 17 catalog joints plus the synthetic neck.
pub const JOINT_SLOTS: usize = 18;

/// Channel indices within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    X = 0,
    Y = 1,
    Confidence = 2,
}

/// Where the value of a joint slot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    /// Copied from a catalog joint.
    Catalog(Joint),
    /// Derived from both shoulders.
    Neck,
}

/// Slot index → source joint.
pub const SLOT_TABLE: [SlotSource; JOINT_SLOTS] = [
    SlotSource::Catalog(Joint::Nose),
    SlotSource::Neck,
    SlotSource::Catalog(Joint::RightShoulder),
    SlotSource::Catalog(Joint::RightElbow),
    SlotSource::Catalog(Joint::RightWrist),
    SlotSource::Catalog(Joint::LeftShoulder),
    SlotSource::Catalog(Joint::LeftElbow),
    SlotSource::Catalog(Joint::LeftWrist),
    SlotSource::Catalog(Joint::RightHip),
    SlotSource::Catalog(Joint::RightKnee),
    SlotSource::Catalog(Joint::RightAnkle),
    SlotSource::Catalog(Joint::LeftHip),
    SlotSource::Catalog(Joint::LeftKnee),
    SlotSource::Catalog(Joint::LeftAnkle),
    SlotSource::Catalog(Joint::RightEye),
    SlotSource::Catalog(Joint::LeftEye),
    SlotSource::Catalog(Joint::RightEar),
    SlotSource::Catalog(Joint::LeftEar),
];

/// Slot index of a catalog joint.
pub fn slot_of(joint: Joint) -> usize {
    SLOT_TABLE
        .iter()
        .position(|source| *source == SlotSource::Catalog(joint))
        .unwrap_or_else(|| unreachable!("every catalog joint has a slot"))
}

/// Dense `[frames, CHANNELS, JOINT_SLOTS]` tensor in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor {
    frames: usize,
    data: Vec<f32>,
}

impl FeatureTensor {
    /// All-zero tensor with `frames` frames.
    pub fn zeros(frames: usize) -> Self {
        Self {
            frames,
            data: vec![0.0; frames * CHANNELS * JOINT_SLOTS],
        }
    }

    /// `[frames, channels, joints]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.frames, CHANNELS, JOINT_SLOTS]
    }

    fn index(frame: usize, channel: usize, slot: usize) -> usize {
        frame * CHANNELS * JOINT_SLOTS + channel * JOINT_SLOTS + slot
    }

    /// Value at `[frame][channel][slot]`. Panics when out of bounds.
    pub fn get(&self, frame: usize, channel: usize, slot: usize) -> f32 {
        assert!(frame < self.frames && channel < CHANNELS && slot < JOINT_SLOTS);
        self.data[Self::index(frame, channel, slot)]
    }

    fn write_point(&mut self, frame: usize, slot: usize, point: &JointPoint) {
        self.data[Self::index(frame, Channel::X as usize, slot)] = point.x;
        self.data[Self::index(frame, Channel::Y as usize, slot)] = point.y;
        self.data[Self::index(frame, Channel::Confidence as usize, slot)] = point.confidence;
    }

    /// Flat row-major buffer, ready to hand to an inference runtime.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Nested `[frame][channel][slot]` copy.
    pub fn to_nested(&self) -> Vec<Vec<Vec<f32>>> {
        self.data
            .chunks(CHANNELS * JOINT_SLOTS)
            .map(|frame| frame.chunks(JOINT_SLOTS).map(<[f32]>::to_vec).collect())
            .collect()
    }

    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }
}

impl Serialize for FeatureTensor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_nested().serialize(serializer)
    }
}

/// Encodes observation windows into [`FeatureTensor`]s.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    frames: usize,
    neck_synthesis_threshold: f32,
}

impl FeatureEncoder {
    pub fn new(frames: usize, neck_synthesis_threshold: f32) -> Self {
        Self {
            frames,
            neck_synthesis_threshold,
        }
    }

    /// Encode a window, oldest observation first.
    ///
    /// Frame slots past the end of a short window repeat the last
    /// observation; an empty window yields all zeros. Observations beyond
    /// the configured frame count are ignored.
    pub fn encode<'a, I>(&self, window: I) -> FeatureTensor
    where
        I: IntoIterator<Item = &'a KeypointObservation>,
    {
        let mut tensor = FeatureTensor::zeros(self.frames);
        let mut observations = window.into_iter();
        let mut last: Option<&KeypointObservation> = None;

        for frame in 0..self.frames {
            if let Some(next) = observations.next() {
                last = Some(next);
            }
            let Some(observation) = last else {
                break;
            };

            for (slot, source) in SLOT_TABLE.iter().enumerate() {
                let point = match source {
                    SlotSource::Catalog(joint) => observation.get(*joint).copied(),
                    SlotSource::Neck => self.synthesize_neck(observation),
                };
                if let Some(point) = point {
                    tensor.write_point(frame, slot, &point);
                }
            }
        }

        tensor
    }

    /// Shoulder midpoint, when both shoulders clear the synthesis threshold.
    fn synthesize_neck(&self, observation: &KeypointObservation) -> Option<JointPoint> {
        let left = observation.valid(Joint::LeftShoulder, self.neck_synthesis_threshold)?;
        let right = observation.valid(Joint::RightShoulder, self.neck_synthesis_threshold)?;
        Some(JointPoint::midpoint(left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NECK: usize = 1;

    fn encoder(frames: usize) -> FeatureEncoder {
        FeatureEncoder::new(frames, 0.1)
    }

    fn nose_only(t: u64) -> KeypointObservation {
        KeypointObservation::new(t).with_joint(Joint::Nose, JointPoint::new(10.0, 20.0, 0.9))
    }

    fn shoulders(left_conf: f32, right_conf: f32) -> KeypointObservation {
        KeypointObservation::new(0)
            .with_joint(Joint::LeftShoulder, JointPoint::new(0.0, 0.0, left_conf))
            .with_joint(Joint::RightShoulder, JointPoint::new(10.0, 0.0, right_conf))
    }

    #[test]
    fn test_slot_table_order() {
        assert_eq!(slot_of(Joint::Nose), 0);
        assert_eq!(slot_of(Joint::RightShoulder), 2);
        assert_eq!(slot_of(Joint::RightElbow), 3);
        assert_eq!(slot_of(Joint::RightWrist), 4);
        assert_eq!(slot_of(Joint::LeftShoulder), 5);
        assert_eq!(slot_of(Joint::LeftElbow), 6);
        assert_eq!(slot_of(Joint::LeftWrist), 7);
        assert_eq!(slot_of(Joint::RightHip), 8);
        assert_eq!(slot_of(Joint::RightKnee), 9);
        assert_eq!(slot_of(Joint::RightAnkle), 10);
        assert_eq!(slot_of(Joint::LeftHip), 11);
        assert_eq!(slot_of(Joint::LeftKnee), 12);
        assert_eq!(slot_of(Joint::LeftAnkle), 13);
        assert_eq!(slot_of(Joint::RightEye), 14);
        assert_eq!(slot_of(Joint::LeftEye), 15);
        assert_eq!(slot_of(Joint::RightEar), 16);
        assert_eq!(slot_of(Joint::LeftEar), 17);
        assert_eq!(SLOT_TABLE[NECK], SlotSource::Neck);
    }

    #[test]
    fn test_empty_window_is_all_zero() {
        let tensor = encoder(60).encode(&Vec::<KeypointObservation>::new());
        assert_eq!(tensor.shape(), [60, 3, 18]);
        assert!(tensor.is_all_zero());
    }

    #[test]
    fn test_nose_lands_in_slot_zero() {
        let window: Vec<_> = (0..4).map(nose_only).collect();
        let tensor = encoder(4).encode(&window);

        for frame in 0..4 {
            assert_eq!(tensor.get(frame, 0, 0), 10.0);
            assert_eq!(tensor.get(frame, 1, 0), 20.0);
            assert_eq!(tensor.get(frame, 2, 0), 0.9);
            for channel in 0..CHANNELS {
                for slot in 1..JOINT_SLOTS {
                    assert_eq!(tensor.get(frame, channel, slot), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_each_joint_maps_to_its_slot() {
        for joint in Joint::ALL {
            let obs = KeypointObservation::new(0).with_joint(joint, JointPoint::new(0.25, 0.5, 0.05));
            let tensor = encoder(1).encode([&obs]);
            let slot = slot_of(joint);
            assert_eq!(tensor.get(0, Channel::X as usize, slot), 0.25);
            assert_eq!(tensor.get(0, Channel::Y as usize, slot), 0.5);
            assert_eq!(tensor.get(0, Channel::Confidence as usize, slot), 0.05);
            let nonzero = tensor.as_slice().iter().filter(|v| **v != 0.0).count();
            assert_eq!(nonzero, 3, "{joint} leaked into other slots");
        }
    }

    #[test]
    fn test_neck_is_shoulder_midpoint() {
        let tensor = encoder(1).encode([&shoulders(0.8, 0.6)]);
        assert_eq!(tensor.get(0, 0, NECK), 5.0);
        assert_eq!(tensor.get(0, 1, NECK), 0.0);
        assert_eq!(tensor.get(0, 2, NECK), 0.6);
    }

    #[test]
    fn test_neck_requires_both_shoulders_above_threshold() {
        for (left, right) in [(0.1, 0.9), (0.9, 0.1), (0.05, 0.05)] {
            let tensor = encoder(1).encode([&shoulders(left, right)]);
            for channel in 0..CHANNELS {
                assert_eq!(tensor.get(0, channel, NECK), 0.0);
            }
        }

        let missing = KeypointObservation::new(0)
            .with_joint(Joint::LeftShoulder, JointPoint::new(0.0, 0.0, 0.9));
        let tensor = encoder(1).encode([&missing]);
        assert_eq!(tensor.get(0, 2, NECK), 0.0);
    }

    #[test]
    fn test_short_window_extends_last_frame() {
        let first = nose_only(0);
        let last = KeypointObservation::new(1).with_joint(Joint::LeftWrist, JointPoint::new(0.3, 0.4, 0.7));
        let tensor = encoder(5).encode([&first, &last]);

        assert_eq!(tensor.get(0, 0, 0), 10.0);
        let wrist = slot_of(Joint::LeftWrist);
        for frame in 1..5 {
            assert_eq!(tensor.get(frame, 0, wrist), 0.3);
            assert_eq!(tensor.get(frame, 0, 0), 0.0);
        }
    }

    #[test]
    fn test_serializes_as_nested_array() {
        let tensor = encoder(2).encode([&nose_only(0)]);
        let value = serde_json::to_value(&tensor).unwrap();
        let frames = value.as_array().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_array().unwrap().len(), 3);
        assert_eq!(frames[0][0].as_array().unwrap().len(), 18);
        assert_eq!(frames[1][0][0], serde_json::json!(10.0));
    }

    proptest! {
        #[test]
        fn prop_shape_is_fixed(frames in 1usize..90, len in 0usize..90) {
            let window: Vec<_> = (0..len as u64).map(nose_only).collect();
            let tensor = encoder(frames).encode(&window);
            prop_assert_eq!(tensor.shape(), [frames, 3, 18]);
            prop_assert_eq!(tensor.as_slice().len(), frames * 3 * 18);
            prop_assert_eq!(tensor.is_all_zero(), len == 0);
        }
    }
}
