//! PoseWatch Pose Model
//!
//! Defines the core data contracts shared by every PoseWatch crate:
//! - **Joints:** The fixed 17-landmark skeletal catalog with per-joint
//!   position and confidence
//! - **Observations:** One frame of keypoints from the external pose
//!   estimator, and the JSONL stream format used to record and replay them
//! - **Skeleton:** Edge topology and screen projection for display consumers
//!
//! Positions are normalized image coordinates in `[0.0, 1.0]` with the
//! origin at the bottom-left, as delivered by the pose estimator.

pub mod joint;
pub mod observation;
pub mod skeleton;

pub use joint::*;
pub use observation::*;
pub use skeleton::*;
