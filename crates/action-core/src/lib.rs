//! PoseWatch Action Core
//!
//! Turns a stream of keypoint observations into a stable display skeleton
//! and a debounced count of a target action:
//! - **Window:** Fixed-capacity FIFO of the most recent observations
//! - **Encoder:** Maps a window into the `[frames, 3, 18]` classifier tensor
//! - **Inference:** Adapter around an injected action classifier
//! - **Debounce:** Confidence gate, rising-edge detection, and cooldown
//! - **Pose Smoothing:** Per-joint exponential smoothing for display
//! - **Pipeline:** Per-frame orchestration and state publishing
//!
//! This crate is pure computation: no I/O, no threads, no platform
//! dependencies. All inputs are data; all outputs are data.

pub mod debounce;
pub mod encoder;
pub mod inference;
pub mod pipeline;
pub mod pose_smooth;
pub mod window;

pub use debounce::EventDebouncer;
pub use encoder::{FeatureEncoder, FeatureTensor};
pub use inference::{ActionClassifier, ClassificationResult, InferenceInvoker};
pub use pipeline::{PipelineOrchestrator, PublishedState};
pub use pose_smooth::PoseSmoother;
pub use window::SlidingWindowBuffer;
