//! Per-joint temporal smoothing of keypoints for display.
//!
//! Smoothing only affects what is shown; the classifier always sees raw
//! observations.

use posewatch_common::config::PipelineConfig;
use posewatch_pose_model::joint::JointMap;
use posewatch_pose_model::observation::KeypointObservation;

/// Available smoothing algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingAlgorithm {
    /// Exponential moving average.
    ///
    /// `alpha` is the weight of the newest sample, in [0.0, 1.0].
    Ema { alpha: f32 },

    /// Pass raw keypoints through.
    None,
}

/// Stateful keypoint smoother holding the previous smoothed frame.
#[derive(Debug, Clone)]
pub struct PoseSmoother {
    algorithm: SmoothingAlgorithm,
    min_confidence: f32,
    previous: Option<JointMap>,
}

impl PoseSmoother {
    pub fn new(algorithm: SmoothingAlgorithm, min_confidence: f32) -> Self {
        let algorithm = match algorithm {
            SmoothingAlgorithm::Ema { alpha } => SmoothingAlgorithm::Ema {
                alpha: alpha.clamp(0.0, 1.0),
            },
            SmoothingAlgorithm::None => SmoothingAlgorithm::None,
        };
        Self {
            algorithm,
            min_confidence,
            previous: None,
        }
    }

    /// Smoother selected by the pipeline config: EMA with its alpha, or
    /// pass-through when display smoothing is off.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        let algorithm = if config.display_smoothing {
            SmoothingAlgorithm::Ema {
                alpha: config.smoothing_alpha,
            }
        } else {
            SmoothingAlgorithm::None
        };
        Self::new(algorithm, config.display_confidence_threshold)
    }

    pub fn algorithm(&self) -> SmoothingAlgorithm {
        self.algorithm
    }

    /// Smooth one frame of joints.
    ///
    /// A joint is blended only when it is valid in both this frame and the
    /// previous smoothed frame; otherwise the raw value passes through.
    /// Joints absent from `raw` are absent from the output.
    pub fn smooth(&mut self, raw: &JointMap) -> JointMap {
        let smoothed = match (self.algorithm, self.previous.as_ref()) {
            (SmoothingAlgorithm::Ema { alpha }, Some(previous)) => raw
                .iter()
                .map(|(&joint, current)| {
                    let point = match previous.get(&joint) {
                        Some(prev)
                            if current.is_valid(self.min_confidence)
                                && prev.is_valid(self.min_confidence) =>
                        {
                            current.blend(prev, alpha)
                        }
                        _ => *current,
                    };
                    (joint, point)
                })
                .collect(),
            _ => raw.clone(),
        };

        self.previous = Some(smoothed.clone());
        smoothed
    }

    /// Smooth the joints of an observation.
    pub fn smooth_observation(&mut self, observation: &KeypointObservation) -> JointMap {
        self.smooth(&observation.joints)
    }

    /// Forget history; the next frame passes through unchanged.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
