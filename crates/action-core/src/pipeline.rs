//! Per-frame orchestration: window → encode → classify → debounce → publish.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use posewatch_common::config::PipelineConfig;
use posewatch_common::error::PoseWatchResult;
use posewatch_pose_model::joint::JointMap;
use posewatch_pose_model::observation::{KeypointObservation, TimestampNs};

use crate::debounce::{DebounceConfig, EventDebouncer, EventHook};
use crate::encoder::FeatureEncoder;
use crate::inference::{ActionClassifier, InferenceInvoker};
use crate::pose_smooth::PoseSmoother;
use crate::window::SlidingWindowBuffer;

/// Snapshot published after every processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedState {
    /// Timestamp of the frame this snapshot describes.
    pub timestamp_ns: TimestampNs,
    /// Display-smoothed joints.
    pub joints: JointMap,
    /// Latest classifier label; empty until the first classification.
    pub label: String,
    /// Target probability in percent.
    pub confidence_pct: f64,
    pub is_active: bool,
    pub event_count: u64,
    pub frames_processed: u64,
}

/// Receives every published snapshot. Must not block.
pub trait Publisher: Send {
    fn publish(&self, state: Arc<PublishedState>);
}

/// Adapts a closure into a [`Publisher`].
pub struct FnPublisher<F>(pub F);

impl<F> Publisher for FnPublisher<F>
where
    F: Fn(Arc<PublishedState>) + Send,
{
    fn publish(&self, state: Arc<PublishedState>) {
        (self.0)(state)
    }
}

/// Owns every pipeline stage and runs them once per observation.
pub struct PipelineOrchestrator {
    window: SlidingWindowBuffer,
    encoder: FeatureEncoder,
    invoker: InferenceInvoker,
    debouncer: EventDebouncer,
    smoother: PoseSmoother,
    publisher: Option<Box<dyn Publisher>>,
    state: Arc<PublishedState>,
    frames_processed: u64,
}

impl PipelineOrchestrator {
    /// Build a pipeline; the configuration is validated first.
    pub fn new(
        config: &PipelineConfig,
        classifier: Option<Box<dyn ActionClassifier>>,
    ) -> PoseWatchResult<Self> {
        config.validate()?;

        tracing::debug!(
            window_size = config.window_size,
            target = %config.target_label,
            classifier_attached = classifier.is_some(),
            "Pipeline created"
        );

        Ok(Self {
            window: SlidingWindowBuffer::new(config.window_size),
            encoder: FeatureEncoder::new(config.window_size, config.neck_synthesis_threshold),
            invoker: InferenceInvoker::new(classifier),
            debouncer: EventDebouncer::new(DebounceConfig::from_pipeline(config)),
            smoother: PoseSmoother::from_pipeline(config),
            publisher: None,
            state: Arc::new(PublishedState::default()),
            frames_processed: 0,
        })
    }

    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_event_hook(mut self, hook: EventHook) -> Self {
        self.debouncer.set_hook(hook);
        self
    }

    /// Report classify calls slower than `budget`.
    pub fn set_inference_budget(&mut self, budget: Option<Duration>) {
        self.invoker.set_budget(budget);
    }

    /// Process one observation and publish the resulting state.
    pub fn ingest(&mut self, observation: KeypointObservation) -> Arc<PublishedState> {
        let timestamp_ns = observation.timestamp_ns;
        let joints = self.smoother.smooth_observation(&observation);
        self.window.push(observation);
        self.frames_processed += 1;

        let mut next = PublishedState {
            timestamp_ns,
            joints,
            label: self.state.label.clone(),
            confidence_pct: self.state.confidence_pct,
            is_active: self.state.is_active,
            event_count: self.debouncer.event_count(),
            frames_processed: self.frames_processed,
        };

        if self.window.is_full() {
            let tensor = self.encoder.encode(self.window.snapshot());
            match self.invoker.classify(&tensor) {
                Some(result) => {
                    let update = self.debouncer.update(&result, timestamp_ns);
                    next.label = update.label;
                    next.confidence_pct = update.confidence_pct;
                    next.is_active = update.is_active;
                    next.event_count = self.debouncer.event_count();
                }
                None => {
                    tracing::debug!(timestamp_ns, "No classification this frame");
                }
            }
        } else {
            tracing::debug!(
                buffered = self.window.len(),
                capacity = self.window.capacity(),
                "Window filling"
            );
        }

        let state = Arc::new(next);
        self.state = Arc::clone(&state);
        if let Some(publisher) = self.publisher.as_ref() {
            publisher.publish(Arc::clone(&state));
        }
        state
    }

    /// Process a frame that may carry no observation; `None` is skipped.
    pub fn ingest_frame(
        &mut self,
        observation: Option<KeypointObservation>,
    ) -> Option<Arc<PublishedState>> {
        match observation {
            Some(observation) => Some(self.ingest(observation)),
            None => {
                tracing::debug!("Frame without observation skipped");
                None
            }
        }
    }

    /// Clear the window and the smoother. The event count survives.
    pub fn reset_tracking(&mut self) {
        self.window.clear();
        self.smoother.reset();
        tracing::info!(
            event_count = self.debouncer.event_count(),
            "Tracking reset"
        );
    }

    /// Latest published snapshot.
    pub fn state(&self) -> Arc<PublishedState> {
        Arc::clone(&self.state)
    }

    pub fn event_count(&self) -> u64 {
        self.debouncer.event_count()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Frames currently buffered in the window.
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    /// Ticks on which classification was unavailable.
    pub fn inference_failures(&self) -> u64 {
        self.invoker.failures()
    }
}
