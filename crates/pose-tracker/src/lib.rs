//! PoseWatch Pose Tracker
//!
//! Runs the recognition pipeline against a stream of keypoint observations.
//! The source is polled on an async task; observations cross a bounded
//! channel to a dedicated blocking worker that owns the pipeline, so a slow
//! classifier never stalls the producer. Sources are pluggable:
//!
//! - **Replay:** recorded JSONL pose streams, optionally paced in real time
//! - **Channel:** observations pushed from another thread (live capture)
//!
//! Published state reaches consumers through a [`mailbox::StateMailbox`].

pub mod mailbox;
pub mod sources;
pub mod writer;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use posewatch_action_core::PipelineOrchestrator;
use posewatch_common::config::TrackerConfig;
use posewatch_common::error::{PoseWatchError, PoseWatchResult};
use posewatch_pose_model::observation::{KeypointObservation, PoseStreamHeader};

/// Trait for pose observation sources.
pub trait PoseSource: Send {
    /// Poll for the next observation. Returns `None` if none is available yet.
    fn poll(&mut self) -> PoseWatchResult<Option<KeypointObservation>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// True once the source will never yield again.
    fn is_exhausted(&self) -> bool;

    /// Live sources drop frames while the worker is busy instead of waiting.
    fn is_live(&self) -> bool {
        false
    }
}

/// Counters reported when a tracking run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerSummary {
    pub frames_forwarded: u64,
    pub frames_dropped: u64,
    pub frames_processed: u64,
    pub event_count: u64,
    pub inference_failures: u64,
}

/// Couples a pose source with a pipeline worker.
pub struct PoseTracker {
    source: Box<dyn PoseSource>,
    pipeline: Option<PipelineOrchestrator>,
    recorder: Option<writer::PoseWriter>,
    config: TrackerConfig,
    stop_flag: Arc<AtomicBool>,
}

impl PoseTracker {
    pub fn new(
        source: Box<dyn PoseSource>,
        mut pipeline: PipelineOrchestrator,
        config: TrackerConfig,
    ) -> PoseWatchResult<Self> {
        config.validate()?;
        pipeline.set_inference_budget(Some(Duration::from_millis(config.inference_budget_ms)));

        Ok(Self {
            source,
            pipeline: Some(pipeline),
            recorder: None,
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Also write every forwarded observation to `path`.
    pub fn record_to(&mut self, path: PathBuf, header: &PoseStreamHeader) -> PoseWatchResult<()> {
        self.recorder = Some(writer::PoseWriter::new(path, header)?);
        Ok(())
    }

    /// Run until the stop flag is set or the source is exhausted.
    ///
    /// The pipeline is handed back to the tracker before `run` returns, on
    /// error paths included. A recording failure ends the run, is reported
    /// once the worker has drained, and detaches the recorder. The stop flag
    /// is cleared on return so the tracker can run again.
    pub async fn run(&mut self) -> PoseWatchResult<TrackerSummary> {
        let mut pipeline = self
            .pipeline
            .take()
            .ok_or_else(|| PoseWatchError::source("pipeline is already running"))?;

        let (tx, mut rx) = mpsc::channel::<KeypointObservation>(self.config.channel_capacity);
        let worker = tokio::task::spawn_blocking(move || {
            while let Some(observation) = rx.blocking_recv() {
                pipeline.ingest(observation);
            }
            pipeline
        });

        let live = self.source.is_live();
        tracing::info!(
            source = %self.source.name(),
            live,
            capacity = self.config.channel_capacity,
            "Pose tracker started"
        );

        let mut summary = TrackerSummary::default();
        let mut recording_error = None;
        while !self.stop_flag.load(Ordering::Relaxed) {
            match self.source.poll() {
                Ok(Some(observation)) => {
                    if let Some(recorder) = self.recorder.as_mut() {
                        if let Err(e) = recorder.write_observation(&observation) {
                            tracing::error!(error = %e, "Recording failed, stopping");
                            recording_error = Some(e);
                        }
                    }
                    let forwarded = if live {
                        match tx.try_send(observation) {
                            Ok(()) => true,
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                summary.frames_dropped += 1;
                                tracing::debug!("Pipeline busy, frame dropped");
                                if recording_error.is_some() {
                                    break;
                                }
                                continue;
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => false,
                        }
                    } else {
                        tx.send(observation).await.is_ok()
                    };
                    if !forwarded {
                        tracing::warn!("Pipeline worker exited early");
                        break;
                    }
                    summary.frames_forwarded += 1;
                    // The observation reached the pipeline even if its
                    // recording failed.
                    if recording_error.is_some() {
                        break;
                    }
                }
                Ok(None) => {
                    if self.source.is_exhausted() {
                        break;
                    }
                    // Nothing available, yield briefly
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "Pose source error");
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Pose source failed, stopping");
                    break;
                }
            }
        }
        self.stop_flag.store(false, Ordering::SeqCst);

        drop(tx);
        let pipeline = worker
            .await
            .map_err(|e| PoseWatchError::Other(anyhow::anyhow!("pipeline worker failed: {e}")))?;

        summary.frames_processed = pipeline.frames_processed();
        summary.event_count = pipeline.event_count();
        summary.inference_failures = pipeline.inference_failures();
        self.pipeline = Some(pipeline);

        if recording_error.is_none() {
            if let Some(recorder) = self.recorder.as_mut() {
                if let Err(e) = recorder.flush() {
                    recording_error = Some(e);
                }
            }
        }
        if let Some(e) = recording_error {
            self.recorder = None;
            return Err(e);
        }

        tracing::info!(
            frames = summary.frames_processed,
            dropped = summary.frames_dropped,
            events = summary.event_count,
            "Pose tracker stopped"
        );
        Ok(summary)
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// The pipeline, when no run is in progress.
    pub fn pipeline(&self) -> Option<&PipelineOrchestrator> {
        self.pipeline.as_ref()
    }
}
