//! Replay a recorded pose stream through the action pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use posewatch_action_core::debounce::EventFired;
use posewatch_action_core::inference::{ActionClassifier, ScriptedClassifier};
use posewatch_action_core::pipeline::{FnPublisher, PublishedState};
use posewatch_action_core::PipelineOrchestrator;
use posewatch_common::clock::SessionClock;
use posewatch_common::config::AppConfig;
use posewatch_pose_model::observation::PoseStreamHeader;
use posewatch_pose_tracker::mailbox::StateMailbox;
use posewatch_pose_tracker::sources::ReplaySource;
use posewatch_pose_tracker::PoseTracker;

pub struct ReplayOptions {
    pub poses: PathBuf,
    pub results: Option<PathBuf>,
    pub json: bool,
    pub realtime: bool,
    pub record: Option<PathBuf>,
}

pub async fn run(config: AppConfig, options: ReplayOptions) -> anyhow::Result<()> {
    let pipeline_config = &config.pipeline;
    if !options.json {
        println!("Replaying pose stream: {}", options.poses.display());
    }

    let mut source = ReplaySource::open(&options.poses)
        .map_err(|e| anyhow::anyhow!("Failed to load poses: {e}"))?;
    if options.realtime {
        source = source.realtime();
    }
    let header = source
        .header()
        .cloned()
        .unwrap_or_else(|| PoseStreamHeader::new("posewatch-replay", 30.0));
    let total = source.remaining();

    let classifier: Option<Box<dyn ActionClassifier>> = match &options.results {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Results file {}: {e}", path.display()))?;
            let scripted = ScriptedClassifier::from_jsonl(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse results: {e}"))?;
            if !options.json {
                println!("  Loaded {} observations, {} results", total, scripted.remaining());
            }
            Some(Box::new(scripted))
        }
        None => {
            if !options.json {
                println!("  Loaded {total} observations (no classifier results, display only)");
            }
            None
        }
    };

    let json = options.json;
    let mut pipeline = PipelineOrchestrator::new(pipeline_config, classifier)
        .map_err(|e| anyhow::anyhow!("Invalid pipeline configuration: {e}"))?
        .with_event_hook(Box::new(move |event: EventFired| {
            if !json {
                println!(
                    "  [event {}] at {:.3}s",
                    event.event_count,
                    SessionClock::ns_to_secs(event.fired_at_ns)
                );
            }
        }));

    let mailbox = StateMailbox::new();
    pipeline = if json {
        pipeline.with_publisher(Box::new(FnPublisher(|state: Arc<PublishedState>| {
            match serde_json::to_string(&*state) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize state"),
            }
        })))
    } else {
        pipeline.with_publisher(Box::new(mailbox.clone()))
    };

    let mut tracker = PoseTracker::new(Box::new(source), pipeline, config.tracker.clone())
        .map_err(|e| anyhow::anyhow!("Invalid tracker configuration: {e}"))?;
    if let Some(path) = options.record {
        tracker
            .record_to(path, &header)
            .map_err(|e| anyhow::anyhow!("Failed to start recording: {e}"))?;
    }

    let summary = tracker.run().await?;

    if !json {
        let last = mailbox.latest();
        println!();
        println!("Replay complete:");
        println!("  Frames processed:   {}", summary.frames_processed);
        println!("  Inference skipped:  {}", summary.inference_failures);
        println!(
            "  {:<18}  {}",
            format!("'{}' events:", pipeline_config.target_label),
            summary.event_count
        );
        if !last.label.is_empty() {
            println!(
                "  Last label:         {} ({:.1}%)",
                last.label, last.confidence_pct
            );
        }
    }

    Ok(())
}
