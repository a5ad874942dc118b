//! Print the feature tensor of one window.

use std::path::PathBuf;

use posewatch_action_core::FeatureEncoder;
use posewatch_common::config::AppConfig;
use posewatch_pose_model::observation::parse_observations;

pub fn run(config: &AppConfig, poses: PathBuf, frame_offset: usize) -> anyhow::Result<()> {
    config
        .pipeline
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid pipeline configuration: {e}"))?;

    let content = std::fs::read_to_string(&poses)
        .map_err(|_| anyhow::anyhow!("Pose stream not found: {}", poses.display()))?;
    let observations =
        parse_observations(&content).map_err(|e| anyhow::anyhow!("Failed to parse poses: {e}"))?;

    if frame_offset >= observations.len() {
        anyhow::bail!(
            "Frame offset {frame_offset} is past the end of the stream ({} observations)",
            observations.len()
        );
    }

    let window_size = config.pipeline.window_size;
    let end = (frame_offset + window_size).min(observations.len());
    if end - frame_offset < window_size {
        tracing::warn!(
            available = end - frame_offset,
            window_size,
            "Short window, repeating the last observation"
        );
    }

    let encoder = FeatureEncoder::new(window_size, config.pipeline.neck_synthesis_threshold);
    let tensor = encoder.encode(&observations[frame_offset..end]);
    println!("{}", serde_json::to_string(&tensor)?);

    Ok(())
}
