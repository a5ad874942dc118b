//! Append-only pose stream writer.
//!
//! Records the observations a tracker consumed so a live session can be
//! replayed later through [`crate::sources::ReplaySource`].

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use posewatch_common::error::{PoseWatchError, PoseWatchResult};
use posewatch_pose_model::observation::{KeypointObservation, PoseStreamHeader};

/// Flush cadence, in observations (~4 s at 30 fps).
const FLUSH_EVERY: u64 = 120;

/// Writes observations to a JSONL file, header first.
pub struct PoseWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    observations_written: u64,
}

impl PoseWriter {
    /// Create the file (and parent directories), truncating any previous
    /// content, and write the header as a `#` comment line.
    pub fn new(path: PathBuf, header: &PoseStreamHeader) -> PoseWatchResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);
        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| PoseWatchError::stream(format!("Failed to write header: {e}")))?;

        tracing::debug!(path = %path.display(), "Pose recording started");

        Ok(Self {
            writer,
            path,
            observations_written: 0,
        })
    }

    pub fn write_observation(&mut self, observation: &KeypointObservation) -> PoseWatchResult<()> {
        let json = serde_json::to_string(observation)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| PoseWatchError::stream(format!("Failed to write observation: {e}")))?;
        self.observations_written += 1;

        if self.observations_written % FLUSH_EVERY == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> PoseWatchResult<()> {
        self.writer
            .flush()
            .map_err(|e| PoseWatchError::stream(format!("Failed to flush observations: {e}")))
    }

    pub fn observations_written(&self) -> u64 {
        self.observations_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PoseWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posewatch_pose_model::joint::{Joint, JointPoint};
    use posewatch_pose_model::observation::{parse_header, parse_observations};

    #[test]
    fn test_pose_writer_roundtrip() {
        let dir = std::env::temp_dir().join("posewatch_test_writer");
        let _ = std::fs::remove_dir_all(&dir);

        let path = dir.join("nested").join("poses.jsonl");
        let header = PoseStreamHeader::new("test-camera", 30.0);
        let observations: Vec<KeypointObservation> = (0..3)
            .map(|i| {
                KeypointObservation::new(i * 33_333_333)
                    .with_joint(Joint::Nose, JointPoint::new(0.5, 0.5, 0.9))
            })
            .collect();

        {
            let mut writer = PoseWriter::new(path.clone(), &header).unwrap();
            for observation in &observations {
                writer.write_observation(observation).unwrap();
            }
            assert_eq!(writer.observations_written(), 3);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert_eq!(parse_header(&content), Some(header));
        assert_eq!(parse_observations(&content).unwrap(), observations);

        std::fs::remove_dir_all(&dir).ok();
    }
}
