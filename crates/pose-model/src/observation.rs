//! Keypoint observations and the JSONL pose stream format.
//!
//! A pose stream is one JSON object per line. Lines starting with `#` are
//! comments; the first one conventionally carries a [`PoseStreamHeader`].

use serde::{Deserialize, Serialize};

use crate::joint::{Joint, JointMap, JointPoint};

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// One frame's keypoints for the single most-confident subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointObservation {
    /// Monotonic nanoseconds since session start.
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    /// Detected joints. Joints the estimator did not report are absent.
    #[serde(default)]
    pub joints: JointMap,
}

impl KeypointObservation {
    /// Create an observation with no joints.
    pub fn new(timestamp_ns: TimestampNs) -> Self {
        Self {
            timestamp_ns,
            joints: JointMap::new(),
        }
    }

    /// Create an observation from `(joint, point)` pairs.
    pub fn from_joints(
        timestamp_ns: TimestampNs,
        joints: impl IntoIterator<Item = (Joint, JointPoint)>,
    ) -> Self {
        Self {
            timestamp_ns,
            joints: joints.into_iter().collect(),
        }
    }

    /// Builder-style joint insertion.
    pub fn with_joint(mut self, joint: Joint, point: JointPoint) -> Self {
        self.joints.insert(joint, point);
        self
    }

    /// Keypoint for `joint`, if reported.
    pub fn get(&self, joint: Joint) -> Option<&JointPoint> {
        self.joints.get(&joint)
    }

    /// Keypoint for `joint` if it is reported with confidence above `min_confidence`.
    pub fn valid(&self, joint: Joint, min_confidence: f32) -> Option<&JointPoint> {
        self.get(joint).filter(|p| p.is_valid(min_confidence))
    }

    /// Number of reported joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Metadata written as the first comment line of a pose stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Free-form identifier of the producing estimator or device.
    #[serde(default)]
    pub source: Option<String>,

    /// Nominal frame rate of the stream (Hz).
    #[serde(default)]
    pub frame_rate_hz: Option<f64>,
}

impl PoseStreamHeader {
    pub fn new(source: impl Into<String>, frame_rate_hz: f64) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            source: Some(source.into()),
            frame_rate_hz: Some(frame_rate_hz),
        }
    }
}

/// Failure while reading a pose stream.
#[derive(Debug, thiserror::Error)]
pub enum PoseStreamError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: timestamp {timestamp_ns} precedes previous frame at {previous_ns}")]
    NonMonotonic {
        line: usize,
        timestamp_ns: TimestampNs,
        previous_ns: TimestampNs,
    },
}

/// Parse observations from JSONL content, skipping blank and `#` lines.
///
/// Timestamps must be non-decreasing.
pub fn parse_observations(jsonl: &str) -> Result<Vec<KeypointObservation>, PoseStreamError> {
    let mut observations: Vec<KeypointObservation> = Vec::new();

    for (idx, raw) in jsonl.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let observation: KeypointObservation =
            serde_json::from_str(line).map_err(|source| PoseStreamError::Parse {
                line: idx + 1,
                source,
            })?;

        if let Some(previous) = observations.last() {
            if observation.timestamp_ns < previous.timestamp_ns {
                return Err(PoseStreamError::NonMonotonic {
                    line: idx + 1,
                    timestamp_ns: observation.timestamp_ns,
                    previous_ns: previous.timestamp_ns,
                });
            }
        }
        observations.push(observation);
    }

    Ok(observations)
}

/// Extract the header from the first `#` line, if it holds one.
pub fn parse_header(jsonl: &str) -> Option<PoseStreamHeader> {
    jsonl
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.strip_prefix('#'))
        .and_then(|rest| serde_json::from_str(rest.trim()).ok())
}

/// Serialize a pose stream to JSONL, with an optional header line.
pub fn serialize_observations(
    header: Option<&PoseStreamHeader>,
    observations: &[KeypointObservation],
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    if let Some(header) = header {
        output.push_str("# ");
        output.push_str(&serde_json::to_string(header)?);
        output.push('\n');
    }
    for observation in observations {
        output.push_str(&serde_json::to_string(observation)?);
        output.push('\n');
    }
    Ok(output)
}
