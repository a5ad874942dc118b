//! Pose source implementations.
//!
//! A source yields keypoint observations one at a time; the tracker polls
//! it and forwards whatever it returns to the pipeline worker.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;

use posewatch_common::clock::SessionClock;
use posewatch_common::error::{PoseWatchError, PoseWatchResult};
use posewatch_pose_model::joint::JointMap;
use posewatch_pose_model::observation::{
    parse_header, parse_observations, KeypointObservation, PoseStreamHeader, TimestampNs,
};

use crate::PoseSource;

/// Replays a recorded pose stream.
pub struct ReplaySource {
    name: String,
    header: Option<PoseStreamHeader>,
    observations: VecDeque<KeypointObservation>,
    realtime: bool,
    clock: Option<SessionClock>,
    first_timestamp_ns: TimestampNs,
}

impl ReplaySource {
    pub fn from_observations(name: impl Into<String>, observations: Vec<KeypointObservation>) -> Self {
        let first_timestamp_ns = observations.first().map_or(0, |o| o.timestamp_ns);
        Self {
            name: name.into(),
            header: None,
            observations: observations.into(),
            realtime: false,
            clock: None,
            first_timestamp_ns,
        }
    }

    /// Load a JSONL pose stream from disk.
    pub fn open(path: &Path) -> PoseWatchResult<Self> {
        if !path.exists() {
            return Err(PoseWatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let observations = parse_observations(&content)
            .map_err(|e| PoseWatchError::stream(format!("{}: {e}", path.display())))?;

        tracing::debug!(
            path = %path.display(),
            observations = observations.len(),
            "Pose stream loaded"
        );

        let mut source = Self::from_observations(format!("replay:{}", path.display()), observations);
        source.header = parse_header(&content);
        Ok(source)
    }

    /// Release observations no faster than their timestamps, measured from
    /// the first poll.
    pub fn realtime(mut self) -> Self {
        self.realtime = true;
        self
    }

    pub fn header(&self) -> Option<&PoseStreamHeader> {
        self.header.as_ref()
    }

    /// Observations not yet polled.
    pub fn remaining(&self) -> usize {
        self.observations.len()
    }
}

impl PoseSource for ReplaySource {
    fn poll(&mut self) -> PoseWatchResult<Option<KeypointObservation>> {
        if self.realtime {
            let clock = self.clock.get_or_insert_with(SessionClock::start);
            if let Some(next) = self.observations.front() {
                let due = next.timestamp_ns.saturating_sub(self.first_timestamp_ns);
                if due > clock.elapsed_ns() {
                    return Ok(None);
                }
            }
        }
        Ok(self.observations.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_exhausted(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Create a connected sender/source pair stamped by `clock`.
pub fn channel(clock: SessionClock) -> (ChannelSender, ChannelSource) {
    tracing::debug!(epoch = %clock.epoch_wall(), "Pose channel opened");
    let (tx, rx) = mpsc::channel();
    (
        ChannelSender { tx, clock },
        ChannelSource {
            rx,
            disconnected: false,
        },
    )
}

/// Producer half, handed to whatever runs pose estimation.
#[derive(Clone)]
pub struct ChannelSender {
    tx: mpsc::Sender<KeypointObservation>,
    clock: SessionClock,
}

impl ChannelSender {
    /// Stamp `joints` with the session clock and send them.
    pub fn send_joints(&self, joints: JointMap) -> PoseWatchResult<TimestampNs> {
        let timestamp_ns = self.clock.elapsed_ns();
        self.send(KeypointObservation {
            timestamp_ns,
            joints,
        })?;
        Ok(timestamp_ns)
    }

    /// Send an already stamped observation.
    pub fn send(&self, observation: KeypointObservation) -> PoseWatchResult<()> {
        self.tx
            .send(observation)
            .map_err(|_| PoseWatchError::source("pose channel closed"))
    }
}

/// Receives observations from a [`ChannelSender`] on another thread.
pub struct ChannelSource {
    rx: mpsc::Receiver<KeypointObservation>,
    disconnected: bool,
}

impl PoseSource for ChannelSource {
    fn poll(&mut self) -> PoseWatchResult<Option<KeypointObservation>> {
        match self.rx.try_recv() {
            Ok(observation) => Ok(Some(observation)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => {
                if !self.disconnected {
                    tracing::debug!("All pose senders dropped");
                }
                self.disconnected = true;
                Ok(None)
            }
        }
    }

    fn name(&self) -> &str {
        "channel"
    }

    fn is_exhausted(&self) -> bool {
        self.disconnected
    }

    fn is_live(&self) -> bool {
        true
    }
}
