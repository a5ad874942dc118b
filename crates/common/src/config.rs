//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PoseWatchError, PoseWatchResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Action-recognition pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Runtime settings for the pose tracker worker.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tuning constants for the recognition pipeline.
///
/// The three confidence thresholds are deliberately independent: display
/// validity gates the smoother and the rendered skeleton, neck synthesis
/// gates the encoder's derived joint, and activation gates the classifier
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of observations per classification window.
    pub window_size: usize,

    /// Classifier label that counts as the target action.
    pub target_label: String,

    /// Minimum target probability, in percent, for the action to be active.
    pub activation_threshold_pct: f64,

    /// Minimum time between two counted events.
    pub cooldown_secs: f64,

    /// Both shoulders must exceed this confidence to synthesize the neck.
    pub neck_synthesis_threshold: f32,

    /// Smooth the display skeleton; when off, raw keypoints are shown.
    pub display_smoothing: bool,

    /// Weight of the newest sample in the display smoother.
    pub smoothing_alpha: f32,

    /// Joints below this confidence are not displayed nor blended.
    pub display_confidence_threshold: f32,
}

/// Pose tracker runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Bounded queue between the pose source and the pipeline worker.
    pub channel_capacity: usize,

    /// A classify call slower than this is reported.
    pub inference_budget_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "posewatch_action_core=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            target_label: "dabbing".to_string(),
            activation_threshold_pct: 50.0,
            cooldown_secs: 2.0,
            neck_synthesis_threshold: 0.1,
            display_smoothing: true,
            smoothing_alpha: 0.7,
            display_confidence_threshold: 0.5,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 120,
            inference_budget_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Longest accepted cooldown (one day). Keeps the nanosecond cooldown
/// representable as a `u64`.
const MAX_COOLDOWN_SECS: f64 = 86_400.0;

impl PipelineConfig {
    /// Cooldown as a `Duration`. Values no `Duration` can hold saturate.
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Reject configurations that would leave the tensor shape or the
    /// gating thresholds undefined.
    pub fn validate(&self) -> PoseWatchResult<()> {
        if self.window_size == 0 {
            return Err(PoseWatchError::config("window_size must be greater than 0"));
        }
        if self.target_label.trim().is_empty() {
            return Err(PoseWatchError::config("target_label must not be empty"));
        }
        if !(0.0..=100.0).contains(&self.activation_threshold_pct) {
            return Err(PoseWatchError::config(format!(
                "activation_threshold_pct must be within [0, 100], got {}",
                self.activation_threshold_pct
            )));
        }
        if !(0.0..=MAX_COOLDOWN_SECS).contains(&self.cooldown_secs) {
            return Err(PoseWatchError::config(format!(
                "cooldown_secs must be within [0, {MAX_COOLDOWN_SECS}], got {}",
                self.cooldown_secs
            )));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(PoseWatchError::config(format!(
                "smoothing_alpha must be within (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        check_unit("neck_synthesis_threshold", self.neck_synthesis_threshold)?;
        check_unit(
            "display_confidence_threshold",
            self.display_confidence_threshold,
        )?;
        Ok(())
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> PoseWatchResult<()> {
        if self.channel_capacity == 0 {
            return Err(PoseWatchError::config(
                "tracker.channel_capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> PoseWatchResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PoseWatchError::config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> PoseWatchResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PoseWatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> PoseWatchResult<()> {
        self.pipeline.validate()?;
        self.tracker.validate()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("posewatch").join("config.json")
}
