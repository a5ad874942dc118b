//! Action classifier adapter.
//!
//! The classifier itself is an external capability (a compiled model behind
//! some inference runtime). This module defines the seam it plugs into and
//! the degradation policy when it fails: the tick is skipped, never retried.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use posewatch_common::error::{PoseWatchError, PoseWatchResult};

use crate::encoder::FeatureTensor;

/// Top label plus the probability distribution over every label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Most probable label.
    #[serde(default)]
    pub label: String,

    /// Probability per label, in `[0.0, 1.0]`.
    pub probabilities: BTreeMap<String, f32>,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, probabilities: BTreeMap<String, f32>) -> Self {
        Self {
            label: label.into(),
            probabilities,
        }
    }

    /// Build a result whose label is the most probable entry.
    pub fn from_probabilities<L: Into<String>>(
        probabilities: impl IntoIterator<Item = (L, f32)>,
    ) -> Self {
        let probabilities: BTreeMap<String, f32> = probabilities
            .into_iter()
            .map(|(label, p)| (label.into(), p))
            .collect();
        let label = top_label(&probabilities);
        Self {
            label,
            probabilities,
        }
    }

    /// Probability of `label`, 0 when the model did not report it.
    pub fn probability_of(&self, label: &str) -> f32 {
        self.probabilities.get(label).copied().unwrap_or(0.0)
    }
}

fn top_label(probabilities: &BTreeMap<String, f32>) -> String {
    probabilities
        .iter()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(label, _)| label.clone())
        .unwrap_or_default()
}

/// An external action classifier over `[frames, 3, 18]` tensors.
pub trait ActionClassifier: Send {
    /// Classify one encoded window.
    fn classify(&mut self, tensor: &FeatureTensor) -> PoseWatchResult<ClassificationResult>;

    /// Classifier name for logging.
    fn name(&self) -> &str;
}

/// Wraps the injected classifier and turns failures into "no result".
pub struct InferenceInvoker {
    classifier: Option<Box<dyn ActionClassifier>>,
    budget: Option<Duration>,
    failures: u64,
}

impl InferenceInvoker {
    pub fn new(classifier: Option<Box<dyn ActionClassifier>>) -> Self {
        Self {
            classifier,
            budget: None,
            failures: 0,
        }
    }

    /// Report classify calls that take longer than `budget`.
    pub fn set_budget(&mut self, budget: Option<Duration>) {
        self.budget = budget;
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    /// Number of ticks skipped because classification was unavailable.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Classify a tensor, or `None` when no classification is available.
    pub fn classify(&mut self, tensor: &FeatureTensor) -> Option<ClassificationResult> {
        let Some(classifier) = self.classifier.as_mut() else {
            self.failures += 1;
            tracing::warn!("No action classifier attached, skipping classification");
            return None;
        };

        let started = Instant::now();
        let outcome = classifier.classify(tensor);
        let elapsed = started.elapsed();

        if let Some(budget) = self.budget {
            if elapsed > budget {
                tracing::warn!(
                    classifier = %classifier.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "Classification exceeded its time budget"
                );
            }
        }

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    classifier = %classifier.name(),
                    label = %result.label,
                    elapsed_us = elapsed.as_micros() as u64,
                    "Window classified"
                );
                Some(result)
            }
            Err(e) => {
                self.failures += 1;
                tracing::warn!(
                    classifier = %classifier.name(),
                    error = %e,
                    "Classification unavailable, keeping previous state"
                );
                None
            }
        }
    }
}

/// Replays pre-computed classification results, one per call.
///
/// A `None` entry simulates a tick on which the model was unavailable.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: VecDeque<Option<ClassificationResult>>,
    calls: u64,
}

impl ScriptedClassifier {
    pub fn new(script: impl IntoIterator<Item = Option<ClassificationResult>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: 0,
        }
    }

    /// Parse a JSONL script: one result object or `null` per line.
    ///
    /// Results without a label take the most probable entry.
    pub fn from_jsonl(jsonl: &str) -> PoseWatchResult<Self> {
        let mut script = VecDeque::new();
        for (idx, raw) in jsonl.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry: Option<ClassificationResult> = serde_json::from_str(line)
                .map_err(|e| PoseWatchError::stream(format!("results line {}: {e}", idx + 1)))?;
            script.push_back(entry.map(|mut result| {
                if result.label.is_empty() {
                    result.label = top_label(&result.probabilities);
                }
                result
            }));
        }
        Ok(Self { script, calls: 0 })
    }

    /// Entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ActionClassifier for ScriptedClassifier {
    fn classify(&mut self, _tensor: &FeatureTensor) -> PoseWatchResult<ClassificationResult> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(Some(result)) => Ok(result),
            Some(None) => Err(PoseWatchError::inference_unavailable(format!(
                "scripted outage on call {}",
                self.calls
            ))),
            None => Err(PoseWatchError::inference_unavailable("script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Adapts a closure into an [`ActionClassifier`].
pub struct FnClassifier<F> {
    name: String,
    classify: F,
}

impl<F> FnClassifier<F>
where
    F: FnMut(&FeatureTensor) -> anyhow::Result<ClassificationResult> + Send,
{
    pub fn new(name: impl Into<String>, classify: F) -> Self {
        Self {
            name: name.into(),
            classify,
        }
    }
}

impl<F> ActionClassifier for FnClassifier<F>
where
    F: FnMut(&FeatureTensor) -> anyhow::Result<ClassificationResult> + Send,
{
    fn classify(&mut self, tensor: &FeatureTensor) -> PoseWatchResult<ClassificationResult> {
        (self.classify)(tensor).map_err(PoseWatchError::from)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
