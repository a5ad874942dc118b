//! Confidence-gated, debounced event counting.
//!
//! Two pieces of state evolve side by side: `is_active` follows the raw
//! confidence gate on every classification, while `event_count` only moves
//! on an inactive → active edge that lands outside the cooldown measured
//! from the previous counted event.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use posewatch_common::clock::SessionClock;
use posewatch_common::config::PipelineConfig;
use posewatch_pose_model::observation::TimestampNs;

use crate::inference::ClassificationResult;

/// Notification passed to the event-fired hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFired {
    /// Count after this event.
    pub event_count: u64,
    /// Timestamp of the classification that fired.
    pub fired_at_ns: TimestampNs,
}

/// Side-effect hook invoked once per counted event (sound, haptics, ...).
pub type EventHook = Box<dyn FnMut(EventFired) + Send>;

/// Gating parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceConfig {
    pub target_label: String,
    /// Activation threshold in percent; the gate is strictly greater-than.
    pub activation_threshold_pct: f64,
    pub cooldown: Duration,
}

impl DebounceConfig {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            target_label: config.target_label.clone(),
            activation_threshold_pct: config.activation_threshold_pct,
            cooldown: config.cooldown(),
        }
    }
}

/// Observable debouncer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceState {
    pub is_active: bool,
    pub last_fired_at_ns: Option<TimestampNs>,
    pub event_count: u64,
    pub label: String,
    pub confidence_pct: f64,
}

/// Outcome of one [`EventDebouncer::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceUpdate {
    pub is_active: bool,
    pub label: String,
    pub confidence_pct: f64,
    /// Whether this update counted a new event.
    pub fired: bool,
}

pub struct EventDebouncer {
    config: DebounceConfig,
    cooldown_ns: u64,
    state: DebounceState,
    on_fire: Option<EventHook>,
}

impl EventDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        let cooldown_ns = SessionClock::duration_to_ns(config.cooldown);
        Self {
            config,
            cooldown_ns,
            state: DebounceState {
                is_active: false,
                last_fired_at_ns: None,
                event_count: 0,
                label: String::new(),
                confidence_pct: 0.0,
            },
            on_fire: None,
        }
    }

    /// Install the hook invoked on every counted event.
    pub fn set_hook(&mut self, hook: EventHook) {
        self.on_fire = Some(hook);
    }

    /// Feed one classification observed at `now`.
    pub fn update(&mut self, result: &ClassificationResult, now: TimestampNs) -> DebounceUpdate {
        let target = self.config.target_label.as_str();
        let confidence_pct = f64::from(result.probability_of(target)) * 100.0;
        let candidate =
            result.label == target && confidence_pct > self.config.activation_threshold_pct;

        let rising_edge = candidate && !self.state.is_active;
        let fired = rising_edge && self.cooldown_elapsed(now);

        if fired {
            self.state.event_count += 1;
            self.state.last_fired_at_ns = Some(now);
            tracing::info!(
                label = %target,
                confidence_pct,
                event_count = self.state.event_count,
                t_secs = SessionClock::ns_to_secs(now),
                "Action event fired"
            );
            if let Some(hook) = self.on_fire.as_mut() {
                hook(EventFired {
                    event_count: self.state.event_count,
                    fired_at_ns: now,
                });
            }
        } else if rising_edge {
            tracing::debug!(
                label = %target,
                t_secs = SessionClock::ns_to_secs(now),
                "Activation inside cooldown, not counted"
            );
        }

        self.state.is_active = candidate;
        self.state.label = result.label.clone();
        self.state.confidence_pct = confidence_pct;

        DebounceUpdate {
            is_active: candidate,
            label: result.label.clone(),
            confidence_pct,
            fired,
        }
    }

    fn cooldown_elapsed(&self, now: TimestampNs) -> bool {
        match self.state.last_fired_at_ns {
            None => true,
            Some(last) => now.saturating_sub(last) > self.cooldown_ns,
        }
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    pub fn event_count(&self) -> u64 {
        self.state.event_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    const SEC: u64 = 1_000_000_000;

    fn debouncer() -> EventDebouncer {
        EventDebouncer::new(DebounceConfig {
            target_label: "dabbing".to_string(),
            activation_threshold_pct: 50.0,
            cooldown: Duration::from_secs(2),
        })
    }

    fn dab(p: f32) -> ClassificationResult {
        ClassificationResult::from_probabilities([("dabbing", p), ("other", 1.0 - p)])
    }

    fn idle() -> ClassificationResult {
        dab(0.1)
    }

    #[test]
    fn test_first_activation_fires() {
        let mut d = debouncer();
        let update = d.update(&dab(0.9), 0);
        assert!(update.fired);
        assert!(update.is_active);
        assert_eq!(update.label, "dabbing");
        assert!((update.confidence_pct - 90.0).abs() < 1e-4);
        assert_eq!(d.event_count(), 1);
    }

    #[test]
    fn test_activations_inside_cooldown_collapse() {
        let mut d = debouncer();
        d.update(&dab(0.9), 10 * SEC);
        d.update(&idle(), 10 * SEC + SEC / 4);
        let second = d.update(&dab(0.9), 10 * SEC + SEC / 2);
        assert!(!second.fired);
        assert!(second.is_active);
        assert_eq!(d.event_count(), 1);
    }

    #[test]
    fn test_activations_outside_cooldown_both_count() {
        let mut d = debouncer();
        d.update(&dab(0.9), 10 * SEC);
        d.update(&idle(), 11 * SEC);
        let second = d.update(&dab(0.9), 13 * SEC);
        assert!(second.fired);
        assert_eq!(d.event_count(), 2);
    }

    #[test]
    fn test_sustained_activity_never_refires() {
        let mut d = debouncer();
        for i in 0..20 {
            d.update(&dab(0.9), i * SEC);
        }
        assert_eq!(d.event_count(), 1);
        assert_eq!(d.state().last_fired_at_ns, Some(0));
    }

    #[test]
    fn test_cooldown_measured_from_last_fire() {
        let mut d = debouncer();
        d.update(&dab(0.9), 0);
        // Suppressed edge at 1s must not restart the cooldown clock.
        d.update(&idle(), SEC / 2);
        d.update(&dab(0.9), SEC);
        d.update(&idle(), SEC + SEC / 2);
        let third = d.update(&dab(0.9), 2 * SEC + SEC / 10);
        assert!(third.fired);
        assert_eq!(d.event_count(), 2);
    }

    #[test]
    fn test_threshold_is_strict_and_label_must_match() {
        let mut d = debouncer();
        let at_threshold = d.update(&dab(0.5), 0);
        assert!(!at_threshold.is_active);

        let wrong_label = ClassificationResult::new(
            "other",
            [("dabbing".to_string(), 0.9), ("other".to_string(), 0.95)]
                .into_iter()
                .collect(),
        );
        assert!(!d.update(&wrong_label, SEC).is_active);
        assert_eq!(d.event_count(), 0);
    }

    #[test]
    fn test_display_state_tracks_gate_every_call() {
        let mut d = debouncer();
        assert!(d.update(&dab(0.9), 0).is_active);
        let falling = d.update(&idle(), SEC / 10);
        assert!(!falling.is_active);
        assert!(!falling.fired);
        assert_eq!(d.state().label, "other");
        assert!(d.update(&dab(0.9), SEC / 5).is_active);
        assert_eq!(d.event_count(), 1);
    }

    #[test]
    fn test_hook_invoked_once_per_event() {
        let fired = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&fired);
        let mut d = debouncer();
        d.set_hook(Box::new(move |event: EventFired| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(event.event_count >= 1);
        }));

        d.update(&dab(0.9), 0);
        d.update(&dab(0.9), SEC);
        d.update(&idle(), 2 * SEC);
        d.update(&dab(0.9), 5 * SEC);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(d.event_count(), 2);
    }
}
