use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use posewatch_action_core::debounce::EventFired;
use posewatch_action_core::inference::ScriptedClassifier;
use posewatch_action_core::pipeline::{FnPublisher, PublishedState};
use posewatch_action_core::{FeatureEncoder, PipelineOrchestrator};
use posewatch_common::config::PipelineConfig;
use posewatch_pose_model::joint::Joint;
use posewatch_pose_model::observation::{parse_header, parse_observations, KeypointObservation};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-session")
        .join(name);
    std::fs::read_to_string(path).expect("fixture should be readable")
}

fn load_poses() -> Vec<KeypointObservation> {
    parse_observations(&fixture("poses.jsonl")).expect("fixture poses should parse")
}

fn load_classifier() -> ScriptedClassifier {
    ScriptedClassifier::from_jsonl(&fixture("results.jsonl")).expect("fixture results should parse")
}

#[test]
fn fixture_header_describes_stream() {
    let header = parse_header(&fixture("poses.jsonl")).expect("fixture has a header");
    assert_eq!(header.frame_rate_hz, Some(30.0));
    assert_eq!(load_poses().len(), 150);
}

#[test]
fn fixture_session_counts_two_debounced_dabs() {
    let poses = load_poses();
    let classifier = load_classifier();
    assert_eq!(classifier.remaining(), poses.len() - 59);

    let fired: Arc<Mutex<Vec<EventFired>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    let published = Arc::new(Mutex::new(0u64));
    let counter = Arc::clone(&published);

    let mut pipeline = PipelineOrchestrator::new(&PipelineConfig::default(), Some(Box::new(classifier)))
        .unwrap()
        .with_event_hook(Box::new(move |event: EventFired| sink.lock().unwrap().push(event)))
        .with_publisher(Box::new(FnPublisher(move |_: Arc<PublishedState>| {
            *counter.lock().unwrap() += 1;
        })));

    let mut active_frames = 0;
    for observation in poses {
        let state = pipeline.ingest(observation);
        if state.is_active {
            active_frames += 1;
        }
    }

    let fired = fired.lock().unwrap();
    assert_eq!(fired.len(), 2);
    assert_eq!(fired[0].fired_at_ns, 59 * 33_333_333);
    assert_eq!(fired[1].fired_at_ns, 120 * 33_333_333);

    let state = pipeline.state();
    assert_eq!(state.event_count, 2);
    assert_eq!(state.frames_processed, 150);
    assert_eq!(state.label, "other");
    assert!(!state.is_active);
    assert_eq!(active_frames, 6 + 6 + 11);
    assert_eq!(pipeline.inference_failures(), 1);
    assert_eq!(*published.lock().unwrap(), 150);
}

#[test]
fn fixture_display_state_is_smoothed() {
    let poses = load_poses();
    let raw_last = poses.last().cloned().unwrap();
    let mut pipeline = PipelineOrchestrator::new(&PipelineConfig::default(), None).unwrap();
    for observation in poses {
        pipeline.ingest(observation);
    }

    let state = pipeline.state();
    let smoothed = state.joints[&Joint::LeftElbow];
    let raw = raw_last.joints[&Joint::LeftElbow];
    assert!((smoothed.y - raw.y).abs() < 0.01);

    // Low-confidence right wrist is never blended.
    assert_eq!(state.joints[&Joint::RightWrist], raw_last.joints[&Joint::RightWrist]);
}

#[test]
fn fixture_window_encodes_synthetic_neck() {
    let poses = load_poses();
    let encoder = FeatureEncoder::new(60, 0.1);
    let tensor = encoder.encode(&poses[..60]);
    assert_eq!(tensor.shape(), [60, 3, 18]);
    // Neck slot sits midway between the shoulders.
    assert!((tensor.get(0, 0, 1) - 0.5).abs() < 1e-6);
    assert!((tensor.get(0, 1, 1) - 0.65).abs() < 1e-6);
    assert!((tensor.get(0, 2, 1) - 0.88).abs() < 1e-6);
}
