/// Integration tests for the jump tracker
///
/// Run with: cargo test -p jump_detector --test integration_tests -- --nocapture

use std::io::Write;
use std::time::{Duration, Instant};

use jump_detector::{
    mjpeg, DetectorConfig, JumpPhase, JumpTracker, Keypoint, Landmarks, Session, TrackerEvent,
};

const FRAME_H: u32 = 480;

fn ms(t0: Instant, millis: u64) -> Instant {
    t0 + Duration::from_millis(millis)
}

/// Stand at 0.60, rise to 0.45, come back to 0.60 after `air_ms`.
fn jump(tracker: &mut JumpTracker, t0: Instant, start_ms: u64, air_ms: u64) -> Vec<TrackerEvent> {
    vec![
        tracker.step(0.60, FRAME_H, ms(t0, start_ms)),
        tracker.step(0.45, FRAME_H, ms(t0, start_ms + 33)),
        tracker.step(0.44, FRAME_H, ms(t0, start_ms + 33 + air_ms / 2)),
        tracker.step(0.60, FRAME_H, ms(t0, start_ms + 33 + air_ms)),
    ]
}

#[test]
fn test_single_valid_jump() {
    println!("\n=== Test: Single Valid Jump ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();

    assert_eq!(tracker.update(0.60, FRAME_H, t0), None);
    assert_eq!(tracker.update(0.45, FRAME_H, ms(t0, 33)), None);
    assert_eq!(tracker.phase(), JumpPhase::Airborne);

    let record = tracker
        .update(0.60, FRAME_H, ms(t0, 333))
        .expect("landing after 300ms should emit a record");

    println!("✓ record: {:?}", record);
    assert_eq!(record.sequence_number, 1);
    assert!((record.air_time - 0.3).abs() < 1e-9);
    // |0.60 - 0.45| * 480 * 0.01 = 0.72
    assert!((record.height_m - 0.72).abs() < 1e-6);
    assert_eq!(tracker.records().len(), 1);
    assert_eq!(tracker.phase(), JumpPhase::Grounded);
}

#[test]
fn test_short_flight_is_discarded() {
    println!("\n=== Test: Short Flight Discarded ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();

    let events = jump(&mut tracker, t0, 0, 100);
    assert!(
        matches!(events.last(), Some(TrackerEvent::TooShort { .. })),
        "expected TooShort, got {:?}",
        events.last()
    );
    assert!(tracker.records().is_empty());
    assert_eq!(tracker.phase(), JumpPhase::Grounded);
    println!("✓ no record for a 100ms flight");
}

#[test]
fn test_sequence_numbers_have_no_gaps() {
    println!("\n=== Test: Sequence Numbers ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();

    // a short hop between the valid jumps must not consume a number
    jump(&mut tracker, t0, 0, 300);
    jump(&mut tracker, t0, 1_000, 50);
    jump(&mut tracker, t0, 2_000, 400);
    jump(&mut tracker, t0, 3_000, 250);

    let seq: Vec<u32> = tracker.records().iter().map(|r| r.sequence_number).collect();
    println!("✓ sequence: {:?}", seq);
    assert_eq!(seq, vec![1, 2, 3]);
}

#[test]
fn test_height_is_non_negative() {
    println!("\n=== Test: Height Non-Negative ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();
    let mut t = 0;

    // landings well below the takeoff point and just past the landing band
    for landing in [0.69_f32, 0.52, 0.66] {
        tracker.step(0.60, FRAME_H, ms(t0, t));
        tracker.step(0.45, FRAME_H, ms(t0, t + 10));
        tracker.step(landing, FRAME_H, ms(t0, t + 500));
        t += 1_000;
    }

    assert_eq!(tracker.records().len(), 3);
    for r in tracker.records() {
        assert!(r.height_m >= 0.0, "negative height in {:?}", r);
    }
    println!("✓ all heights >= 0");
}

#[test]
fn test_missing_landmarks_leave_state_untouched() {
    println!("\n=== Test: Missing Landmarks ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();
    tracker.step(0.60, FRAME_H, t0);
    tracker.step(0.45, FRAME_H, ms(t0, 33));

    let before_ref = tracker.reference_y();
    let before_phase = tracker.phase();
    let before = tracker.summary();

    // frames without a pose never reach the tracker
    let frames: Vec<Option<Landmarks>> = vec![None; 30];
    for (i, lm) in frames.iter().enumerate() {
        if let Some(y) = lm.as_ref().and_then(Landmarks::pelvis_y) {
            tracker.update(y, FRAME_H, ms(t0, 66 + i as u64 * 33));
        }
    }

    assert_eq!(tracker.reference_y(), before_ref);
    assert_eq!(tracker.phase(), before_phase);
    assert_eq!(tracker.summary(), before);

    // and the interrupted jump still completes
    let rec = tracker.update(0.60, FRAME_H, ms(t0, 1_200));
    assert!(rec.is_some());
    println!("✓ 30 empty frames were a no-op");
}

#[test]
fn test_grounded_reference_follows_drift() {
    println!("\n=== Test: Grounded Drift ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();

    // slow downward drift of 0.02 per frame never crosses the threshold
    let mut y = 0.40;
    for i in 0..20 {
        let ev = tracker.step(y, FRAME_H, ms(t0, i * 33));
        assert!(matches!(ev, TrackerEvent::Anchored { .. } | TrackerEvent::Holding));
        y += 0.02;
    }
    assert_eq!(tracker.phase(), JumpPhase::Grounded);
    assert!((tracker.reference_y().unwrap() - (y - 0.02)).abs() < 1e-5);

    // slow upward drift never triggers takeoff either
    for i in 20..40 {
        y -= 0.05;
        tracker.step(y, FRAME_H, ms(t0, i * 33));
    }
    assert_eq!(tracker.phase(), JumpPhase::Grounded);
    println!("✓ baseline tracked the drift");
}

#[test]
fn test_rearm_keeps_records_and_numbering() {
    println!("\n=== Test: Rearm ===");
    let mut tracker = JumpTracker::default();
    let t0 = Instant::now();

    jump(&mut tracker, t0, 0, 300);
    tracker.step(0.60, FRAME_H, ms(t0, 500));
    tracker.step(0.45, FRAME_H, ms(t0, 533));
    assert_eq!(tracker.phase(), JumpPhase::Airborne);

    tracker.rearm();
    assert_eq!(tracker.phase(), JumpPhase::Grounded);
    assert_eq!(tracker.reference_y(), None);
    assert_eq!(tracker.records().len(), 1);

    // first observation after rearm only re-anchors
    let ev = tracker.step(0.30, FRAME_H, ms(t0, 2_000));
    assert_eq!(ev, TrackerEvent::Anchored { reference_y: 0.30 });

    jump(&mut tracker, t0, 3_000, 300);
    let seq: Vec<u32> = tracker.records().iter().map(|r| r.sequence_number).collect();
    assert_eq!(seq, vec![1, 2]);
    println!("✓ numbering continued after rearm");
}

#[test]
fn test_pelvis_is_hip_midpoint() {
    let mut points = vec![Keypoint::new(0.5, 0.1, 0.9); 33];
    points[23] = Keypoint::new(0.45, 0.60, 0.9);
    points[24] = Keypoint::new(0.55, 0.70, 0.7);
    let lm = Landmarks::new(points, 23, 24);

    assert!((lm.pelvis_y().unwrap() - 0.65).abs() < 1e-6);
    assert!((lm.hip_score().unwrap() - 0.8).abs() < 1e-6);

    let short = Landmarks::new(vec![Keypoint::new(0.0, 0.0, 1.0); 17], 23, 24);
    assert_eq!(short.pelvis_y(), None);
}

#[test]
fn test_summary_and_json_shape() {
    println!("\n=== Test: Summary JSON ===");
    let mut tracker = JumpTracker::default();
    assert_eq!(tracker.summary().jump_count, 0);
    assert_eq!(tracker.summary().last_height, 0.0);

    let t0 = Instant::now();
    jump(&mut tracker, t0, 0, 300);
    jump(&mut tracker, t0, 1_000, 500);

    let summary = tracker.summary();
    assert_eq!(summary.jump_count, 2);
    assert_eq!(summary.last_air_time, 0.5);

    let v = serde_json::to_value(&summary).expect("Should serialize to JSON");
    assert_eq!(v["jump_count"], 2);
    assert_eq!(v["all_jumps"][1]["count"], 2);
    assert!(v["all_jumps"][0]["height"].is_number());
    assert!(v["all_jumps"][0]["air_time"].is_number());
    println!("✓ {}", v);
}

#[test]
fn test_session_snapshot_sees_writes() {
    println!("\n=== Test: Session Snapshot ===");
    let session = Session::default();
    let t0 = Instant::now();

    let mut stream = session.stream();
    stream.step(0.60, FRAME_H, t0);
    stream.step(0.45, FRAME_H, ms(t0, 33));
    stream.step(0.60, FRAME_H, ms(t0, 333));
    assert_eq!(session.summary().jump_count, 1);
    println!("✓ reader sees the landed jump");

    // a stream that goes away mid-flight leaves the log as it was
    stream.step(0.60, FRAME_H, ms(t0, 900));
    stream.step(0.45, FRAME_H, ms(t0, 933));
    assert_eq!(stream.phase(), JumpPhase::Airborne);
    drop(stream);

    let fresh = session.stream();
    assert_eq!(fresh.phase(), JumpPhase::Grounded);
    assert_eq!(session.summary().jump_count, 1);
    println!("✓ new stream starts grounded, records kept");
}

#[test]
fn test_interleaved_streams_keep_their_own_flight() {
    println!("\n=== Test: Interleaved Streams ===");
    let session = Session::default();
    let t0 = Instant::now();

    let mut a = session.stream();
    a.step(0.60, FRAME_H, t0);
    assert!(matches!(a.step(0.45, FRAME_H, ms(t0, 33)), TrackerEvent::Started { .. }));

    // a second viewer connects while the first is mid-air
    let mut b = session.stream();
    assert!(matches!(b.step(0.70, FRAME_H, ms(t0, 100)), TrackerEvent::Anchored { .. }));
    assert_eq!(a.phase(), JumpPhase::Airborne);
    assert_eq!(b.phase(), JumpPhase::Grounded);

    let first = a
        .step(0.60, FRAME_H, ms(t0, 400))
        .into_record()
        .expect("first stream's flight should survive the second viewer");
    assert_eq!(first.sequence_number, 1);
    assert_eq!(first.air_time, 0.37);
    println!("✓ stream A landed: {:?}", first);

    b.step(0.55, FRAME_H, ms(t0, 500));
    let second = b
        .step(0.70, FRAME_H, ms(t0, 900))
        .into_record()
        .expect("second stream should record its own jump");
    assert_eq!(second.sequence_number, 2);
    println!("✓ stream B landed: {:?}", second);

    let summary = session.summary();
    let numbers: Vec<u32> = summary.all_jumps.iter().map(|r| r.sequence_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(summary.last_air_time, 0.4);
}

#[test]
fn test_multipart_part_framing() {
    let jpeg = [0xFF_u8, 0xD8, 0x01, 0x02, 0xFF, 0xD9];
    let part = mjpeg::multipart_part(&jpeg);

    let header = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    assert!(part.starts_with(header));
    assert_eq!(&part[header.len()..header.len() + jpeg.len()], &jpeg);
    assert!(part.ends_with(b"\xFF\xD9\r\n"));
    assert_eq!(part.len(), header.len() + jpeg.len() + 2);
    assert_eq!(mjpeg::CONTENT_TYPE, "multipart/x-mixed-replace; boundary=frame");
}

#[test]
fn test_config_defaults_and_file() {
    println!("\n=== Test: Config ===");
    let cfg = DetectorConfig::default();
    assert_eq!(cfg.jump_threshold, 0.1);
    assert_eq!(cfg.min_jump_time_s, 0.2);
    assert_eq!(cfg.pixel_to_meters, 0.01);
    assert_eq!((cfg.frame_width, cfg.frame_height), (640, 480));
    assert!(cfg.validate().is_ok());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "jump_threshold": 0.15, "camera_index": 2 }}"#).unwrap();
    let loaded = DetectorConfig::load(file.path()).expect("partial config should load");
    assert_eq!(loaded.jump_threshold, 0.15);
    assert_eq!(loaded.camera_index, 2);
    assert_eq!(loaded.min_jump_time_s, 0.2);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, r#"{{ "jump_threshold": -1.0 }}"#).unwrap();
    assert!(DetectorConfig::load(bad.path()).is_err());

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    write!(garbage, "not json").unwrap();
    assert!(DetectorConfig::load(garbage.path()).is_err());

    assert!(DetectorConfig::load("/nonexistent/jump.json").is_err());
    println!("✓ config loading behaves");
}

#[test]
fn test_custom_threshold_changes_sensitivity() {
    let cfg = DetectorConfig {
        jump_threshold: 0.2,
        ..DetectorConfig::default()
    };
    let mut tracker = JumpTracker::from_config(&cfg);
    let t0 = Instant::now();

    // a 0.15 rise is below the 0.2 threshold
    let events = jump(&mut tracker, t0, 0, 300);
    assert!(events.iter().all(|e| !matches!(e, TrackerEvent::Started { .. })));
    assert!(tracker.records().is_empty());
}
