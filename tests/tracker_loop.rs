//! End-to-end runs of the polling loop against mock capture and input

use std::time::Duration;

use image::{GrayImage, Luma};
use marker_tracker::input::{InputEvent, MockInput};
use marker_tracker::tracker::ManualClock;
use marker_tracker::vision::MockCapture;
use marker_tracker::{
    Input, Sensitivity, Template, TemplateMatcher, TickOutcome, Tracker,
    TrackerConfig, TrackerState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104729) ^ seed).wrapping_mul(2654435761);
        Luma([(v >> 24) as u8])
    })
}

/// 40px region on a 100x100 screen with unit sensitivity
fn config() -> TrackerConfig {
    TrackerConfig::default()
        .with_screen_size(100, 100)
        .with_capture_size(40)
        .with_sensitivity(Sensitivity::new(0.55, 1.0, 1.0, 0.0))
}

fn build(
    frames: Vec<GrayImage>,
    template: GrayImage,
    input: MockInput,
) -> Tracker<MockCapture, MockInput, ManualClock> {
    build_with(config(), frames, template, input)
}

fn build_with(
    config: TrackerConfig,
    frames: Vec<GrayImage>,
    template: GrayImage,
    input: MockInput,
) -> Tracker<MockCapture, MockInput, ManualClock> {
    Tracker::new(
        config,
        MockCapture::with_frames(frames),
        TemplateMatcher::new(Template::new(template)),
        input,
        ManualClock::new(),
    )
    .unwrap()
    .with_rng(StdRng::seed_from_u64(42))
}

#[test]
fn test_confident_match_moves_and_clicks() {
    let frame = noise(40, 40, 1);
    // 8x8 marker at (28, 6): centre (32, 10), region centre (20, 20)
    let template = image::imageops::crop_imm(&frame, 28, 6, 8, 8).to_image();
    let input = MockInput::new()
        .with_held(Input::RightButton)
        .with_press_after(Input::XButton2, 6);
    let mut tracker = build(vec![frame], template, input);

    let summary = tracker.run().unwrap();

    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.captures, 3);
    assert_eq!(summary.actions, 3);
    assert!((summary.best_confidence.unwrap() - 1.0).abs() < 1e-5);
    assert_eq!(tracker.state(), TrackerState::Acting);

    let device = tracker.input().device();
    assert_eq!(device.moves(), vec![(12, -10); 3]);

    let events = device.events();
    assert_eq!(events.len(), 10);
    for action in events[..9].chunks(3) {
        assert_eq!(action[0], InputEvent::Move { dx: 12, dy: -10 });
        assert_eq!(action[1], InputEvent::LeftDown);
        assert_eq!(action[2], InputEvent::LeftUp);
    }
    assert_eq!(
        events[9],
        InputEvent::Beep {
            frequency_hz: 1000,
            duration: Duration::from_millis(10)
        }
    );

    // four poll sleeps plus three click holds of 10..=30ms
    let elapsed = tracker.clock().elapsed();
    assert!(elapsed >= Duration::from_millis(4 + 3 * 10));
    assert!(elapsed <= Duration::from_millis(4 + 3 * 30));
    assert_eq!(tracker.clock().sleep_count(), 7);
}

#[test]
fn test_never_acts_below_threshold() {
    // horizontal ramp against a vertical ramp: uncorrelated at every placement
    let frame = GrayImage::from_fn(40, 40, |x, _| Luma([(x * 6) as u8]));
    let unrelated = GrayImage::from_fn(8, 8, |_, y| Luma([(y * 30) as u8]));
    let input = MockInput::new().with_held(Input::RightButton);
    let mut tracker = build(vec![frame], unrelated, input);

    for _ in 0..20 {
        match tracker.tick().unwrap() {
            TickOutcome::Seeking { confidence } => assert_eq!(confidence, 0.0),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(tracker.state(), TrackerState::Seeking);
    assert!(tracker.input().device().events().is_empty());
    assert_eq!(tracker.summary().actions, 0);
    assert_eq!(tracker.source().requested().len(), 20);
}

#[test]
fn test_acts_at_exactly_the_threshold() {
    let frame = noise(40, 40, 8);
    let mut template = image::imageops::crop_imm(&frame, 12, 20, 8, 8).to_image();
    for (x, y) in [(1, 1), (6, 2), (3, 7)] {
        let p = template.get_pixel(x, y)[0];
        template.put_pixel(x, y, Luma([255 - p]));
    }

    let measured = TemplateMatcher::new(Template::new(template.clone()))
        .find(&frame)
        .unwrap()
        .confidence;
    assert!(measured < 1.0);

    let input = MockInput::new().with_held(Input::RightButton);
    let mut tracker = build_with(config().with_threshold(measured), vec![frame], template, input);

    match tracker.tick().unwrap() {
        TickOutcome::Acted {
            location,
            confidence,
            ..
        } => {
            assert_eq!(location, (12, 20));
            assert_eq!(confidence, measured);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(tracker.summary().actions, 1);
}

#[test]
fn test_seeking_then_acting() {
    let marked = noise(40, 40, 3);
    let template = image::imageops::crop_imm(&marked, 16, 16, 8, 8).to_image();
    let blank = GrayImage::from_pixel(40, 40, Luma([90]));
    let input = MockInput::new().with_held(Input::RightButton);
    let mut tracker = build(vec![blank, marked], template, input);

    assert_eq!(
        tracker.tick().unwrap(),
        TickOutcome::Seeking { confidence: 0.0 }
    );
    assert_eq!(tracker.state(), TrackerState::Seeking);

    match tracker.tick().unwrap() {
        TickOutcome::Acted {
            location, dx, dy, ..
        } => {
            assert_eq!(location, (16, 16));
            // marker centred on the crosshair needs no movement
            assert_eq!((dx, dy), (0, 0));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(tracker.state(), TrackerState::Acting);
}

#[test]
fn test_releasing_trigger_goes_idle() {
    let frame = noise(40, 40, 4);
    let template = image::imageops::crop_imm(&frame, 0, 0, 8, 8).to_image();
    let input = MockInput::new().with_held(Input::RightButton);
    let mut tracker = build(vec![frame], template, input);

    assert!(matches!(tracker.tick().unwrap(), TickOutcome::Acted { .. }));

    tracker.input_mut().device_mut().release(Input::RightButton);
    assert_eq!(tracker.tick().unwrap(), TickOutcome::Idle);
    assert_eq!(tracker.state(), TrackerState::Idle);
    assert_eq!(tracker.source().requested().len(), 1);
}

#[test]
fn test_exit_stops_within_one_tick() {
    let blank = GrayImage::from_pixel(40, 40, Luma([0]));
    // two polls per tick; the exit input goes down after poll 5
    let input = MockInput::new()
        .with_held(Input::RightButton)
        .with_press_after(Input::XButton2, 5);
    let mut tracker = build(vec![blank], noise(8, 8, 5), input);

    let summary = tracker.run().unwrap();

    // asserted during tick 3, observed at the start of tick 4
    assert_eq!(summary.ticks, 4);
    assert_eq!(tracker.input().device().poll_count(), 7);
    assert_eq!(tracker.clock().elapsed(), Duration::from_millis(4));
    assert_eq!(tracker.input().device().events().len(), 1);
}

#[test]
fn test_capture_failure_ends_run() {
    let mut tracker = Tracker::new(
        config(),
        MockCapture::failing(),
        TemplateMatcher::new(Template::new(noise(8, 8, 6))),
        MockInput::new().with_held(Input::RightButton),
        ManualClock::new(),
    )
    .unwrap();

    let err = tracker.run().unwrap_err();
    assert!(err.to_string().contains("screen capture failed"));
    assert_eq!(tracker.summary().ticks, 1);
}

#[test]
fn test_tracker_from_toml_config() {
    let config = TrackerConfig::from_toml_str(
        r#"
        screen_width = 100
        screen_height = 100
        capture_size = 40
        exit = "escape"
        "#,
    )
    .unwrap();
    let mut tracker = Tracker::new(
        config,
        MockCapture::failing(),
        TemplateMatcher::new(Template::new(noise(8, 8, 7))),
        MockInput::new().with_held(Input::Escape),
        ManualClock::new(),
    )
    .unwrap();

    assert_eq!(tracker.region().as_tuple(), (30, 30, 40, 40));
    assert_eq!(tracker.tick().unwrap(), TickOutcome::Exit);
}
