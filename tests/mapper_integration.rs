//! Integration tests for the mapper pipeline.
//!
//! These drive the public API end to end: pointer samples through the motion
//! transform and axis state out to a recording sink, and hotkey presses
//! through the reset/decay logic.

use std::sync::Arc;
use std::time::{Duration, Instant};

use evdev::Key;
use joystickify::{
    AxisId, AxisSink, EmulationState, JoystickError, Mapper, MapperConfig, MapperError,
    AXIS_CENTER, AXIS_MAX, AXIS_MIN,
};
use parking_lot::Mutex;

const PRESS: i32 = 1;
const HOTKEY: Key = Key::KEY_F8;

/// Records every published (x, y) pair; clones share the log
#[derive(Clone, Default)]
struct Recorder {
    frames: Arc<Mutex<Vec<(i32, i32)>>>,
}

impl Recorder {
    fn frames(&self) -> Vec<(i32, i32)> {
        self.frames.lock().clone()
    }

    fn last(&self) -> Option<(i32, i32)> {
        self.frames.lock().last().copied()
    }
}

impl AxisSink for Recorder {
    fn set_axis(&mut self, axis: AxisId, value: i32) -> Result<(), JoystickError> {
        self.set_axes(&[(axis, value)])
    }

    fn set_axes(&mut self, values: &[(AxisId, i32)]) -> Result<(), JoystickError> {
        let mut frame = (AXIS_CENTER, AXIS_CENTER);
        for &(axis, value) in values {
            match axis {
                AxisId::X => frame.0 = value,
                AxisId::Y => frame.1 = value,
            }
        }
        self.frames.lock().push(frame);
        Ok(())
    }
}

/// Fails every write after the first `ok_writes`
struct FailingSink {
    ok_writes: usize,
}

impl AxisSink for FailingSink {
    fn set_axis(&mut self, _axis: AxisId, _value: i32) -> Result<(), JoystickError> {
        if self.ok_writes == 0 {
            return Err(JoystickError::EmitEvent(std::io::Error::other(
                "device gone",
            )));
        }
        self.ok_writes -= 1;
        Ok(())
    }
}

/// Fails only the write with index `fail_at`
struct FlakySink {
    writes: usize,
    fail_at: usize,
}

impl AxisSink for FlakySink {
    fn set_axis(&mut self, _axis: AxisId, _value: i32) -> Result<(), JoystickError> {
        let index = self.writes;
        self.writes += 1;
        if index == self.fail_at {
            return Err(JoystickError::EmitEvent(std::io::Error::other(
                "transient write failure",
            )));
        }
        Ok(())
    }
}

fn no_dead_zone() -> MapperConfig {
    MapperConfig {
        dead_zone: 0,
        ..Default::default()
    }
}

fn fast_decay(speed: i32) -> MapperConfig {
    MapperConfig {
        smooth_reset_speed: speed,
        smooth_reset_interval_ms: 1,
        ..no_dead_zone()
    }
}

fn new_mapper(config: MapperConfig) -> (Mapper<Recorder>, Recorder) {
    let recorder = Recorder::default();
    (Mapper::new(config, HOTKEY, recorder.clone()), recorder)
}

/// Push X to `CENTER + 50 * dx` with sensitivity 0.5
fn push_x(mapper: &Mapper<Recorder>, dx: f64) {
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(dx, 0.0, 1.0).unwrap();
}

async fn wait_until(what: &str, mut ready: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !ready() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// ── Motion ──

#[test]
fn baseline_then_move_scales_delta() {
    let (mapper, recorder) = new_mapper(MapperConfig::default());
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(10.0, 0.0, 1.0).unwrap();

    assert_eq!(mapper.axes().x(), AXIS_CENTER + 500);
    assert_eq!(mapper.axes().y(), AXIS_CENTER);
    // 500 is inside the default 2000 dead zone
    assert_eq!(recorder.last(), Some((AXIS_CENTER, AXIS_CENTER)));
}

#[test]
fn sub_threshold_motion_is_discarded_not_carried() {
    let (mapper, _) = new_mapper(MapperConfig::default());
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(0.5, 0.0, 1.0).unwrap();
    mapper.handle_move(1.0, 0.0, 2.0).unwrap();
    assert_eq!(mapper.axes().x(), AXIS_CENTER);
}

#[test]
fn max_speed_caps_before_scaling() {
    let (mapper, _) = new_mapper(MapperConfig {
        max_speed_enabled: true,
        max_speed: 100.0,
        ..no_dead_zone()
    });
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(-1000.0, 0.0, 1.0).unwrap();
    // dx capped to -100, scaled by 0.5 * 100
    assert_eq!(mapper.axes().x(), AXIS_CENTER - 5000);
}

#[test]
fn axes_stay_in_range_under_large_motion() {
    let (mapper, recorder) = new_mapper(no_dead_zone());
    let mut x = 0.0;
    mapper.handle_move(x, 0.0, 0.0).unwrap();
    for i in 1..=50 {
        x += if i % 7 == 0 { -5000.0 } else { 2500.0 };
        mapper.handle_move(x, -x, f64::from(i)).unwrap();
        let axes = mapper.axes();
        assert!((AXIS_MIN..=AXIS_MAX).contains(&axes.x()));
        assert!((AXIS_MIN..=AXIS_MAX).contains(&axes.y()));
    }
    assert_eq!(mapper.axes().x(), AXIS_MAX);
    assert_eq!(mapper.axes().y(), AXIS_MIN);
    assert!(recorder
        .frames()
        .iter()
        .all(|&(x, y)| (AXIS_MIN..=AXIS_MAX).contains(&x) && (AXIS_MIN..=AXIS_MAX).contains(&y)));
}

#[test]
fn vertical_disabled_keeps_y_centered() {
    let (mapper, recorder) = new_mapper(MapperConfig {
        vertical_movement_enabled: false,
        ..no_dead_zone()
    });
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(40.0, 400.0, 1.0).unwrap();
    assert_eq!(mapper.axes().y(), AXIS_CENTER);
    assert_eq!(recorder.last(), Some((AXIS_CENTER + 2000, AXIS_CENTER)));
}

// ── Toggle and reset ──

#[tokio::test]
async fn toggle_discards_stale_sample() {
    let (mapper, _) = new_mapper(MapperConfig {
        smooth_reset_enabled: false,
        ..no_dead_zone()
    });
    push_x(&mapper, 10.0);
    assert_eq!(
        mapper.handle_key(HOTKEY, PRESS).unwrap(),
        Some(EmulationState::Disabled)
    );
    assert_eq!(
        mapper.handle_key(HOTKEY, PRESS).unwrap(),
        Some(EmulationState::Enabled)
    );

    // Far from the pre-disable position: only a new baseline
    mapper.handle_move(900.0, 900.0, 5.0).unwrap();
    assert!(mapper.axes().is_centered());

    mapper.handle_move(910.0, 900.0, 6.0).unwrap();
    assert_eq!(mapper.axes().x(), AXIS_CENTER + 500);
}

#[tokio::test(flavor = "multi_thread")]
async fn smooth_reset_converges_monotonically() {
    let (mapper, recorder) = new_mapper(fast_decay(2));
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(100.0, -60.0, 1.0).unwrap();
    assert_eq!(mapper.axes().x(), AXIS_CENTER + 5000);
    assert_eq!(mapper.axes().y(), AXIS_CENTER - 3000);
    let before = recorder.frames().len();

    mapper.handle_key(HOTKEY, PRESS).unwrap();
    wait_until("decay to finish", || !mapper.is_decaying()).await;

    assert!(mapper.axes().is_centered());
    let decay_frames = &recorder.frames()[before..];
    assert!(!decay_frames.is_empty());
    let mut previous = (AXIS_CENTER + 5000, AXIS_CENTER - 3000);
    for &(x, y) in decay_frames {
        assert!(x <= previous.0 && x >= AXIS_CENTER, "x overshoot: {x}");
        assert!(y >= previous.1 && y <= AXIS_CENTER, "y overshoot: {y}");
        previous = (x, y);
    }
    assert_eq!(previous, (AXIS_CENTER, AXIS_CENTER));
}

#[tokio::test(flavor = "multi_thread")]
async fn re_enable_halts_decay_without_snapping() {
    let (mapper, _) = new_mapper(MapperConfig {
        smooth_reset_speed: 500,
        smooth_reset_interval_ms: 5,
        ..no_dead_zone()
    });
    push_x(&mapper, 100.0);

    mapper.handle_key(HOTKEY, PRESS).unwrap();
    assert!(mapper.is_decaying());
    tokio::time::sleep(Duration::from_millis(30)).await;
    mapper.handle_key(HOTKEY, PRESS).unwrap();
    wait_until("decay to notice re-enable", || !mapper.is_decaying()).await;

    let x = mapper.axes().x();
    assert!(x < AXIS_CENTER + 5000, "decay never stepped");
    assert!(x > AXIS_CENTER, "decay ran to completion or snapped");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(mapper.axes().x(), x);
}

#[tokio::test(flavor = "multi_thread")]
async fn disabling_again_reuses_running_decay() {
    let (mapper, _) = new_mapper(MapperConfig {
        smooth_reset_speed: 500,
        smooth_reset_interval_ms: 50,
        ..no_dead_zone()
    });
    push_x(&mapper, 100.0);

    mapper.handle_key(HOTKEY, PRESS).unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    mapper.handle_key(HOTKEY, PRESS).unwrap();
    mapper.handle_key(HOTKEY, PRESS).unwrap();
    assert_eq!(mapper.state(), EmulationState::Disabled);
    // The first task is asleep between steps and resumes decaying
    assert!(mapper.is_decaying());
    mapper.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_waits_for_decay_and_leaves_axes() {
    let (mapper, _) = new_mapper(MapperConfig {
        smooth_reset_speed: 500,
        smooth_reset_interval_ms: 5,
        ..no_dead_zone()
    });
    push_x(&mapper, 100.0);
    mapper.handle_key(HOTKEY, PRESS).unwrap();
    tokio::time::sleep(Duration::from_millis(15)).await;

    tokio::time::timeout(Duration::from_secs(1), mapper.stop())
        .await
        .expect("stop should return within one decay step")
        .unwrap();
    assert!(!mapper.is_decaying());
    let x = mapper.axes().x();
    assert!(x > AXIS_CENTER && x < AXIS_CENTER + 5000);

    // Events are ignored once stopping
    assert_eq!(mapper.handle_key(HOTKEY, PRESS).unwrap(), None);
    assert_eq!(mapper.state(), EmulationState::Disabled);
    push_x(&mapper, 10.0);
    assert_eq!(mapper.axes().x(), x);
}

#[tokio::test(flavor = "multi_thread")]
async fn decay_device_error_surfaces_on_stop() {
    // Two writes for the initial move, then the first decay step fails
    let mapper = Mapper::new(fast_decay(2), HOTKEY, FailingSink { ok_writes: 2 });
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(100.0, 0.0, 1.0).unwrap();

    mapper.handle_key(HOTKEY, PRESS).unwrap();
    wait_until("decay to fail", || !mapper.is_decaying()).await;

    assert!(matches!(
        mapper.stop().await,
        Err(MapperError::Device(JoystickError::EmitEvent(_)))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn decay_error_survives_later_toggles() {
    // Two writes for the move, then only the first decay write fails
    let mapper = Mapper::new(
        fast_decay(2),
        HOTKEY,
        FlakySink {
            writes: 0,
            fail_at: 2,
        },
    );
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    mapper.handle_move(100.0, 0.0, 1.0).unwrap();

    mapper.handle_key(HOTKEY, PRESS).unwrap();
    tokio::time::timeout(Duration::from_secs(1), mapper.decay_failed())
        .await
        .expect("decay failure should be signalled");
    assert!(!mapper.is_decaying());

    // The sink has recovered, but the failure is still reported
    assert_eq!(
        mapper.handle_key(HOTKEY, PRESS).unwrap(),
        Some(EmulationState::Enabled)
    );
    assert!(matches!(
        mapper.handle_key(HOTKEY, PRESS),
        Err(JoystickError::DecayFailed)
    ));
    assert!(!mapper.is_decaying());
    assert!(!mapper.axes().is_centered());

    assert!(matches!(
        mapper.stop().await,
        Err(MapperError::Device(JoystickError::EmitEvent(_)))
    ));
}

#[test]
fn move_device_error_propagates() {
    let mapper = Mapper::new(no_dead_zone(), HOTKEY, FailingSink { ok_writes: 0 });
    mapper.handle_move(0.0, 0.0, 0.0).unwrap();
    assert!(mapper.handle_move(10.0, 0.0, 1.0).is_err());
}

// ── Concurrency ──

#[tokio::test(flavor = "multi_thread")]
async fn rapid_toggling_always_ends_centered() {
    let (mapper, _) = new_mapper(fast_decay(2));

    for round in 0..100 {
        if round > 0 {
            assert_eq!(
                mapper.handle_key(HOTKEY, PRESS).unwrap(),
                Some(EmulationState::Enabled)
            );
        }
        push_x(&mapper, 100.0);
        assert_eq!(mapper.axes().x(), AXIS_CENTER + 5000);

        // off, on, off: the last disable may land while the first task exits
        for _ in 0..3 {
            mapper.handle_key(HOTKEY, PRESS).unwrap();
        }
        assert_eq!(mapper.state(), EmulationState::Disabled);
        wait_until("axes to return to center", || mapper.axes().is_centered()).await;
    }

    wait_until("decay to finish", || !mapper.is_decaying()).await;
    mapper.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_moves_and_decay_publish_consistent_frames() {
    // Every sample lies on y == -x and the output dead zone is off, so any
    // frame built from a single state satisfies x + y == 2 * CENTER
    let (mapper, recorder) = new_mapper(fast_decay(3));
    let mapper = Arc::new(mapper);

    let movers: Vec<_> = (0..3)
        .map(|worker| {
            let mapper = Arc::clone(&mapper);
            tokio::spawn(async move {
                for i in 0..400u32 {
                    let p = f64::from((i * 37 + worker * 11) % 500) - 250.0;
                    mapper
                        .handle_move(p, -p, f64::from(i) * 0.01)
                        .expect("recorder never fails");
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    let toggler = {
        let mapper = Arc::clone(&mapper);
        tokio::spawn(async move {
            for _ in 0..10 {
                mapper.handle_key(HOTKEY, PRESS).expect("recorder never fails");
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    for task in movers {
        task.await.unwrap();
    }
    toggler.await.unwrap();
    mapper.stop().await.unwrap();

    let frames = recorder.frames();
    assert!(frames.iter().any(|&(x, _)| x != AXIS_CENTER));
    for (x, y) in frames {
        assert!((AXIS_MIN..=AXIS_MAX).contains(&x), "x out of range: {x}");
        assert_eq!(x + y, 2 * AXIS_CENTER, "torn frame ({x}, {y})");
    }
    let axes = mapper.axes();
    assert_eq!(axes.x() + axes.y(), 2 * AXIS_CENTER);
}
