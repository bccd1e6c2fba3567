//! Control loop integration tests.
//!
//! A test owns both tracking segments in place of the tracking process and
//! hands the loop a recording actuator. The recorder notes, at each homing
//! move, whether the close signal was already visible in shared memory.

use nozzle_common::actuator::{ActuatorError, ActuatorPort};
use nozzle_common::config::{ActuatorConfig, TrackingConfig};
use nozzle_common::shm::layout::{CloseSignal, TrackingFrame};
use nozzle_control::{ControlError, ControlLoop, CorridorId, FrameDiscontinuity, LoopPhase};
use nozzle_hal::DriverRegistry;
use nozzle_shared_memory::SharedSegment;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Configure(f64, f64),
    MoveTo { angle: f64, close_signalled: bool },
    MoveBy(f64),
    GetPosition,
    Close,
}

type CallLog = Arc<Mutex<Vec<Call>>>;

struct RecordingActuator {
    log: CallLog,
    position: f64,
    signals: Option<SharedSegment<CloseSignal>>,
    fail_configure: bool,
    /// Fail the n-th `move_by` (1-based).
    fail_move_by_at: Option<usize>,
    move_by_calls: usize,
}

impl RecordingActuator {
    fn new(log: CallLog, signal_segment: Option<&str>) -> Self {
        Self {
            log,
            position: 0.0,
            signals: signal_segment.map(|name| SharedSegment::open(name).expect("open signals")),
            fail_configure: false,
            fail_move_by_at: None,
            move_by_calls: 0,
        }
    }
}

impl ActuatorPort for RecordingActuator {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn configure(&mut self, velocity: f64, acceleration: f64) -> Result<(), ActuatorError> {
        self.log.lock().push(Call::Configure(velocity, acceleration));
        if self.fail_configure {
            return Err(ActuatorError::CommunicationError("no answer".into()));
        }
        Ok(())
    }

    fn move_to(&mut self, _axis: usize, angle: f64) -> Result<(), ActuatorError> {
        let close_signalled = self
            .signals
            .as_ref()
            .is_some_and(|s| s.read().is_close_requested());
        self.log.lock().push(Call::MoveTo {
            angle,
            close_signalled,
        });
        self.position = angle;
        Ok(())
    }

    fn move_by(&mut self, _axis: usize, delta: f64) -> Result<(), ActuatorError> {
        self.log.lock().push(Call::MoveBy(delta));
        self.move_by_calls += 1;
        if self.fail_move_by_at == Some(self.move_by_calls) {
            return Err(ActuatorError::CommunicationError("stage unplugged".into()));
        }
        self.position += delta;
        Ok(())
    }

    fn get_position(&mut self, _axis: usize) -> Result<f64, ActuatorError> {
        self.log.lock().push(Call::GetPosition);
        Ok(self.position)
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        self.log.lock().push(Call::Close);
        Ok(())
    }
}

/// Stand-in for the tracking process.
struct Tracker {
    state: SharedSegment<TrackingFrame>,
    signals: SharedSegment<CloseSignal>,
    config: TrackingConfig,
}

impl Tracker {
    fn new(tag: &str) -> Self {
        let config = tracking_config(tag);
        Self {
            state: SharedSegment::create(&config.state_segment).expect("create state"),
            signals: SharedSegment::create(&config.signal_segment).expect("create signals"),
            config,
        }
    }

    fn publish(&mut self, frame_cnt: i32, heading: f64, posy: f64) {
        self.state.write(TrackingFrame {
            frame_cnt,
            heading,
            posy,
            seq_num: frame_cnt,
            ..Default::default()
        });
    }
}

fn tracking_config(tag: &str) -> TrackingConfig {
    let pid = std::process::id();
    TrackingConfig {
        state_segment: format!("nozzle_loop_{tag}_{pid}"),
        signal_segment: format!("nozzle_loop_{tag}_{pid}_SIGNALS"),
    }
}

fn actuator_config() -> ActuatorConfig {
    ActuatorConfig {
        driver: "recording".into(),
        settle_ms: 0,
        park_ms: 0,
        ..Default::default()
    }
}

fn control_loop(tracker: &Tracker, actuator: RecordingActuator) -> ControlLoop {
    ControlLoop::new(
        Box::new(actuator),
        actuator_config(),
        tracker.config.clone(),
    )
}

fn closes(log: &CallLog) -> usize {
    log.lock().iter().filter(|c| **c == Call::Close).count()
}

#[test]
fn test_startup_homes_then_seeds() {
    let mut tracker = Tracker::new("startup");
    tracker.publish(5, 0.0, 2.0);
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));

    control.start().expect("start");
    assert_eq!(control.phase(), LoopPhase::Running);
    assert_eq!(
        *log.lock(),
        vec![
            Call::Configure(500.0, 500.0),
            Call::MoveTo {
                angle: -32.0,
                close_signalled: false
            },
        ]
    );

    let state = control.state().expect("seeded");
    assert_eq!(state.last_frame_count, 5);
    assert_eq!(state.switch_pos_y, 2.0);
    assert_eq!(state.last_corridor_id, CorridorId::One);

    control.stop().expect("stop");
}

#[test]
fn test_cycle_moves_by_difference() {
    let mut tracker = Tracker::new("delta");
    tracker.publish(1, 0.0, 0.0);
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));
    control.start().expect("start");

    // Stage parked at -32, heading 0 targets 328.
    tracker.publish(2, 0.0, 0.0);
    let report = control.cycle().expect("cycle");
    assert_eq!(report.current_angle, -32.0);
    assert!((report.target_angle - 328.0).abs() < 1e-9);
    assert!((report.delta - 360.0).abs() < 1e-9);
    assert_eq!(report.corridor, CorridorId::One);
    assert_eq!(report.discontinuity, None);

    // Same heading again: the stage is already there.
    tracker.publish(3, 0.0, 70.0 / 4.5);
    let report = control.cycle().expect("cycle");
    assert_eq!(report.delta, 0.0);
    assert_eq!(report.corridor, CorridorId::Zero);
    assert_eq!(log.lock().last(), Some(&Call::MoveBy(0.0)));

    assert_eq!(control.state().map(|s| s.last_frame_count), Some(3));
    assert_eq!(control.stats().cycle_count, 2);
    control.stop().expect("stop");
}

#[test]
fn test_skipped_frame_is_reported_and_absorbed() {
    let mut tracker = Tracker::new("skip");
    tracker.publish(5, 0.5, 0.0);
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));
    control.start().expect("start");

    tracker.publish(6, 0.5, 0.0);
    assert_eq!(control.cycle().expect("cycle").discontinuity, None);

    tracker.publish(8, 0.5, 0.0);
    let report = control.cycle().expect("cycle continues");
    assert_eq!(
        report.discontinuity,
        Some(FrameDiscontinuity {
            previous: 6,
            current: 8
        })
    );
    assert_eq!(control.stats().discontinuities, 1);
    assert_eq!(control.phase(), LoopPhase::Running);
    control.stop().expect("stop");
}

#[test]
fn test_shutdown_signals_then_parks_then_closes_once() {
    let mut tracker = Tracker::new("shutdown");
    tracker.publish(1, 1.0, 0.0);
    let log = CallLog::default();
    let actuator = RecordingActuator::new(log.clone(), Some(&tracker.config.signal_segment));
    let mut control = control_loop(&tracker, actuator);

    control.start().expect("start");
    control.cycle().expect("cycle");
    assert!(!tracker.signals.read().is_close_requested());

    control.stop().expect("stop");
    assert_eq!(control.phase(), LoopPhase::Stopped);
    assert!(tracker.signals.read().is_close_requested());

    let calls = log.lock().clone();
    let n = calls.len();
    assert_eq!(calls[n - 1], Call::Close);
    assert_eq!(
        calls[n - 2],
        Call::MoveTo {
            angle: -32.0,
            close_signalled: true
        }
    );
    drop(control);
    assert_eq!(closes(&log), 1);
}

#[test]
fn test_stop_is_idempotent() {
    let mut tracker = Tracker::new("restop");
    tracker.publish(1, 0.0, 0.0);
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));
    control.start().expect("start");

    control.stop().expect("stop");
    control.stop().expect("second stop");
    assert_eq!(closes(&log), 1);
    assert!(matches!(
        control.cycle(),
        Err(ControlError::InvalidPhase(LoopPhase::Stopped))
    ));
}

#[test]
fn test_actuator_fault_runs_stop_sequence() {
    let mut tracker = Tracker::new("fault");
    tracker.publish(1, 0.0, 0.0);
    let log = CallLog::default();
    let mut actuator = RecordingActuator::new(log.clone(), Some(&tracker.config.signal_segment));
    actuator.fail_move_by_at = Some(3);
    let mut control = control_loop(&tracker, actuator);

    let running = AtomicBool::new(true);
    let result = control.execute(&running);
    assert!(matches!(result, Err(ControlError::ActuatorComm(_))));
    assert_eq!(control.phase(), LoopPhase::Stopped);
    assert_eq!(control.stats().cycle_count, 2);
    assert!(tracker.signals.read().is_close_requested());

    let calls = log.lock().clone();
    assert_eq!(calls.last(), Some(&Call::Close));
    assert!(calls.contains(&Call::MoveTo {
        angle: -32.0,
        close_signalled: true
    }));
    assert_eq!(closes(&log), 1);
}

#[test]
fn test_missing_channel_closes_actuator() {
    let config = tracking_config("absent");
    let log = CallLog::default();
    let mut control = ControlLoop::new(
        Box::new(RecordingActuator::new(log.clone(), None)),
        actuator_config(),
        config,
    );

    let result = control.start();
    assert!(matches!(result, Err(ControlError::ChannelUnavailable(_))));
    assert_eq!(control.phase(), LoopPhase::Stopped);
    assert_eq!(log.lock().last(), Some(&Call::Close));

    drop(control);
    assert_eq!(closes(&log), 1);
}

#[test]
fn test_configure_failure_closes_actuator() {
    let tracker = Tracker::new("noconf");
    let log = CallLog::default();
    let mut actuator = RecordingActuator::new(log.clone(), None);
    actuator.fail_configure = true;
    let mut control = control_loop(&tracker, actuator);

    let running = AtomicBool::new(true);
    assert!(matches!(
        control.execute(&running),
        Err(ControlError::ActuatorComm(_))
    ));
    assert_eq!(
        *log.lock(),
        vec![Call::Configure(500.0, 500.0), Call::Close]
    );
}

#[test]
fn test_cleared_flag_stops_without_cycling() {
    let mut tracker = Tracker::new("cleared");
    tracker.publish(1, 0.0, 0.0);
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));

    let running = AtomicBool::new(false);
    control.execute(&running).expect("clean shutdown");
    assert_eq!(control.stats().cycle_count, 0);
    assert!(!log.lock().contains(&Call::GetPosition));
    assert_eq!(closes(&log), 1);
}

#[test]
fn test_drop_while_running_closes_once() {
    let mut tracker = Tracker::new("drop");
    tracker.publish(1, 0.0, 0.0);
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));
    control.start().expect("start");

    drop(control);
    assert_eq!(closes(&log), 1);
}

#[test]
fn test_stop_before_start_only_releases() {
    let tracker = Tracker::new("prestop");
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));

    control.stop().expect("stop");
    assert_eq!(control.phase(), LoopPhase::Stopped);
    assert_eq!(*log.lock(), vec![Call::Close]);
    assert!(!tracker.signals.read().is_close_requested());

    drop(control);
    assert_eq!(closes(&log), 1);
}

#[test]
fn test_cycle_before_start_is_rejected() {
    let tracker = Tracker::new("early");
    let log = CallLog::default();
    let mut control = control_loop(&tracker, RecordingActuator::new(log.clone(), None));
    assert!(matches!(
        control.cycle(),
        Err(ControlError::InvalidPhase(LoopPhase::Starting))
    ));
    assert!(log.lock().is_empty());
}

#[test]
fn test_simulated_stage_follows_heading_until_interrupted() {
    let mut tracker = Tracker::new("sim");
    tracker.publish(1, std::f64::consts::PI, 0.0);

    let config = ActuatorConfig {
        driver: "simulation".into(),
        ..actuator_config()
    };
    let actuator = DriverRegistry::with_builtin_drivers()
        .create_driver(&config.driver, &config)
        .expect("simulation driver");
    let mut control = ControlLoop::new(actuator, config, tracker.config.clone());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        r.store(false, Ordering::SeqCst);
    });

    control.execute(&running).expect("clean shutdown");
    interrupter.join().expect("interrupter");

    assert_eq!(control.phase(), LoopPhase::Stopped);
    assert!(control.stats().cycle_count > 0);
    assert!(tracker.signals.read().is_close_requested());
}
