//! The closed control loop.
//!
//! One cycle: read the stage position, snapshot the tracker, compute the
//! target angle and corridor, command the relative move, report. There is
//! no inter-cycle delay; the actuator round-trip paces the loop.
//!
//! The loop owns the actuator for its whole life and releases it exactly
//! once, whichever way it ends: clean stop, failed start, fault while
//! running, or drop.

use crate::corridor::{CorridorId, corridor_id};
use crate::error::ControlError;
use crate::state::{ControlState, FrameDiscontinuity, LoopPhase};
use crate::transform::target_angle;
use nozzle_common::actuator::ActuatorPort;
use nozzle_common::config::{ActuatorConfig, TrackingConfig};
use nozzle_common::consts::{HOME_ANGLE_DEGREES, POSITION_SCALE_MM};
use nozzle_shared_memory::SharedStateChannel;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Tracing target of the per-cycle status lines.
pub const STATUS_TARGET: &str = "nozzle::status";

/// Tracing target of the full tracking-state dump.
pub const STATE_TARGET: &str = "nozzle::state";

/// Cycles between DEBUG statistics summaries.
pub const STATS_LOG_INTERVAL: u64 = 1000;

// ─── Statistics ─────────────────────────────────────────────────────

/// Cycle timing statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Frame counter discontinuities observed.
    pub discontinuities: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: u64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u128,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            discontinuities: 0,
            last_cycle_ns: 0,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.cycle_count += 1;
        self.last_cycle_ns = ns;
        if ns > self.max_cycle_ns {
            self.max_cycle_ns = ns;
        }
        self.sum_cycle_ns += u128::from(ns);
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            u64::try_from(self.sum_cycle_ns / u128::from(self.cycle_count)).unwrap_or(u64::MAX)
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the calling thread runs under SCHED_FIFO or SCHED_RR.
pub fn realtime_scheduling() -> bool {
    // SAFETY: sched_getscheduler only reads scheduler state of pid 0 (self).
    let policy = unsafe { libc::sched_getscheduler(0) };
    policy == libc::SCHED_FIFO || policy == libc::SCHED_RR
}

// ─── Control Loop ───────────────────────────────────────────────────

/// Outcome of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// Stage position read at the start of the cycle [deg].
    pub current_angle: f64,
    /// Angle the nozzle was sent to [deg].
    pub target_angle: f64,
    /// Relative move issued [deg].
    pub delta: f64,
    /// Corridor of the snapshot.
    pub corridor: CorridorId,
    /// Counter jump seen in this cycle, if any.
    pub discontinuity: Option<FrameDiscontinuity>,
}

/// Nozzle controller driving one actuator axis from the tracking channel.
pub struct ControlLoop {
    actuator: Option<Box<dyn ActuatorPort>>,
    channel: Option<SharedStateChannel>,
    actuator_config: ActuatorConfig,
    tracking_config: TrackingConfig,
    state: Option<ControlState>,
    phase: LoopPhase,
    stats: CycleStats,
}

impl ControlLoop {
    /// Take ownership of `actuator`. Nothing is sent until [`start`](Self::start).
    pub fn new(
        actuator: Box<dyn ActuatorPort>,
        actuator_config: ActuatorConfig,
        tracking_config: TrackingConfig,
    ) -> Self {
        Self {
            actuator: Some(actuator),
            channel: None,
            actuator_config,
            tracking_config,
            state: None,
            phase: LoopPhase::Starting,
            stats: CycleStats::new(),
        }
    }

    /// Current lifecycle phase.
    #[inline]
    pub const fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Carried state; `None` before the first snapshot.
    pub fn state(&self) -> Option<&ControlState> {
        self.state.as_ref()
    }

    /// Timing and anomaly counters.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Home the nozzle, attach to the tracker and seed the state.
    ///
    /// On failure the actuator is closed and the loop ends in `Stopped`.
    pub fn start(&mut self) -> Result<(), ControlError> {
        if self.phase != LoopPhase::Starting {
            return Err(ControlError::InvalidPhase(self.phase));
        }
        info!(
            "Starting: driver={}, axis={}, realtime={}",
            self.actuator.as_ref().map_or("none", |a| a.name()),
            self.actuator_config.axis,
            realtime_scheduling()
        );

        if let Err(e) = self.try_start() {
            error!("Startup failed: {e}");
            self.release_actuator();
            self.phase = LoopPhase::Stopped;
            return Err(e);
        }

        self.phase = LoopPhase::Running;
        info!("Running, waiting for tracking updates");
        Ok(())
    }

    fn try_start(&mut self) -> Result<(), ControlError> {
        let config = &self.actuator_config;
        let actuator = self
            .actuator
            .as_mut()
            .ok_or(ControlError::InvalidPhase(self.phase))?;

        actuator.configure(config.velocity_limit, config.acceleration_limit)?;
        actuator.move_to(config.axis, HOME_ANGLE_DEGREES)?;
        debug!("Homed to {HOME_ANGLE_DEGREES}°, settling {:?}", config.settle_time());
        thread::sleep(config.settle_time());

        let channel = SharedStateChannel::from_config(&self.tracking_config)?;
        let first = channel.read();
        self.state = Some(ControlState::seed(&first));
        self.channel = Some(channel);
        info!(
            "Seeded from frame {} (heading={}, posy={})",
            first.frame_cnt, first.heading, first.posy
        );
        Ok(())
    }

    /// Run one control cycle.
    ///
    /// # Errors
    /// `ActuatorComm` if the stage fails to report or to move;
    /// `InvalidPhase` outside `Running`.
    pub fn cycle(&mut self) -> Result<CycleReport, ControlError> {
        if self.phase != LoopPhase::Running {
            return Err(ControlError::InvalidPhase(self.phase));
        }
        let started = Instant::now();
        let (Some(actuator), Some(channel), Some(state)) = (
            self.actuator.as_mut(),
            self.channel.as_ref(),
            self.state.as_mut(),
        ) else {
            return Err(ControlError::InvalidPhase(self.phase));
        };
        let axis = self.actuator_config.axis;

        let current_angle = actuator.get_position(axis)?;
        let frame = channel.read();

        let discontinuity = state.check_frame(&frame);
        if let Some(jump) = discontinuity {
            self.stats.discontinuities += 1;
            warn!("{jump}");
        }

        let target = target_angle(frame.heading);
        let corridor = corridor_id(frame.posy);
        let delta = target - current_angle;
        actuator.move_by(axis, delta)?;

        state.advance(&frame, corridor);
        info!(
            target: STATUS_TARGET,
            "{}\t{}\t{}\t{}",
            target,
            frame.posy * POSITION_SCALE_MM,
            corridor,
            state.switch_pos_y * POSITION_SCALE_MM
        );
        trace!(target: STATE_TARGET, "{}", frame.state_line());

        self.stats.record(started.elapsed());
        if self.stats.cycle_count % STATS_LOG_INTERVAL == 0 {
            debug!(
                "{} cycles, avg={}ns, max={}ns, discontinuities={}",
                self.stats.cycle_count,
                self.stats.avg_cycle_ns(),
                self.stats.max_cycle_ns,
                self.stats.discontinuities
            );
        }

        Ok(CycleReport {
            current_angle,
            target_angle: target,
            delta,
            corridor,
            discontinuity,
        })
    }

    /// Cycle until `running` is cleared or a cycle fails.
    ///
    /// The flag is checked between cycles only, so an in-flight cycle
    /// always completes.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), ControlError> {
        while running.load(Ordering::SeqCst) {
            if let Err(e) = self.cycle() {
                error!("Cycle {} failed: {e}", self.stats.cycle_count + 1);
                return Err(e);
            }
        }
        info!("Cancellation requested after {} cycles", self.stats.cycle_count);
        Ok(())
    }

    /// Signal the tracker, park the nozzle and close the actuator.
    ///
    /// Every step is attempted even if an earlier one fails; the first
    /// actuator error is returned. Before [`start`](Self::start) the
    /// actuator is only closed.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        match self.phase {
            LoopPhase::Stopped => return Ok(()),
            LoopPhase::Starting => {
                // Never configured or homed: release without moving.
                info!("Stopped before start, releasing actuator");
                self.release_actuator();
                self.phase = LoopPhase::Stopped;
                return Ok(());
            }
            LoopPhase::Running | LoopPhase::Stopping => {}
        }
        self.phase = LoopPhase::Stopping;
        info!("Stopping: sending close signal to the tracking process");

        if let Some(channel) = self.channel.as_mut() {
            channel.signal_close();
        }

        let mut first_error = None;
        if let Some(actuator) = self.actuator.as_mut() {
            match actuator.move_to(self.actuator_config.axis, HOME_ANGLE_DEGREES) {
                Ok(()) => thread::sleep(self.actuator_config.park_time()),
                Err(e) => {
                    error!("Parking move failed: {e}");
                    first_error = Some(e);
                }
            }
        }
        if let Some(mut actuator) = self.actuator.take() {
            if let Err(e) = actuator.close() {
                error!("Closing actuator failed: {e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        self.phase = LoopPhase::Stopped;
        info!(
            "Stopped after {} cycles (avg={}ns, max={}ns, discontinuities={})",
            self.stats.cycle_count,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.discontinuities
        );
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    /// Full lifecycle: start, run until `running` clears, stop.
    ///
    /// A fault while running still goes through the stop sequence; the
    /// fault is returned in preference to any error from stopping.
    pub fn execute(&mut self, running: &AtomicBool) -> Result<(), ControlError> {
        self.start()?;
        let outcome = self.run(running);
        let stopped = self.stop();
        outcome.and(stopped)
    }

    fn release_actuator(&mut self) {
        if let Some(mut actuator) = self.actuator.take() {
            if let Err(e) = actuator.close() {
                warn!("Closing actuator failed: {e}");
            }
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        if self.actuator.is_some() {
            warn!("Control loop dropped in phase {:?}, closing actuator", self.phase);
            self.release_actuator();
        }
    }
}
