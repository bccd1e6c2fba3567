//! Control loop lifecycle and per-cycle memory.

use crate::corridor::CorridorId;
use nozzle_common::shm::layout::TrackingFrame;
use std::fmt;

/// Lifecycle of the control loop.
///
/// `Starting → Running → Stopping → Stopped`. A failed start goes straight
/// to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    /// Homing the actuator and attaching to the tracker.
    #[default]
    Starting,
    /// Tracking the heading, one cycle after another.
    Running,
    /// Signalling the tracker and parking the nozzle.
    Stopping,
    /// Terminal. The actuator connection is released.
    Stopped,
}

/// Frame counter moved by something other than zero or one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDiscontinuity {
    /// Counter seen in the previous cycle.
    pub previous: i32,
    /// Counter seen in this cycle.
    pub current: i32,
}

impl FrameDiscontinuity {
    /// Compare two successive counters.
    ///
    /// An unchanged counter means the tracker has not published yet and is
    /// not reported. Backward jumps are reported like forward ones, and so
    /// is a counter wrapping from `i32::MAX` to `i32::MIN`.
    pub fn detect(previous: i32, current: i32) -> Option<Self> {
        let jump = i64::from(current) - i64::from(previous);
        if jump == 0 || jump == 1 {
            None
        } else {
            Some(Self { previous, current })
        }
    }

    /// Signed counter difference.
    pub fn jump(&self) -> i64 {
        i64::from(self.current) - i64::from(self.previous)
    }
}

impl fmt::Display for FrameDiscontinuity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame counter jumped by {} (previous={}, current={})",
            self.jump(),
            self.previous,
            self.current
        )
    }
}

/// Values carried from one cycle to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    /// Frame counter of the last snapshot consumed.
    pub last_frame_count: i32,
    /// Heading of the last snapshot consumed [rad].
    pub last_heading: f64,
    /// Corridor of the last snapshot consumed.
    pub last_corridor_id: CorridorId,
    /// `posy` when monitoring began.
    pub switch_pos_y: f64,
}

impl ControlState {
    /// Seed from the first snapshot. The corridor starts as `One`.
    pub fn seed(frame: &TrackingFrame) -> Self {
        Self {
            last_frame_count: frame.frame_cnt,
            last_heading: frame.heading,
            last_corridor_id: CorridorId::One,
            switch_pos_y: frame.posy,
        }
    }

    /// Check `frame` against the last consumed counter.
    pub fn check_frame(&self, frame: &TrackingFrame) -> Option<FrameDiscontinuity> {
        FrameDiscontinuity::detect(self.last_frame_count, frame.frame_cnt)
    }

    /// Record `frame` as consumed.
    pub fn advance(&mut self, frame: &TrackingFrame, corridor: CorridorId) {
        self.last_frame_count = frame.frame_cnt;
        self.last_heading = frame.heading;
        self.last_corridor_id = corridor;
    }
}
