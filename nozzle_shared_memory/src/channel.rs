//! The two-segment channel shared with the tracking process.
//!
//! - state segment: tracker writes a `TrackingFrame` every video frame,
//!   this process only reads it.
//! - signal segment: this process writes a nonzero `CloseSignal` once, on
//!   shutdown. Nothing is read back.

use crate::error::ShmResult;
use crate::segment::SharedSegment;
use nozzle::config::TrackingConfig;
use nozzle::shm::layout::{CloseSignal, TrackingFrame};
use tracing::{debug, info};

/// Live view of the tracking process's published state.
pub struct SharedStateChannel {
    state: SharedSegment<TrackingFrame>,
    signals: SharedSegment<CloseSignal>,
    close_sent: bool,
}

impl SharedStateChannel {
    /// Attach to both segments.
    ///
    /// # Errors
    /// Fails if either segment is missing or has the wrong size.
    pub fn open(state_segment: &str, signal_segment: &str) -> ShmResult<Self> {
        let state = SharedSegment::open(state_segment)?;
        let signals = SharedSegment::open(signal_segment)?;
        info!(
            "Tracking channel open (state={}, signals={})",
            state_segment, signal_segment
        );
        Ok(Self {
            state,
            signals,
            close_sent: false,
        })
    }

    /// Attach using configured segment names.
    pub fn from_config(config: &TrackingConfig) -> ShmResult<Self> {
        Self::open(&config.state_segment, &config.signal_segment)
    }

    /// Snapshot of the current tracking record. May be torn.
    #[inline]
    pub fn read(&self) -> TrackingFrame {
        self.state.read()
    }

    /// Ask the tracking process to terminate. Only the first call writes.
    pub fn signal_close(&mut self) {
        if self.close_sent {
            debug!("Close signal already sent to {}", self.signals.name());
            return;
        }
        self.signals.write(CloseSignal::CLOSE);
        self.close_sent = true;
        info!("Close signal written to {}", self.signals.name());
    }

    /// Whether [`signal_close`](Self::signal_close) has been issued.
    pub fn close_sent(&self) -> bool {
        self.close_sent
    }
}
