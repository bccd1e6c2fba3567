//! # Nozzle Shared Memory
//!
//! Read side of the tracking process's shared memory interface.
//!
//! The tracker publishes a fixed-layout record into a named POSIX shared
//! memory object and polls a second object for a close flag. Neither side
//! synchronizes: the producer overwrites its record in place at frame rate
//! and this crate copies it out with plain volatile loads.
//!
//! ```text
//! ┌────────────────┐   FicTracStateSHMEM          ┌─────────────────────┐
//! │   Tracking     ├─────────────────────────────►│ SharedStateChannel  │
//! │   process      │   FicTracStateSHMEM_SIGNALS  │   read()            │
//! │                │◄─────────────────────────────┤   signal_close()    │
//! └────────────────┘                              └─────────────────────┘
//! ```
//!
//! ## Torn reads
//!
//! A snapshot taken while the producer is mid-update can mix fields from
//! two consecutive frames. This is not detected. Consumers use each field
//! independently and every cycle starts from a fresh snapshot.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nozzle_shared_memory::SharedStateChannel;
//!
//! # fn main() -> Result<(), nozzle_shared_memory::ShmError> {
//! let mut channel = SharedStateChannel::open("FicTracStateSHMEM", "FicTracStateSHMEM_SIGNALS")?;
//! let frame = channel.read();
//! println!("frame {} heading {}", frame.frame_cnt, frame.heading);
//! channel.signal_close();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod error;
pub mod platform;
pub mod segment;

pub use channel::SharedStateChannel;
pub use error::{ShmError, ShmResult};
pub use segment::{SegmentLayout, SharedSegment};
