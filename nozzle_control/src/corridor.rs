//! Corridor banding along the virtual track.
//!
//! The track alternates between two corridor types every
//! [`CORRIDOR_WIDTH_MM`]. Classification depends only on the current
//! position; there is no hysteresis, so a position hovering on a band
//! edge flips the id on every poll that crosses it.

use nozzle_common::consts::{CORRIDOR_WIDTH_MM, POSITION_SCALE_MM};
use std::fmt;

/// Which of the two alternating corridor types the animal occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CorridorId {
    /// Second half of each period, `[W, 2W)`.
    Zero = 0,
    /// First half of each period, `[0, W)`. Also the startup assumption.
    One = 1,
}

impl CorridorId {
    /// Numeric id as printed in status lines.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for CorridorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Distance travelled along the track [mm] for a tracker `posy`.
#[inline]
pub fn arc_length(pos_y: f64) -> f64 {
    pos_y * POSITION_SCALE_MM
}

/// Classify a tracker `posy` into its corridor.
///
/// The period is taken with a floored modulo, so walking backwards past
/// the origin continues the same banding.
#[inline]
pub fn corridor_id(pos_y: f64) -> CorridorId {
    let t = arc_length(pos_y).rem_euclid(2.0 * CORRIDOR_WIDTH_MM);
    if t < CORRIDOR_WIDTH_MM {
        CorridorId::One
    } else {
        CorridorId::Zero
    }
}
