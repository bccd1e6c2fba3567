//! Shared memory record layouts published by the tracking process.
//!
//! These structs are overlays of bytes owned by another process. Field
//! order, widths and padding must match the producer exactly: this is a
//! binary compatibility contract, not a format this workspace controls.
//!
//! All structs: `#[repr(C)]` with natural alignment. Fixed-size types only.
//!
//! ## Segments
//!
//! | Segment                      | Writer → Reader     | Payload          | Size |
//! |------------------------------|---------------------|------------------|------|
//! | `FicTracStateSHMEM`          | tracker → nozzle    | `TrackingFrame`  | 184  |
//! | `FicTracStateSHMEM_SIGNALS`  | nozzle → tracker    | `CloseSignal`    | 4    |

use static_assertions::const_assert_eq;
use std::fmt::Write as _;

/// One tracking update, as published by the tracking process.
///
/// Only `frame_cnt`, `heading` and `posy` drive the nozzle; the remaining
/// fields are kept so the layout matches the producer.
///
/// Size: 184 bytes (i32 + 4 pad, 21×f64, i32 + 4 trailing pad).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct TrackingFrame {
    /// Frame counter, incremented by the producer on every update.
    pub frame_cnt: i32,
    /// Rotation delta in camera coordinates.
    pub del_rot_cam_vec: [f64; 3],
    /// Residual error of the rotation delta fit.
    pub del_rot_error: f64,
    /// Rotation delta in lab coordinates.
    pub del_rot_lab_vec: [f64; 3],
    /// Absolute orientation in camera coordinates.
    pub abs_ori_cam_vec: [f64; 3],
    /// Absolute orientation in lab coordinates.
    pub abs_ori_lab_vec: [f64; 3],
    /// Integrated x position incorporating heading.
    pub posx: f64,
    /// Integrated y position incorporating heading.
    pub posy: f64,
    /// Lab-frame heading [rad].
    pub heading: f64,
    /// Movement direction [rad].
    pub direction: f64,
    /// Movement speed.
    pub speed: f64,
    /// Integrated forward motion ignoring heading.
    pub intx: f64,
    /// Integrated side motion ignoring heading.
    pub inty: f64,
    /// Producer timestamp.
    pub timestamp: f64,
    /// Producer sequence number.
    pub seq_num: i32,
}

const_assert_eq!(core::mem::size_of::<TrackingFrame>(), 184);
const_assert_eq!(core::mem::align_of::<TrackingFrame>(), 8);

impl TrackingFrame {
    /// Render every field tab-separated, vectors expanded to three columns.
    pub fn state_line(&self) -> String {
        let mut line = String::with_capacity(512);
        let _ = write!(line, "{}\t", self.frame_cnt);
        push_vec(&mut line, &self.del_rot_cam_vec);
        let _ = write!(line, "{}\t", self.del_rot_error);
        push_vec(&mut line, &self.del_rot_lab_vec);
        push_vec(&mut line, &self.abs_ori_cam_vec);
        push_vec(&mut line, &self.abs_ori_lab_vec);
        for x in [
            self.posx,
            self.posy,
            self.heading,
            self.direction,
            self.speed,
            self.intx,
            self.inty,
            self.timestamp,
        ] {
            let _ = write!(line, "{x}\t");
        }
        let _ = write!(line, "{}\t", self.seq_num);
        line
    }
}

fn push_vec(line: &mut String, v: &[f64; 3]) {
    let _ = write!(line, "{}\t{}\t{}\t", v[0], v[1], v[2]);
}

/// Signal record read by the tracking process.
///
/// Writing a nonzero `close_signal_var` asks the tracker to terminate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct CloseSignal {
    /// Close request flag (0 = keep running).
    pub close_signal_var: i32,
}

const_assert_eq!(core::mem::size_of::<CloseSignal>(), 4);

impl CloseSignal {
    /// Record requesting the tracker to close.
    pub const CLOSE: Self = Self {
        close_signal_var: 1,
    };

    /// Whether this record carries a close request.
    #[inline]
    pub const fn is_close_requested(&self) -> bool {
        self.close_signal_var != 0
    }
}
