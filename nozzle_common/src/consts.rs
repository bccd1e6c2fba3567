//! Fixed physical constants of the rig.
//!
//! These are properties of the hardware and arena, not tunables. They are
//! the single source of truth for every crate in the workspace.

/// Angle between the nozzle home position and the animal's body axis,
/// clockwise positive [deg].
pub const HOME_OFFSET_DEGREES: f64 = -32.0;

/// Nozzle parking angle used at startup and shutdown [deg].
pub const HOME_ANGLE_DEGREES: f64 = HOME_OFFSET_DEGREES;

/// Diameter of the air-supported ball the animal walks on [mm].
pub const BALL_DIAMETER_MM: f64 = 9.0;

/// Width of one corridor band along the virtual track [mm].
pub const CORRIDOR_WIDTH_MM: f64 = 60.0;

/// Scale from ball rotation units to millimetres of travel (`D / 2`).
pub const POSITION_SCALE_MM: f64 = BALL_DIAMETER_MM / 2.0;

/// Default name of the tracking state segment.
pub const DEFAULT_STATE_SEGMENT: &str = "FicTracStateSHMEM";

/// Default name of the tracker signal segment.
pub const DEFAULT_SIGNAL_SEGMENT: &str = "FicTracStateSHMEM_SIGNALS";

/// Canonical service name (logging).
pub const SERVICE_NAME: &str = "nozzle";
