//! Heading to nozzle angle.

use nozzle_common::consts::HOME_OFFSET_DEGREES;

/// One full turn [deg].
const FULL_TURN_DEGREES: f64 = 360.0;

/// Target nozzle angle [deg] for a lab-frame heading [rad].
///
/// Shifts the heading by a full turn plus the home offset, then folds the
/// result back once if it passed 360°. For headings in `(-π, π]` the
/// result lies in `[0, 360)`. Inputs outside that domain are not folded
/// further: a heading below `-(π + 328°)` yields a negative angle.
#[inline]
pub fn target_angle(heading: f64) -> f64 {
    let degrees = FULL_TURN_DEGREES + heading.to_degrees() + HOME_OFFSET_DEGREES;
    if degrees > FULL_TURN_DEGREES {
        degrees - FULL_TURN_DEGREES
    } else {
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    #[test]
    fn reference_headings() {
        assert!((target_angle(0.0) - 328.0).abs() < EPS);
        assert!((target_angle(PI) - 148.0).abs() < EPS);
        assert!((target_angle(-PI) - 148.0).abs() < EPS);
    }

    #[test]
    fn folds_just_past_full_turn() {
        assert!((target_angle(31f64.to_radians()) - 359.0).abs() < 1e-6);
        assert!((target_angle(33f64.to_radians()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identical_headings_give_zero_delta() {
        let h = 1.234;
        assert_eq!(target_angle(h) - target_angle(h), 0.0);
    }

    #[test]
    fn no_lower_bound_fold() {
        // Far outside the tracker's domain the single fold leaves a negative angle.
        let angle = target_angle(-2.0 * PI);
        assert!((angle - -32.0).abs() < EPS);
    }

    #[test]
    fn single_fold_only() {
        // Above 720 the single fold is not enough.
        let angle = target_angle(3.0 * PI);
        assert!(angle > 360.0);
    }

    proptest! {
        #[test]
        fn tracker_domain_maps_into_one_turn(h in (-PI + 1e-12)..=PI) {
            let angle = target_angle(h);
            prop_assert!(angle >= 0.0, "angle {} for heading {}", angle, h);
            prop_assert!(angle <= 360.0, "angle {} for heading {}", angle, h);
        }
    }
}
