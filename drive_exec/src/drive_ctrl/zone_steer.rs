//! Zone steering
//!
//! Legacy controller which steers directly in proportion to the side density imbalance, without
//! planning a waypoint. Kept for comparison runs with `controller = "zone_steer"`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{DensityReading, Params};
use drive_if::eqpt::actuation::Control;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the zone steering control for a density reading.
///
/// The vehicle goes straight only if the front is strictly clearer than both sides. Otherwise it
/// steers away from the denser side, at constant throttle and without braking.
pub fn zone_steer(density: &DensityReading, params: &Params) -> Control {
    let (front, left, right) = (density.front(), density.left(), density.right());

    let steer = if front < left && front < right {
        0.0
    } else {
        let total = left + right;
        if total > 0.0 {
            clamp(
                &((left - right) / total * params.zone_steering_gain),
                &-1.0,
                &1.0,
            )
        } else {
            0.0
        }
    };

    Control {
        steer,
        throttle: params.base_throttle,
        brake: 0.0,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn steer(front: f64, left: f64, right: f64) -> Control {
        let d = DensityReading::new(front, left, right).unwrap();
        zone_steer(&d, &Params::default())
    }

    #[test]
    fn test_zone_steer() {
        assert_eq!(steer(10.0, 50.0, 40.0).steer, 0.0);

        // Ties do not count as a clear front
        let c = steer(40.0, 60.0, 40.0);
        assert!((c.steer - 0.16).abs() < 1e-12);

        // Left denser steers right
        let c = steer(80.0, 60.0, 20.0);
        assert!((c.steer - 0.4).abs() < 1e-12);
        assert_eq!(c.throttle, 0.3);
        assert_eq!(c.brake, 0.0);

        // Right denser steers left
        assert!(steer(80.0, 20.0, 60.0).steer < 0.0);

        // Empty sides
        assert_eq!(steer(5.0, 0.0, 0.0).steer, 0.0);
    }

    #[test]
    fn test_gain_saturates() {
        let mut params = Params::default();
        params.zone_steering_gain = 5.0;

        let d = DensityReading::new(50.0, 30.0, 0.0).unwrap();
        let c = zone_steer(&d, &params);

        assert_eq!(c.steer, 1.0);
        assert!(c.is_valid());
    }
}
