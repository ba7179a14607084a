//! # Trajectory control
//!
//! Pure pursuit steering towards a waypoint, with throttle reduced while turning and the brake
//! applied on hard turns.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Params, Waypoint};
use drive_if::eqpt::actuation::Control;
use util::maths::{clamp, finite_or};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Smallest forward distance used in the pure pursuit law, nearer waypoints are treated as being
/// this far ahead.
///
/// Units: meters
pub const MIN_LOOKAHEAD_M: f64 = 1e-4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Intermediate values of a control conversion, for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ControlDiagnostics {
    /// Units: radians
    pub steering_angle_rad: f64,

    /// Units: degrees
    pub steering_angle_deg: f64,

    /// Lateral distance of the waypoint from the vehicle's forward axis.
    ///
    /// Units: meters
    pub cross_track_error_m: f64,

    /// Units: meters
    pub lookahead_m: f64,

    /// Units: meters/second
    pub speed_ms: f64,

    pub steer: f64,
    pub throttle: f64,
    pub brake: f64,

    /// True if the steering angle exceeded the steering lock.
    pub steer_saturated: bool,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a waypoint into control demands.
///
/// The vehicle speed is only recorded in the diagnostics, the control law does not depend on it.
pub fn convert(waypoint: &Waypoint, speed_ms: f64, params: &Params) -> (Control, ControlDiagnostics) {
    let lookahead_m = waypoint.forward_m().max(MIN_LOOKAHEAD_M);
    let cross_track_error_m = waypoint.lateral_m();

    // Pure pursuit steering angle for an arc through the waypoint
    let steering_angle_rad = finite_or((2.0 * cross_track_error_m / lookahead_m).atan(), 0.0);

    let raw_steer = steering_angle_rad / params.max_steering_angle_rad();
    let steer = clamp(&raw_steer, &-1.0, &1.0);
    let steer_saturated = raw_steer.abs() > 1.0;
    let steer_mag = steer.abs();

    let throttle_candidate =
        (params.base_throttle * (1.0 - steer_mag * params.steering_throttle_reduction)).max(0.0);

    let brake = if steer_mag > params.brake_steering_threshold {
        clamp(&(steer_mag * params.brake_strength), &0.0, &1.0)
    } else {
        0.0
    };

    // Braking always takes priority over throttle
    let throttle = if brake > 0.0 {
        0.0
    } else {
        clamp(&throttle_candidate, &0.0, &1.0)
    };

    let control = Control {
        steer,
        throttle,
        brake,
    };

    let diag = ControlDiagnostics {
        steering_angle_rad,
        steering_angle_deg: steering_angle_rad.to_degrees(),
        cross_track_error_m,
        lookahead_m,
        speed_ms,
        steer,
        throttle,
        brake,
        steer_saturated,
    };

    if steer_saturated {
        trace!(
            "Steering angle {:.1} deg saturated at the {:.1} deg lock",
            diag.steering_angle_deg,
            params.max_steering_angle_deg
        );
    }

    (control, diag)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
