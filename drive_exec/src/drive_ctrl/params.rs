//! Drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control, shared by the waypoint planner and the trajectory controller.
///
/// Any key missing from the parameter file takes its default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- WAYPOINT PLANNING ----
    /// Forward distance at which every target waypoint is placed.
    ///
    /// Units: meters
    #[serde(alias = "lookahead_distance")]
    pub lookahead_distance_m: f64,

    /// Maximum lateral deviation of a target waypoint from the vehicle's forward axis.
    ///
    /// Units: meters
    #[serde(alias = "max_lateral_offset")]
    pub max_lateral_offset_m: f64,

    // ---- TRAJECTORY CONTROL ----
    /// Steering lock angle, a steering angle of this magnitude gives a full steer demand.
    ///
    /// Units: degrees
    #[serde(alias = "max_steering_angle")]
    pub max_steering_angle_deg: f64,

    /// Throttle demand when driving straight.
    pub base_throttle: f64,

    /// Fraction of the throttle removed at full steering lock.
    pub steering_throttle_reduction: f64,

    /// Normalised steer magnitude above which the brake is applied.
    pub brake_steering_threshold: f64,

    /// Brake demand per unit of normalised steer magnitude.
    pub brake_strength: f64,

    // ---- CONTROLLER SELECTION ----
    /// Which control law drives the vehicle.
    pub controller: ControllerKind,

    /// Steering gain of the zone steering controller.
    pub zone_steering_gain: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The available control laws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Waypoint planning followed by pure pursuit trajectory control.
    PurePursuit,

    /// Legacy direct steering from the density imbalance.
    ZoneSteer,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lookahead_distance_m: 10.0,
            max_lateral_offset_m: 5.0,
            max_steering_angle_deg: 25.0,
            base_throttle: 0.3,
            steering_throttle_reduction: 0.5,
            brake_steering_threshold: 0.7,
            brake_strength: 0.3,
            controller: ControllerKind::PurePursuit,
            zone_steering_gain: 0.8,
        }
    }
}

impl Params {
    /// Maximum steering angle in radians.
    pub fn max_steering_angle_rad(&self) -> f64 {
        self.max_steering_angle_deg.to_radians()
    }

    /// Check that the parameters can only produce valid waypoints and controls.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let fields = [
            ("lookahead_distance_m", self.lookahead_distance_m),
            ("max_lateral_offset_m", self.max_lateral_offset_m),
            ("max_steering_angle_deg", self.max_steering_angle_deg),
            ("base_throttle", self.base_throttle),
            ("steering_throttle_reduction", self.steering_throttle_reduction),
            ("brake_steering_threshold", self.brake_steering_threshold),
            ("brake_strength", self.brake_strength),
            ("zone_steering_gain", self.zone_steering_gain),
        ];

        for (name, value) in fields.iter() {
            if !value.is_finite() {
                return Err(ParamsError::NotFinite(*name));
            }
        }

        if self.lookahead_distance_m <= 0.0 {
            return Err(ParamsError::OutOfRange(
                "lookahead_distance_m",
                self.lookahead_distance_m,
                "(0, inf)",
            ));
        }
        if self.max_lateral_offset_m < 0.0 {
            return Err(ParamsError::OutOfRange(
                "max_lateral_offset_m",
                self.max_lateral_offset_m,
                "[0, inf)",
            ));
        }
        if self.max_steering_angle_deg <= 0.0 || self.max_steering_angle_deg >= 90.0 {
            return Err(ParamsError::OutOfRange(
                "max_steering_angle_deg",
                self.max_steering_angle_deg,
                "(0, 90)",
            ));
        }

        let unit_fields = [
            ("base_throttle", self.base_throttle),
            ("steering_throttle_reduction", self.steering_throttle_reduction),
            ("brake_steering_threshold", self.brake_steering_threshold),
        ];
        for (name, value) in unit_fields.iter() {
            if *value < 0.0 || *value > 1.0 {
                return Err(ParamsError::OutOfRange(*name, *value, "[0, 1]"));
            }
        }

        // A zero strength would let the threshold be exceeded without braking
        if self.brake_strength <= 0.0 || self.brake_strength > 1.0 {
            return Err(ParamsError::OutOfRange(
                "brake_strength",
                self.brake_strength,
                "(0, 1]",
            ));
        }

        if self.zone_steering_gain < 0.0 {
            return Err(ParamsError::OutOfRange(
                "zone_steering_gain",
                self.zone_steering_gain,
                "[0, inf)",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
