//! # Actuation Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Normalised vehicle control demands handed to the actuator every tick.
///
/// A valid control satisfies:
/// - `steer` in `[-1, 1]`, positive steers to the right,
/// - `throttle` in `[0, 1]`,
/// - `brake` in `[0, 1]`,
/// - `throttle == 0` whenever `brake > 0`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub steer: f64,
    pub throttle: f64,
    pub brake: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Control {
    /// The fail-safe control: wheels straight, no throttle, full brake.
    pub fn fail_safe() -> Self {
        Self {
            steer: 0.0,
            throttle: 0.0,
            brake: 1.0,
        }
    }

    /// Determine if the control meets all range and coupling requirements.
    pub fn is_valid(&self) -> bool {
        let in_range = |v: f64, min: f64, max: f64| v.is_finite() && v >= min && v <= max;

        in_range(self.steer, -1.0, 1.0)
            && in_range(self.throttle, 0.0, 1.0)
            && in_range(self.brake, 0.0, 1.0)
            && !(self.brake > 0.0 && self.throttle > 0.0)
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Steer:{:+.2} Throttle:{:.2} Brake:{:.2}",
            self.steer, self.throttle, self.brake
        )
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
