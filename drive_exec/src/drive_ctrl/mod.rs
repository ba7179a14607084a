//! # Drive control module
//!
//! Drive control turns the obstacle densities measured in three zones around the vehicle (front,
//! left, and right) into normalised steer, throttle, and brake demands. It does this in two
//! stages, each a pure function of its inputs and the parameters:
//!
//! 1. Waypoint planning (`wpt_plan`) picks a direction of travel from the densities and places a
//!    target waypoint at a fixed lookahead distance ahead of the vehicle. The lateral offset of
//!    the waypoint grows with the imbalance between the left and right densities, pushing the
//!    target away from the more obstructed side.
//! 2. Trajectory control (`traj_ctrl`) steers towards the waypoint using the pure pursuit law.
//!    Throttle is reduced in proportion to the steer demand, and above a steer threshold the
//!    brake is applied and throttle removed entirely.
//!
//! Neither stage remembers anything between ticks. The `DriveCtrl` module state wraps them for
//! the executive, owning the only cross-tick memory in the module (the last good plan, used when
//! a density sample is rejected) and the fail-safe response to missing sensor data.
//!
//! The local frame of the vehicle has X pointing forwards, Y to the right, and Z upwards. Positive
//! steer demands turn the vehicle to the right.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;
pub mod steer_filter;
pub mod traj_ctrl;
pub mod wpt_plan;
pub mod zone_steer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::{self, Display};

// Internal
pub use params::{ControllerKind, Params};
pub use state::*;
pub use steer_filter::SteerFilter;
pub use traj_ctrl::{convert, ControlDiagnostics};
pub use wpt_plan::{plan, AnalysisRecord, DensityReading, Direction, Rationale, Waypoint};
pub use zone_steer::zone_steer;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(ParamsError),

    #[error("Invalid density input: {0}")]
    InvalidDensityInput(DensityFault),

    #[error("Could not initialise the archive: {0}")]
    ArchiveInitError(util::archive::ArchiveError),
}

/// Ways in which a parameter set can be invalid.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("{0} must be finite")]
    NotFinite(&'static str),

    #[error("{0} = {1} is outside the allowed range {2}")]
    OutOfRange(&'static str, f64, &'static str),
}

/// Ways in which a density sample can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DensityFault {
    #[error("the {0} density is missing")]
    Missing(Zone),

    #[error("the {0} density is negative ({1})")]
    Negative(Zone, f64),

    #[error("the {0} density is not finite ({1})")]
    NotFinite(Zone, f64),
}

/// The density zones around the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Front,
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Front => write!(f, "front"),
            Zone::Left => write!(f, "left"),
            Zone::Right => write!(f, "right"),
        }
    }
}
