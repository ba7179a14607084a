//! # Actuator
//!
//! The actuator is the last stage of each cycle, taking the final control and applying it to the
//! vehicle. Without a simulator attached the controls are archived instead.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use thiserror::Error;

use drive_if::eqpt::actuation::Control;
use util::{
    archive::{ArchiveError, Archiver},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which can apply controls to the vehicle.
pub trait Actuator {
    /// Apply the control.
    ///
    /// Controls which do not satisfy the range and brake/throttle coupling requirements are
    /// rejected without being applied.
    fn actuate(&mut self, control: &Control) -> Result<(), ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("Refusing to apply an invalid control ({0})")]
    InvalidControl(Control),

    #[error("Could not archive the control: {0}")]
    ArchiveError(ArchiveError),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An actuator which writes every control to `actuator/control.csv`.
///
/// The default instance has no archive and only keeps the last applied control.
#[derive(Default)]
pub struct ArchiveActuator {
    arch_control: Archiver,
    last_control: Option<Control>,
    num_applied: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArchiveActuator {
    /// Create a new actuator archiving into the given session.
    pub fn new(session: &Session) -> Result<Self, ActuatorError> {
        Ok(Self {
            arch_control: Archiver::from_path(session, "actuator/control.csv")
                .map_err(ActuatorError::ArchiveError)?,
            ..Default::default()
        })
    }

    /// The last control which was applied.
    pub fn last_control(&self) -> Option<Control> {
        self.last_control
    }

    /// Number of controls applied so far.
    pub fn num_applied(&self) -> u64 {
        self.num_applied
    }
}

impl Actuator for ArchiveActuator {
    fn actuate(&mut self, control: &Control) -> Result<(), ActuatorError> {
        if !control.is_valid() {
            return Err(ActuatorError::InvalidControl(*control));
        }

        trace!("Actuating {}", control);

        self.last_control = Some(*control);
        self.num_applied += 1;

        if self.arch_control.is_init() {
            self.arch_control
                .serialise(control)
                .map_err(ActuatorError::ArchiveError)?;
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_actuate() {
        let mut act = ArchiveActuator::default();

        assert!(act.actuate(&Control::fail_safe()).is_ok());
        assert_eq!(act.last_control(), Some(Control::fail_safe()));

        let bad = Control {
            steer: 0.0,
            throttle: 0.3,
            brake: 0.2,
        };
        assert!(matches!(
            act.actuate(&bad),
            Err(ActuatorError::InvalidControl(_))
        ));

        // Rejected controls are not applied
        assert_eq!(act.last_control(), Some(Control::fail_safe()));
        assert_eq!(act.num_applied(), 1);

        let nan = Control {
            steer: f64::NAN,
            throttle: 0.0,
            brake: 0.0,
        };
        assert!(act.actuate(&nan).is_err());
    }
}
