//! # Data Store

use drive_if::eqpt::{actuation::Control, density::DensityFrame};
use log::{info, warn};

use crate::drive_ctrl;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the vehicle has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    SensorTimeout,
    Interrupted,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if the summary should be logged on this cycle
    pub is_summary_cycle: bool,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the vehicle is in safe mode.
    pub safe: bool,

    /// Gives the reason for the vehicle being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Sensor data
    pub density_frame: Option<DensityFrame>,

    /// Last known vehicle speed, kept across cycles without data
    pub speed_ms: f64,

    // DriveCtrl
    pub drive_ctrl: drive_ctrl::DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: drive_ctrl::OutputData,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    /// The control sent to the actuator, after any filtering
    pub control: Control,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the vehicle into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Make drive_ctrl safe
            self.drive_ctrl.make_safe();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// To remove safe mode the provided cause must match the initial reason for safe mode being
    /// enabled, otherwise the root cause is returned as the error. If safe mode was not enabled
    /// `Ok(())` is returned.
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), SafeModeCause> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(root_cause),
            _ => {
                self.safe = false;
                self.safe_cause = None;
                info!("Safe mode ({:?}) cleared", cause);
                Ok(())
            }
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, advances the simulation
    /// time, and sets the summary cycle flag.
    pub fn cycle_start(&mut self, cycle_period_s: f64, cycles_per_summary: u64) {
        self.is_summary_cycle = self.num_cycles % cycles_per_summary.max(1) == 0;

        self.sim_time_s = self.num_cycles as f64 * cycle_period_s;

        self.density_frame = None;
        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_ctrl_output = drive_ctrl::OutputData::default();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();
        self.control = Control::default();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode() {
        let mut ds = DataStore::default();

        assert_eq!(ds.make_unsafe(SafeModeCause::SensorTimeout), Ok(()));

        ds.make_safe(SafeModeCause::SensorTimeout);
        assert!(ds.safe);

        // A second cause doesn't replace the first
        ds.make_safe(SafeModeCause::Interrupted);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::SensorTimeout));

        assert_eq!(
            ds.make_unsafe(SafeModeCause::Interrupted),
            Err(SafeModeCause::SensorTimeout)
        );
        assert!(ds.safe);

        assert_eq!(ds.make_unsafe(SafeModeCause::SensorTimeout), Ok(()));
        assert!(!ds.safe);
        assert!(ds.safe_cause.is_none());
    }

    #[test]
    fn test_cycle_management() {
        let mut ds = DataStore::default();

        ds.cycle_start(0.05, 100);
        assert!(ds.is_summary_cycle);
        assert_eq!(ds.sim_time_s, 0.0);
        ds.cycle_end();

        ds.cycle_start(0.05, 100);
        assert!(!ds.is_summary_cycle);
        assert!((ds.sim_time_s - 0.05).abs() < 1e-12);

        ds.num_cycles = 100;
        ds.cycle_start(0.05, 100);
        assert!(ds.is_summary_cycle);
        assert!((ds.sim_time_s - 5.0).abs() < 1e-9);
    }
}
