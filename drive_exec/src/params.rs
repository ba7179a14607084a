//! # Drive Executable Parameters
//!
//! This module provide parameters for the drive executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::drive_ctrl::ParamsError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveExecParams {
    /// Target period of one cycle, also the simulation time step.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Period of the summary log.
    ///
    /// Units: seconds
    pub summary_period_s: f64,

    /// Age beyond which the latest density frame is considered lost.
    ///
    /// Units: seconds
    pub sensor_timeout_s: f64,

    /// Maximum length of the run in simulation time.
    ///
    /// Units: seconds
    pub sim_duration_s: f64,

    /// If true each cycle is padded out to `cycle_period_s` of wall time.
    pub real_time: bool,

    /// Smoothing factor of the steer filter, no filtering if not set.
    pub steer_filter_alpha: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DriveExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.05,
            summary_period_s: 5.0,
            sensor_timeout_s: 0.25,
            sim_duration_s: 30.0,
            real_time: true,
            steer_filter_alpha: None,
        }
    }
}

impl DriveExecParams {
    /// Check the parameters are usable by the main loop.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let fields = [
            ("cycle_period_s", self.cycle_period_s),
            ("summary_period_s", self.summary_period_s),
            ("sensor_timeout_s", self.sensor_timeout_s),
            ("sim_duration_s", self.sim_duration_s),
        ];

        for (name, value) in fields.iter() {
            if !value.is_finite() {
                return Err(ParamsError::NotFinite(*name));
            }
        }

        if self.cycle_period_s <= 0.0 {
            return Err(ParamsError::OutOfRange(
                "cycle_period_s",
                self.cycle_period_s,
                "(0, inf)",
            ));
        }
        if self.summary_period_s <= 0.0 {
            return Err(ParamsError::OutOfRange(
                "summary_period_s",
                self.summary_period_s,
                "(0, inf)",
            ));
        }
        if self.sensor_timeout_s < 0.0 {
            return Err(ParamsError::OutOfRange(
                "sensor_timeout_s",
                self.sensor_timeout_s,
                "[0, inf)",
            ));
        }
        if self.sim_duration_s < 0.0 {
            return Err(ParamsError::OutOfRange(
                "sim_duration_s",
                self.sim_duration_s,
                "[0, inf)",
            ));
        }

        if let Some(alpha) = self.steer_filter_alpha {
            if !alpha.is_finite() {
                return Err(ParamsError::NotFinite("steer_filter_alpha"));
            }
            if alpha <= 0.0 || alpha > 1.0 {
                return Err(ParamsError::OutOfRange("steer_filter_alpha", alpha, "(0, 1]"));
            }
        }

        Ok(())
    }

    /// Number of cycles between summaries, at least one.
    pub fn cycles_per_summary(&self) -> u64 {
        let n = (self.summary_period_s / self.cycle_period_s).round();

        if n.is_finite() && n >= 1.0 {
            n as u64
        } else {
            1
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let p: DriveExecParams = util::params::parse(
            r#"
            cycle_period_s = 0.1
            steer_filter_alpha = 0.4
            "#,
        )
        .unwrap();

        assert_eq!(p.cycle_period_s, 0.1);
        assert_eq!(p.steer_filter_alpha, Some(0.4));
        assert_eq!(p.sensor_timeout_s, 0.25);
        assert!(p.real_time);
        assert_eq!(p.cycles_per_summary(), 50);
    }

    #[test]
    fn test_cycles_per_summary() {
        assert_eq!(DriveExecParams::default().cycles_per_summary(), 100);

        let p = DriveExecParams {
            summary_period_s: 0.0,
            ..Default::default()
        };
        assert_eq!(p.cycles_per_summary(), 1);
    }

    #[test]
    fn test_validate() {
        assert!(DriveExecParams::default().validate().is_ok());

        let p = DriveExecParams {
            cycle_period_s: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParamsError::OutOfRange("cycle_period_s", _, _))
        ));

        let p = DriveExecParams {
            cycle_period_s: -0.05,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = DriveExecParams {
            sensor_timeout_s: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParamsError::NotFinite("sensor_timeout_s"))
        ));

        let p = DriveExecParams {
            sim_duration_s: f64::INFINITY,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = DriveExecParams {
            summary_period_s: -1.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        for alpha in [0.0, 1.5, f64::NAN].iter() {
            let p = DriveExecParams {
                steer_filter_alpha: Some(*alpha),
                ..Default::default()
            };
            assert!(p.validate().is_err(), "alpha {} accepted", alpha);
        }

        let p = DriveExecParams {
            steer_filter_alpha: Some(1.0),
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }
}
