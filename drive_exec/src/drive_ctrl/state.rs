//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::convert::TryFrom;

// Internal
use super::{
    convert, plan, zone_steer, AnalysisRecord, ControlDiagnostics, ControllerKind, DensityFault,
    DensityReading, Direction, DriveCtrlError, Params, Rationale, Waypoint,
};
use drive_if::eqpt::{actuation::Control, density::DensitySample};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// The last accepted density reading, replanned when a sample is rejected.
    last_reading: Option<DensityReading>,

    num_ticks: u64,

    record: Option<TickRecord>,
    arch_tick: Archiver,
}

/// Input data to drive control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// The density sample for this tick, or `None` if the sensor timed out.
    pub density: Option<DensitySample>,

    /// Current vehicle speed, for diagnostics only.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// Output of drive control for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutputData {
    /// The control to apply, always valid.
    pub control: Control,

    /// The target waypoint, `None` on fail-safe ticks and under zone steering.
    pub waypoint: Option<Waypoint>,

    pub direction: Option<Direction>,

    /// The planner's record, `None` when no plan was made from this tick's densities.
    pub analysis: Option<AnalysisRecord>,

    pub diagnostics: Option<ControlDiagnostics>,
}

/// Status report for DriveCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusReport {
    /// No density sample was available, the fail-safe control was output.
    pub sensor_timeout: bool,

    /// The density sample was rejected, the fallback plan was used.
    pub invalid_density: bool,

    /// Why the sample was rejected.
    pub density_fault: Option<DensityFault>,

    /// The steering angle exceeded the steering lock.
    pub steer_saturated: bool,

    /// Steering exceeded the brake threshold so the brake was applied.
    pub brake_engaged: bool,

    /// Both side densities were zero.
    pub degenerate_ratio: bool,
}

/// Flat record of a single tick, written to `drive_ctrl/tick.csv`.
#[derive(Debug, Clone, Copy, Serialize)]
struct TickRecord {
    tick: u64,
    speed_ms: f64,
    front_density: Option<f64>,
    left_density: Option<f64>,
    right_density: Option<f64>,
    ratio: Option<f64>,
    direction: Option<Direction>,
    rationale: Option<Rationale>,
    waypoint_x_m: Option<f64>,
    waypoint_y_m: Option<f64>,
    steering_angle_deg: Option<f64>,
    steer: f64,
    throttle: f64,
    brake: f64,
    sensor_timeout: bool,
    invalid_density: bool,
    steer_saturated: bool,
    brake_engaged: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Create a new instance from the given parameters, without archiving.
    pub fn new(params: Params) -> Result<Self, DriveCtrlError> {
        params.validate().map_err(DriveCtrlError::InvalidParams)?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Forget the remembered density reading, so that any fallback before the next good sample is
    /// straight ahead.
    pub fn make_safe(&mut self) {
        self.last_reading = None;
    }

    /// Run the selected control law on a density reading.
    fn control_from(&self, reading: &DensityReading, speed_ms: f64) -> OutputData {
        match self.params.controller {
            ControllerKind::PurePursuit => {
                let (waypoint, direction, analysis) = plan(reading, &self.params);
                let (control, diagnostics) = convert(&waypoint, speed_ms, &self.params);

                OutputData {
                    control,
                    waypoint: Some(waypoint),
                    direction: Some(direction),
                    analysis: Some(analysis),
                    diagnostics: Some(diagnostics),
                }
            }
            ControllerKind::ZoneSteer => OutputData {
                control: zone_steer(reading, &self.params),
                ..Default::default()
            },
        }
    }

    /// Output for ticks with no usable reading and nothing remembered: straight ahead.
    fn straight(&self, speed_ms: f64) -> OutputData {
        match self.params.controller {
            ControllerKind::PurePursuit => {
                let waypoint = Waypoint::new(self.params.lookahead_distance_m, 0.0, 0.0);
                let (control, diagnostics) = convert(&waypoint, speed_ms, &self.params);

                OutputData {
                    control,
                    waypoint: Some(waypoint),
                    direction: Some(Direction::Straight),
                    analysis: None,
                    diagnostics: Some(diagnostics),
                }
            }
            ControllerKind::ZoneSteer => OutputData {
                control: Control {
                    steer: 0.0,
                    throttle: self.params.base_throttle,
                    brake: 0.0,
                },
                ..Default::default()
            },
        }
    }

    fn make_record(
        &self,
        input_data: &InputData,
        output: &OutputData,
        report: &StatusReport,
    ) -> TickRecord {
        let sample = input_data.density.unwrap_or_default();

        TickRecord {
            tick: self.num_ticks,
            speed_ms: input_data.speed_ms,
            front_density: sample.front,
            left_density: sample.left,
            right_density: sample.right,
            ratio: output.analysis.map(|a| a.ratio),
            direction: output.direction,
            rationale: output.analysis.map(|a| a.rationale),
            waypoint_x_m: output.waypoint.map(|w| w.forward_m()),
            waypoint_y_m: output.waypoint.map(|w| w.lateral_m()),
            steering_angle_deg: output.diagnostics.map(|d| d.steering_angle_deg),
            steer: output.control.steer,
            throttle: output.control.throttle,
            brake: output.control.brake,
            sensor_timeout: report.sensor_timeout,
            invalid_density: report.invalid_density,
            steer_saturated: report.steer_saturated,
            brake_engaged: report.brake_engaged,
        }
    }
}

impl State for DriveCtrl {
    type InitData = &'static str;
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(DriveCtrlError::ParamLoadError)?;
        self.params
            .validate()
            .map_err(DriveCtrlError::InvalidParams)?;

        self.arch_tick = Archiver::from_path(session, "drive_ctrl/tick.csv")
            .map_err(DriveCtrlError::ArchiveInitError)?;

        self.last_reading = None;
        self.num_ticks = 0;

        Ok(())
    }

    /// Perform cyclic processing of drive control.
    ///
    /// Always produces a valid control: the fail-safe control if there is no sample, or the
    /// fallback plan if the sample is rejected.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let output = match input_data.density {
            None => {
                self.report.sensor_timeout = true;
                OutputData {
                    control: Control::fail_safe(),
                    ..Default::default()
                }
            }
            Some(ref sample) => match DensityReading::try_from(sample) {
                Ok(reading) => {
                    self.last_reading = Some(reading);
                    self.control_from(&reading, input_data.speed_ms)
                }
                Err(DriveCtrlError::InvalidDensityInput(fault)) => {
                    self.report.invalid_density = true;
                    self.report.density_fault = Some(fault);

                    match self.last_reading {
                        Some(reading) => {
                            let mut out = self.control_from(&reading, input_data.speed_ms);
                            // The record describes an earlier sample, not this one
                            out.analysis = None;
                            out
                        }
                        None => self.straight(input_data.speed_ms),
                    }
                }
                Err(e) => return Err(e),
            },
        };

        if !self.report.sensor_timeout {
            self.report.brake_engaged = output.control.brake > 0.0;
            self.report.steer_saturated = match output.diagnostics {
                Some(d) => d.steer_saturated,
                None => output.control.steer.abs() >= 1.0,
            };
            self.report.degenerate_ratio = output
                .analysis
                .map(|a| a.rationale == Rationale::SidesEmpty)
                .unwrap_or(false);
        }

        trace!("DriveCtrl output: {}", output.control);

        self.num_ticks += 1;
        self.record = Some(self.make_record(input_data, &output, &self.report));

        Ok((output, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        // Modules built without a session don't archive
        if !self.arch_tick.is_init() {
            return Ok(());
        }

        match self.record {
            Some(r) => self.arch_tick.serialise(r),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn input(density: Option<DensitySample>) -> InputData {
        InputData {
            density,
            speed_ms: 3.0,
        }
    }

    fn sample(front: f64, left: f64, right: f64) -> Option<DensitySample> {
        Some(DensitySample::new(front, left, right))
    }

    #[test]
    fn test_nominal() {
        let mut dc = DriveCtrl::new(Params::default()).unwrap();

        let (out, rpt) = dc.proc(&input(sample(15.0, 60.0, 55.0))).unwrap();

        assert_eq!(out.direction, Some(Direction::Straight));
        assert_eq!(out.waypoint, Some(Waypoint::new(10.0, 0.0, 0.0)));
        assert_eq!(out.control.steer, 0.0);
        assert!((out.control.throttle - 0.3).abs() < 1e-12);
        assert_eq!(out.control.brake, 0.0);
        assert_eq!(rpt, StatusReport::default());
        assert_eq!(out.diagnostics.map(|d| d.speed_ms), Some(3.0));
    }

    #[test]
    fn test_sensor_timeout() {
        let mut dc = DriveCtrl::new(Params::default()).unwrap();

        let (out, rpt) = dc.proc(&input(None)).unwrap();

        assert_eq!(out.control, Control::fail_safe());
        assert!(out.waypoint.is_none());
        assert!(out.direction.is_none());
        assert!(rpt.sensor_timeout);
        assert!(!rpt.brake_engaged);
    }

    #[test]
    fn test_invalid_density_fallback() {
        let mut dc = DriveCtrl::new(Params::default()).unwrap();

        // No previous plan, straight ahead
        let (out, rpt) = dc.proc(&input(sample(-1.0, 0.0, 0.0))).unwrap();
        assert!(rpt.invalid_density);
        assert!(matches!(rpt.density_fault, Some(DensityFault::Negative(_, _))));
        assert_eq!(out.direction, Some(Direction::Straight));
        assert_eq!(out.waypoint.map(|w| w.lateral_m()), Some(0.0));
        assert!(out.control.is_valid());

        // Good plan to the right
        let (good, _) = dc.proc(&input(sample(80.0, 60.0, 20.0))).unwrap();
        assert_eq!(good.direction, Some(Direction::Right));

        // Rejected sample reuses it
        let missing = DensitySample {
            front: Some(10.0),
            left: None,
            right: Some(10.0),
        };
        let (out, rpt) = dc.proc(&input(Some(missing))).unwrap();
        assert!(rpt.invalid_density);
        assert_eq!(out.waypoint, good.waypoint);
        assert_eq!(out.direction, good.direction);
        assert_eq!(out.control, good.control);
        assert!(out.analysis.is_none());

        // Make safe forgets it
        dc.make_safe();
        let (out, _) = dc.proc(&input(sample(f64::NAN, 1.0, 1.0))).unwrap();
        assert_eq!(out.direction, Some(Direction::Straight));
    }

    #[test]
    fn test_status_flags() {
        let mut dc = DriveCtrl::new(Params::default()).unwrap();

        // Right side empty, waypoint at the full offset, hard turn with braking
        let (out, rpt) = dc.proc(&input(sample(80.0, 50.0, 0.0))).unwrap();
        assert!(rpt.brake_engaged);
        assert!(rpt.steer_saturated);
        assert!(!rpt.degenerate_ratio);
        assert_eq!(out.control.throttle, 0.0);

        let (_, rpt) = dc.proc(&input(sample(5.0, 0.0, 0.0))).unwrap();
        assert!(rpt.degenerate_ratio);
        assert!(!rpt.brake_engaged);
    }

    #[test]
    fn test_zone_steer_mode() {
        let mut params = Params::default();
        params.controller = ControllerKind::ZoneSteer;
        let mut dc = DriveCtrl::new(params).unwrap();

        let (out, _) = dc.proc(&input(sample(80.0, 60.0, 20.0))).unwrap();
        assert!((out.control.steer - 0.4).abs() < 1e-12);
        assert!(out.waypoint.is_none());

        let (fallback, rpt) = dc.proc(&input(sample(80.0, -3.0, 20.0))).unwrap();
        assert!(rpt.invalid_density);
        assert_eq!(fallback.control, out.control);

        let (out, _) = dc.proc(&input(None)).unwrap();
        assert_eq!(out.control, Control::fail_safe());
    }

    #[test]
    fn test_invalid_params() {
        let mut params = Params::default();
        params.lookahead_distance_m = -1.0;

        assert!(matches!(
            DriveCtrl::new(params),
            Err(DriveCtrlError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_write_without_session() {
        let mut dc = DriveCtrl::new(Params::default()).unwrap();
        dc.proc(&input(sample(1.0, 2.0, 3.0))).unwrap();
        assert!(dc.write().is_ok());
    }
}
