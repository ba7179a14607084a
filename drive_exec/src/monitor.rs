//! # Drive monitor
//!
//! Reports on drive control in three tiers:
//!
//! - every tick at `DEBUG`: densities, ratio, waypoint, steering angle, cross-track error and the
//!   final control,
//! - a summary at `INFO` on each summary cycle: elapsed time, speed, densities, waypoint and
//!   control,
//! - anomalies at `WARN` whenever they occur: sensor timeouts, rejected densities, braking, and
//!   interruption of the run.
//!
//! Running totals are kept for the end of run summary.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::drive_ctrl::{InputData, OutputData, StatusReport};
use drive_if::eqpt::actuation::Control;
use util::maths::ms_to_kmh;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Monitors drive control outputs cycle by cycle.
pub struct DriveMonitor {
    summary: RunSummary,
    throttle_sum: f64,
    in_timeout: bool,
    braking: bool,
}

/// Totals over a whole run, saved as `run_summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    /// Why the run ended
    pub end_reason: Option<String>,

    /// Units: seconds
    pub sim_duration_s: f64,

    pub num_ticks: u64,
    pub num_sensor_timeouts: u64,
    pub num_invalid_inputs: u64,

    /// Number of times the brake was engaged by steering, a continuous application counts once.
    pub num_brake_events: u64,

    pub num_actuator_errors: u64,
    pub peak_abs_steer: f64,
    pub mean_throttle: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveMonitor {
    pub fn new() -> Self {
        Self {
            summary: RunSummary {
                start_time: Utc::now(),
                end_time: None,
                end_reason: None,
                sim_duration_s: 0.0,
                num_ticks: 0,
                num_sensor_timeouts: 0,
                num_invalid_inputs: 0,
                num_brake_events: 0,
                num_actuator_errors: 0,
                peak_abs_steer: 0.0,
                mean_throttle: 0.0,
            },
            throttle_sum: 0.0,
            in_timeout: false,
            braking: false,
        }
    }

    /// Record one tick of drive control.
    ///
    /// `applied` is the control actually sent to the actuator, which may differ from the drive
    /// control output if filtering is enabled.
    pub fn record(
        &mut self,
        sim_time_s: f64,
        is_summary_cycle: bool,
        input: &InputData,
        output: &OutputData,
        report: &StatusReport,
        applied: &Control,
    ) {
        let s = &mut self.summary;
        s.num_ticks += 1;
        s.sim_duration_s = sim_time_s;
        s.peak_abs_steer = s.peak_abs_steer.max(applied.steer.abs());
        self.throttle_sum += applied.throttle;
        s.mean_throttle = self.throttle_sum / s.num_ticks as f64;

        // ---- ANOMALIES ----

        if report.sensor_timeout {
            s.num_sensor_timeouts += 1;
            if !self.in_timeout {
                warn!(
                    "[{:.2} s] Sensor timeout, applying fail-safe control ({})",
                    sim_time_s, applied
                );
            }
        } else if self.in_timeout {
            info!("[{:.2} s] Sensor data restored", sim_time_s);
        }
        self.in_timeout = report.sensor_timeout;

        if report.invalid_density {
            s.num_invalid_inputs += 1;
            match report.density_fault {
                Some(fault) => warn!(
                    "[{:.2} s] Density input rejected ({}), using the fallback plan",
                    sim_time_s, fault
                ),
                None => warn!(
                    "[{:.2} s] Density input rejected, using the fallback plan",
                    sim_time_s
                ),
            }
        }

        if report.brake_engaged && !self.braking {
            s.num_brake_events += 1;
            warn!(
                "[{:.2} s] Steer {:+.2} over the brake threshold, braking at {:.2}",
                sim_time_s, output.control.steer, output.control.brake
            );
        }
        self.braking = report.brake_engaged;

        // ---- PER-TICK DETAIL ----

        debug!("{}", tick_detail(sim_time_s, input, output, report, applied));

        // ---- SUMMARY ----

        if is_summary_cycle {
            info!("{}", tick_summary(sim_time_s, input, output, applied));
        }
    }

    /// Count a control the actuator refused.
    pub fn actuator_error(&mut self) {
        self.summary.num_actuator_errors += 1;
    }

    /// Report that the run was interrupted.
    pub fn interrupted(&self, sim_time_s: f64) {
        warn!("[{:.2} s] Run interrupted, stopping", sim_time_s);
    }

    /// Current totals.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Close the run and return its summary.
    pub fn finish(mut self, end_reason: &str) -> RunSummary {
        self.summary.end_time = Some(Utc::now());
        self.summary.end_reason = Some(end_reason.to_string());

        let s = &self.summary;
        info!(
            "Run complete ({}): {} ticks over {:.2} s, {} timeouts, {} invalid inputs, \
             {} brake events, peak steer {:.2}, mean throttle {:.2}",
            end_reason,
            s.num_ticks,
            s.sim_duration_s,
            s.num_sensor_timeouts,
            s.num_invalid_inputs,
            s.num_brake_events,
            s.peak_abs_steer,
            s.mean_throttle
        );

        self.summary
    }
}

impl Default for DriveMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn tick_detail(
    sim_time_s: f64,
    input: &InputData,
    output: &OutputData,
    report: &StatusReport,
    applied: &Control,
) -> String {
    let mut line = format!("[{:.2} s]", sim_time_s);

    if report.sensor_timeout {
        line.push_str(" No density data");
    } else if report.invalid_density {
        line.push_str(" Densities rejected");
    } else if let Some(a) = output.analysis {
        line.push_str(&format!(
            " Densities [L:{:.1} F:{:.1} R:{:.1}] ratio {:.3} | {} ({})",
            a.left_density, a.front_density, a.right_density, a.ratio, a, a.rationale
        ));
    } else if let Some(d) = input.density.and_then(|d| Some((d.left?, d.front?, d.right?))) {
        line.push_str(&format!(" Densities [L:{:.1} F:{:.1} R:{:.1}]", d.0, d.1, d.2));
    }

    if let Some(w) = output.waypoint {
        line.push_str(&format!(" | Waypoint {}", w));
    }

    if let Some(d) = output.diagnostics {
        line.push_str(&format!(
            " | Angle {:+.2} deg ({:+.4} rad) | CTE {:+.2} m",
            d.steering_angle_deg, d.steering_angle_rad, d.cross_track_error_m
        ));
    }

    line.push_str(&format!(" | {}", applied));

    line
}

fn tick_summary(sim_time_s: f64, input: &InputData, output: &OutputData, applied: &Control) -> String {
    let mut line = format!(
        "[{:6.1} s] Speed {:5.1} km/h",
        sim_time_s,
        ms_to_kmh(input.speed_ms)
    );

    if let Some(d) = input.density {
        let fmt = |v: Option<f64>| match v {
            Some(v) => format!("{:.0}", v),
            None => String::from("-"),
        };
        line.push_str(&format!(
            " | L:{} F:{} R:{}",
            fmt(d.left),
            fmt(d.front),
            fmt(d.right)
        ));
    }

    if let Some(a) = output.analysis {
        line.push_str(&format!(" | {}", a));
    }
    if let Some(w) = output.waypoint {
        line.push_str(&format!(" | Waypoint {}", w));
    }

    line.push_str(&format!(" | {}", applied));

    line
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_ctrl::{DriveCtrl, Params};
    use drive_if::eqpt::density::DensitySample;
    use util::module::State;

    fn run(monitor: &mut DriveMonitor, dc: &mut DriveCtrl, t: f64, density: Option<DensitySample>) {
        let input = InputData {
            density,
            speed_ms: 2.0,
        };
        let (out, rpt) = dc.proc(&input).unwrap();
        monitor.record(t, false, &input, &out, &rpt, &out.control);
    }

    #[test]
    fn test_totals() {
        let mut m = DriveMonitor::new();
        let mut dc = DriveCtrl::new(Params::default()).unwrap();

        // Straight at base throttle, then the same again from the fallback plan
        run(&mut m, &mut dc, 0.00, Some(DensitySample::new(15.0, 60.0, 55.0)));
        run(&mut m, &mut dc, 0.05, Some(DensitySample::new(-1.0, 0.0, 0.0)));

        // Two ticks of hard braking count as one event
        run(&mut m, &mut dc, 0.10, Some(DensitySample::new(80.0, 50.0, 0.0)));
        run(&mut m, &mut dc, 0.15, Some(DensitySample::new(80.0, 50.0, 0.0)));

        run(&mut m, &mut dc, 0.20, None);

        m.actuator_error();

        let s = m.finish("end of script");
        assert_eq!(s.num_ticks, 5);
        assert_eq!(s.num_brake_events, 1);
        assert_eq!(s.num_sensor_timeouts, 1);
        assert_eq!(s.num_invalid_inputs, 1);
        assert_eq!(s.num_actuator_errors, 1);
        assert_eq!(s.peak_abs_steer, 1.0);
        assert!((s.mean_throttle - 0.6 / 5.0).abs() < 1e-12);
        assert_eq!(s.sim_duration_s, 0.20);
        assert_eq!(s.end_reason.as_deref(), Some("end of script"));
        assert!(s.end_time.is_some());
    }

    #[test]
    fn test_detail_lines() {
        let mut dc = DriveCtrl::new(Params::default()).unwrap();
        let input = InputData {
            density: Some(DensitySample::new(80.0, 60.0, 20.0)),
            speed_ms: 5.0,
        };
        let (out, rpt) = dc.proc(&input).unwrap();

        let detail = tick_detail(1.0, &input, &out, &rpt, &out.control);
        assert!(detail.contains("RIGHT (2.50m)"));
        assert!(detail.contains("left-denser"));

        let summary = tick_summary(1.0, &input, &out, &out.control);
        assert!(summary.contains("18.0 km/h"));
        assert!(summary.contains("L:60 F:80 R:20"));
        assert!(summary.contains("RIGHT (2.50m)"));
        assert!(summary.contains("Waypoint (10.00, 2.50, 0.00)"));

        // Fallback ticks have no decision record but still show the waypoint
        let bad = InputData {
            density: Some(DensitySample::new(-1.0, 1.0, 1.0)),
            speed_ms: 5.0,
        };
        let (out, _) = dc.proc(&bad).unwrap();
        let summary = tick_summary(1.05, &bad, &out, &out.control);
        assert!(summary.contains("Waypoint (10.00, 2.50, 0.00)"));
    }
}
