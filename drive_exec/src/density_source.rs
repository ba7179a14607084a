//! # Density source
//!
//! Provides the density frame for each cycle. The only source available without a simulator is a
//! replay script, see `util::script_interpreter` for the format.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use drive_if::eqpt::density::DensityFrame;
use util::script_interpreter::{PendingFrames, ScriptInterpreter, ScriptedFrame};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of density frames.
pub trait DensitySource {
    /// Get the density frame for the given simulation time.
    fn poll(&mut self, sim_time_s: f64) -> DensityPoll;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of polling a density source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DensityPoll {
    /// A frame containing a density sample.
    Frame(DensityFrame),

    /// No usable sample for this cycle.
    NoData,

    /// The source has nothing more to give.
    EndOfStream,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Replays the frames of a density script.
///
/// The newest frame is held until it is older than the sensor timeout, after which the source
/// reports `NoData`. Once the script is exhausted and its last frame has expired the source
/// reports `EndOfStream`.
pub struct ScriptedDensity {
    si: ScriptInterpreter,
    sensor_timeout_s: f64,
    latest: Option<ScriptedFrame>,
    script_ended: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScriptedDensity {
    pub fn new(si: ScriptInterpreter, sensor_timeout_s: f64) -> Self {
        Self {
            si,
            sensor_timeout_s,
            latest: None,
            script_ended: false,
        }
    }
}

impl DensitySource for ScriptedDensity {
    fn poll(&mut self, sim_time_s: f64) -> DensityPoll {
        if !self.script_ended {
            match self.si.get_pending_frames(sim_time_s) {
                PendingFrames::Some(frames) => {
                    trace!("{} density frame(s) arrived", frames.len());
                    if let Some(f) = frames.last() {
                        self.latest = Some(*f);
                    }
                }
                PendingFrames::None => (),
                PendingFrames::EndOfScript => self.script_ended = true,
            }
        }

        let fresh = self
            .latest
            .filter(|f| sim_time_s - f.arrival_time_s <= self.sensor_timeout_s);

        match fresh {
            Some(f) if f.frame.sample.is_some() => DensityPoll::Frame(f.frame),
            Some(_) => DensityPoll::NoData,
            None if self.script_ended => DensityPoll::EndOfStream,
            None => DensityPoll::NoData,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use drive_if::eqpt::density::DensitySample;

    const SCRIPT: &str = r#"
        0.10: {"speed_ms": 2.0, "sample": {"front": 15, "left": 60, "right": 55}};
        0.20: {"speed_ms": 2.0, "sample": {"front": 80, "left": 20, "right": 40}};
        1.00: {"speed_ms": 2.5, "sample": null};
        1.10: {"speed_ms": 2.5, "sample": {"front": 1, "left": 2, "right": 3}};
    "#;

    fn source() -> ScriptedDensity {
        ScriptedDensity::new(SCRIPT.parse().unwrap(), 0.25)
    }

    fn sample_at(src: &mut ScriptedDensity, t: f64) -> Option<DensitySample> {
        match src.poll(t) {
            DensityPoll::Frame(f) => f.sample,
            _ => None,
        }
    }

    #[test]
    fn test_replay() {
        let mut src = source();

        // Nothing has arrived yet
        assert_eq!(src.poll(0.0), DensityPoll::NoData);

        assert_eq!(
            sample_at(&mut src, 0.10),
            Some(DensitySample::new(15.0, 60.0, 55.0))
        );

        // Newest frame held within the timeout
        assert_eq!(
            sample_at(&mut src, 0.30),
            Some(DensitySample::new(80.0, 20.0, 40.0))
        );
        assert!(sample_at(&mut src, 0.40).is_some());

        // Then it expires
        assert_eq!(src.poll(0.50), DensityPoll::NoData);

        // Frames without a sample are no data
        assert_eq!(src.poll(1.0), DensityPoll::NoData);

        assert!(sample_at(&mut src, 1.1).is_some());
        assert!(sample_at(&mut src, 1.3).is_some());
        assert_eq!(src.poll(1.4), DensityPoll::EndOfStream);
        assert_eq!(src.poll(2.0), DensityPoll::EndOfStream);
    }

    #[test]
    fn test_obstacle_course_cadence() {
        let script = include_str!("../../scripts/obstacle_course.drv");
        let timeout = crate::params::DriveExecParams::default().sensor_timeout_s;
        let mut src = ScriptedDensity::new(script.parse().unwrap(), timeout);

        // Only the dropout between the null frame at 4.0 s and the next frame at 5.0 s is lost
        let mut num_no_data = 0;
        let mut ended = false;

        for n in 0..200 {
            let t = n as f64 * 0.05;
            let in_gap = t > 3.99 && t < 4.99;

            match src.poll(t) {
                DensityPoll::Frame(_) => assert!(!in_gap, "frame at {:.2} s", t),
                DensityPoll::NoData => {
                    assert!(in_gap, "no data at {:.2} s", t);
                    num_no_data += 1;
                }
                DensityPoll::EndOfStream => {
                    assert!(t > 6.2, "ended at {:.2} s", t);
                    ended = true;
                    break;
                }
            }
        }

        assert!(ended);
        assert_eq!(num_no_data, 20);
    }
}
