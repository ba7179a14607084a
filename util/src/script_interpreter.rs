//! # Density script interpreter module
//!
//! This module provides an interpreter for density replay scripts, allowing recorded or
//! hand-written sensor fusion output to be fed into the drive software without a simulator.
//!
//! A script is a sequence of timestamped frames, one per line:
//!
//! ```text
//! 0.00: {"speed_ms": 0.0, "sample": {"front": 15, "left": 60, "right": 55}};
//! 0.50: {"speed_ms": 2.1, "sample": {"front": 80, "left": 20, "right": 40}};
//! 1.00: {"speed_ms": 2.4, "sample": null};
//! ```
//!
//! Timestamps are in seconds of simulation time and must not decrease.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

// Internal
use drive_if::eqpt::density::{DensityFrame, FrameParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A frame which is scripted to arrive at a specific time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedFrame {
    /// The simulation time at which the frame arrives
    pub arrival_time_s: f64,

    /// The frame itself
    pub frame: DensityFrame,
}

/// A density script interpreter.
///
/// After loading a script use `.get_pending_frames` to acquire the frames which have arrived by
/// the current simulation time.
#[derive(Debug)]
pub struct ScriptInterpreter {
    frames: VecDeque<ScriptedFrame>,
    duration_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease, found {1} s after {0} s")]
    TimestampsOutOfOrder(f64, f64),

    #[error("Script contains an invalid frame at {0} s: {1}")]
    InvalidFrame(f64, FrameParseError),
}

/// Frames pending at the current time.
#[derive(Debug, PartialEq)]
pub enum PendingFrames {
    None,
    Some(Vec<ScriptedFrame>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        script.parse()
    }

    /// Return the frames which have arrived by `sim_time_s`, in arrival order.
    pub fn get_pending_frames(&mut self, sim_time_s: f64) -> PendingFrames {
        // If the queue is empty the script is over
        if self.frames.is_empty() {
            return PendingFrames::EndOfScript;
        }

        let mut pending = vec![];

        while let Some(f) = self.frames.front() {
            if f.arrival_time_s > sim_time_s {
                break;
            }
            if let Some(f) = self.frames.pop_front() {
                pending.push(f);
            }
        }

        if pending.is_empty() {
            PendingFrames::None
        } else {
            PendingFrames::Some(pending)
        }
    }

    /// Get the number of frames remaining in the script
    pub fn get_num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.duration_s
    }
}

impl FromStr for ScriptInterpreter {
    type Err = ScriptError;

    fn from_str(script: &str) -> Result<Self, Self::Err> {
        // Each entry is `<time>: <payload>;`
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(|e| ScriptError::InvalidTimestamp(e.to_string()))?;

        let mut frames: VecDeque<ScriptedFrame> = VecDeque::new();

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or_default();

            let arrival_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(prev) = frames.back() {
                if arrival_time_s < prev.arrival_time_s {
                    return Err(ScriptError::TimestampsOutOfOrder(
                        prev.arrival_time_s,
                        arrival_time_s,
                    ));
                }
            }

            let frame = DensityFrame::from_json(payload)
                .map_err(|e| ScriptError::InvalidFrame(arrival_time_s, e))?;

            frames.push_back(ScriptedFrame {
                arrival_time_s,
                frame,
            });
        }

        let duration_s = match frames.back() {
            Some(f) => f.arrival_time_s,
            None => return Err(ScriptError::ScriptEmpty),
        };

        Ok(ScriptInterpreter {
            frames,
            duration_s,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use drive_if::eqpt::density::DensitySample;

    const SCRIPT: &str = r#"
        # Comment lines are ignored
        0.0: {"speed_ms": 0.0, "sample": {"front": 15, "left": 60, "right": 55}};
        0.5: {"speed_ms": 2.0, "sample": {"front": 80, "left": 20, "right": 40}};
        0.5: {"speed_ms": 2.1, "sample": null};
        2: {"speed_ms": 2.5, "sample": {"front": 10, "left": 10, "right": 10}};
    "#;

    #[test]
    fn test_parse_script() {
        let si: ScriptInterpreter = SCRIPT.parse().unwrap();

        assert_eq!(si.get_num_frames(), 4);
        assert_eq!(si.get_duration(), 2.0);
    }

    #[test]
    fn test_pending_frames() {
        let mut si: ScriptInterpreter = SCRIPT.parse().unwrap();

        match si.get_pending_frames(0.0) {
            PendingFrames::Some(f) => {
                assert_eq!(f.len(), 1);
                assert_eq!(f[0].frame.sample, Some(DensitySample::new(15.0, 60.0, 55.0)));
            }
            p => panic!("Expected one frame, got {:?}", p),
        }

        assert_eq!(si.get_pending_frames(0.25), PendingFrames::None);

        // Both frames at 0.5 s arrive together
        match si.get_pending_frames(1.0) {
            PendingFrames::Some(f) => {
                assert_eq!(f.len(), 2);
                assert!(f[1].frame.sample.is_none());
            }
            p => panic!("Expected two frames, got {:?}", p),
        }

        assert!(matches!(si.get_pending_frames(5.0), PendingFrames::Some(_)));
        assert_eq!(si.get_pending_frames(5.0), PendingFrames::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            "nothing here".parse::<ScriptInterpreter>(),
            Err(ScriptError::ScriptEmpty)
        ));

        assert!(matches!(
            "1.0: {\"sample\": 4};".parse::<ScriptInterpreter>(),
            Err(ScriptError::InvalidFrame(_, _))
        ));

        assert!(matches!(
            "1.0: {};\n0.5: {};".parse::<ScriptInterpreter>(),
            Err(ScriptError::TimestampsOutOfOrder(_, _))
        ));

        assert!(matches!(
            ScriptInterpreter::new("/not/a/real/script.drv"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
