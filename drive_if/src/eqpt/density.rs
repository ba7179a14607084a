//! # Density Equipment Interface
//!
//! Obstacle densities are produced by the sensor fusion stage, which projects the LiDAR point
//! cloud into the front, left, and right camera views and counts the points landing in each one.
//! The counts arrive here unvalidated, a zone the fusion stage could not compute is left empty.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Raw density counts for one tick, as sent by the sensor fusion stage.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensitySample {
    /// Number of obstacle points in the front zone.
    #[serde(default)]
    pub front: Option<f64>,

    /// Number of obstacle points in the left zone.
    #[serde(default)]
    pub left: Option<f64>,

    /// Number of obstacle points in the right zone.
    #[serde(default)]
    pub right: Option<f64>,
}

/// A frame of sensor data delivered for a single tick.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityFrame {
    /// Speed of the vehicle when the frame was captured.
    ///
    /// Units: meters/second
    #[serde(default)]
    pub speed_ms: f64,

    /// The density sample, or `None` if the fusion stage produced nothing for this frame.
    #[serde(default)]
    pub sample: Option<DensitySample>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("Could not parse the density frame JSON: {0}")]
    JsonError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DensitySample {
    /// Create a complete sample from the three zone counts.
    pub fn new(front: f64, left: f64, right: f64) -> Self {
        Self {
            front: Some(front),
            left: Some(left),
            right: Some(right),
        }
    }
}

impl DensityFrame {
    /// Parse a frame from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, FrameParseError> {
        serde_json::from_str(json).map_err(FrameParseError::JsonError)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_from_json() {
        let frame = DensityFrame::from_json(
            r#"{"speed_ms": 4.5, "sample": {"front": 15, "left": 60.0, "right": 55}}"#,
        )
        .unwrap();

        assert_eq!(frame.speed_ms, 4.5);
        assert_eq!(frame.sample, Some(DensitySample::new(15.0, 60.0, 55.0)));

        // A missing zone is kept as empty so it can be rejected downstream
        let frame = DensityFrame::from_json(r#"{"sample": {"front": 1, "left": 2}}"#).unwrap();
        assert_eq!(frame.speed_ms, 0.0);
        assert_eq!(frame.sample.unwrap().right, None);

        // No sample at all
        let frame = DensityFrame::from_json(r#"{"speed_ms": 1.0, "sample": null}"#).unwrap();
        assert!(frame.sample.is_none());

        assert!(DensityFrame::from_json("{not json").is_err());
    }
}
