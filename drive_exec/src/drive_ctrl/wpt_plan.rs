//! # Waypoint planning
//!
//! Converts a density reading into a target waypoint in the vehicle's local frame.
//!
//! The front zone is preferred: if it is no denser than either side the vehicle goes straight.
//! Otherwise the waypoint is pushed towards the less dense side by an amount proportional to the
//! normalised imbalance between the sides, `|left - right| / (left + right)`, which is 1 when one
//! side is empty and 0 when the sides are equal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;
use serde::Serialize;
use std::convert::TryFrom;
use std::fmt::{self, Display};

// Internal
use super::{DensityFault, DriveCtrlError, Params, Zone};
use drive_if::eqpt::density::DensitySample;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A validated density reading.
///
/// All three counts are guaranteed to be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityReading {
    front: f64,
    left: f64,
    right: f64,
}

/// A target point for the vehicle to steer towards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    /// Position of the waypoint.
    ///
    /// Units: meters,
    /// Frame: Vehicle local
    pub position_m_vl: Vector3<f64>,
}

/// Record of how a waypoint was chosen, for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub front_density: f64,
    pub left_density: f64,
    pub right_density: f64,

    /// Normalised imbalance between the left and right densities, in `[0, 1]`.
    pub ratio: f64,

    pub direction: Direction,
    pub rationale: Rationale,

    /// Lateral coordinate of the chosen waypoint.
    ///
    /// Units: meters
    pub lateral_offset_m: f64,

    /// Forward coordinate of the chosen waypoint.
    ///
    /// Units: meters
    pub lookahead_distance_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction of travel chosen by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Straight,
    Left,
    Right,
}

/// The comparison which decided the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rationale {
    /// The front is no denser than either side.
    FrontClear,

    /// The left side is denser, so the vehicle moves right.
    LeftDenser,

    /// The right side is denser, so the vehicle moves left.
    RightDenser,

    /// Both sides are equally dense (and not empty), no lateral offset.
    SidesBalanced,

    /// Both sides are empty, no lateral offset.
    SidesEmpty,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Plan the target waypoint for this tick.
///
/// Returns the waypoint, the chosen direction, and a record of the decision. The waypoint is
/// always at `params.lookahead_distance_m` ahead, within `params.max_lateral_offset_m` to either
/// side, and on the ground plane.
pub fn plan(density: &DensityReading, params: &Params) -> (Waypoint, Direction, AnalysisRecord) {
    let DensityReading { front, left, right } = *density;

    // Ties favour going straight
    let (direction, ratio, rationale) = if front <= left && front <= right {
        (Direction::Straight, 0.0, Rationale::FrontClear)
    } else {
        // Normalise by the larger side so the sum can't overflow
        let scale = left.max(right);

        let ratio = if scale > 0.0 {
            let (l, r) = (left / scale, right / scale);
            (l - r).abs() / (l + r)
        } else {
            0.0
        };

        let rationale = if scale <= 0.0 {
            Rationale::SidesEmpty
        } else if left > right {
            Rationale::LeftDenser
        } else if right > left {
            Rationale::RightDenser
        } else {
            Rationale::SidesBalanced
        };

        // Move away from the denser side
        let direction = if left > right {
            Direction::Right
        } else {
            Direction::Left
        };

        (direction, ratio, rationale)
    };

    let max_lat_m = params.max_lateral_offset_m;
    let lateral_offset_m = if ratio > 0.0 {
        clamp(&(direction.sign() * ratio * max_lat_m), &-max_lat_m, &max_lat_m)
    } else {
        0.0
    };

    let waypoint = Waypoint::new(params.lookahead_distance_m, lateral_offset_m, 0.0);

    let record = AnalysisRecord {
        front_density: front,
        left_density: left,
        right_density: right,
        ratio,
        direction,
        rationale,
        lateral_offset_m,
        lookahead_distance_m: params.lookahead_distance_m,
    };

    trace!(
        "Waypoint decision: {} [L:{:.1} F:{:.1} R:{:.1}, ratio {:.3}, {}]",
        record,
        left,
        front,
        right,
        ratio,
        rationale
    );

    (waypoint, direction, record)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DensityReading {
    /// Create a new reading, rejecting negative or non-finite counts.
    pub fn new(front: f64, left: f64, right: f64) -> Result<Self, DriveCtrlError> {
        check_zone(Zone::Front, front)?;
        check_zone(Zone::Left, left)?;
        check_zone(Zone::Right, right)?;

        Ok(Self { front, left, right })
    }

    pub fn front(&self) -> f64 {
        self.front
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }
}

impl TryFrom<&DensitySample> for DensityReading {
    type Error = DriveCtrlError;

    fn try_from(sample: &DensitySample) -> Result<Self, Self::Error> {
        let get = |zone: Zone, value: Option<f64>| {
            value.ok_or(DriveCtrlError::InvalidDensityInput(DensityFault::Missing(zone)))
        };

        Self::new(
            get(Zone::Front, sample.front)?,
            get(Zone::Left, sample.left)?,
            get(Zone::Right, sample.right)?,
        )
    }
}

impl Waypoint {
    pub fn new(forward_m: f64, lateral_m: f64, vertical_m: f64) -> Self {
        Self {
            position_m_vl: Vector3::new(forward_m, lateral_m, vertical_m),
        }
    }

    /// Distance ahead of the vehicle (X).
    pub fn forward_m(&self) -> f64 {
        self.position_m_vl[0]
    }

    /// Distance to the right of the vehicle (Y), also the cross-track error.
    pub fn lateral_m(&self) -> f64 {
        self.position_m_vl[1]
    }

    /// Distance above the ground plane (Z).
    pub fn vertical_m(&self) -> f64 {
        self.position_m_vl[2]
    }
}

impl Direction {
    /// Sign of the lateral offset for this direction.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Straight => 0.0,
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Straight => write!(f, "STRAIGHT"),
            Direction::Left => write!(f, "LEFT"),
            Direction::Right => write!(f, "RIGHT"),
        }
    }
}

impl Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {:.2})",
            self.forward_m(),
            self.lateral_m(),
            self.vertical_m()
        )
    }
}

impl Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rationale::FrontClear => "front-clear",
            Rationale::LeftDenser => "left-denser",
            Rationale::RightDenser => "right-denser",
            Rationale::SidesBalanced => "sides-balanced",
            Rationale::SidesEmpty => "sides-empty",
        };
        write!(f, "{}", s)
    }
}

impl Display for AnalysisRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Straight => write!(f, "STRAIGHT (front clear)"),
            d => write!(f, "{} ({:.2}m)", d, self.lateral_offset_m),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_zone(zone: Zone, value: f64) -> Result<(), DriveCtrlError> {
    if !value.is_finite() {
        Err(DriveCtrlError::InvalidDensityInput(DensityFault::NotFinite(
            zone, value,
        )))
    } else if value < 0.0 {
        Err(DriveCtrlError::InvalidDensityInput(DensityFault::Negative(
            zone, value,
        )))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const DENSITIES: [f64; 9] = [0.0, 0.5, 1.0, 3.0, 15.0, 20.0, 55.0, 60.0, 1e6];

    fn reading(front: f64, left: f64, right: f64) -> DensityReading {
        DensityReading::new(front, left, right).unwrap()
    }

    #[test]
    fn test_front_clear() {
        let params = Params::default();

        let (wpt, dir, rec) = plan(&reading(15.0, 60.0, 55.0), &params);

        assert_eq!(dir, Direction::Straight);
        assert_eq!(wpt, Waypoint::new(10.0, 0.0, 0.0));
        assert_eq!(rec.rationale, Rationale::FrontClear);
        assert_eq!(rec.ratio, 0.0);
        assert_eq!(format!("{}", rec), "STRAIGHT (front clear)");

        // Ties favour straight
        let (wpt, dir, _) = plan(&reading(20.0, 20.0, 20.0), &params);
        assert_eq!(dir, Direction::Straight);
        assert_eq!(wpt.lateral_m(), 0.0);

        let (_, dir, _) = plan(&reading(0.0, 0.0, 0.0), &params);
        assert_eq!(dir, Direction::Straight);
    }

    #[test]
    fn test_side_selection() {
        let params = Params::default();

        // Right denser, move left by a third of the maximum offset
        let (wpt, dir, rec) = plan(&reading(80.0, 20.0, 40.0), &params);
        assert_eq!(dir, Direction::Left);
        assert_eq!(rec.rationale, Rationale::RightDenser);
        assert!((rec.ratio - 1.0 / 3.0).abs() < 1e-12);
        assert!((wpt.lateral_m() + 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(format!("{}", rec), "LEFT (-1.67m)");

        // Left denser, move right
        let (wpt, dir, rec) = plan(&reading(80.0, 60.0, 20.0), &params);
        assert_eq!(dir, Direction::Right);
        assert_eq!(rec.rationale, Rationale::LeftDenser);
        assert!((wpt.lateral_m() - 2.5).abs() < 1e-12);
        assert_eq!(format!("{}", rec), "RIGHT (2.50m)");

        // Front only blocked by one side being clearer
        let (_, dir, _) = plan(&reading(30.0, 10.0, 50.0), &params);
        assert_eq!(dir, Direction::Left);
    }

    #[test]
    fn test_degenerate_sides() {
        let params = Params::default();

        // Empty sides, direction is still chosen but there's no offset
        let (wpt, dir, rec) = plan(&reading(5.0, 0.0, 0.0), &params);
        assert_eq!(dir, Direction::Left);
        assert_eq!(rec.rationale, Rationale::SidesEmpty);
        assert_eq!(rec.ratio, 0.0);
        assert_eq!(wpt.lateral_m(), 0.0);
        assert!(wpt.lateral_m().is_sign_positive());

        // Balanced sides
        let (wpt, dir, rec) = plan(&reading(50.0, 10.0, 10.0), &params);
        assert_eq!(dir, Direction::Left);
        assert_eq!(rec.rationale, Rationale::SidesBalanced);
        assert_eq!(wpt.lateral_m(), 0.0);
    }

    #[test]
    fn test_waypoint_bounds() {
        let params = Params::default();

        for &f in DENSITIES.iter() {
            for &l in DENSITIES.iter() {
                for &r in DENSITIES.iter() {
                    let (wpt, dir, _) = plan(&reading(f, l, r), &params);

                    assert_eq!(wpt.forward_m(), params.lookahead_distance_m);
                    assert!(wpt.lateral_m().abs() <= params.max_lateral_offset_m);
                    assert_eq!(wpt.vertical_m(), 0.0);

                    if f <= l && f <= r {
                        assert_eq!(dir, Direction::Straight);
                        assert_eq!(wpt.lateral_m(), 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_offset_monotonic_in_imbalance() {
        let params = Params::default();
        let total = 100.0;

        let mut prev_offset = -1.0;
        for i in 0..=50 {
            // Left grows from 50 to 100 while the total is fixed
            let left = 50.0 + i as f64;
            let (wpt, _, _) = plan(&reading(total, left, total - left), &params);
            let offset = wpt.lateral_m().abs();

            assert!(offset > prev_offset);
            prev_offset = offset;
        }

        // One side empty gives exactly the maximum offset
        assert_eq!(prev_offset, params.max_lateral_offset_m);
        let (wpt, _, _) = plan(&reading(total, 0.0, total), &params);
        assert_eq!(wpt.lateral_m(), -params.max_lateral_offset_m);
    }

    #[test]
    fn test_huge_densities() {
        let params = Params::default();

        // The side sum is beyond f64::MAX but the imbalance must still give an offset
        let (wpt, dir, rec) = plan(&reading(f64::MAX, 1.5e308, 1e308), &params);
        assert_eq!(dir, Direction::Right);
        assert!((rec.ratio - 0.2).abs() < 1e-12);
        assert!((wpt.lateral_m() - 1.0).abs() < 1e-12);

        let (wpt, _, _) = plan(&reading(f64::MAX, 1e308, 1.5e308), &params);
        assert!((wpt.lateral_m() + 1.0).abs() < 1e-12);

        let (wpt, _, rec) = plan(&reading(f64::MAX, f64::MAX, 0.0), &params);
        assert_eq!(rec.ratio, 1.0);
        assert_eq!(wpt.lateral_m(), params.max_lateral_offset_m);
    }

    #[test]
    fn test_mirror_symmetry() {
        let params = Params::default();

        for &f in DENSITIES.iter() {
            for &l in DENSITIES.iter() {
                for &r in DENSITIES.iter() {
                    let (a, _, _) = plan(&reading(f, l, r), &params);
                    let (b, _, _) = plan(&reading(f, r, l), &params);

                    assert_eq!(a.lateral_m(), -b.lateral_m());
                }
            }
        }
    }

    #[test]
    fn test_reading_validation() {
        assert!(DensityReading::new(0.0, 0.0, 0.0).is_ok());

        assert!(matches!(
            DensityReading::new(-1.0, 0.0, 0.0),
            Err(DriveCtrlError::InvalidDensityInput(DensityFault::Negative(Zone::Front, _)))
        ));
        assert!(matches!(
            DensityReading::new(0.0, f64::NAN, 0.0),
            Err(DriveCtrlError::InvalidDensityInput(DensityFault::NotFinite(Zone::Left, _)))
        ));
        assert!(matches!(
            DensityReading::new(0.0, 0.0, f64::INFINITY),
            Err(DriveCtrlError::InvalidDensityInput(DensityFault::NotFinite(Zone::Right, _)))
        ));

        let sample = DensitySample {
            front: Some(1.0),
            left: None,
            right: Some(2.0),
        };
        assert!(matches!(
            DensityReading::try_from(&sample),
            Err(DriveCtrlError::InvalidDensityInput(DensityFault::Missing(Zone::Left)))
        ));

        let r = DensityReading::try_from(&DensitySample::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!((r.front(), r.left(), r.right()), (1.0, 2.0, 3.0));
    }
}
