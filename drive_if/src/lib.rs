//! # Drive interface crate.
//!
//! Provides the interface structures exchanged between the drive software and its external
//! collaborators: the sensor fusion stage producing obstacle densities, and the actuation stage
//! consuming vehicle controls.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data definitions for equipment (density sensing and actuation)
pub mod eqpt;
