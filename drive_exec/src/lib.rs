//! # Drive library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the drive executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator - delivers the control demands to the vehicle
pub mod actuator;

/// Data store - the executable's per-cycle shared data
pub mod data_store;

/// Density source - provides a density sample to drive control each cycle
pub mod density_source;

/// Drive control module - converts obstacle densities into steer, throttle and brake demands
pub mod drive_ctrl;

/// Drive monitor - per-tick, periodic, and anomaly reporting of drive control
pub mod monitor;

/// Parameters of the executable itself
pub mod params;
