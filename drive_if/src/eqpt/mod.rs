//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with equipment
//! collaborators.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod actuation;
pub mod density;
