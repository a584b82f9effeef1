//! Math utilities for the tank drive.
//!
//! This module provides the ramp arithmetic and the signed-speed to H-bridge signal mapping.

pub mod ramp;
