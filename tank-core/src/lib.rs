//! Ramped differential-drive control for two-motor H-bridge vehicles on no-std targets.
//!
//! For a runnable host harness, see `tank-app/mock-mcu`.
#![no_std]

pub mod utils;
