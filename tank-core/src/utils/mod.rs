//! Utility re-exports and helper macros for the tank drive.
//!
//! - `clock`: monotonic millisecond time sources
//! - `controllers`: ramped drive, actuator backends, and the command channel
//! - `math`: ramp arithmetic and speed-to-signal mapping
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod clock;
pub mod controllers;
pub mod math;

pub use clock::{Clock, EmbassyClock};
pub use controllers::{
    DriveCommand, DriveController, DriveReport, RampedDifferentialDrive, DRIVE_CHANNEL, DRIVE_REPORT,
};
pub use embassy_time::{Duration, Instant, Timer};
pub use math::ramp::{ChannelSignal, Direction, RampConfig};

#[doc(hidden)]
pub use static_cell as __static_cell;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::__static_cell::StaticCell<$t> =
            $crate::utils::__static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
