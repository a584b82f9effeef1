//! Module Exports
//!
//! This file exports the motor control pieces of the tank drive.
//!
//! - `drive`: the ramped differential drive itself.
//! - `h_bridge`: actuator trait and the pin/PWM L298N backend.
//! - `pca9685`: L298N driven through a PCA9685 expander on I2C.

pub mod drive;
pub mod h_bridge;
pub mod pca9685;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{with_timeout, Duration};
use serde::{Deserialize, Serialize};

pub use drive::{DriveError, DriveStatus, MotorState, RampedDifferentialDrive};
pub use h_bridge::{Actuator, HBridge, HBridgeError, Side, L298n};

use crate::utils::clock::Clock;

/// Channel used to receive drive commands from whatever transport feeds the tank.
pub static DRIVE_CHANNEL: embassy_sync::channel::Channel<CriticalSectionRawMutex, DriveCommand, 16> =
    embassy_sync::channel::Channel::new();

/// Drive commands as sent by the control broker.
///
/// Serialized as JSON with tag `"command"`, e.g.
/// `{"command":"setspeed","leftSpeed":120,"rightSpeed":120}`. Only lowercase tags
/// are accepted; the broker lowercases command names before forwarding them.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum DriveCommand {
    Forward,
    Backward,
    Left,
    Right,
    /// Ramp both sides down to zero.
    Stop,
    /// Change magnitudes, keep directions.
    SetSpeed {
        #[serde(rename = "leftSpeed")]
        left_speed: u8,
        #[serde(rename = "rightSpeed")]
        right_speed: u8,
    },
    /// Retune the ramp; missing fields keep their present value.
    Ramp {
        #[serde(default)]
        step: Option<u8>,
        #[serde(default)]
        interval: Option<u8>,
    },
    /// Stop immediately without ramping.
    Halt,
}

impl DriveCommand {
    /// Decode a JSON command from a text or binary frame.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// Latest drive report, published by `DriveController` whenever the drive settles.
pub static DRIVE_REPORT: Signal<CriticalSectionRawMutex, DriveReport> = Signal::new();

/// What the drive task has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveReport {
    /// Commands applied since the controller was created.
    pub handled: u32,
    pub status: DriveStatus,
}

/// Runs a drive against `DRIVE_CHANNEL`, ticking the ramp between commands.
pub struct DriveController<A, C> {
    pub drive: RampedDifferentialDrive<A, C>,
    poll: Duration,
    handled: u32,
    settled: bool,
}

impl<A, C> DriveController<A, C>
where
    A: Actuator,
    C: Clock,
{
    pub const DEFAULT_POLL_MS: u64 = 5;

    /// Initialize the drive and wrap it. `poll_ms` bounds how long the task waits
    /// for a command before ticking the ramp again.
    pub fn new(
        mut drive: RampedDifferentialDrive<A, C>,
        poll_ms: Option<u64>,
    ) -> Self {
        if let Err(e) = drive.initialize() {
            tracing::warn!("Drive init failed, will retry on first tick: {:?}", e);
        }
        DriveController {
            drive,
            poll: Duration::from_millis(poll_ms.unwrap_or(Self::DEFAULT_POLL_MS)),
            handled: 0,
            settled: false,
        }
    }

    /// Apply one command, logging instead of failing.
    pub fn handle(
        &mut self,
        command: DriveCommand,
    ) {
        tracing::info!("Received Drive Command: {:?}", command);
        self.handled = self.handled.wrapping_add(1);
        if let Err(e) = self.drive.execute_command(command) {
            tracing::error!("Drive command failed: {:?}", e);
        }
    }

    /// Advance the ramp once, re-initializing if the drive never came up.
    pub fn tick(&mut self) {
        match self.drive.advance() {
            Ok(_) => {}
            Err(DriveError::NotInitialized) => {
                if let Err(e) = self.drive.initialize() {
                    tracing::error!("Drive init failed: {:?}", e);
                }
            }
            Err(e) => tracing::error!("Drive tick failed: {:?}", e),
        }
    }

    pub fn report(&self) -> DriveReport {
        DriveReport {
            handled: self.handled,
            status: self.drive.status(),
        }
    }

    /// One pass of the drive task: apply `command` if any, tick, and publish a
    /// report to `DRIVE_REPORT` when the drive has just settled (the first pass
    /// counts) or a command arrived while it was already settled.
    pub fn step(
        &mut self,
        command: Option<DriveCommand>,
    ) {
        let received = command.is_some();
        if let Some(command) = command {
            self.handle(command);
        }
        self.tick();

        let now_settled = self.drive.is_settled();
        if now_settled && (!self.settled || received) {
            let report = self.report();
            tracing::info!(status = ?report.status, "Drive settled");
            DRIVE_REPORT.signal(report);
        }
        self.settled = now_settled;
    }

    pub async fn drive_ch(&mut self) -> ! {
        loop {
            let command = with_timeout(self.poll, DRIVE_CHANNEL.receiver().receive())
                .await
                .ok();
            self.step(command);
        }
    }
}
