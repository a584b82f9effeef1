//! Ramped differential drive.
//!
//! Holds a target and a commanded (current) speed per side. Intent operations only
//! touch targets; [`RampedDifferentialDrive::advance`] is the single place where the
//! commanded speeds move and where signals reach the hardware. Call `advance()` from
//! a poll loop at least as often as the ramp interval; it rate-limits itself.

use serde::{Deserialize, Serialize};

use super::{
    h_bridge::{Actuator, Side},
    DriveCommand,
};
use crate::utils::{
    clock::{elapsed_ms, Clock},
    math::ramp::{ramp_toward, ChannelSignal, RampConfig},
};

/// Errors surfaced by the drive.
#[derive(Debug)]
pub enum DriveError<E: core::fmt::Debug> {
    /// The actuator rejected a write.
    Actuator(E),
    /// `advance()` was called before `initialize()`.
    NotInitialized,
}

/// Target and commanded speed of one side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorState {
    pub target: i16,
    pub current: i16,
}

impl MotorState {
    pub fn is_settled(&self) -> bool {
        self.target == self.current
    }

    /// New target with magnitude `magnitude`, keeping the sign of the present target.
    /// A zero target counts as non-negative.
    fn keep_sign(
        &mut self,
        magnitude: u8,
    ) {
        let magnitude = i16::from(magnitude);
        self.target = if self.target < 0 { -magnitude } else { magnitude };
    }

    fn point(
        &mut self,
        reverse: bool,
    ) {
        let magnitude = self.target.saturating_abs();
        self.target = if reverse { -magnitude } else { magnitude };
    }
}

/// Snapshot of the drive, suitable for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveStatus {
    pub left: MotorState,
    pub right: MotorState,
    pub ramp: RampConfig,
}

/// Two-motor drive that ramps commanded speeds toward their targets.
pub struct RampedDifferentialDrive<A, C> {
    actuator: A,
    clock: C,
    ramp: RampConfig,
    left: MotorState,
    right: MotorState,
    last_tick_ms: u32,
    initialized: bool,
}

impl<A, C> RampedDifferentialDrive<A, C>
where
    A: Actuator,
    C: Clock,
{
    /// Bind the actuator and time source with the default ramp. Performs no I/O.
    pub fn new(
        actuator: A,
        clock: C,
    ) -> Self {
        Self {
            actuator,
            clock,
            ramp: RampConfig::default(),
            left: MotorState::default(),
            right: MotorState::default(),
            last_tick_ms: 0,
            initialized: false,
        }
    }

    /// Enable the outputs and put both channels into the stopped state.
    ///
    /// Must be called once before the first `advance()`.
    pub fn initialize(&mut self) -> Result<(), DriveError<A::Error>> {
        self.actuator.enable().map_err(DriveError::Actuator)?;
        self.left = MotorState::default();
        self.right = MotorState::default();
        self.emit(Side::Left, ChannelSignal::STOPPED)?;
        self.emit(Side::Right, ChannelSignal::STOPPED)?;
        self.last_tick_ms = self.clock.now_ms();
        self.initialized = true;
        tracing::info!(ramp = ?self.ramp, "drive initialized");
        Ok(())
    }

    /// Change the ramp tuning. `step == 0` freezes the commanded speeds.
    pub fn configure_ramp(
        &mut self,
        step: u8,
        interval_ms: u8,
    ) {
        self.set_ramp(RampConfig { step, interval_ms });
    }

    pub fn set_ramp(
        &mut self,
        ramp: RampConfig,
    ) {
        if ramp.step == 0 {
            tracing::warn!("ramp step is zero, motor speeds are frozen");
        }
        self.ramp = ramp;
    }

    pub fn ramp(&self) -> RampConfig {
        self.ramp
    }

    /// Set how fast each side should turn, keeping which way it turns.
    pub fn set_speed(
        &mut self,
        left: u8,
        right: u8,
    ) {
        self.left.keep_sign(left);
        self.right.keep_sign(right);
    }

    pub fn forward(&mut self) {
        self.left.point(false);
        self.right.point(false);
    }

    pub fn backward(&mut self) {
        self.left.point(true);
        self.right.point(true);
    }

    /// Pivot left: left side reverses, right side drives forward.
    pub fn left(&mut self) {
        self.left.point(true);
        self.right.point(false);
    }

    /// Pivot right: left side drives forward, right side reverses.
    pub fn right(&mut self) {
        self.left.point(false);
        self.right.point(true);
    }

    /// Ramp both sides down to zero.
    pub fn stop(&mut self) {
        self.left.target = 0;
        self.right.target = 0;
    }

    /// Stop both sides now, bypassing the ramp.
    pub fn halt(&mut self) -> Result<(), DriveError<A::Error>> {
        self.left = MotorState::default();
        self.right = MotorState::default();
        tracing::info!("drive halted");
        if !self.initialized {
            return Ok(());
        }
        self.emit(Side::Left, ChannelSignal::STOPPED)?;
        self.emit(Side::Right, ChannelSignal::STOPPED)
    }

    /// Advance the ramp if the interval has elapsed and drive the outputs.
    ///
    /// Returns `Ok(true)` when a tick happened, `Ok(false)` when it was too early.
    pub fn advance(&mut self) -> Result<bool, DriveError<A::Error>> {
        if !self.initialized {
            return Err(DriveError::NotInitialized);
        }

        let now = self.clock.now_ms();
        if elapsed_ms(self.last_tick_ms, now) < u32::from(self.ramp.interval_ms) {
            return Ok(false);
        }
        self.last_tick_ms = now;

        self.left.current = ramp_toward(self.left.current, self.left.target, self.ramp.step);
        self.right.current = ramp_toward(self.right.current, self.right.target, self.ramp.step);
        tracing::trace!(left = ?self.left, right = ?self.right, "ramp tick");

        self.emit(Side::Left, ChannelSignal::from_speed(self.left.current))?;
        self.emit(Side::Right, ChannelSignal::from_speed(self.right.current))?;
        Ok(true)
    }

    /// Apply a decoded command.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn execute_command(
        &mut self,
        command: DriveCommand,
    ) -> Result<(), DriveError<A::Error>> {
        match command {
            DriveCommand::Forward => self.forward(),
            DriveCommand::Backward => self.backward(),
            DriveCommand::Left => self.left(),
            DriveCommand::Right => self.right(),
            DriveCommand::Stop => self.stop(),
            DriveCommand::SetSpeed {
                left_speed,
                right_speed,
            } => self.set_speed(left_speed, right_speed),
            DriveCommand::Ramp { step, interval } => self.set_ramp(RampConfig {
                step: step.unwrap_or(self.ramp.step),
                interval_ms: interval.unwrap_or(self.ramp.interval_ms),
            }),
            DriveCommand::Halt => return self.halt(),
        }
        Ok(())
    }

    pub fn status(&self) -> DriveStatus {
        DriveStatus {
            left: self.left,
            right: self.right,
            ramp: self.ramp,
        }
    }

    /// Both sides have reached their targets.
    pub fn is_settled(&self) -> bool {
        self.left.is_settled() && self.right.is_settled()
    }

    /// Hand back the actuator and clock.
    pub fn release(self) -> (A, C) {
        (self.actuator, self.clock)
    }

    fn emit(
        &mut self,
        side: Side,
        signal: ChannelSignal,
    ) -> Result<(), DriveError<A::Error>> {
        self.actuator
            .set_direction(side, signal.direction)
            .map_err(DriveError::Actuator)?;
        self.actuator
            .set_duty_cycle(side, signal.duty)
            .map_err(DriveError::Actuator)
    }
}
