//! H-bridge actuator abstraction for the tank drive.
//!
//! The drive only talks to an [`Actuator`]: two direction lines and one duty output
//! per side. [`L298n`] implements it over plain `embedded-hal` pins and PWM channels,
//! which is how an L298N (IN1/IN2/ENA, IN3/IN4/ENB) is usually wired to a MCU.

use embedded_hal::{digital::OutputPin, pwm::SetDutyCycle};
use serde::{Deserialize, Serialize};

use crate::utils::math::ramp::{Direction, MAX_DUTY};

/// Which drive side a signal is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Minimal output interface the ramped drive needs from motor hardware.
pub trait Actuator {
    type Error: core::fmt::Debug;

    /// Bring the outputs into a usable state. Called once from `initialize()`.
    fn enable(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Set the bridge polarity lines of one side.
    fn set_direction(
        &mut self,
        side: Side,
        direction: Direction,
    ) -> Result<(), Self::Error>;

    /// Set the PWM duty (0–255) of one side.
    fn set_duty_cycle(
        &mut self,
        side: Side,
        duty: u8,
    ) -> Result<(), Self::Error>;
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    type Error = T::Error;

    fn enable(&mut self) -> Result<(), Self::Error> {
        (**self).enable()
    }

    fn set_direction(
        &mut self,
        side: Side,
        direction: Direction,
    ) -> Result<(), Self::Error> {
        (**self).set_direction(side, direction)
    }

    fn set_duty_cycle(
        &mut self,
        side: Side,
        duty: u8,
    ) -> Result<(), Self::Error> {
        (**self).set_duty_cycle(side, duty)
    }
}

/// Errors raised by the pins or PWM channel behind an [`HBridge`].
#[derive(Debug)]
pub enum HBridgeError<PinE: core::fmt::Debug, PwmE: core::fmt::Debug> {
    Pin(PinE),
    Pwm(PwmE),
}

/// One H-bridge channel: two direction inputs and an enable/PWM input.
pub struct HBridge<A, B, P> {
    dir_a: A,
    dir_b: B,
    pwm: P,
}

impl<A, B, P, PinE, PwmE> HBridge<A, B, P>
where
    A: OutputPin<Error = PinE>,
    B: OutputPin<Error = PinE>,
    P: SetDutyCycle<Error = PwmE>,
    PinE: core::fmt::Debug,
    PwmE: core::fmt::Debug,
{
    /// Bind the channel's lines. No I/O happens until the first write.
    pub fn new(
        dir_a: A,
        dir_b: B,
        pwm: P,
    ) -> Self {
        Self { dir_a, dir_b, pwm }
    }

    /// Drive the direction lines, direction-A first.
    pub fn set_direction(
        &mut self,
        direction: Direction,
    ) -> Result<(), HBridgeError<PinE, PwmE>> {
        let (a, b) = direction.levels();
        self.dir_a.set_state(a.into()).map_err(HBridgeError::Pin)?;
        self.dir_b.set_state(b.into()).map_err(HBridgeError::Pin)?;
        Ok(())
    }

    /// Scale an 8-bit duty onto the PWM channel's full range.
    pub fn set_duty_cycle(
        &mut self,
        duty: u8,
    ) -> Result<(), HBridgeError<PinE, PwmE>> {
        self.pwm
            .set_duty_cycle_fraction(u16::from(duty), u16::from(MAX_DUTY))
            .map_err(HBridgeError::Pwm)
    }

    /// Hand back the owned lines.
    pub fn release(self) -> (A, B, P) {
        (self.dir_a, self.dir_b, self.pwm)
    }
}

/// Dual-channel L298N driver: left motor on one bridge, right motor on the other.
pub struct L298n<A, B, P> {
    left: HBridge<A, B, P>,
    right: HBridge<A, B, P>,
}

impl<A, B, P> L298n<A, B, P> {
    pub fn new(
        left: HBridge<A, B, P>,
        right: HBridge<A, B, P>,
    ) -> Self {
        Self { left, right }
    }

    /// Hand back both bridges as `(left, right)`.
    pub fn release(self) -> (HBridge<A, B, P>, HBridge<A, B, P>) {
        (self.left, self.right)
    }
}

impl<A, B, P, PinE, PwmE> Actuator for L298n<A, B, P>
where
    A: OutputPin<Error = PinE>,
    B: OutputPin<Error = PinE>,
    P: SetDutyCycle<Error = PwmE>,
    PinE: core::fmt::Debug,
    PwmE: core::fmt::Debug,
{
    type Error = HBridgeError<PinE, PwmE>;

    fn set_direction(
        &mut self,
        side: Side,
        direction: Direction,
    ) -> Result<(), Self::Error> {
        match side {
            Side::Left => self.left.set_direction(direction),
            Side::Right => self.right.set_direction(direction),
        }
    }

    fn set_duty_cycle(
        &mut self,
        side: Side,
        duty: u8,
    ) -> Result<(), Self::Error> {
        match side {
            Side::Left => self.left.set_duty_cycle(duty),
            Side::Right => self.right.set_duty_cycle(duty),
        }
    }
}
