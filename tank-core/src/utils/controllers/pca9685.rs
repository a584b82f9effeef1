//! PCA9685-backed actuator for the tank drive.
//!
//! Some boards run out of hardware PWM pins and wire all six L298N inputs to a
//! PCA9685 expander instead. Direction lines are driven as fully-on / fully-off
//! channels; the enable line carries the scaled duty. The expander sits on a shared
//! I2C bus, borrowed through `RefCellDevice`.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use super::h_bridge::{Actuator, Side};
use crate::utils::math::ramp::{Direction, MAX_DUTY};

/// Default I2C address of the expander.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Full-scale count of a PCA9685 channel.
const PWM_FULL: u16 = 4095;
/// Prescale value written by `enable()`.
const PRESCALE: u8 = 100;

/// PCA9685 channels wired to one L298N bridge.
#[derive(Debug, Clone, Copy)]
pub struct BridgeChannels {
    pub dir_a: Channel,
    pub dir_b: Channel,
    pub pwm: Channel,
}

/// L298N driven entirely through a PCA9685 expander.
pub struct Pca9685Bridge<'a, I2C: 'static> {
    pwm: Pca9685<RefCellDevice<'a, I2C>>,
    channels: [BridgeChannels; 2],
}

impl<'a, I2C, E> Pca9685Bridge<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Bind the expander and channel layout. Nothing is written to the bus yet.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: Option<u8>,
        left: BridgeChannels,
        right: BridgeChannels,
    ) -> Result<Self, PwmError<E>> {
        let pwm = Pca9685::new(
            RefCellDevice::new(i2c_bus),
            PwmAddress::from(address.unwrap_or(DEFAULT_ADDRESS)),
        )?;
        Ok(Self {
            pwm,
            channels: [left, right],
        })
    }

    fn channels(
        &self,
        side: Side,
    ) -> BridgeChannels {
        match side {
            Side::Left => self.channels[0],
            Side::Right => self.channels[1],
        }
    }

    fn line(
        &mut self,
        channel: Channel,
        asserted: bool,
    ) -> Result<(), PwmError<E>> {
        let off = if asserted { PWM_FULL } else { 0 };
        self.pwm.set_channel_on_off(channel, 0, off)
    }
}

impl<I2C, E> Actuator for Pca9685Bridge<'_, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = PwmError<E>;

    fn enable(&mut self) -> Result<(), Self::Error> {
        self.pwm.enable()?;
        self.pwm.set_prescale(PRESCALE)?;
        tracing::info!("PCA9685 enabled, prescale {}", PRESCALE);
        Ok(())
    }

    fn set_direction(
        &mut self,
        side: Side,
        direction: Direction,
    ) -> Result<(), Self::Error> {
        let channels = self.channels(side);
        let (a, b) = direction.levels();
        self.line(channels.dir_a, a)?;
        self.line(channels.dir_b, b)
    }

    fn set_duty_cycle(
        &mut self,
        side: Side,
        duty: u8,
    ) -> Result<(), Self::Error> {
        let channel = self.channels(side).pwm;
        let off = (u32::from(duty) * u32::from(PWM_FULL) / u32::from(MAX_DUTY)) as u16;
        self.pwm.set_channel_on_off(channel, 0, off)
    }
}
