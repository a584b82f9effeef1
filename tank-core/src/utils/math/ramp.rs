//! Ramp arithmetic and speed-to-signal mapping for H-bridge motor channels.
//!
//! A motor speed is a signed `i16`: the sign selects the bridge polarity and the
//! magnitude is the PWM duty (8-bit, 0–255). `ramp_toward` moves a commanded speed
//! toward its target by a bounded step, and `ChannelSignal::from_speed` turns the
//! result into the line levels an L298N-style driver expects.
//!
//! # Example
//! ```rust
//! use tank_core::utils::math::ramp::{ramp_toward, ChannelSignal, Direction};
//! let next = ramp_toward(0, 100, 10);
//! assert_eq!(next, 10);
//! let signal = ChannelSignal::from_speed(-50);
//! assert_eq!(signal.direction, Direction::Reverse);
//! assert_eq!(signal.duty, 50);
//! ```

use serde::{Deserialize, Serialize};

/// Largest duty the 8-bit PWM output accepts.
pub const MAX_DUTY: u8 = u8::MAX;

/// Ramp tuning: how far and how often the commanded speed may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampConfig {
    /// Maximum change of the commanded speed per tick.
    pub step: u8,
    /// Minimum time between two ticks (ms).
    pub interval_ms: u8,
}

impl RampConfig {
    pub const DEFAULT_STEP: u8 = 10;
    pub const DEFAULT_INTERVAL_MS: u8 = 10;

    /// Build a configuration, falling back to the defaults for missing fields.
    ///
    /// A `step` of zero is accepted; it freezes the commanded speed where it is.
    pub fn new(
        step: Option<u8>,
        interval_ms: Option<u8>,
    ) -> Self {
        Self {
            step: step.unwrap_or(Self::DEFAULT_STEP),
            interval_ms: interval_ms.unwrap_or(Self::DEFAULT_INTERVAL_MS),
        }
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Move `current` toward `target` by at most `step`, stopping exactly on the target.
pub fn ramp_toward(
    current: i16,
    target: i16,
    step: u8,
) -> i16 {
    let step = i16::from(step);
    if current < target {
        current.saturating_add(step).min(target)
    } else if current > target {
        current.saturating_sub(step).max(target)
    } else {
        current
    }
}

/// Number of ticks `ramp_toward` needs to bring `current` onto `target`.
///
/// Returns `None` if the target can never be reached (`step == 0` with a gap left).
pub fn ticks_to_reach(
    current: i16,
    target: i16,
    step: u8,
) -> Option<u32> {
    let gap = (i32::from(target) - i32::from(current)).unsigned_abs();
    if gap == 0 {
        return Some(0);
    }
    if step == 0 {
        return None;
    }
    Some(gap.div_ceil(u32::from(step)))
}

/// Bridge polarity of one motor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Direction-A high, direction-B low.
    Forward,
    /// Direction-A low, direction-B high.
    Reverse,
    /// Both direction lines low.
    Coast,
}

impl Direction {
    /// Line levels as `(direction_a, direction_b)`.
    pub const fn levels(self) -> (bool, bool) {
        match self {
            Direction::Forward => (true, false),
            Direction::Reverse => (false, true),
            Direction::Coast => (false, false),
        }
    }
}

/// Everything one H-bridge channel needs to be driven: polarity plus duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSignal {
    pub direction: Direction,
    pub duty: u8,
}

impl ChannelSignal {
    /// Both lines low, no duty.
    pub const STOPPED: Self = Self {
        direction: Direction::Coast,
        duty: 0,
    };

    /// Map a signed speed onto bridge polarity and duty.
    ///
    /// `speed > 0` drives forward, `speed < 0` in reverse, and zero coasts.
    ///
    /// Magnitudes beyond [`MAX_DUTY`] saturate.
    pub fn from_speed(speed: i16) -> Self {
        let duty = speed.unsigned_abs().min(u16::from(MAX_DUTY)) as u8;
        match speed {
            s if s > 0 => Self {
                direction: Direction::Forward,
                duty,
            },
            s if s < 0 => Self {
                direction: Direction::Reverse,
                duty,
            },
            _ => Self::STOPPED,
        }
    }
}

impl Default for ChannelSignal {
    fn default() -> Self {
        Self::STOPPED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_up_clamps_at_target() {
        assert_eq!(ramp_toward(0, 100, 10), 10);
        assert_eq!(ramp_toward(95, 100, 10), 100);
        assert_eq!(ramp_toward(100, 100, 10), 100);
    }

    #[test]
    fn test_ramp_down_clamps_at_target() {
        assert_eq!(ramp_toward(100, 0, 30), 70);
        assert_eq!(ramp_toward(20, 0, 30), 0);
        assert_eq!(ramp_toward(-20, -25, 30), -25);
    }

    #[test]
    fn test_ramp_crosses_zero_on_reversal() {
        // Reversal is not special-cased: the speed walks through zero.
        let mut speed = 30;
        let mut seen = [0i16; 6];
        for slot in seen.iter_mut() {
            speed = ramp_toward(speed, -30, 10);
            *slot = speed;
        }
        assert_eq!(seen, [20, 10, 0, -10, -20, -30]);
    }

    #[test]
    fn test_zero_step_freezes_speed() {
        assert_eq!(ramp_toward(40, 200, 0), 40);
        assert_eq!(ticks_to_reach(40, 200, 0), None);
        assert_eq!(ticks_to_reach(40, 40, 0), Some(0));
    }

    #[test]
    fn test_ticks_to_reach_rounds_up() {
        assert_eq!(ticks_to_reach(0, 100, 10), Some(10));
        assert_eq!(ticks_to_reach(0, 101, 10), Some(11));
        assert_eq!(ticks_to_reach(255, -255, 255), Some(2));
    }

    #[test]
    fn test_ramp_never_overflows_at_extremes() {
        assert_eq!(ramp_toward(i16::MAX - 1, i16::MAX, 255), i16::MAX);
        assert_eq!(ramp_toward(i16::MIN + 1, i16::MIN, 255), i16::MIN);
    }

    #[test]
    fn test_signal_mapping() {
        assert_eq!(
            ChannelSignal::from_speed(120),
            ChannelSignal {
                direction: Direction::Forward,
                duty: 120
            }
        );
        assert_eq!(
            ChannelSignal::from_speed(-50),
            ChannelSignal {
                direction: Direction::Reverse,
                duty: 50
            }
        );
        assert_eq!(ChannelSignal::from_speed(0), ChannelSignal::STOPPED);
        assert_eq!(ChannelSignal::from_speed(-400).duty, MAX_DUTY);
    }

    #[test]
    fn test_direction_levels() {
        assert_eq!(Direction::Forward.levels(), (true, false));
        assert_eq!(Direction::Reverse.levels(), (false, true));
        assert_eq!(Direction::Coast.levels(), (false, false));
    }

    #[test]
    fn test_ramp_config_defaults() {
        let cfg = RampConfig::new(Some(25), None);
        assert_eq!(cfg.step, 25);
        assert_eq!(cfg.interval_ms, RampConfig::DEFAULT_INTERVAL_MS);
        assert_eq!(RampConfig::default(), RampConfig::new(Some(10), Some(10)));
    }
}
