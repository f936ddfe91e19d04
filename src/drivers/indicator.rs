//! Status-word to output-pin updater.
//!
//! Drives the machine outputs (latch release, production cycle) and the
//! panel lamps from a published status word. Each line is lit when every
//! bit of its mask is set in the word; polarity is per pin.

use embedded_hal::digital::{OutputPin, PinState};

use crate::pins;
use crate::status;

/// One output pin and its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioOutputConfig {
    pub pin: i32,
    pub active_high: bool,
}

impl GpioOutputConfig {
    pub const fn active_high(pin: i32) -> Self {
        Self {
            pin,
            active_high: true,
        }
    }
}

/// Lamp lit while both hands are on (ready for the foot switch).
pub const HANDS_OK: u32 = status::LEFT_HAND_ON | status::RIGHT_HAND_ON;

/// Default board wiring: `(status mask, output)`.
pub const BOARD_LINES: [(u32, GpioOutputConfig); 11] = [
    (status::LATCH_RELEASE_ON, GpioOutputConfig::active_high(pins::LATCH_RELEASE_GPIO)),
    (status::PRODUCTION_CYCLE_ON, GpioOutputConfig::active_high(pins::PRODUCTION_CYCLE_GPIO)),
    (HANDS_OK, GpioOutputConfig::active_high(pins::HANDS_OK_GPIO)),
    (status::LEFT_HAND_ON, GpioOutputConfig::active_high(pins::LEFT_HAND_ON_GPIO)),
    (status::LEFT_HAND_ENABLED, GpioOutputConfig::active_high(pins::LEFT_HAND_ENABLED_GPIO)),
    (status::LEFT_HAND_VOIDED, GpioOutputConfig::active_high(pins::LEFT_HAND_VOIDED_GPIO)),
    (status::RIGHT_HAND_ON, GpioOutputConfig::active_high(pins::RIGHT_HAND_ON_GPIO)),
    (status::RIGHT_HAND_ENABLED, GpioOutputConfig::active_high(pins::RIGHT_HAND_ENABLED_GPIO)),
    (status::RIGHT_HAND_VOIDED, GpioOutputConfig::active_high(pins::RIGHT_HAND_VOIDED_GPIO)),
    (status::FOOT_ON, GpioOutputConfig::active_high(pins::FOOT_ON_GPIO)),
    (status::FOOT_ENABLED, GpioOutputConfig::active_high(pins::FOOT_ENABLED_GPIO)),
];

struct Line<P> {
    mask: u32,
    active_high: bool,
    pin: P,
}

pub struct IndicatorUpdater<P> {
    lines: Vec<Line<P>>,
    last_word: Option<u32>,
}

impl<P: OutputPin> Default for IndicatorUpdater<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin> IndicatorUpdater<P> {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            last_word: None,
        }
    }

    /// Add a line. The pin is driven inactive immediately, so a machine
    /// output never floats active before the first word arrives.
    pub fn add_line(&mut self, mask: u32, cfg: GpioOutputConfig, mut pin: P) -> Result<(), P::Error> {
        pin.set_state(PinState::from(!cfg.active_high))?;
        self.lines.push(Line {
            mask,
            active_high: cfg.active_high,
            pin,
        });
        self.last_word = None;
        Ok(())
    }

    /// Drive every line from `word`. Repeated words are skipped.
    pub fn apply(&mut self, word: u32) -> Result<(), P::Error> {
        if self.last_word == Some(word) {
            return Ok(());
        }
        for line in &mut self.lines {
            let lit = line.mask != 0 && word & line.mask == line.mask;
            line.pin.set_state(PinState::from(lit == line.active_high))?;
        }
        self.last_word = Some(word);
        Ok(())
    }
}
