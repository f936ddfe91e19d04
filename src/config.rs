//! Interlock configuration parameters
//!
//! Hardware facts (pins, polarity, debounce) are fixed at construction.
//! Behaviour facts (start delay, enablement, void time) and the working
//! timings are mutable at runtime through validated setters.
//! Values can be persisted through [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;

/// Minimum void time an underlying hand or foot switch accepts.
pub const MIN_VOID_TIME_MS: u32 = 1000;
/// Standard void time for a hand switch.
pub const STD_VOID_TIME_MS: u32 = 10_000;
/// Standard input debounce time.
pub const STD_DEBOUNCE_MS: u32 = 20;
/// Fastest poll period the underlying switches can usefully feed.
pub const MIN_POLL_PERIOD_MS: u32 = 1;
/// Poll period used when none is configured.
pub const DEFAULT_POLL_PERIOD_MS: u32 = 10;

/// Hardware characteristics of one physical input switch.
///
/// Set by the hardware developers; never modified at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchInputConfig {
    /// GPIO number the switch is wired to.
    pub pin: i32,
    /// `true` for a normally-open contact.
    pub is_normally_open: bool,
    /// `true` when the input is pulled up (pressed reads low for NO).
    pub is_pulled_up: bool,
    /// Debounce window in milliseconds.
    pub debounce_ms: u32,
}

impl SwitchInputConfig {
    /// A normally-open, pulled-up switch with the standard debounce time.
    pub const fn new(pin: i32) -> Self {
        Self {
            pin,
            is_normally_open: true,
            is_pulled_up: true,
            debounce_ms: STD_DEBOUNCE_MS,
        }
    }
}

/// Runtime behaviour of one switch.
///
/// The foot switch uses the reduced form: only `start_delay_ms` and
/// `void_time_ms` apply, its enablement is owned by the FDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchBehaviorConfig {
    /// Minimum hold time before a press is accepted.
    pub start_delay_ms: u32,
    /// Whether this switch counts toward interlock evaluation.
    pub is_enabled: bool,
    /// Maximum hold time before the press is voided.
    pub void_time_ms: u32,
}

impl Default for SwitchBehaviorConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 0,
            is_enabled: true,
            void_time_ms: STD_VOID_TIME_MS,
        }
    }
}

impl SwitchBehaviorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.void_time_ms < MIN_VOID_TIME_MS {
            return Err(ConfigError::VoidTimeTooShort {
                min_ms: MIN_VOID_TIME_MS,
            });
        }
        Ok(())
    }
}

/// Timings of the two-phase activation output.
///
/// Both durations are measured from the same cycle start instant.
/// Invariant: `0 < latch_release_total_ms <= production_cycle_total_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbSafetyWorkingConfig {
    latch_release_total_ms: u32,
    production_cycle_total_ms: u32,
}

impl Default for LimbSafetyWorkingConfig {
    fn default() -> Self {
        Self {
            latch_release_total_ms: 1500,
            production_cycle_total_ms: 6000,
        }
    }
}

impl LimbSafetyWorkingConfig {
    pub fn new(
        latch_release_total_ms: u32,
        production_cycle_total_ms: u32,
    ) -> Result<Self, ConfigError> {
        let cfg = Self {
            latch_release_total_ms,
            production_cycle_total_ms,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn latch_release_total_ms(&self) -> u32 {
        self.latch_release_total_ms
    }

    pub fn production_cycle_total_ms(&self) -> u32 {
        self.production_cycle_total_ms
    }

    /// Rejects zero and values above the production cycle time.
    pub fn set_latch_release_total_ms(&mut self, ms: u32) -> Result<(), ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if ms > self.production_cycle_total_ms {
            return Err(ConfigError::ReleaseExceedsCycle);
        }
        self.latch_release_total_ms = ms;
        Ok(())
    }

    /// Rejects zero and values below the latch release time.
    pub fn set_production_cycle_total_ms(&mut self, ms: u32) -> Result<(), ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if ms < self.latch_release_total_ms {
            return Err(ConfigError::CycleShorterThanRelease);
        }
        self.production_cycle_total_ms = ms;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.latch_release_total_ms == 0 || self.production_cycle_total_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.latch_release_total_ms > self.production_cycle_total_ms {
            return Err(ConfigError::ReleaseExceedsCycle);
        }
        Ok(())
    }
}

/// Complete interlock configuration, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterlockConfig {
    // --- Hardware ---
    pub left_hand_input: SwitchInputConfig,
    pub right_hand_input: SwitchInputConfig,
    pub foot_input: SwitchInputConfig,

    // --- Behaviour ---
    pub left_hand: SwitchBehaviorConfig,
    pub right_hand: SwitchBehaviorConfig,
    pub foot: SwitchBehaviorConfig,

    // --- Timing ---
    pub working: LimbSafetyWorkingConfig,
    /// Period of the poll driver tick (milliseconds).
    pub poll_period_ms: u32,
}

impl Default for InterlockConfig {
    fn default() -> Self {
        Self {
            left_hand_input: SwitchInputConfig::new(pins::LEFT_HAND_GPIO),
            right_hand_input: SwitchInputConfig::new(pins::RIGHT_HAND_GPIO),
            foot_input: SwitchInputConfig::new(pins::FOOT_GPIO),
            left_hand: SwitchBehaviorConfig::default(),
            right_hand: SwitchBehaviorConfig::default(),
            foot: SwitchBehaviorConfig::default(),
            working: LimbSafetyWorkingConfig::default(),
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
        }
    }
}

impl InterlockConfig {
    /// Check every invariant. Used before persisting and after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.left_hand.validate()?;
        self.right_hand.validate()?;
        self.foot.validate()?;
        self.working.validate()?;
        if self.poll_period_ms < MIN_POLL_PERIOD_MS {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(())
    }
}
