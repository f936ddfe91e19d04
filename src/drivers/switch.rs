//! Debounced, voidable, enable-able input switch.
//!
//! ## Hardware
//!
//! One digital input per switch. Contact type and pull direction decide
//! which level means "pressed":
//!
//! | Contact | Pull | Pressed reads |
//! |---------|------|---------------|
//! | NO      | up   | low           |
//! | NO      | down | high          |
//! | NC      | up   | high          |
//! | NC      | down | low           |
//!
//! ## Press timeline
//!
//! ```text
//!  raw ──┐  debounce  ┌─ start delay ─┬──────── void time ────────┬──────
//!        └────────────┘               │  is_on = true             │ voided
//! ```
//!
//! A voided press must be released and pressed again. After `enable()`
//! the input must be seen released before a press counts, so a contact
//! held through enablement never reads on.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::SwitchPort;
use crate::config::{MIN_VOID_TIME_MS, STD_VOID_TIME_MS, SwitchInputConfig};

pub struct DebouncedSwitch<P> {
    pin: P,
    input: SwitchInputConfig,
    start_delay_ms: u32,
    void_time_ms: u32,
    enabled: bool,
    /// Reported state while disabled.
    on_if_disabled: bool,
    running: bool,
    needs_release: bool,

    // -- Debounce --
    raw_pressed: bool,
    raw_since_ms: u32,
    stable_pressed: bool,
    pressed_since_ms: u32,

    // -- Derived at each poll --
    on: bool,
    voided: bool,
}

impl<P: InputPin> DebouncedSwitch<P> {
    /// Starts disabled; the interlock decides enablement.
    pub fn new(pin: P, input: SwitchInputConfig) -> Self {
        Self {
            pin,
            input,
            start_delay_ms: 0,
            void_time_ms: STD_VOID_TIME_MS,
            enabled: false,
            on_if_disabled: false,
            running: false,
            needs_release: true,
            raw_pressed: false,
            raw_since_ms: 0,
            stable_pressed: false,
            pressed_since_ms: 0,
            on: false,
            voided: false,
        }
    }

    /// Report on while disabled (a hand position the installation does
    /// not staff).
    pub fn set_on_if_disabled(&mut self, on: bool) {
        self.on_if_disabled = on;
    }

    /// Debounced contact state, independent of enablement and timing.
    pub fn is_pressed(&self) -> bool {
        self.stable_pressed
    }

    fn read_pressed(&mut self) -> bool {
        let pressed_level_high = self.input.is_normally_open != self.input.is_pulled_up;
        match self.pin.is_high() {
            Ok(high) => high == pressed_level_high,
            Err(_) => {
                // An unreadable contact counts as released.
                warn!("SWITCH: GPIO {} read failed", self.input.pin);
                false
            }
        }
    }
}

impl<P: InputPin> SwitchPort for DebouncedSwitch<P> {
    fn begin(&mut self, _poll_period_ms: u32) -> bool {
        self.running = true;
        true
    }

    fn end(&mut self) {
        self.running = false;
        self.on = false;
        self.voided = false;
    }

    fn poll(&mut self, now_ms: u32) {
        if !self.running {
            return;
        }

        let raw = self.read_pressed();
        if raw != self.raw_pressed {
            self.raw_pressed = raw;
            self.raw_since_ms = now_ms;
        }
        if self.raw_pressed != self.stable_pressed
            && now_ms.wrapping_sub(self.raw_since_ms) >= self.input.debounce_ms
        {
            self.stable_pressed = self.raw_pressed;
            self.pressed_since_ms = now_ms;
        }

        if !self.stable_pressed {
            self.needs_release = false;
            self.on = false;
            self.voided = false;
            return;
        }
        if !self.enabled || self.needs_release {
            self.on = false;
            self.voided = false;
            return;
        }

        let held = now_ms.wrapping_sub(self.pressed_since_ms);
        let accepted = held >= self.start_delay_ms;
        self.voided = accepted && held - self.start_delay_ms >= self.void_time_ms;
        self.on = accepted && !self.voided;
    }

    fn is_on(&self) -> bool {
        if self.enabled { self.on } else { self.on_if_disabled }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_voided(&self) -> bool {
        self.enabled && self.voided
    }

    fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.needs_release = true;
            self.on = false;
            self.voided = false;
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.on = false;
        self.voided = false;
    }

    fn set_start_delay(&mut self, ms: u32) {
        self.start_delay_ms = ms;
    }

    fn set_void_time(&mut self, ms: u32) -> bool {
        if ms < MIN_VOID_TIME_MS {
            return false;
        }
        self.void_time_ms = ms;
        true
    }

    fn min_poll_period_ms(&self) -> u32 {
        // Debounce needs at least two samples inside its window.
        (self.input.debounce_ms / 2).max(crate::config::MIN_POLL_PERIOD_MS)
    }
}
