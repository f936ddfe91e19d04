//! LimbSafety firmware library.
//!
//! A single-shot limb-safety interlock: the latch release and production
//! cycle outputs are only driven after both hand switches are on and the
//! foot switch is then pressed, with every step timed and ordered by a
//! deterministic automaton.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod notify;
pub mod pins;
pub mod poll;
pub mod status;

pub mod adapters;
pub mod drivers;
