//! Application core: the interlock policy, zero direct I/O.
//!
//! The [`service::LimbSafetySwitch`] drives the FDA over three switches
//! reached through the **port traits** in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod ports;
pub mod service;
