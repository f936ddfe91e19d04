//! GPIO pin assignments for the LimbSafety controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Inputs (normally-open contacts, pulled up)
// ---------------------------------------------------------------------------

/// Left hand palm switch.
pub const LEFT_HAND_GPIO: i32 = 25;
/// Right hand palm switch.
pub const RIGHT_HAND_GPIO: i32 = 26;
/// Foot pedal switch.
pub const FOOT_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Machine outputs
// ---------------------------------------------------------------------------

/// Latch release solenoid driver (active HIGH).
pub const LATCH_RELEASE_GPIO: i32 = 32;
/// Production cycle enable relay (active HIGH).
pub const PRODUCTION_CYCLE_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// "Hands OK, ready for foot switch" lamp.
pub const HANDS_OK_GPIO: i32 = 21;
/// Left hand isOn / isEnabled / isVoided lamps.
pub const LEFT_HAND_ON_GPIO: i32 = 14;
pub const LEFT_HAND_ENABLED_GPIO: i32 = 12;
pub const LEFT_HAND_VOIDED_GPIO: i32 = 13;
/// Right hand isOn / isEnabled / isVoided lamps.
pub const RIGHT_HAND_ON_GPIO: i32 = 15;
pub const RIGHT_HAND_ENABLED_GPIO: i32 = 2;
pub const RIGHT_HAND_VOIDED_GPIO: i32 = 4;
/// Foot isOn / isEnabled lamps.
pub const FOOT_ON_GPIO: i32 = 16;
pub const FOOT_ENABLED_GPIO: i32 = 17;
