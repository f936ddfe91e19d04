//! Port traits: the hexagonal boundary between the interlock and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LimbSafetySwitch (domain)
//! ```
//!
//! Switch drivers, clocks and storage implement these traits. The
//! [`LimbSafetySwitch`](super::service::LimbSafetySwitch) consumes them
//! via generics, so the interlock core never touches hardware directly.

use crate::config::{InterlockConfig, MIN_POLL_PERIOD_MS};
use crate::error::{ConfigError, StorageError};

// ───────────────────────────────────────────────────────────────
// Switch port (driven adapter: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// One debounced, voidable, enable-able input switch.
///
/// The interlock owns three of these by value and polls them once per
/// tick before taking its snapshot.
pub trait SwitchPort {
    /// Start polling with the given period. `false` if the switch refuses.
    fn begin(&mut self, poll_period_ms: u32) -> bool;

    /// Stop polling.
    fn end(&mut self);

    /// Refresh the switch from its input at `now_ms`.
    fn poll(&mut self, now_ms: u32);

    fn is_on(&self) -> bool;
    fn is_enabled(&self) -> bool;
    fn is_voided(&self) -> bool;

    fn enable(&mut self);
    fn disable(&mut self);

    /// Minimum hold time before a press is accepted.
    fn set_start_delay(&mut self, ms: u32);

    /// Maximum hold time before a press is voided. Rejects values the
    /// switch cannot honour.
    fn set_void_time(&mut self, ms: u32) -> bool;

    /// Fastest poll period this switch can usefully feed.
    fn min_poll_period_ms(&self) -> u32 {
        MIN_POLL_PERIOD_MS
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock. Wraps at `u32::MAX`.
pub trait ClockPort {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the interlock configuration.
///
/// Implementations MUST validate before persisting and after loading.
/// Invalid values are rejected, never clamped.
pub trait ConfigPort {
    /// [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<InterlockConfig, ConfigError>;

    fn save(&self, config: &InterlockConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value blob storage. Writes are atomic.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}
