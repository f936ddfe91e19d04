//! Unified error types for the LimbSafety firmware.
//!
//! Every fallible operation in the interlock core funnels into [`Error`].
//! All variants are `Copy` so they can be returned from inside the
//! critical section that guards the switch without allocation.
//!
//! The FDA itself never fails mid-tick: only configuration setters,
//! persistence and start-up return errors.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A configuration value was rejected; the prior value is unchanged.
    Config(ConfigError),
    /// The switch could not be started.
    Start(StartError),
    /// Persistent storage failed.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Start(e) => write!(f, "start: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity of the three underlying switches
// ---------------------------------------------------------------------------

/// Which of the three underlying switches an error or command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchId {
    LeftHand,
    RightHand,
    Foot,
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftHand => write!(f, "left hand"),
            Self::RightHand => write!(f, "right hand"),
            Self::Foot => write!(f, "foot"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration that must be positive was zero.
    ZeroDuration,
    /// Latch release time would exceed the production cycle time.
    ReleaseExceedsCycle,
    /// Production cycle time would be shorter than the latch release time.
    CycleShorterThanRelease,
    /// Void time below the minimum the underlying switch accepts.
    VoidTimeTooShort { min_ms: u32 },
    /// The underlying switch refused the value.
    RejectedBySwitch(SwitchId),
    /// Stored configuration failed decoding or validation.
    Corrupted,
    /// No stored configuration exists (first boot).
    NotFound,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDuration => write!(f, "duration must be greater than zero"),
            Self::ReleaseExceedsCycle => {
                write!(f, "latch release time exceeds production cycle time")
            }
            Self::CycleShorterThanRelease => {
                write!(f, "production cycle time shorter than latch release time")
            }
            Self::VoidTimeTooShort { min_ms } => {
                write!(f, "void time below minimum of {min_ms} ms")
            }
            Self::RejectedBySwitch(id) => write!(f, "{id} switch rejected the value"),
            Self::Corrupted => write!(f, "stored config corrupted"),
            Self::NotFound => write!(f, "stored config not found"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Start-up errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// Requested poll period is faster than the switches can supply data.
    PollPeriodTooShort { requested_ms: u32, min_ms: u32 },
    /// An underlying switch refused to start polling.
    SwitchBeginFailed(SwitchId),
    /// `begin` was called on a switch that is already running.
    AlreadyStarted,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PollPeriodTooShort {
                requested_ms,
                min_ms,
            } => write!(
                f,
                "poll period {requested_ms} ms below minimum of {min_ms} ms"
            ),
            Self::SwitchBeginFailed(id) => write!(f, "{id} switch failed to begin polling"),
            Self::AlreadyStarted => write!(f, "already started"),
        }
    }
}

impl From<StartError> for Error {
    fn from(e: StartError) -> Self {
        Self::Start(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
