//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements              | Connects to              |
//! |------------|-------------------------|--------------------------|
//! | `log_sink` | NotifyTarget            | Serial log output        |
//! | `nvs`      | ConfigPort, StoragePort | NVS / in-memory store    |
//! | `time`     | ClockPort               | ESP32 system timer       |

pub mod log_sink;
pub mod nvs;
pub mod time;
