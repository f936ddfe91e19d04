//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock switches or the real debounced driver.  All tests run on
//! the host (x86_64) with no real hardware required.

mod interlock_tests;
mod mock_hw;
mod poll_tests;
