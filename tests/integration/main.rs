//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one component against
//! the journaling mock adapters.  All tests run on the host (x86_64) with
//! no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod link_tests;
mod mock_hw;
mod session_tests;
