//! climanode firmware library.
//!
//! Exposes the connectivity core for integration testing against mock
//! adapters. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod actuation;
pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod recovery;
pub mod scheduler;
pub mod topics;
