//! Application core.
//!
//! The port traits in [`ports`] are the only way the core reaches hardware,
//! and [`node`] is the main loop that composes everything behind them.

pub mod node;
pub mod ports;
