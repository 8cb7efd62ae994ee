//! Default GPIO assignments for the climanode board.
//!
//! Single source of truth for the defaults in [`NodeConfig`](crate::config::NodeConfig).

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// DHT11 single-wire data line (open drain, external 10 kΩ pull-up).
pub const DHT_DATA_GPIO: i32 = 28;

// ---------------------------------------------------------------------------
// Actuation output
// ---------------------------------------------------------------------------

/// LED or relay driver.  Configured input-output so the actuator can read
/// back the level it last drove.
pub const OUTPUT_GPIO: i32 = 15;
