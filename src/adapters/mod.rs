//! Adapters: the supervisor components that sit on a port trait, plus the
//! ESP-IDF implementations of those ports.
//!
//! | Adapter     | Drives         | ESP-IDF implementation    |
//! |-------------|----------------|---------------------------|
//! | `wifi`      | `Radio`        | `EspRadio` (EspWifi STA)  |
//! | `mqtt`      | `PubSubClient` | `EspPubSub` (EspMqttClient) |
//! | `device_id` |                | eFuse factory MAC         |

pub mod device_id;
pub mod mqtt;
pub mod wifi;
