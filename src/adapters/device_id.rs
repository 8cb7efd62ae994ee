//! Broker client identity derived from the ESP32 factory MAC address.
//!
//! The client id is the full 6-byte MAC in lowercase hex (`deadbeefcafe`).
//! It is stable across resets, which matters for a crash-only device: the
//! broker sees the same client come back after every restart.

use core::fmt::Write;

/// Broker client id: 12 lowercase hex chars.
pub type ClientId = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Hex-encode the MAC into a broker client id.
pub fn client_id(mac: &MacAddress) -> ClientId {
    let mut id = ClientId::new();
    for byte in mac {
        // 12 chars always fit the 16-byte buffer.
        let _ = write!(id, "{:02x}", byte);
    }
    id
}
