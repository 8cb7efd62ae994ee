/// Compile-time configuration consumed by `NodeConfig::from_build_env()`.
const CONFIG_VARS: &[&str] = &[
    "CLIMANODE_WIFI_SSID",
    "CLIMANODE_WIFI_SECRET",
    "CLIMANODE_BROKER_HOST",
    "CLIMANODE_BROKER_PORT",
    "CLIMANODE_BROKER_USER",
    "CLIMANODE_BROKER_SECRET",
    "CLIMANODE_ROLE",
    "CLIMANODE_ALERT_BAND",
];

fn main() {
    for var in CONFIG_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
