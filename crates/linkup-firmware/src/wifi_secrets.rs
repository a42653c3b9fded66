//! WiFi credentials, baked in at build time by `build.rs`.

pub const WIFI_SSID: &str = env!(
    "LINKUP_WIFI_SSID",
    "Set LINKUP_WIFI_SSID in .env or the environment before building."
);

/// Empty for an open network.
pub const WIFI_PASSWORD: &str = env!(
    "LINKUP_WIFI_PASSWORD",
    "Set LINKUP_WIFI_PASSWORD in .env or the environment before building."
);
