//! Bakes the WiFi credentials into the firmware.
//!
//! Values come from the build environment first, then from `.env` next to
//! this file. Lengths the station would reject fail the build.

use std::env;

use linkup_core::config::InternetConfig;

const CREDENTIAL_KEYS: [&str; 2] = ["LINKUP_WIFI_SSID", "LINKUP_WIFI_PASSWORD"];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env");

    let from_file: Vec<(String, String)> = match dotenvy::from_filename_iter(".env") {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(_) => Vec::new(),
    };

    let [ssid, password] = CREDENTIAL_KEYS.map(|key| {
        println!("cargo:rerun-if-env-changed={key}");

        let value = env::var(key).ok().or_else(|| {
            from_file
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        });

        match &value {
            Some(value) => println!("cargo:rustc-env={key}={value}"),
            None => println!("cargo:warning={key} is not set, add it to .env (see .env.example)"),
        }
        value
    });

    if let (Some(ssid), Some(password)) = (ssid, password) {
        let credentials = InternetConfig {
            ssid: &ssid,
            password: &password,
        };
        if let Err(err) = credentials.validate() {
            panic!("Invalid WiFi credentials in LINKUP_WIFI_SSID / LINKUP_WIFI_PASSWORD: {err}");
        }
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
