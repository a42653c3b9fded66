//! ESP32 firmware-specific modules for linkup
//!
//! Everything here touches esp-hal peripherals or the radio and only builds
//! for the `xtensa-esp32-none-elf` target. The bring-up sequence itself lives
//! in `linkup-core`.

#![no_std]

extern crate alloc;

pub mod hardware;
pub mod panel;
pub mod wifi;
pub mod wifi_secrets;
