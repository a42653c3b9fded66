//! Hardware-independent core library for linkup
//!
//! This crate contains the platform-agnostic part of the device bring-up:
//! build-time configuration, the bring-up sequence and its state machine,
//! text rendering for the 128x64 OLED, and the traits the firmware and the
//! simulator implement for the display panel and the WiFi link.
//!
//! It is `#![no_std]` without `alloc` so it compiles on the ESP32 target and
//! on desktop hosts (for the simulator and tests).

#![no_std]

pub mod bring_up;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod link;
pub mod panel;
pub mod terminal;

pub use bring_up::{BringUp, BringUpState, Device};
pub use config::Config;
pub use error::{BringUpError, ConfigError};
pub use link::{LinkStatus, WifiLink};
pub use panel::OledPanel;
