//! Error types for the bring-up sequence

use core::fmt::{Debug, Write};

use thiserror_no_std::Error;

/// Capacity of the text kept from lower-level driver errors
pub const ERROR_TEXT_LEN: usize = 64;

pub type ErrorText = heapless::String<ERROR_TEXT_LEN>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SSID must be 1 to 32 bytes, got {0}")]
    SsidLength(usize),
    #[error("passphrase must be empty or 8 to 63 bytes, got {0}")]
    PassphraseLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BringUpError {
    #[error("serial console setup failed: {0}")]
    Console(ErrorText),
    #[error("I2C bus setup failed: {0}")]
    Bus(ErrorText),
    #[error("SSD1306 allocation failed")]
    DisplayInit,
    #[error("invalid WiFi credentials: {0}")]
    Credentials(#[from] ConfigError),
    #[error("WiFi association could not be started: {0}")]
    LinkStart(ErrorText),
    #[error("WiFi not connected after {attempts} checks ({waited_ms} ms)")]
    ConnectionTimeout { attempts: u32, waited_ms: u64 },
    #[error("display update failed: {0}")]
    Render(ErrorText),
}

impl BringUpError {
    /// Whether the display can still be used to show the failure.
    pub fn display_usable(&self) -> bool {
        !matches!(self, Self::Console(_) | Self::Bus(_) | Self::DisplayInit)
    }
}

/// Debug text of a driver error, truncated to [`ERROR_TEXT_LEN`] bytes.
pub fn describe<E: Debug>(err: &E) -> ErrorText {
    let mut text = ErrorText::new();
    // Overflow only truncates.
    let _ = write!(text, "{:?}", err);
    text
}
