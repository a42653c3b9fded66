//! Build-time configuration for the bring-up sequence
//!
//! Every parameter is a compile-time constant. The [`Config`] struct groups
//! them so the sequence receives its configuration explicitly instead of
//! reading globals.

use embassy_time::Duration;

use crate::error::ConfigError;

/// Serial console baud rate
pub const SERIAL_BAUD: u32 = 115_200;

/// I2C data line
pub const I2C_SDA_GPIO: u8 = 21;
/// I2C clock line
pub const I2C_SCL_GPIO: u8 = 22;
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// 7-bit I2C address of the SSD1306 with SA0 tied low
pub const OLED_I2C_ADDRESS: u8 = 0x3C;
pub const OLED_WIDTH_PX: u32 = 128;
pub const OLED_HEIGHT_PX: u32 = 64;

/// Delay between two association status checks. Also the lower bound for
/// any custom interval.
pub const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// How long to wait for the network before reporting a timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub const MAX_SSID_LEN: usize = 32;
pub const MIN_PASSPHRASE_LEN: usize = 8;
pub const MAX_PASSPHRASE_LEN: usize = 63;

/// Complete configuration for one bring-up run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub serial: SerialConfig,
    pub bus: BusConfig,
    pub display: DisplayConfig,
    pub connect: ConnectPolicy,
}

impl<'a> Config<'a> {
    /// Configuration for the given network with every other setting at its
    /// board default.
    pub const fn new(ssid: &'a str, password: &'a str) -> Self {
        Self {
            internet: InternetConfig { ssid, password },
            serial: SerialConfig { baud: SERIAL_BAUD },
            bus: BusConfig {
                sda_gpio: I2C_SDA_GPIO,
                scl_gpio: I2C_SCL_GPIO,
                frequency_khz: I2C_FREQUENCY_KHZ,
            },
            display: DisplayConfig {
                address: OLED_I2C_ADDRESS,
                width_px: OLED_WIDTH_PX,
                height_px: OLED_HEIGHT_PX,
            },
            connect: ConnectPolicy::bounded(CONNECT_POLL_INTERVAL, CONNECT_TIMEOUT),
        }
    }

    pub const fn with_connect_policy(mut self, connect: ConnectPolicy) -> Self {
        self.connect = connect;
        self
    }
}

/// WiFi station credentials
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

impl InternetConfig<'_> {
    /// Check the credentials against the limits of a WPA2-Personal station.
    ///
    /// An empty passphrase selects an open network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidLength(self.ssid.len()));
        }

        let pass_len = self.password.len();
        if pass_len != 0 && !(MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&pass_len) {
            return Err(ConfigError::PassphraseLength(pass_len));
        }

        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// Keeps the passphrase out of logs.
impl core::fmt::Debug for InternetConfig<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InternetConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub sda_gpio: u8,
    pub scl_gpio: u8,
    pub frequency_khz: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub address: u8,
    pub width_px: u32,
    pub height_px: u32,
}

/// How the sequence waits for the network to come up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ConnectPolicy {
    /// Poll every `poll_interval` and give up once `timeout` has been waited.
    ///
    /// Intervals shorter than [`CONNECT_POLL_INTERVAL`] are raised to it.
    pub const fn bounded(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval: clamp_interval(poll_interval),
            timeout: Some(timeout),
        }
    }

    /// Poll forever. A wrong passphrase or an unreachable access point then
    /// looks exactly like a slow association.
    pub const fn unbounded() -> Self {
        Self {
            poll_interval: CONNECT_POLL_INTERVAL,
            timeout: None,
        }
    }

    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of status checks the policy allows before timing out, or
    /// `None` when it waits forever.
    pub fn max_polls(&self) -> Option<u32> {
        let interval_ms = self.poll_interval.as_millis().max(1);
        self.timeout.map(|timeout| {
            let delays = timeout.as_millis().div_ceil(interval_ms);
            u32::try_from(delays.saturating_add(1)).unwrap_or(u32::MAX)
        })
    }
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::bounded(CONNECT_POLL_INTERVAL, CONNECT_TIMEOUT)
    }
}

const fn clamp_interval(interval: Duration) -> Duration {
    if interval.as_ticks() < CONNECT_POLL_INTERVAL.as_ticks() {
        CONNECT_POLL_INTERVAL
    } else {
        interval
    }
}
