//! Peripheral setup for the ESP32 DevKit wiring
//!
//! Console on UART0 (the USB bridge), OLED on I2C0 with SDA on GPIO21 and
//! SCL on GPIO22.

use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::peripherals::{GPIO1, GPIO3, GPIO21, GPIO22, I2C0, UART0};
use esp_hal::rng::Rng;
use esp_hal::time::Rate;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_hal::{Async, Blocking};
use log::{error, info};

use linkup_core::config::{BusConfig, SerialConfig};
use linkup_core::error::{BringUpError, describe};

/// Open UART0 at the configured baud rate.
pub fn open_console(
    uart0: UART0<'static>,
    tx: GPIO1<'static>,
    rx: GPIO3<'static>,
    serial: &SerialConfig,
) -> Result<Uart<'static, Blocking>, BringUpError> {
    let uart = Uart::new(uart0, UartConfig::default().with_baudrate(serial.baud))
        .map_err(|e| {
            error!("UART0 config rejected: {:?}", e);
            BringUpError::Console(describe(&e))
        })?
        .with_tx(tx)
        .with_rx(rx);

    info!("Console on UART0 at {} baud", serial.baud);
    Ok(uart)
}

/// Bring up I2C0 in async mode for the display.
///
/// The pin numbers in `bus` are fixed by the peripheral types; they are
/// only logged here.
pub fn create_i2c_bus(
    i2c0: I2C0<'static>,
    sda: GPIO21<'static>,
    scl: GPIO22<'static>,
    bus: &BusConfig,
) -> Result<I2c<'static, Async>, BringUpError> {
    let i2c = I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(bus.frequency_khz)),
    )
    .map_err(|e| {
        error!("I2C0 config rejected: {:?}", e);
        BringUpError::Bus(describe(&e))
    })?
    .with_sda(sda)
    .with_scl(scl)
    .into_async();

    info!(
        "I2C0 ready: SDA=GPIO{} SCL=GPIO{} @ {} kHz",
        bus.sda_gpio, bus.scl_gpio, bus.frequency_khz
    );
    Ok(i2c)
}

/// Seed for the network stack's port and sequence number randomization.
pub fn network_seed() -> u64 {
    let rng = Rng::new();
    (u64::from(rng.random()) << 32) | u64::from(rng.random())
}
