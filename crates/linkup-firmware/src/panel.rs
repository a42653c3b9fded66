//! SSD1306 driver behind the `OledPanel` seam

use display_interface::DisplayError;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use esp_hal::Async;
use esp_hal::i2c::master::I2c;
use log::info;
use ssd1306::mode::BufferedGraphicsModeAsync;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306Async};

use linkup_core::OledPanel;
use linkup_core::config::DisplayConfig;

/// 128x64 SSD1306 on I2C0 in buffered graphics mode.
pub type Oled = Ssd1306Async<
    I2CInterface<I2c<'static, Async>>,
    DisplaySize128x64,
    BufferedGraphicsModeAsync<DisplaySize128x64>,
>;

/// The SSD1306 driver as seen by the bring-up sequence.
pub struct OledDriver(Oled);

/// Wrap the bus in a driver for the panel at `display.address`. Nothing is
/// sent until [`OledPanel::init`].
pub fn new_oled(i2c: I2c<'static, Async>, display: &DisplayConfig) -> OledDriver {
    info!(
        "SSD1306 {}x{} at {:#04x}",
        display.width_px, display.height_px, display.address
    );
    let interface = I2CDisplayInterface::new_custom_address(i2c, display.address);
    OledDriver(
        Ssd1306Async::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode(),
    )
}

impl OriginDimensions for OledDriver {
    fn size(&self) -> Size {
        OriginDimensions::size(&self.0)
    }
}

impl DrawTarget for OledDriver {
    type Color = BinaryColor;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        DrawTarget::draw_iter(&mut self.0, pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        DrawTarget::clear(&mut self.0, color)
    }
}

impl OledPanel for OledDriver {
    type BusError = DisplayError;

    async fn init(&mut self) -> Result<(), DisplayError> {
        DisplayConfigAsync::init(&mut self.0).await
    }

    async fn flush(&mut self) -> Result<(), DisplayError> {
        self.0.flush().await
    }
}
