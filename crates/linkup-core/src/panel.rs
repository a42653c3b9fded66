//! Display panel seam
//!
//! The bring-up sequence draws into the panel's buffer through
//! `embedded-graphics` and pushes it to the screen with an explicit flush.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

/// A buffered monochrome OLED panel.
#[allow(async_fn_in_trait)]
pub trait OledPanel: DrawTarget<Color = BinaryColor> {
    /// Error raised while talking to the panel over its bus.
    type BusError: core::fmt::Debug;

    /// Bring the panel controller up. Fails when nothing answers on the bus.
    async fn init(&mut self) -> Result<(), Self::BusError>;

    /// Send the buffer to the screen.
    async fn flush(&mut self) -> Result<(), Self::BusError>;
}
