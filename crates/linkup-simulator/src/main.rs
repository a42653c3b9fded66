//! Desktop simulator for the linkup bring-up sequence.
//!
//! Runs the exact sequence the firmware runs, against a simulated 128x64
//! OLED and a scripted WiFi link, printing the serial console to stdout.
//! The final screen is written to a PNG; with the `window` feature it is
//! also shown in an SDL2 window until closed.
//!
//! Unlike the firmware, which idles or halts forever, the simulator exits
//! when the sequence ends: status 0 once connected (after the window is
//! closed with `window`), status 1 on any bring-up error.
//!
//! # Environment
//!
//! | Variable                   | Effect                                         |
//! |----------------------------|------------------------------------------------|
//! | `LINKUP_WIFI_SSID`         | Network name (default `linkup-sim`)            |
//! | `LINKUP_WIFI_PASSWORD`     | Passphrase (default `123456789`)               |
//! | `LINKUP_SIM_CONNECT_AFTER` | Status checks until connected, or `never`      |
//! | `LINKUP_SIM_ADDRESS`       | Address handed out (default `192.168.1.42`)    |
//! | `LINKUP_SIM_DISPLAY_FAIL`  | `1` simulates an absent display                |
//! | `LINKUP_SIM_UNBOUNDED`     | `1` waits forever instead of timing out        |
//! | `LINKUP_SIM_PNG`           | Screenshot path (default `linkup-oled.png`)    |

use std::io::Write as _;
use std::net::Ipv4Addr;
use std::time::Duration as StdDuration;

use embassy_time::Instant;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{BinaryColorTheme, OutputSettings, OutputSettingsBuilder, SimulatorDisplay};
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use linkup_core::bring_up::{self, BringUp};
use linkup_core::config::{ConnectPolicy, InternetConfig, OLED_HEIGHT_PX, OLED_WIDTH_PX};
use linkup_core::framebuffer::MonoFrameBuffer;
use linkup_core::{Config, LinkStatus, OledPanel, WifiLink};

/// Pixel scale factor for the screenshot and window.
const OUTPUT_SCALE: u32 = 4;

const DEFAULT_SSID: &str = "linkup-sim";
const DEFAULT_PASSWORD: &str = "123456789";
const DEFAULT_CONNECT_AFTER: u32 = 6;
const DEFAULT_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);
const DEFAULT_PNG: &str = "linkup-oled.png";

// ---------------------------------------------------------------------------
// Serial console
// ---------------------------------------------------------------------------

/// Stdout standing in for the UART. Flushed on every write so progress dots
/// show up as they happen.
struct StdoutConsole;

impl core::fmt::Write for StdoutConsole {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut out = std::io::stdout().lock();
        out.write_all(s.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|_| core::fmt::Error)
    }
}

// ---------------------------------------------------------------------------
// Simulated hardware
// ---------------------------------------------------------------------------

/// Real-time delay for the host.
struct HostDelay;

impl DelayNs for HostDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(StdDuration::from_nanos(u64::from(ns)));
    }
}

/// OLED that draws into a framebuffer and mirrors it to the simulator
/// display on flush.
struct SimPanel {
    buffer: MonoFrameBuffer,
    screen: SimulatorDisplay<BinaryColor>,
    absent: bool,
    #[cfg(feature = "window")]
    window: embedded_graphics_simulator::Window,
}

impl SimPanel {
    fn new(absent: bool, output_settings: &OutputSettings) -> Self {
        #[cfg(not(feature = "window"))]
        let _ = output_settings;

        Self {
            buffer: MonoFrameBuffer::new(),
            screen: SimulatorDisplay::new(Size::new(OLED_WIDTH_PX, OLED_HEIGHT_PX)),
            absent,
            #[cfg(feature = "window")]
            window: embedded_graphics_simulator::Window::new("linkup OLED", output_settings),
        }
    }
}

impl OriginDimensions for SimPanel {
    fn size(&self) -> Size {
        self.buffer.size()
    }
}

impl DrawTarget for SimPanel {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.buffer.draw_iter(pixels)
    }
}

impl OledPanel for SimPanel {
    type BusError = &'static str;

    async fn init(&mut self) -> Result<(), Self::BusError> {
        if self.absent {
            return Err("no ACK from 0x3C");
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), Self::BusError> {
        self.buffer
            .flush(&mut self.screen)
            .map_err(|_| "simulator display rejected the frame")?;
        #[cfg(feature = "window")]
        self.window.update(&self.screen);
        Ok(())
    }
}

/// WiFi link that walks through association and DHCP on a fixed script.
struct ScriptedLink {
    connect_after: Option<u32>,
    address: Ipv4Addr,
    begun: bool,
    polls: u32,
}

impl WifiLink for ScriptedLink {
    type Error = &'static str;

    async fn begin(&mut self, credentials: &InternetConfig<'_>) -> Result<(), Self::Error> {
        info!("simulated station joining '{}'", credentials.ssid);
        self.begun = true;
        Ok(())
    }

    async fn status(&mut self) -> LinkStatus {
        if !self.begun {
            return LinkStatus::Idle;
        }
        self.polls += 1;

        match self.connect_after {
            Some(after) if self.polls >= after => LinkStatus::Connected(self.address),
            Some(after) if self.polls + 1 == after => LinkStatus::AwaitingAddress,
            _ => LinkStatus::Associating,
        }
    }

    async fn end(&mut self) {
        info!("simulated station stopped after {} checks", self.polls);
        self.begun = false;
        self.connect_after = None;
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn connect_after_from_env() -> Option<u32> {
    match std::env::var("LINKUP_SIM_CONNECT_AFTER") {
        Ok(v) if v.eq_ignore_ascii_case("never") => None,
        Ok(v) => match v.parse::<u32>() {
            Ok(n) => Some(n.max(1)),
            Err(_) => {
                warn!("LINKUP_SIM_CONNECT_AFTER={:?} is not a number, using {}", v, DEFAULT_CONNECT_AFTER);
                Some(DEFAULT_CONNECT_AFTER)
            }
        },
        Err(_) => Some(DEFAULT_CONNECT_AFTER),
    }
}

fn address_from_env() -> Ipv4Addr {
    match std::env::var("LINKUP_SIM_ADDRESS") {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            warn!("LINKUP_SIM_ADDRESS={:?} is not an IPv4 address", v);
            DEFAULT_ADDRESS
        }),
        Err(_) => DEFAULT_ADDRESS,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting linkup simulator");

    let ssid = env_or("LINKUP_WIFI_SSID", DEFAULT_SSID);
    let password = env_or("LINKUP_WIFI_PASSWORD", DEFAULT_PASSWORD);
    let png_path = env_or("LINKUP_SIM_PNG", DEFAULT_PNG);

    let mut config = Config::new(&ssid, &password);
    if env_flag("LINKUP_SIM_UNBOUNDED") {
        config = config.with_connect_policy(ConnectPolicy::unbounded());
    }
    info!("Config: {:?}", config);

    let output_settings = OutputSettingsBuilder::new()
        .theme(BinaryColorTheme::OledBlue)
        .scale(OUTPUT_SCALE)
        .build();

    let panel = SimPanel::new(env_flag("LINKUP_SIM_DISPLAY_FAIL"), &output_settings);
    let link = ScriptedLink {
        connect_after: connect_after_from_env(),
        address: address_from_env(),
        begun: false,
        polls: 0,
    };

    let started = Instant::now();
    let mut console = StdoutConsole;
    bring_up::greet(&mut console);

    let result = embassy_futures::block_on(
        BringUp::new(config, &mut console, panel, link, HostDelay).run(),
    );
    info!("Bring-up finished after {} ms", started.elapsed().as_millis());

    match result {
        Ok(device) => {
            info!("Device online at {}", device.address);
            for line in device.terminal.lines() {
                info!("screen: {}", line);
            }
            save_screenshot(&device.display.screen, &output_settings, &png_path);

            #[cfg(feature = "window")]
            keep_window_open(device.display);
        }
        Err(err) => {
            error!("Bring-up failed: {}", err);
            std::process::exit(1);
        }
    }
}

fn save_screenshot(screen: &SimulatorDisplay<BinaryColor>, settings: &OutputSettings, path: &str) {
    match screen.to_rgb_output_image(settings).save_png(path) {
        Ok(()) => info!("Screen saved to {}", path),
        Err(e) => error!("Could not save {}: {}", path, e),
    }
}

/// Idle like the firmware does, but let the user close the window.
#[cfg(feature = "window")]
fn keep_window_open(mut panel: SimPanel) {
    use embedded_graphics_simulator::SimulatorEvent;

    info!("Close the window or press Q to quit");
    'idle: loop {
        panel.window.update(&panel.screen);
        for event in panel.window.events() {
            match event {
                SimulatorEvent::Quit => break 'idle,
                SimulatorEvent::KeyDown { keycode, .. }
                    if keycode == embedded_graphics_simulator::sdl2::Keycode::Q =>
                {
                    break 'idle;
                }
                _ => {}
            }
        }
        std::thread::sleep(StdDuration::from_millis(50));
    }
    info!("Simulator exiting");
}
