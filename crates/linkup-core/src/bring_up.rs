//! Device bring-up sequence
//!
//! Runs once at power-on: initialize the display, set text defaults, start
//! WiFi association, wait for an address, and show it on the screen.
//!
//! ```text
//! Booting --display init fails--> BusInitFailed          (halt)
//! Booting --display ready-------> WaitingForNetwork
//! WaitingForNetwork --not yet---> WaitingForNetwork      (delay, '.')
//! WaitingForNetwork --connected-> Connected              (idle)
//! WaitingForNetwork --timeout---> LinkFailed             (halt)
//! ```
//!
//! Each step is a method so the firmware can interleave board-specific work
//! and tests can stop after any step; [`BringUp::run`] executes them all.

use core::fmt::Write;
use core::net::Ipv4Addr;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::Point;
use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{BringUpError, describe};
use crate::link::{LinkStatus, WifiLink};
use crate::panel::OledPanel;
use crate::terminal::{TextScale, Terminal};

pub const GREETING: &str = "Hello, ESP32!";
pub const DISPLAY_FAILURE: &str = "SSD1306 allocation failed";
pub const CONNECTING: &str = "Connecting to WiFi...";
pub const CONNECTED_BANNER: &str = "WiFi Connected!";
pub const ADDRESS_LABEL: &str = "IP Address: ";
pub const LINK_FAILED_BANNER: &str = "WiFi Failed";
pub const LINK_FAILED_HINT: &str = "Check WiFi credentials";
pub const TIMEOUT_NOTICE: &str = "WiFi connection timed out";

const PROGRESS_MARKER: &str = ".";
const IDLE_TICK_MS: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpState {
    Booting,
    BusInitFailed,
    WaitingForNetwork,
    Connected,
    LinkFailed,
}

impl BringUpState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::BusInitFailed | Self::Connected | Self::LinkFailed)
    }
}

/// Everything the sequence hands back once the device is online
pub struct Device<P, L> {
    pub display: P,
    pub link: L,
    pub terminal: Terminal,
    pub address: Ipv4Addr,
}

/// Write the power-on greeting to the console.
pub fn greet<C: Write>(console: &mut C) {
    let _ = writeln!(console, "{}", GREETING);
}

pub struct BringUp<'a, C, P, L, D> {
    config: Config<'a>,
    console: C,
    panel: P,
    link: L,
    delay: D,
    terminal: Terminal,
    state: BringUpState,
    attempts: u32,
}

impl<'a, C, P, L, D> BringUp<'a, C, P, L, D>
where
    C: Write,
    P: OledPanel,
    P::Error: core::fmt::Debug,
    L: WifiLink,
    D: DelayNs,
{
    pub fn new(config: Config<'a>, console: C, panel: P, link: L, delay: D) -> Self {
        Self {
            config,
            console,
            panel,
            link,
            delay,
            terminal: Terminal::new(),
            state: BringUpState::Booting,
            attempts: 0,
        }
    }

    pub fn state(&self) -> BringUpState {
        self.state
    }

    /// Status checks made so far while waiting for the network
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    fn transition(&mut self, next: BringUpState) {
        if self.state != next {
            info!("bring-up: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn say(&mut self, line: &str) {
        let _ = writeln!(self.console, "{}", line);
    }

    /// Refuse to touch the display or the radio after a failed display init.
    fn ensure_operational(&self) -> Result<(), BringUpError> {
        match self.state {
            BringUpState::BusInitFailed => Err(BringUpError::DisplayInit),
            _ => Ok(()),
        }
    }

    /// Initialize the display controller.
    ///
    /// On failure exactly one diagnostic line reaches the console and every
    /// later step is refused.
    pub async fn init_display(&mut self) -> Result<(), BringUpError> {
        self.ensure_operational()?;

        let address = self.config.display.address;
        match self.panel.init().await {
            Ok(()) => {
                info!("SSD1306 ready at {:#04x}", address);
                self.transition(BringUpState::WaitingForNetwork);
                Ok(())
            }
            Err(err) => {
                error!("SSD1306 init at {:#04x} failed: {:?}", address, err);
                self.say(DISPLAY_FAILURE);
                self.transition(BringUpState::BusInitFailed);
                Err(BringUpError::DisplayInit)
            }
        }
    }

    /// Clear the buffer and reset color, scale and cursor.
    pub fn configure_text(&mut self) -> Result<(), BringUpError> {
        self.ensure_operational()?;

        self.terminal
            .clear(&mut self.panel)
            .map_err(|e| BringUpError::Render(describe(&e)))?;
        self.terminal.set_text_color(BinaryColor::On);
        self.terminal.set_text_scale(TextScale::Normal);
        self.terminal.set_cursor(Point::zero());
        Ok(())
    }

    /// Ask the link to join the configured network.
    pub async fn begin_association(&mut self) -> Result<(), BringUpError> {
        self.ensure_operational()?;

        self.say(CONNECTING);
        self.config.internet.validate()?;

        let internet = self.config.internet;
        info!(
            "joining '{}' ({})",
            internet.ssid,
            if internet.is_open() { "open" } else { "WPA2" }
        );

        self.link.begin(&internet).await.map_err(|err| {
            error!("association request failed: {:?}", err);
            BringUpError::LinkStart(describe(&err))
        })
    }

    /// Poll the link until it reports an address.
    ///
    /// Every status other than connected counts as still in progress. The
    /// check count restarts on each call. The wait ends with [`BringUpError::ConnectionTimeout`] once the policy's
    /// timeout has been spent in delays, or never when it is unbounded.
    pub async fn wait_for_network(&mut self) -> Result<Ipv4Addr, BringUpError> {
        self.ensure_operational()?;

        let policy = self.config.connect;
        let interval_ms = policy.poll_interval().as_millis();
        let timeout_ms = policy.timeout().map(|t| t.as_millis());
        let mut waited_ms: u64 = 0;
        let mut last_status = None;
        self.attempts = 0;

        match policy.max_polls() {
            Some(max) => debug!("waiting for network, up to {} checks", max),
            None => debug!("waiting for network without timeout"),
        }

        loop {
            self.attempts = self.attempts.saturating_add(1);
            let status = self.link.status().await;
            if last_status != Some(status) {
                debug!("link status after {} ms: {:?}", waited_ms, status);
                last_status = Some(status);
            }

            if let LinkStatus::Connected(address) = status {
                if waited_ms > 0 {
                    let _ = writeln!(self.console);
                }
                let _ = writeln!(self.console, "WiFi connected, IP address: {}", address);
                info!("network up after {} checks, address {}", self.attempts, address);
                self.transition(BringUpState::Connected);
                return Ok(address);
            }

            if timeout_ms.is_some_and(|limit| waited_ms >= limit) {
                if waited_ms > 0 {
                    let _ = writeln!(self.console);
                }
                self.say(TIMEOUT_NOTICE);
                warn!(
                    "no network after {} checks ({} ms), last status {:?}",
                    self.attempts, waited_ms, status
                );
                self.transition(BringUpState::LinkFailed);
                return Err(BringUpError::ConnectionTimeout {
                    attempts: self.attempts,
                    waited_ms,
                });
            }

            self.delay
                .delay_ms(u32::try_from(interval_ms).unwrap_or(u32::MAX))
                .await;
            waited_ms = waited_ms.saturating_add(interval_ms);
            let _ = self.console.write_str(PROGRESS_MARKER);
        }
    }

    /// Write the connection banner and address, then flush to the screen.
    pub async fn show_connected(&mut self, address: Ipv4Addr) -> Result<(), BringUpError> {
        self.ensure_operational()?;

        let mut text: heapless::String<16> = heapless::String::new();
        // "255.255.255.255" is 15 bytes.
        let _ = write!(text, "{}", address);

        self.terminal
            .println(&mut self.panel, CONNECTED_BANNER)
            .and_then(|_| self.terminal.print(&mut self.panel, ADDRESS_LABEL))
            .and_then(|_| self.terminal.println(&mut self.panel, &text))
            .map_err(|e| BringUpError::Render(describe(&e)))?;

        self.flush().await
    }

    /// Replace the screen with a failure notice, so a device that could not
    /// join the network says so instead of staying blank.
    pub async fn show_link_failure(&mut self) -> Result<(), BringUpError> {
        self.ensure_operational()?;
        self.configure_text()?;

        self.terminal
            .println(&mut self.panel, LINK_FAILED_BANNER)
            .and_then(|_| self.terminal.println(&mut self.panel, LINK_FAILED_HINT))
            .map_err(|e| BringUpError::Render(describe(&e)))?;

        self.flush().await
    }

    async fn flush(&mut self) -> Result<(), BringUpError> {
        self.panel.flush().await.map_err(|err| {
            error!("display flush failed: {:?}", err);
            BringUpError::Render(describe(&err))
        })
    }

    /// Run the whole sequence and hand back the live device.
    pub async fn run(mut self) -> Result<Device<P, L>, BringUpError> {
        self.init_display().await?;
        self.configure_text()?;

        let waited = match self.begin_association().await {
            Ok(()) => self.wait_for_network().await,
            Err(err) => Err(err),
        };

        let address = match waited {
            Ok(address) => address,
            Err(err) => {
                // Past display init, so the radio may be mid-association.
                self.link.end().await;
                if err.display_usable() {
                    self.transition(BringUpState::LinkFailed);
                    if let Err(render) = self.show_link_failure().await {
                        warn!("could not show failure screen: {}", render);
                    }
                }
                return Err(err);
            }
        };

        self.show_connected(address).await?;

        Ok(Device {
            display: self.panel,
            link: self.link,
            terminal: self.terminal,
            address,
        })
    }
}

/// Idle forever once the device is up. Nothing is left to do.
pub async fn idle<D: DelayNs>(mut delay: D) -> ! {
    info!("bring-up complete, idling");
    loop {
        delay.delay_ms(IDLE_TICK_MS).await;
    }
}

/// Stop forever after a fatal bring-up error.
pub async fn halt<D: DelayNs>(mut delay: D, reason: &BringUpError) -> ! {
    error!("halted: {}", reason);
    loop {
        delay.delay_ms(IDLE_TICK_MS).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONNECT_POLL_INTERVAL, ConnectPolicy};
    use crate::framebuffer::MonoFrameBuffer;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embassy_time::Duration;
    use embedded_graphics::prelude::*;

    type Console = heapless::String<1024>;

    const ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 23);

    /// Panel whose "screen" only changes on flush
    #[derive(Default)]
    struct TestPanel {
        buffer: MonoFrameBuffer,
        screen: MonoFrameBuffer,
        absent: bool,
        inits: u32,
        flushes: u32,
    }

    impl TestPanel {
        fn absent() -> Self {
            Self {
                absent: true,
                ..Self::default()
            }
        }
    }

    impl OriginDimensions for TestPanel {
        fn size(&self) -> Size {
            self.buffer.size()
        }
    }

    impl DrawTarget for TestPanel {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.buffer.draw_iter(pixels)
        }
    }

    impl OledPanel for TestPanel {
        type BusError = &'static str;

        async fn init(&mut self) -> Result<(), Self::BusError> {
            self.inits += 1;
            if self.absent { Err("NACK") } else { Ok(()) }
        }

        async fn flush(&mut self) -> Result<(), Self::BusError> {
            self.flushes += 1;
            self.buffer.flush(&mut self.screen).map_err(|_| "flush")
        }
    }

    // Lets a test keep the panel after `run` consumes its argument.
    impl OriginDimensions for &mut TestPanel {
        fn size(&self) -> Size {
            (**self).size()
        }
    }

    impl DrawTarget for &mut TestPanel {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            (**self).draw_iter(pixels)
        }
    }

    impl OledPanel for &mut TestPanel {
        type BusError = &'static str;

        async fn init(&mut self) -> Result<(), Self::BusError> {
            (**self).init().await
        }

        async fn flush(&mut self) -> Result<(), Self::BusError> {
            OledPanel::flush(&mut **self).await
        }
    }

    /// Link that reports connected on the `connect_on`-th status check
    #[derive(Default)]
    struct ScriptedLink {
        connect_on: Option<u32>,
        refuse_begin: bool,
        begins: u32,
        polls: u32,
        ends: u32,
    }

    impl ScriptedLink {
        fn connecting_on(poll: u32) -> Self {
            Self {
                connect_on: Some(poll),
                ..Self::default()
            }
        }

        fn never() -> Self {
            Self::default()
        }
    }

    impl WifiLink for ScriptedLink {
        type Error = &'static str;

        async fn begin(&mut self, _credentials: &crate::config::InternetConfig<'_>) -> Result<(), Self::Error> {
            self.begins += 1;
            if self.refuse_begin { Err("radio off") } else { Ok(()) }
        }

        async fn status(&mut self) -> LinkStatus {
            self.polls += 1;
            match self.connect_on {
                Some(n) if self.polls >= n => LinkStatus::Connected(ADDRESS),
                _ if self.polls % 2 == 0 => LinkStatus::Disconnected,
                _ => LinkStatus::Associating,
            }
        }

        async fn end(&mut self) {
            self.ends += 1;
        }
    }

    impl WifiLink for &mut ScriptedLink {
        type Error = &'static str;

        async fn begin(&mut self, credentials: &crate::config::InternetConfig<'_>) -> Result<(), Self::Error> {
            (**self).begin(credentials).await
        }

        async fn status(&mut self) -> LinkStatus {
            (**self).status().await
        }

        async fn end(&mut self) {
            (**self).end().await
        }
    }

    /// Delay that returns at once and records what was asked
    #[derive(Default)]
    struct RecordingDelay {
        calls: u32,
        shortest_ms: Option<u32>,
        total_ms: u64,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.delay_ms(ns / 1_000_000).await;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.calls += 1;
            self.total_ms += u64::from(ms);
            self.shortest_ms = Some(self.shortest_ms.map_or(ms, |s| s.min(ms)));
        }
    }

    fn config() -> Config<'static> {
        Config::new("saad", "123456789")
    }

    /// What the screen holds after the failure notice is drawn from a
    /// cleared buffer.
    fn failure_screen() -> MonoFrameBuffer {
        let mut expected = MonoFrameBuffer::new();
        let mut terminal = Terminal::new();
        terminal.println(&mut expected, LINK_FAILED_BANNER).unwrap();
        terminal.println(&mut expected, LINK_FAILED_HINT).unwrap();
        expected
    }

    fn same_pixels(a: &MonoFrameBuffer, b: &MonoFrameBuffer) -> bool {
        a.bounding_box().points().all(|p| a.pixel(p) == b.pixel(p))
    }

    #[test]
    fn test_connects_and_shows_two_lines() {
        let mut console = Console::new();
        let mut delay = RecordingDelay::default();

        let device = block_on(
            BringUp::new(config(), &mut console, TestPanel::default(), ScriptedLink::connecting_on(4), &mut delay)
                .run(),
        )
        .unwrap();

        let lines: heapless::Vec<&str, 8> = device.terminal.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "WiFi Connected!");
        assert_eq!(lines[1], "IP Address: 192.168.4.23");
        assert_eq!(device.address, ADDRESS);
        assert_eq!(device.display.flushes, 1);
        assert!(device.display.screen.lit_pixels() > 0);
        assert_eq!(device.link.begins, 1);

        assert_eq!(
            console.as_str(),
            "Connecting to WiFi...\n...\nWiFi connected, IP address: 192.168.4.23\n"
        );
        assert_eq!(delay.calls, 3);
    }

    #[test]
    fn test_address_line_is_dotted_quad() {
        let mut console = Console::new();
        let device = block_on(
            BringUp::new(
                config(),
                &mut console,
                TestPanel::default(),
                ScriptedLink::connecting_on(1),
                RecordingDelay::default(),
            )
            .run(),
        )
        .unwrap();

        let line = device.terminal.lines().nth(1).unwrap();
        let quad = line.strip_prefix(ADDRESS_LABEL).unwrap();
        let octets: heapless::Vec<&str, 4> = quad.split('.').collect();
        assert_eq!(octets.len(), 4);
        assert!(octets.iter().all(|o| !o.is_empty() && o.parse::<u8>().is_ok()));
    }

    #[test]
    fn test_display_failure_emits_one_line_and_stops() {
        let mut console = Console::new();
        let mut bring_up = BringUp::new(
            config(),
            &mut console,
            TestPanel::absent(),
            ScriptedLink::connecting_on(1),
            RecordingDelay::default(),
        );

        let err = block_on(bring_up.init_display()).unwrap_err();
        assert_eq!(err, BringUpError::DisplayInit);
        assert_eq!(bring_up.state(), BringUpState::BusInitFailed);

        // Later steps are refused without touching anything.
        assert_eq!(bring_up.configure_text(), Err(BringUpError::DisplayInit));
        assert_eq!(block_on(bring_up.begin_association()), Err(BringUpError::DisplayInit));
        assert_eq!(block_on(bring_up.wait_for_network()), Err(BringUpError::DisplayInit));
        assert_eq!(block_on(bring_up.show_connected(ADDRESS)), Err(BringUpError::DisplayInit));

        assert_eq!(bring_up.link().begins, 0);
        assert_eq!(bring_up.link().polls, 0);
        assert_eq!(bring_up.panel().flushes, 0);
        assert_eq!(bring_up.panel().inits, 1);
        assert_eq!(bring_up.console().as_str(), "SSD1306 allocation failed\n");
    }

    #[test]
    fn test_run_with_absent_display() {
        let mut console = Console::new();
        greet(&mut console);

        let mut link = ScriptedLink::connecting_on(1);

        let result = block_on(
            BringUp::new(
                config(),
                &mut console,
                TestPanel::absent(),
                &mut link,
                RecordingDelay::default(),
            )
            .run(),
        );

        assert!(matches!(result, Err(BringUpError::DisplayInit)));
        assert_eq!((link.begins, link.polls, link.ends), (0, 0, 0));
        assert_eq!(console.as_str(), "Hello, ESP32!\nSSD1306 allocation failed\n");
    }

    #[test]
    fn test_every_poll_delay_is_at_least_interval() {
        let mut console = Console::new();
        let mut delay = RecordingDelay::default();
        let policy = ConnectPolicy::bounded(Duration::from_millis(750), Duration::from_secs(10));

        block_on(
            BringUp::new(
                config().with_connect_policy(policy),
                &mut console,
                TestPanel::default(),
                ScriptedLink::connecting_on(6),
                &mut delay,
            )
            .run(),
        )
        .unwrap();

        assert_eq!(delay.calls, 5);
        assert_eq!(delay.shortest_ms, Some(750));
        assert!(u64::from(delay.shortest_ms.unwrap()) >= CONNECT_POLL_INTERVAL.as_millis());
    }

    #[test]
    fn test_timeout_reports_error_and_failure_screen() {
        let mut console = Console::new();
        let mut delay = RecordingDelay::default();
        let policy = ConnectPolicy::bounded(Duration::from_millis(500), Duration::from_secs(2));
        let mut bring_up = BringUp::new(
            config().with_connect_policy(policy),
            &mut console,
            TestPanel::default(),
            ScriptedLink::never(),
            &mut delay,
        );

        block_on(bring_up.init_display()).unwrap();
        bring_up.configure_text().unwrap();
        block_on(bring_up.begin_association()).unwrap();

        let err = block_on(bring_up.wait_for_network()).unwrap_err();
        assert_eq!(
            err,
            BringUpError::ConnectionTimeout {
                attempts: 5,
                waited_ms: 2_000
            }
        );
        assert_eq!(bring_up.state(), BringUpState::LinkFailed);
        assert_eq!(Some(bring_up.attempts()), policy.max_polls());

        block_on(bring_up.show_link_failure()).unwrap();
        let lines: heapless::Vec<&str, 8> = bring_up.terminal().lines().collect();
        assert_eq!(lines.as_slice(), &[LINK_FAILED_BANNER, LINK_FAILED_HINT]);
        assert!(bring_up.panel().screen.lit_pixels() > 0);
        assert_eq!(
            bring_up.console().as_str(),
            "Connecting to WiFi...\n....\nWiFi connection timed out\n"
        );
    }

    #[test]
    fn test_unbounded_policy_keeps_waiting() {
        let mut console = Console::new();
        let mut delay = RecordingDelay::default();

        let device = block_on(
            BringUp::new(
                config().with_connect_policy(ConnectPolicy::unbounded()),
                &mut console,
                TestPanel::default(),
                // Far past the bounded default of 61 checks.
                ScriptedLink::connecting_on(200),
                &mut delay,
            )
            .run(),
        )
        .unwrap();

        assert_eq!(device.link.polls, 200);
        assert_eq!(delay.calls, 199);
        assert_eq!(delay.total_ms, 199 * 500);
    }

    #[test]
    fn test_invalid_credentials_never_reach_the_link() {
        let mut console = Console::new();
        let mut bring_up = BringUp::new(
            Config::new("saad", "short"),
            &mut console,
            TestPanel::default(),
            ScriptedLink::connecting_on(1),
            RecordingDelay::default(),
        );

        block_on(bring_up.init_display()).unwrap();
        let err = block_on(bring_up.begin_association()).unwrap_err();

        assert_eq!(err, BringUpError::Credentials(crate::error::ConfigError::PassphraseLength(5)));
        assert_eq!(bring_up.link().begins, 0);
    }

    #[test]
    fn test_link_start_failure_shows_failure_screen() {
        let mut console = Console::new();
        let mut panel = TestPanel::default();
        let mut link = ScriptedLink {
            refuse_begin: true,
            ..ScriptedLink::default()
        };

        let result = block_on(
            BringUp::new(config(), &mut console, &mut panel, &mut link, RecordingDelay::default()).run(),
        );

        match result {
            Err(BringUpError::LinkStart(text)) => assert_eq!(text.as_str(), "\"radio off\""),
            _ => panic!("expected LinkStart"),
        }
        assert_eq!(panel.flushes, 1);
        assert!(same_pixels(&panel.screen, &failure_screen()));
        assert_eq!(link.ends, 1);
        assert_eq!(link.polls, 0);
    }

    #[test]
    fn test_run_timeout_ends_link_and_shows_failure_screen() {
        let mut console = Console::new();
        let mut panel = TestPanel::default();
        let mut link = ScriptedLink::never();
        let policy = ConnectPolicy::bounded(Duration::from_millis(500), Duration::from_secs(2));

        let result = block_on(
            BringUp::new(
                config().with_connect_policy(policy),
                &mut console,
                &mut panel,
                &mut link,
                RecordingDelay::default(),
            )
            .run(),
        );

        assert_eq!(
            result.err(),
            Some(BringUpError::ConnectionTimeout {
                attempts: 5,
                waited_ms: 2_000
            })
        );
        assert_eq!(panel.flushes, 1);
        assert!(same_pixels(&panel.screen, &failure_screen()));
        assert!(panel.screen.lit_pixels() > 0);
        assert_eq!(link.begins, 1);
        assert_eq!(link.ends, 1);
        assert_eq!(
            console.as_str(),
            "Connecting to WiFi...\n....\nWiFi connection timed out\n"
        );
    }

    #[test]
    fn test_successful_run_keeps_link() {
        let mut console = Console::new();
        let mut link = ScriptedLink::connecting_on(2);

        let device = block_on(
            BringUp::new(config(), &mut console, TestPanel::default(), &mut link, RecordingDelay::default())
                .run(),
        );

        assert!(device.is_ok());
        drop(device);
        assert_eq!(link.ends, 0);
    }

    #[test]
    fn test_second_wait_restarts_check_count() {
        let mut console = Console::new();
        let policy = ConnectPolicy::bounded(Duration::from_millis(500), Duration::from_secs(2));
        let mut bring_up = BringUp::new(
            config().with_connect_policy(policy),
            &mut console,
            TestPanel::default(),
            ScriptedLink::never(),
            RecordingDelay::default(),
        );
        block_on(bring_up.init_display()).unwrap();
        block_on(bring_up.begin_association()).unwrap();

        let first = block_on(bring_up.wait_for_network()).unwrap_err();
        let second = block_on(bring_up.wait_for_network()).unwrap_err();

        let expected = BringUpError::ConnectionTimeout {
            attempts: 5,
            waited_ms: 2_000,
        };
        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert_eq!(bring_up.attempts(), 5);
    }

    #[test]
    fn test_configure_text_resets_defaults() {
        let mut console = Console::new();
        let mut bring_up = BringUp::new(
            config(),
            &mut console,
            TestPanel::default(),
            ScriptedLink::never(),
            RecordingDelay::default(),
        );
        block_on(bring_up.init_display()).unwrap();
        assert_eq!(bring_up.state(), BringUpState::WaitingForNetwork);

        bring_up.configure_text().unwrap();

        let terminal = bring_up.terminal();
        assert_eq!(terminal.cursor(), Point::zero());
        assert_eq!(terminal.text_color(), BinaryColor::On);
        assert_eq!(terminal.text_scale(), TextScale::Normal);
        assert_eq!(bring_up.panel().buffer.lit_pixels(), 0);
    }

    #[test]
    fn test_terminal_states() {
        assert!(BringUpState::BusInitFailed.is_terminal());
        assert!(BringUpState::Connected.is_terminal());
        assert!(BringUpState::LinkFailed.is_terminal());
        assert!(!BringUpState::WaitingForNetwork.is_terminal());
        assert!(!BringUpState::Booting.is_terminal());
    }
}
