//! WiFi station over esp-radio with a DHCPv4 embassy-net stack
//!
//! The radio driver and the network runner are created up front. Joining is
//! deferred until the bring-up sequence calls [`WifiLink::begin`], which
//! hands the credentials to [`connection_loop`] through a [`Signal`].
//! [`WifiLink::end`] sends a leave over the same signal; the loop then
//! disconnects, stops the radio and makes no further attempts.

use alloc::string::String;

use embassy_futures::select::{Either, select};
use embassy_net::{Runner, Stack, StackResources};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use esp_hal::peripherals::WIFI;
use esp_radio::wifi::{AuthMethod, ClientConfig, ModeConfig, WifiController, WifiDevice};
use log::{debug, error, info, warn};
use static_cell::StaticCell;

use linkup_core::config::InternetConfig;
use linkup_core::error::{BringUpError, describe};
use linkup_core::{LinkStatus, WifiLink};

/// Pause between association attempts while not connected.
pub const REASSOCIATE_DELAY: Duration = Duration::from_secs(10);

/// Sockets the stack reserves; DHCP is the only user.
const STACK_SOCKETS: usize = 3;

/// What the bring-up sequence asks of the connection loop
pub enum LinkCommand {
    Join(ClientConfig),
    Leave,
}

pub type LinkCommands = Signal<CriticalSectionRawMutex, LinkCommand>;

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();

/// Radio driver and network stack, before anything is associated.
pub struct Network {
    pub controller: WifiController<'static>,
    pub stack: Stack<'static>,
    pub runner: Runner<'static, WifiDevice<'static>>,
}

/// Start the radio and build a DHCPv4 stack on the station interface.
pub fn init_network(wifi: WIFI<'static>, seed: u64) -> Result<Network, BringUpError> {
    let radio = esp_radio::init().map_err(|e| {
        error!("Radio init failed: {:?}", e);
        BringUpError::LinkStart(describe(&e))
    })?;
    let radio = RADIO.init(radio);

    let (controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, Default::default()).map_err(|e| {
            error!("WiFi driver init failed: {:?}", e);
            BringUpError::LinkStart(describe(&e))
        })?;

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );

    info!("WiFi station driver ready");
    Ok(Network {
        controller,
        stack,
        runner,
    })
}

fn client_config(credentials: &InternetConfig<'_>) -> ClientConfig {
    let auth_method = if credentials.is_open() {
        AuthMethod::None
    } else {
        AuthMethod::Wpa2Personal
    };

    ClientConfig::default()
        .with_ssid(String::from(credentials.ssid))
        .with_password(String::from(credentials.password))
        .with_auth_method(auth_method)
}

/// Owns the controller. Waits for credentials, then keeps trying to join
/// until one attempt succeeds and watches the association afterwards.
/// A [`LinkCommand::Leave`] at any point stops the radio for good.
/// Dropping the link after it was up is logged, not recovered from.
pub async fn connection_loop(controller: &mut WifiController<'_>, commands: &LinkCommands) -> ! {
    let client = match commands.wait().await {
        LinkCommand::Join(client) => client,
        LinkCommand::Leave => leave(controller).await,
    };

    if let Err(err) = controller.set_config(&ModeConfig::Client(client)) {
        // The bring-up sequence times out and ends the link.
        error!("WiFi mode config rejected: {:?}", err);
        wait_for_leave(commands).await;
        leave(controller).await;
    }

    let joined = select(associate(controller), wait_for_leave(commands)).await;
    if let Either::Second(()) = joined {
        leave(controller).await;
    }

    let watched = select(watch(controller), wait_for_leave(commands)).await;
    if let Either::Second(()) = watched {
        leave(controller).await;
    }

    park().await
}

async fn associate(controller: &mut WifiController<'_>) {
    let mut attempt = 0u32;
    loop {
        if !controller.is_started().unwrap_or(false) {
            if let Err(err) = controller.start_async().await {
                warn!("WiFi start failed: {:?}", err);
                Timer::after(REASSOCIATE_DELAY).await;
                continue;
            }
            debug!("WiFi started");
        }

        attempt += 1;
        match controller.connect_async().await {
            Ok(()) => {
                info!("Associated after {} attempt(s)", attempt);
                return;
            }
            Err(err) => {
                warn!("Association attempt {} failed: {:?}", attempt, err);
                let _ = controller.disconnect_async().await;
                Timer::after(REASSOCIATE_DELAY).await;
            }
        }
    }
}

/// Returns once the association is lost.
async fn watch(controller: &mut WifiController<'_>) {
    loop {
        Timer::after(REASSOCIATE_DELAY).await;
        if !controller.is_connected().unwrap_or(false) {
            warn!("Association lost");
            return;
        }
    }
}

async fn wait_for_leave(commands: &LinkCommands) {
    loop {
        match commands.wait().await {
            LinkCommand::Leave => return,
            LinkCommand::Join(_) => debug!("Join ignored, already configured"),
        }
    }
}

async fn leave(controller: &mut WifiController<'_>) -> ! {
    if controller.is_connected().unwrap_or(false) {
        let _ = controller.disconnect_async().await;
    }
    if controller.is_started().unwrap_or(false) {
        match controller.stop_async().await {
            Ok(()) => info!("WiFi stopped"),
            Err(err) => warn!("WiFi stop failed: {:?}", err),
        }
    }
    park().await
}

async fn park() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}

/// [`WifiLink`] backed by the embassy-net stack.
///
/// Status is read from the stack: link up without a DHCP lease is
/// `AwaitingAddress`, a lease is `Connected`.
pub struct EspWifiLink<'a> {
    stack: Stack<'a>,
    commands: &'a LinkCommands,
    requested: bool,
}

impl<'a> EspWifiLink<'a> {
    pub fn new(stack: Stack<'a>, commands: &'a LinkCommands) -> Self {
        Self {
            stack,
            commands,
            requested: false,
        }
    }
}

impl WifiLink for EspWifiLink<'_> {
    type Error = core::convert::Infallible;

    async fn begin(&mut self, credentials: &InternetConfig<'_>) -> Result<(), Self::Error> {
        info!("Joining '{}'", credentials.ssid);
        self.commands.signal(LinkCommand::Join(client_config(credentials)));
        self.requested = true;
        Ok(())
    }

    async fn status(&mut self) -> LinkStatus {
        if !self.requested {
            return LinkStatus::Idle;
        }
        if !self.stack.is_link_up() {
            return LinkStatus::Associating;
        }
        match self.stack.config_v4() {
            Some(config) => LinkStatus::Connected(config.address.address()),
            None => LinkStatus::AwaitingAddress,
        }
    }

    async fn end(&mut self) {
        info!("Leaving the network");
        self.commands.signal(LinkCommand::Leave);
        self.requested = false;
    }
}
