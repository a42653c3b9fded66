#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::fmt::Write;

use embassy_executor::Spawner;
use embassy_futures::select::{Either3, select3};
use embassy_time::Delay;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};

use linkup_core::Config;
use linkup_core::bring_up::{self, BringUp};
use linkup_firmware::hardware::{create_i2c_bus, network_seed, open_console};
use linkup_firmware::panel::new_oled;
use linkup_firmware::wifi::{self, EspWifiLink, LinkCommands};
use linkup_firmware::wifi_secrets::{WIFI_PASSWORD, WIFI_SSID};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = Config::new(WIFI_SSID, WIFI_PASSWORD);
    info!("Config: {:?}", config);

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // The radio driver allocates from this heap.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let mut console = match open_console(
        peripherals.UART0,
        peripherals.GPIO1,
        peripherals.GPIO3,
        &config.serial,
    ) {
        Ok(console) => console,
        Err(err) => bring_up::halt(Delay, &err).await,
    };
    bring_up::greet(&mut console);

    let i2c = match create_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO21,
        peripherals.GPIO22,
        &config.bus,
    ) {
        Ok(i2c) => i2c,
        Err(err) => {
            let _ = writeln!(console, "{}", err);
            bring_up::halt(Delay, &err).await
        }
    };
    let panel = new_oled(i2c, &config.display);

    // Only the driver comes up here; nothing is sent over the air until
    // the sequence calls `begin`.
    let mut network = match wifi::init_network(peripherals.WIFI, network_seed()) {
        Ok(network) => network,
        Err(err) => {
            let _ = writeln!(console, "{}", err);
            bring_up::halt(Delay, &err).await
        }
    };

    let commands = LinkCommands::new();
    let link = EspWifiLink::new(network.stack, &commands);

    let sequence = async {
        match BringUp::new(config, &mut console, panel, link, Delay).run().await {
            Ok(device) => {
                info!("Online at {}", device.address);
                // The panel keeps showing the address as long as it is held.
                let _device = device;
                bring_up::idle(Delay).await
            }
            Err(err) => {
                // The link was ended inside `run`, so the radio is stopping.
                error!("Bring-up failed: {}", err);
                bring_up::halt(Delay, &err).await
            }
        }
    };

    match select3(
        network.runner.run(),
        wifi::connection_loop(&mut network.controller, &commands),
        sequence,
    )
    .await
    {
        Either3::First(never) | Either3::Second(never) | Either3::Third(never) => never,
    }
}
