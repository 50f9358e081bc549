#![no_std]
#![no_main]

use core::fmt::Write as _;

use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use static_cell::StaticCell;

#[cfg(feature = "defmt")]
use defmt_rtt as _;
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_reset as _;

use irt_app::prelude::*;
use irt_core::{EventBus, IndicationChannel};

static EVENT_BUS: StaticCell<EventBus> = StaticCell::new();
static INDICATIONS: StaticCell<IndicationChannel> = StaticCell::new();
static CONNECTION: StaticCell<ConnectionSlot> = StaticCell::new();
static BUTTON_REARM: StaticCell<WakeSignal> = StaticCell::new();
static DISPLAY_KICK: StaticCell<WakeSignal> = StaticCell::new();
static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();
static DEVICE_NAME: StaticCell<heapless::String<24>> = StaticCell::new();

/// `RAK-HTM-` plus the 48-bit FICR device address, matching the name the
/// factory firmware advertises.
fn device_name() -> &'static str {
    let ficr = embassy_nrf::pac::FICR;
    let addr_low = ficr.deviceaddr(0).read();
    let addr_high = ficr.deviceaddr(1).read() as u16;
    let mut name = heapless::String::new();
    let _ = write!(name, "RAK-HTM-{addr_high:04X}{addr_low:08X}");
    DEVICE_NAME.init(name).as_str()
}

// Application main entry point. The spawner can be used to start async tasks.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("IR thermometer starting, fw {}", FW_VERSION);

    // First we initialize our board.
    let board = Rak4631::default();

    let led_green =
        Output::new(board.led_green, Level::Low, OutputDrive::Standard);
    let led_blue =
        Output::new(board.led_blue, Level::Low, OutputDrive::Standard);

    spawner.must_spawn(watchdog_task(board.wdt));
    spawner.must_spawn(battery_task(board.battery));

    let i2c_bus = I2C_BUS.init(board.i2c_bus.get_bus());
    let mut display = DisplayManager::new(
        embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice::new(i2c_bus),
    );
    // The unit is usable headless; a dead display only costs the UI.
    if display.init().await.is_err() {
        warn!("display init failed, continuing without UI");
    }
    if display.show_status("IR THERMO", "BOOT").await.is_err() {
        warn!("boot splash failed");
    }

    let sensor_i2c =
        embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice::new(i2c_bus);
    let sensor = match TempSensor::init(sensor_i2c).await {
        Ok(sensor) => sensor,
        Err(_) => {
            // Without the sensor there is nothing this device can do.
            sensor_fault(display, led_green, led_blue).await
        }
    };

    let buzzer = Buzzer::new(board.buzzer.configure());

    let name = device_name();
    info!("device name: {}", name);
    let (server, advertiser, _sd) = Server::start_gatt(name, spawner);

    let bus = EVENT_BUS.init(EventBus::new());
    let indications = INDICATIONS.init(IndicationChannel::new());
    let conn_slot = CONNECTION.init(Mutex::new(None));
    let button_rearm = BUTTON_REARM.init(WakeSignal::new());
    let display_kick = DISPLAY_KICK.init(WakeSignal::new());

    spawner.must_spawn(ble_task(
        server,
        advertiser,
        conn_slot,
        indications,
        bus.poster(),
    ));
    spawner.must_spawn(button_task(
        board.button.into(),
        bus.poster(),
        button_rearm,
    ));
    spawner.must_spawn(display_timeout_task(display_kick, bus.poster()));
    spawner.must_spawn(indicate_tick_task(bus.poster()));

    // Arm the idle timer for the boot splash.
    display_kick.signal(());

    spawner.must_spawn(orchestrate(OrchestratorContext {
        bus,
        indications,
        sensor,
        display,
        buzzer,
        led_green,
        led_blue,
        sink: HtmIndicator::new(server, conn_slot),
        button_rearm,
        display_kick,
    }));
}

/// Terminal state: the sensor did not come up. Show why and blink until the
/// user power-cycles; the watchdog keeps getting petted so we stay here.
async fn sensor_fault(
    mut display: DisplayManager,
    mut led_green: Output<'static>,
    mut led_blue: Output<'static>,
) -> ! {
    error!("IR sensor init failed");
    led_blue.set_high();
    let mut flip = false;
    loop {
        let (top, bottom) =
            if flip { ("CHECK", "SENSOR") } else { ("SENSOR", "ERROR") };
        if display.show_status(top, bottom).await.is_err() {
            warn!("display write failed");
        }
        flip = !flip;
        led_green.toggle();
        led_blue.toggle();
        Timer::after(Duration::from_secs(1)).await;
    }
}
