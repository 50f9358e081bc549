#![no_std]

pub mod orchestrator;
pub mod tasks;
mod util;

use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_nrf::twim::Twim;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use nrf_softdevice::ble::Connection;

pub const FW_VERSION: &str = env!("FW_VERSION");
pub const HW_VERSION: &str = "52840";
pub const MANUFACTURER: &str = "RAKwireless";
pub const MODEL: &str = "RAK4631";

/// How long a button-triggered acquisition runs.
pub const MEASURE_WINDOW: Duration = Duration::from_secs(10);
/// Pause between consecutive sensor reads inside the acquisition window.
pub const MEASURE_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Cadence of indications while a subscriber is streaming.
pub const STREAM_PERIOD: Duration = Duration::from_secs(1);
/// Idle time before the display is powered down.
pub const DISPLAY_TIMEOUT: Duration = Duration::from_secs(30);

/// The shared TWI bus behind its mutex.
pub type I2cBus = Mutex<CriticalSectionRawMutex, Twim<'static>>;
/// One device's handle onto the shared TWI bus.
pub type SharedI2c = I2cDevice<'static, CriticalSectionRawMutex, Twim<'static>>;

/// Binary wake signal used to re-arm the button and kick the display timer.
pub type WakeSignal = Signal<CriticalSectionRawMutex, ()>;

/// The current peripheral connection, if any. Written by the BLE task,
/// read by the indication sink.
pub type ConnectionSlot = Mutex<CriticalSectionRawMutex, Option<Connection>>;

pub mod prelude {
    pub use crate::orchestrator::*;
    pub use crate::tasks::*;
    pub use crate::{
        error, info, unwrap, warn, ConnectionSlot, I2cBus, SharedI2c,
        WakeSignal, DISPLAY_TIMEOUT, FW_VERSION, HW_VERSION, MANUFACTURER,
        MEASURE_POLL_INTERVAL, MEASURE_WINDOW, MODEL, STREAM_PERIOD,
    };
    pub use embassy_executor::Spawner;
    pub use embassy_sync::blocking_mutex::raw::{
        CriticalSectionRawMutex, NoopRawMutex,
    };
    pub use embassy_sync::mutex::Mutex;
    pub use embassy_time::{Duration, Timer};
    pub use irt_bsp::Rak4631;
    pub use irt_core::{
        EventBus, EventKind, IndicationChannel, Poster, Sampler,
    };
}
