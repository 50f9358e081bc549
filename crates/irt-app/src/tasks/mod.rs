use crate::prelude::*;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_nrf::peripherals::WDT;
use embassy_nrf::wdt;
use embassy_nrf::wdt::Watchdog;
use embassy_nrf::Peri;
use irt_bsp::BatteryResources;
use portable_atomic::{AtomicU32, Ordering};

pub mod ble;
pub mod buzzer;
pub mod display;
pub mod measure;

// Re-exports
pub use ble::*;
pub use buzzer::*;
pub use display::*;
pub use measure::*;

/// Latest battery voltage in millivolts, updated by `battery_task`.
pub static BATTERY_MILLIVOLTS: AtomicU32 = AtomicU32::new(0);

/// How often a one-shot indication is requested while connected.
const INDICATE_TICK_PERIOD: Duration = Duration::from_secs(30);

// Keeps our system alive
#[embassy_executor::task]
pub async fn watchdog_task(wdt: Peri<'static, WDT>) {
    let wdt_config = wdt::Config::try_new(&wdt).unwrap();
    let (_wdt, [mut handle]) = match Watchdog::try_new(wdt, wdt_config) {
        Ok(x) => x,
        Err(_) => {
            // Watchdog already active with the wrong number of handles, waiting for it to timeout...
            loop {
                cortex_m::asm::wfe();
            }
        }
    };
    loop {
        handle.pet();
        Timer::after(Duration::from_secs(2)).await;
    }
}

/// Posts a measurement request per button press. The pin interrupt stays
/// disarmed until the dispatcher signals `rearm`, so presses during an
/// acquisition are ignored rather than queued.
#[embassy_executor::task]
pub async fn button_task(
    btn_pin: Peri<'static, AnyPin>,
    poster: Poster<'static>,
    rearm: &'static WakeSignal,
) {
    let mut button = Input::new(btn_pin, Pull::Up);
    loop {
        button.wait_for_falling_edge().await;
        poster.post(EventKind::Button);
        rearm.wait().await;
    }
}

/// Arms an idle timer whenever `kick` fires and posts a display timeout
/// once no kick arrives for [`DISPLAY_TIMEOUT`]. The dispatcher owns the
/// display and does the actual power-down.
#[embassy_executor::task]
pub async fn display_timeout_task(
    kick: &'static WakeSignal,
    poster: Poster<'static>,
) {
    loop {
        kick.wait().await;
        loop {
            match select(kick.wait(), Timer::after(DISPLAY_TIMEOUT)).await {
                Either::First(()) => continue,
                Either::Second(()) => {
                    poster.post(EventKind::DisplayTimeout);
                    break;
                }
            }
        }
    }
}

/// Samples VBAT through the on-board divider and publishes millivolts.
#[embassy_executor::task]
pub async fn battery_task(battery: BatteryResources) {
    let mut adc = battery.configure();
    loop {
        let mut buf = [0i16; 1];
        adc.sample(&mut buf).await;
        BATTERY_MILLIVOLTS.store(raw_to_millivolts(buf[0]), Ordering::Relaxed);
        Timer::after(Duration::from_secs(30)).await;
    }
}

/// 12-bit sample, 0.6 V reference with gain 1/6 (3.6 V full scale), then
/// the WisBlock VBAT divider compensation of 1.73.
fn raw_to_millivolts(raw: i16) -> u32 {
    let raw = raw.max(0) as u32;
    raw * 3600 / 4096 * 173 / 100
}

/// Periodically requests a single indication so a subscriber that is not
/// streaming still sees a fresh reading now and then.
#[embassy_executor::task]
pub async fn indicate_tick_task(poster: Poster<'static>) {
    loop {
        Timer::after(INDICATE_TICK_PERIOD).await;
        poster.post(EventKind::IndicateOne);
    }
}
