use embassy_nrf::interrupt::Priority;
use embassy_nrf::peripherals::{P0_17, P1_03, P1_04, WDT};
use embassy_nrf::Peri;

use crate::resources::{
    BatteryResources, BuzzerResources, I2cBusResources,
};

/// Peripherals and pins of the RAK4631 thermometer assembly.
pub struct Rak4631 {
    /// User button on WB_IO1.
    pub button: Peri<'static, P0_17>,
    /// Green LED, blinked during an acquisition.
    pub led_green: Peri<'static, P1_03>,
    /// Blue LED, blinked in antiphase with the green one.
    pub led_blue: Peri<'static, P1_04>,
    /// Shared I2C bus: MLX90632 sensor and SSD1306 OLED.
    pub i2c_bus: I2cBusResources,
    /// Buzzer on WB_IO2, driven by PWM.
    pub buzzer: BuzzerResources,
    /// Battery voltage divider on AIN3.
    pub battery: BatteryResources,
    /// Watchdog timer.
    pub wdt: Peri<'static, WDT>,
}

impl Default for Rak4631 {
    fn default() -> Self {
        // Interrupt priorities above the softdevice's reserved levels.
        let mut config = embassy_nrf::config::Config::default();
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;
        Self::new(config)
    }
}

impl Rak4631 {
    /// Create a new instance based on HAL configuration
    pub fn new(config: embassy_nrf::config::Config) -> Self {
        let p = embassy_nrf::init(config);

        Self {
            button: p.P0_17,
            led_green: p.P1_03,
            led_blue: p.P1_04,
            i2c_bus: I2cBusResources {
                twim: p.TWISPI0,
                sda: p.P0_13,
                scl: p.P0_14,
            },
            buzzer: BuzzerResources { pwm: p.PWM0, pin: p.P1_02 },
            battery: BatteryResources { saadc: p.SAADC, vbat: p.P0_05 },
            wdt: p.WDT,
        }
    }
}
