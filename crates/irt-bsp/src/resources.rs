use embassy_nrf::{
    bind_interrupts,
    gpio::OutputDrive,
    interrupt::{self, InterruptExt},
    peripherals, pwm, saadc, twim,
};
use embassy_nrf::Peri;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

bind_interrupts!(struct TwimIrqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

bind_interrupts!(struct SaadcIrq {
    SAADC => saadc::InterruptHandler;
});

pub struct I2cBusResources {
    pub twim: Peri<'static, peripherals::TWISPI0>,
    pub sda: Peri<'static, peripherals::P0_13>,
    pub scl: Peri<'static, peripherals::P0_14>,
}

pub struct BuzzerResources {
    pub pwm: Peri<'static, peripherals::PWM0>,
    pub pin: Peri<'static, peripherals::P1_02>,
}

pub struct BatteryResources {
    pub saadc: Peri<'static, peripherals::SAADC>,
    pub vbat: Peri<'static, peripherals::P0_05>,
}

impl I2cBusResources {
    /// Shared bus for the sensor and the display. K100 keeps the OLED happy
    /// over the WisBlock flex cable.
    pub fn get_bus<MutexType: RawMutex>(
        self,
    ) -> Mutex<MutexType, twim::Twim<'static>> {
        let mut config = twim::Config::default();
        config.frequency = twim::Frequency::K100;
        interrupt::TWISPI0.set_priority(interrupt::Priority::P3);
        static RAM_BUFFER: static_cell::ConstStaticCell<[u8; 32]> =
            static_cell::ConstStaticCell::new([0; 32]);

        Mutex::new(twim::Twim::new(
            self.twim,
            TwimIrqs,
            self.sda,
            self.scl,
            config,
            RAM_BUFFER.take(),
        ))
    }
}

impl BuzzerResources {
    /// Single-channel PWM for tone generation, clocked at 1 MHz; the app
    /// sets period and duty per cue.
    pub fn configure(self) -> pwm::SimplePwm<'static> {
        let mut pwm = pwm::SimplePwm::new_1ch(self.pwm, self.pin);
        pwm.set_prescaler(pwm::Prescaler::Div16);
        pwm.set_ch0_drive(OutputDrive::HighDrive);
        pwm
    }
}

impl BatteryResources {
    /// One single-ended SAADC channel on the battery divider, 12-bit.
    pub fn configure(self) -> saadc::Saadc<'static, 1> {
        let mut config = saadc::Config::default();
        config.resolution = saadc::Resolution::_12BIT;
        let channel = saadc::ChannelConfig::single_ended(self.vbat);
        interrupt::SAADC.set_priority(interrupt::Priority::P3);
        saadc::Saadc::new(self.saadc, SaadcIrq, config, [channel])
    }
}
