//! IR sensor adapter: duty cycling, fault policy, sampler sources.

use embassy_embedded_hal::shared_bus::I2cDeviceError;
use embassy_nrf::twim;
use embassy_time::Delay;
use irt_core::SampleSource;
use mlx90632::Mlx90632;

use crate::{warn, SharedI2c};

pub type SensorError = mlx90632::Error<I2cDeviceError<twim::Error>>;

/// The MLX90632 plus the last reading that came back good.
///
/// Boot-time init failure is fatal (handled in `main`); after that, read
/// failures degrade to repeating the last good value so an acquisition
/// window never aborts halfway.
pub struct TempSensor {
    dev: Mlx90632<SharedI2c, Delay>,
    last_good: f32,
}

impl TempSensor {
    /// Probe the device, load calibration and take one seed reading.
    pub async fn init(i2c: SharedI2c) -> Result<Self, SensorError> {
        let mut dev = Mlx90632::new(i2c, Delay);
        dev.init().await?;
        dev.wake().await?;
        let first = dev.read_object_temperature().await?;
        dev.sleep().await?;
        Ok(Self { dev, last_good: first })
    }

    /// Leave sleep mode ahead of a burst of reads. Best effort.
    pub async fn wake(&mut self) {
        if self.dev.wake().await.is_err() {
            warn!("sensor wake failed");
        }
    }

    /// Back to sleep between bursts. Best effort.
    pub async fn sleep(&mut self) {
        if self.dev.sleep().await.is_err() {
            warn!("sensor sleep failed");
        }
    }

    /// One reading with the sensor already awake. A failed read repeats the
    /// last good value instead of propagating.
    pub async fn read_awake(&mut self) -> f32 {
        match self.dev.read_object_temperature().await {
            Ok(celsius) => {
                self.last_good = celsius;
                celsius
            }
            Err(_) => {
                warn!("sensor read failed, repeating last good value");
                self.last_good
            }
        }
    }

    /// Wake, read once, sleep again. The streaming and one-shot paths use
    /// this so the sensor never idles in continuous mode.
    pub async fn read_single(&mut self) -> f32 {
        self.wake().await;
        let celsius = self.read_awake().await;
        self.sleep().await;
        celsius
    }
}

/// Sampler source over a sensor the caller keeps awake for the whole
/// acquisition window.
pub struct AwakeSensor<'a>(pub &'a mut TempSensor);

impl SampleSource for AwakeSensor<'_> {
    async fn read(&mut self) -> f32 {
        self.0.read_awake().await
    }
}

/// Stream source that duty-cycles the sensor around every reading.
pub struct OneShotSensor<'a>(pub &'a mut TempSensor);

impl SampleSource for OneShotSensor<'_> {
    async fn read(&mut self) -> f32 {
        self.0.read_single().await
    }
}
