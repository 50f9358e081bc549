//! Async driver for the Melexis MLX90632 far-infrared temperature sensor.
//!
//! Reads the factory calibration constants from EEPROM once at init and runs
//! the datasheet DSP (version 5) on the raw RAM channels to produce object
//! temperatures in degrees Celsius.

#![no_std]

use embedded_hal_async::{delay, i2c};
use micromath::F32Ext;

pub mod regs;

use regs::*;

/// Default 7-bit I2C address (RAK12003 breakout).
pub const DEFAULT_ADDRESS: u8 = 0x3A;

/// Polling attempts for the data-ready flag before giving up. Continuous mode
/// refreshes at 2 Hz, so 100 x 10 ms covers two full cycles.
const DATA_READY_ATTEMPTS: u32 = 100;
const DATA_READY_POLL_MS: u32 = 10;

#[derive(derive_more::From, Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<I2cError> {
    #[from]
    I2c(I2cError),
    /// EE_VERSION did not report a DSP v5 part.
    UnknownDeviceVersion(u16),
    /// Data-ready flag never came up.
    Timeout,
}

/// Operating mode, control register bits [2:1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Sleep = 0b01,
    Step = 0b10,
    Continuous = 0b11,
}

/// Factory calibration constants, pre-scaled to their physical values.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub p_r: f32,
    pub p_g: f32,
    pub p_t: f32,
    pub p_o: f32,
    pub ea: f32,
    pub eb: f32,
    pub fa: f32,
    pub fb: f32,
    pub ga: f32,
    pub gb: f32,
    pub ka: f32,
    pub ha: f32,
    pub hb: f32,
}

/// One raw measurement frame: the object channel pair for the active cycle
/// plus both ambient channels.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct RawFrame {
    object_lower: i16,
    object_upper: i16,
    ambient_new: i16,
    ambient_old: i16,
}

pub struct Mlx90632<I2c, D> {
    i2c: I2c,
    delay: D,
    address: u8,
    calib: Calibration,
    emissivity: f32,
}

impl<I2c: i2c::I2c, D: delay::DelayNs> Mlx90632<I2c, D> {
    pub fn new(i2c: I2c, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
            calib: Calibration {
                p_r: 0.0,
                p_g: 0.0,
                p_t: 0.0,
                p_o: 0.0,
                ea: 0.0,
                eb: 0.0,
                fa: 0.0,
                fb: 0.0,
                ga: 0.0,
                gb: 0.0,
                ka: 0.0,
                ha: 0.0,
                hb: 0.0,
            },
            emissivity: 1.0,
        }
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Skin is close to a black body; exposed for non-medical use.
    pub fn set_emissivity(&mut self, emissivity: f32) {
        self.emissivity = emissivity;
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calib
    }

    /// Probe the part, load calibration from EEPROM, and leave it sleeping.
    pub async fn init(&mut self) -> Result<(), Error<I2c::Error>> {
        // Power-on reset settle time per datasheet.
        self.delay.delay_ms(3).await;

        let version = self.read_u16(EE_VERSION).await?;
        if version != EXPECTED_EE_VERSION {
            return Err(Error::UnknownDeviceVersion(version));
        }

        self.calib = self.read_calibration().await?;
        self.set_mode(Mode::Sleep).await?;
        Ok(())
    }

    /// Wake the sensor into continuous conversion.
    pub async fn wake(&mut self) -> Result<(), Error<I2c::Error>> {
        self.set_mode(Mode::Continuous).await
    }

    /// Put the sensor back into its lowest-power mode.
    pub async fn sleep(&mut self) -> Result<(), Error<I2c::Error>> {
        self.set_mode(Mode::Sleep).await
    }

    /// Block until a fresh frame is available, then compute the object
    /// temperature in degrees Celsius. The sensor must be awake.
    pub async fn read_object_temperature(
        &mut self,
    ) -> Result<f32, Error<I2c::Error>> {
        let frame = self.read_raw_frame().await?;
        Ok(self.object_temperature(&frame))
    }

    /// Ambient (sensor die) temperature in degrees Celsius, from the most
    /// recent frame. The sensor must be awake.
    pub async fn read_ambient_temperature(
        &mut self,
    ) -> Result<f32, Error<I2c::Error>> {
        let frame = self.read_raw_frame().await?;
        Ok(self.ambient_temperature(&frame))
    }

    async fn set_mode(&mut self, mode: Mode) -> Result<(), Error<I2c::Error>> {
        let control = self.read_u16(REG_CONTROL).await?;
        let control = (control & !CONTROL_MODE_MASK)
            | ((mode as u16) << CONTROL_MODE_SHIFT);
        self.write_u16(REG_CONTROL, control).await
    }

    async fn read_raw_frame(&mut self) -> Result<RawFrame, Error<I2c::Error>> {
        let status = self.wait_data_ready().await?;

        // The active measurement selects which RAM pair holds the object
        // channels; ambient always lives in RAM_6/RAM_9.
        let cycle = (status & STATUS_CYCLE_MASK) >> STATUS_CYCLE_SHIFT;
        let (lower_reg, upper_reg) = if cycle == 2 {
            (RAM_7, RAM_8)
        } else {
            (RAM_4, RAM_5)
        };

        let frame = RawFrame {
            object_lower: self.read_u16(lower_reg).await? as i16,
            object_upper: self.read_u16(upper_reg).await? as i16,
            ambient_new: self.read_u16(RAM_6).await? as i16,
            ambient_old: self.read_u16(RAM_9).await? as i16,
        };

        // Acknowledge the frame so the flag tracks the next conversion.
        self.write_u16(REG_STATUS, status & !STATUS_NEW_DATA).await?;
        Ok(frame)
    }

    async fn wait_data_ready(&mut self) -> Result<u16, Error<I2c::Error>> {
        for _ in 0..DATA_READY_ATTEMPTS {
            let status = self.read_u16(REG_STATUS).await?;
            if status & STATUS_NEW_DATA != 0 {
                return Ok(status);
            }
            self.delay.delay_ms(DATA_READY_POLL_MS).await;
        }
        Err(Error::Timeout)
    }

    async fn read_calibration(
        &mut self,
    ) -> Result<Calibration, Error<I2c::Error>> {
        Ok(Calibration {
            p_r: self.read_i32(EE_P_R).await? as f32 * exp2(-8),
            p_g: self.read_i32(EE_P_G).await? as f32 * exp2(-20),
            p_t: self.read_i32(EE_P_T).await? as f32 * exp2(-44),
            p_o: self.read_i32(EE_P_O).await? as f32 * exp2(-8),
            ea: self.read_i32(EE_EA).await? as f32 * exp2(-16),
            eb: self.read_i32(EE_EB).await? as f32 * exp2(-8),
            fa: self.read_i32(EE_FA).await? as f32 * exp2(-46),
            fb: self.read_i32(EE_FB).await? as f32 * exp2(-36),
            ga: self.read_i32(EE_GA).await? as f32 * exp2(-36),
            gb: self.read_u16(EE_GB).await? as i16 as f32 * exp2(-10),
            ka: self.read_u16(EE_KA).await? as i16 as f32 * exp2(-10),
            ha: self.read_u16(EE_HA).await? as i16 as f32 * exp2(-14),
            hb: self.read_u16(EE_HB).await? as i16 as f32 * exp2(-10),
        })
    }

    fn ambient_temperature(&self, frame: &RawFrame) -> f32 {
        let c = &self.calib;
        let vr_ta = frame.ambient_old as f32
            + c.gb * (frame.ambient_new as f32 / 12.0);
        let amb = (frame.ambient_new as f32 / 12.0) / vr_ta * 524288.0;

        // Polynomial in (AMB - P_R) around the calibration point.
        let delta = amb - c.p_r;
        c.p_o + delta / c.p_g + c.p_t * delta * delta
    }

    /// Datasheet DSP v5: three fixed-point Newton refinements of the
    /// Stefan-Boltzmann inversion around a 25 C seed.
    fn object_temperature(&self, frame: &RawFrame) -> f32 {
        let c = &self.calib;

        let vr_ta = frame.ambient_old as f32
            + c.gb * (frame.ambient_new as f32 / 12.0);
        let amb = (frame.ambient_new as f32 / 12.0) / vr_ta * 524288.0;
        let ta_dut = (amb - c.eb) / c.ea + 25.0;

        let s = (frame.object_lower as f32 + frame.object_upper as f32) / 2.0;
        let vr_to = frame.ambient_old as f32
            + c.ka * (frame.ambient_new as f32 / 12.0);
        let s_to = (s / 12.0) / vr_to * 524288.0;

        let ta_k = ta_dut + 273.15;
        let ta_k4 = pow4(ta_k);
        let ta_ref = 25.0;

        let mut to = 25.0_f32;
        for _ in 0..3 {
            let denom = self.emissivity
                * c.fa
                * c.ha
                * (1.0 + c.ga * (to - ta_ref) + c.fb * (ta_dut - ta_ref));
            let to_k4 = s_to / denom + ta_k4;
            to = sqrt_sqrt(to_k4) - 273.15 - c.hb;
        }
        to
    }

    async fn read_u16(&mut self, reg: u16) -> Result<u16, Error<I2c::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &reg.to_be_bytes(), &mut buf)
            .await?;
        Ok(u16::from_be_bytes(buf))
    }

    /// 32-bit EEPROM constant: least significant word at the lower address.
    async fn read_i32(&mut self, reg: u16) -> Result<i32, Error<I2c::Error>> {
        let lsw = self.read_u16(reg).await? as u32;
        let msw = self.read_u16(reg + 1).await? as u32;
        Ok(((msw << 16) | lsw) as i32)
    }

    async fn write_u16(
        &mut self,
        reg: u16,
        value: u16,
    ) -> Result<(), Error<I2c::Error>> {
        let reg = reg.to_be_bytes();
        let value = value.to_be_bytes();
        let buf = [reg[0], reg[1], value[0], value[1]];
        self.i2c.write(self.address, &buf).await?;
        Ok(())
    }
}

/// 2^n for the EEPROM scale factors, exact in f32 for this exponent range.
fn exp2(n: i32) -> f32 {
    f32::from_bits(((127 + n) as u32) << 23)
}

fn pow4(x: f32) -> f32 {
    let sq = x * x;
    sq * sq
}

/// Fourth root via two square roots; tighter than powf(0.25) in micromath.
fn sqrt_sqrt(x: f32) -> f32 {
    x.sqrt().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp2_matches_reference_scales() {
        assert_eq!(exp2(-8), 1.0 / 256.0);
        assert_eq!(exp2(-20), 1.0 / 1_048_576.0);
        assert_eq!(exp2(-46), 1.0 / 70_368_744_177_664.0);
    }

    #[test]
    fn fourth_root_inverts_fourth_power() {
        for x in [1.0_f32, 273.15, 298.15, 310.0] {
            assert!((sqrt_sqrt(pow4(x)) - x).abs() < 0.01);
        }
    }
}
