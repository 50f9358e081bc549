use embassy_time::{Duration, Timer};
use micromath::F32Ext;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::events::{EventKind, Poster};
use crate::sampler::SampleSource;

/// Length of the Temperature Measurement payload. Protocol contract: any
/// change breaks peer compatibility.
pub const RECORD_LEN: usize = 6;

/// Flags byte: unit Celsius (bit0 = 0), no timestamp (bit1 = 0), temperature
/// type present (bit2 = 1).
pub const FLAG_TYPE_PRESENT: u8 = 0b0000_0100;

/// Temperature Type code 2: body (general).
pub const TEMPERATURE_TYPE_BODY: u8 = 2;

/// Fixed decimal exponent of the FLOAT field (two decimal places).
const FLOAT_EXPONENT: i8 = -2;

/// IEEE-11073 24-bit mantissa special values and limits.
const MANTISSA_NAN: u32 = 0x007F_FFFF;
const MANTISSA_PLUS_INF: u32 = 0x007F_FFFE;
const MANTISSA_MINUS_INF: u32 = 0x0080_0002;
const MANTISSA_MAX: i32 = 0x007F_FFFD;
const MANTISSA_MIN: i32 = -0x0080_0000 + 3;

/// One encoded Temperature Measurement characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementRecord(pub [u8; RECORD_LEN]);

impl MeasurementRecord {
    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.0
    }
}

/// Encode a Celsius value into the 6-byte Temperature Measurement layout:
/// flags, IEEE-11073 32-bit FLOAT (little endian), temperature type.
///
/// Deterministic for every input. Non-finite readings (a sensor fault the
/// upstream protocol leaves unspecified) map to the IEEE-11073 NaN and
/// infinity special values rather than a fabricated temperature; finite
/// values beyond the 24-bit mantissa range saturate.
pub fn encode(celsius: f32) -> MeasurementRecord {
    let field = float_field(celsius);
    let mut bytes = [0u8; RECORD_LEN];
    bytes[0] = FLAG_TYPE_PRESENT;
    bytes[1..5].copy_from_slice(&field.to_le_bytes());
    bytes[5] = TEMPERATURE_TYPE_BODY;
    MeasurementRecord(bytes)
}

fn float_field(celsius: f32) -> u32 {
    if celsius.is_nan() {
        // Special values carry exponent 0.
        return MANTISSA_NAN;
    }
    if celsius.is_infinite() {
        return if celsius > 0.0 { MANTISSA_PLUS_INF } else { MANTISSA_MINUS_INF };
    }
    let scaled = (celsius * 100.0).round();
    let mantissa = if scaled >= MANTISSA_MAX as f32 {
        MANTISSA_MAX
    } else if scaled <= MANTISSA_MIN as f32 {
        MANTISSA_MIN
    } else {
        scaled as i32
    };
    ((FLOAT_EXPONENT as u8 as u32) << 24) | (mantissa as u32 & 0x00FF_FFFF)
}

/// Decode the FLOAT field of a record back into Celsius.
///
/// Inverse of [`encode`] for finite values; the IEEE-11073 NaN special value
/// decodes to `f32::NAN`.
pub fn decode_temperature(record: &MeasurementRecord) -> f32 {
    let raw = u32::from_le_bytes(record.0[1..5].try_into().unwrap());
    let mantissa_bits = raw & 0x00FF_FFFF;
    if mantissa_bits == MANTISSA_NAN {
        return f32::NAN;
    }
    // Sign-extend the 24-bit mantissa.
    let mantissa = ((mantissa_bits << 8) as i32) >> 8;
    let exponent = (raw >> 24) as u8 as i8;
    let mut value = mantissa as f32;
    if exponent >= 0 {
        for _ in 0..exponent {
            value *= 10.0;
        }
    } else {
        for _ in 0..-exponent {
            value /= 10.0;
        }
    }
    value
}

/// Transport hooks the firmware implements on top of the GATT server.
pub trait IndicationSink {
    type Error;

    /// Mirror `record` into the characteristic value without transmitting,
    /// so a later read by the peer sees the current measurement.
    fn update(&self, record: &MeasurementRecord);

    /// Issue one indication. At-most-one-outstanding discipline (waiting for
    /// the peer acknowledgment) is the transport's business, not ours.
    async fn indicate(
        &self,
        record: &MeasurementRecord,
    ) -> Result<(), Self::Error>;
}

/// What [`IndicationChannel::send_one`] did with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    /// An indication was handed to the transport.
    Indicated,
    /// Peer not subscribed; only the cached characteristic value was updated.
    CachedOnly,
}

/// Subscription gate and send path for the Temperature Measurement
/// characteristic.
///
/// The subscription flag is flipped by the CCCD callback and peer-disconnect
/// path; everything else is driven by the single consumer task. The flag is
/// the sole gate for transmission — values are always encoded and cached
/// regardless.
pub struct IndicationChannel {
    subscribed: AtomicBool,
    last_celsius: AtomicU32,
}

impl IndicationChannel {
    pub const fn new() -> Self {
        Self {
            subscribed: AtomicBool::new(false),
            last_celsius: AtomicU32::new(0),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    /// Apply a CCCD change from the transport. Entering the subscribed state
    /// posts `IndicateStream` so the consumer starts continuous output;
    /// leaving it is observed cooperatively by the streaming loop.
    pub fn set_subscribed(&self, enabled: bool, poster: &Poster<'_>) {
        let was = self.subscribed.swap(enabled, Ordering::AcqRel);
        if enabled && !was {
            poster.post(EventKind::IndicateStream);
        }
    }

    /// Peer gone; equivalent to an unsubscribe without a CCCD write.
    pub fn on_disconnect(&self) {
        self.subscribed.store(false, Ordering::Release);
    }

    /// Last value handed to [`send_one`](IndicationChannel::send_one).
    pub fn last_celsius(&self) -> f32 {
        f32::from_bits(self.last_celsius.load(Ordering::Acquire))
    }

    /// Encode and publish one measurement.
    ///
    /// The characteristic value is always refreshed; an indication goes out
    /// only while subscribed. At most one send per call, no queueing.
    pub async fn send_one<S: IndicationSink>(
        &self,
        celsius: f32,
        sink: &S,
    ) -> Result<SendOutcome, S::Error> {
        let record = encode(celsius);
        self.last_celsius.store(celsius.to_bits(), Ordering::Release);
        sink.update(&record);
        if !self.is_subscribed() {
            return Ok(SendOutcome::CachedOnly);
        }
        sink.indicate(&record).await?;
        Ok(SendOutcome::Indicated)
    }

    /// Continuous output: one instantaneous reading per `period` until the
    /// peer unsubscribes. Cancellation is polling-based, so it is observed
    /// within one period of the flag dropping.
    pub async fn run_stream<Src, S>(
        &self,
        period: Duration,
        source: &mut Src,
        sink: &S,
    ) where
        Src: SampleSource,
        S: IndicationSink,
    {
        while self.is_subscribed() {
            let celsius = source.read().await;
            if self.send_one(celsius, sink).await.is_err() {
                // Not retried; the next tick re-attempts naturally.
                #[cfg(feature = "defmt")]
                defmt::warn!("indication failed, peer may be gone");
            }
            Timer::after(period).await;
        }
    }
}

impl Default for IndicationChannel {
    fn default() -> Self {
        Self::new()
    }
}
