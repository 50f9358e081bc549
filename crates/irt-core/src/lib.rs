#![no_std]
#![allow(async_fn_in_trait)]
//! Coordination core for the IR thermometer firmware.
//!
//! Holds everything that does not touch hardware: the pending-event bus that
//! wakes the single consumer task, the streaming statistics sampler that turns
//! a noisy acquisition window into one stable reading, and the Health
//! Thermometer indication channel with its 6-byte wire encoding. All of it is
//! host-testable; the firmware crate supplies the sensor, display and BLE
//! implementations of the traits defined here.

mod events;
mod htm;
mod sampler;

pub use events::{EventBus, EventKind, Poster};
pub use htm::{
    decode_temperature, encode, IndicationChannel, IndicationSink,
    MeasurementRecord, SendOutcome, FLAG_TYPE_PRESENT, RECORD_LEN,
    TEMPERATURE_TYPE_BODY,
};
pub use sampler::{AcquisitionUi, SampleSource, Sampler};
