use crate::prelude::*;
use derive_more::From;
use embassy_sync::channel::Receiver;
use irt_core::{IndicationSink, MeasurementRecord};
use nrf_softdevice::ble::gatt_server::IndicateValueError;

use super::gatt::Server;

/// Health Thermometer Service (UUID: 0x1809)
#[nrf_softdevice::gatt_service(uuid = "1809")]
pub struct HealthThermometerService {
    /// Temperature Measurement (UUID: 0x2A1C), indicate only. Fixed 6-byte
    /// layout: flags, IEEE-11073 FLOAT, temperature type.
    #[characteristic(uuid = "2a1c", indicate)]
    pub temperature_measurement: [u8; 6],
}

impl HealthThermometerService {
    /// Apply CCCD writes to the subscription gate. The rising edge is what
    /// kicks off streaming; the dispatcher takes it from there.
    pub async fn handle(
        &self,
        rx: Receiver<'_, NoopRawMutex, HealthThermometerServiceEvent, 4>,
        indications: &'static IndicationChannel,
        poster: Poster<'static>,
    ) {
        loop {
            let event = rx.receive().await;
            match event {
                HealthThermometerServiceEvent::TemperatureMeasurementCccdWrite {
                    indications: enabled,
                } => {
                    info!("HTM indications = {:?}", enabled);
                    indications.set_subscribed(enabled, &poster);
                }
            }
        }
    }
}

#[derive(Debug, From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HtmIndicateError {
    /// No central connected right now.
    NotConnected,
    Indicate(IndicateValueError),
}

/// Pushes encoded measurements into the Temperature Measurement
/// characteristic.
pub struct HtmIndicator {
    server: &'static Server,
    conn_slot: &'static ConnectionSlot,
}

impl HtmIndicator {
    pub fn new(
        server: &'static Server,
        conn_slot: &'static ConnectionSlot,
    ) -> Self {
        Self { server, conn_slot }
    }
}

impl IndicationSink for HtmIndicator {
    type Error = HtmIndicateError;

    fn update(&self, record: &MeasurementRecord) {
        // Refresh the attribute even without a subscriber so a plain read
        // returns the latest measurement.
        if self
            .server
            .htm
            .temperature_measurement_set(record.as_bytes())
            .is_err()
        {
            warn!("failed to update temperature characteristic");
        }
    }

    async fn indicate(
        &self,
        record: &MeasurementRecord,
    ) -> Result<(), HtmIndicateError> {
        let guard = self.conn_slot.lock().await;
        let conn = guard.as_ref().ok_or(HtmIndicateError::NotConnected)?;
        self.server
            .htm
            .temperature_measurement_indicate(conn, record.as_bytes())?;
        Ok(())
    }
}
