use crate::prelude::*;
use crate::tasks::BATTERY_MILLIVOLTS;
use embassy_sync::channel::Receiver;
use portable_atomic::Ordering;

/// Battery Service (UUID: 0x180F)
/// A standard BLE service that exposes battery level information of a device.
#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    /// Battery Level (UUID: 0x2A19)
    /// The current charge level of a battery in percentage from 0% to 100%
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

impl BatteryService {
    pub async fn handle(
        &self,
        rx: Receiver<'_, NoopRawMutex, BatteryServiceEvent, 4>,
    ) {
        loop {
            let event = rx.receive().await;
            match event {
                BatteryServiceEvent::BatteryLevelCccdWrite {
                    notifications,
                } => {
                    info!("Battery level notifications = {:?}", notifications);
                }
            }
        }
    }
}

/// Push the most recent SAADC reading into the battery level
/// characteristic.
pub fn update_battery_characteristics(server: &super::gatt::Server) {
    let mv = BATTERY_MILLIVOLTS.load(Ordering::Relaxed);
    if server.battery.battery_level_set(&millivolts_to_percent(mv)).is_err() {
        warn!("failed to update battery level characteristic");
    }
}

/// Linear approximation over the LiPo usable range, 3.3 V empty to 4.2 V
/// full.
fn millivolts_to_percent(mv: u32) -> u8 {
    let mv = mv.clamp(3300, 4200);
    ((mv - 3300) * 100 / 900) as u8
}
