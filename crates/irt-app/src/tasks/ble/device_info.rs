use crate::prelude::*;
use embassy_sync::channel::Receiver;

/// Device Information Service (UUID: 0x180A)
/// A standard BLE service that exposes device information.
#[nrf_softdevice::gatt_service(uuid = "180a")]
pub struct DeviceInfoService {
    /// Model Number String (UUID: 0x2A24)
    #[characteristic(uuid = "2a24", read)]
    model_number: heapless::String<32>,

    /// Hardware Revision String (UUID: 0x2A27)
    #[characteristic(uuid = "2a27", read)]
    hardware_revision: heapless::String<32>,

    /// Software Revision String (UUID: 0x2A28)
    #[characteristic(uuid = "2a28", read)]
    software_revision: heapless::String<32>,

    /// Manufacturer Name String (UUID: 0x2A29)
    #[characteristic(uuid = "2a29", read)]
    manufacturer_name: heapless::String<32>,
}

impl DeviceInfoService {
    pub async fn handle(
        &self,
        rx: Receiver<'_, NoopRawMutex, DeviceInfoServiceEvent, 4>,
    ) {
        loop {
            let _event = rx.receive().await;
            // No events to handle for device info service as it's read-only
        }
    }
}

/// Fill in the static device information characteristics.
pub fn update_device_info_characteristics(server: &super::gatt::Server) {
    let info = &server.device_info;
    unwrap!(info.model_number_set(&string32(MODEL)));
    unwrap!(info.hardware_revision_set(&string32(HW_VERSION)));
    unwrap!(info.software_revision_set(&string32(FW_VERSION)));
    unwrap!(info.manufacturer_name_set(&string32(MANUFACTURER)));
}

fn string32(s: &str) -> heapless::String<32> {
    let mut out = heapless::String::new();
    // Truncate rather than fail if a revision string ever grows too long.
    let _ = out.push_str(&s[..s.len().min(32)]);
    out
}
