pub mod advertiser;
pub mod battery;
pub mod device_info;
pub mod gatt;
pub mod htm;

// Re-exports
pub use advertiser::*;
pub use battery::*;
pub use device_info::*;
pub use gatt::*;
pub use htm::*;

use crate::prelude::*;
use irt_core::IndicationChannel;
use nrf_softdevice::{raw, Softdevice};

/// Default MTU is plenty for a 6-byte indication payload.
pub const ATT_MTU: usize = 23;

pub fn enable_softdevice(name: &'static str) -> &'static mut Softdevice {
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 4,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t {
            att_mtu: (ATT_MTU as u16),
        }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: 1408,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: Default::default(),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: name.as_ptr() as *const u8 as _,
            current_len: name.len() as u16,
            max_len: name.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    info!("Enabling softdevice");
    Softdevice::enable(&config)
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) {
    sd.run().await;
}

/// Advertise, serve one connection at a time and keep the connection slot
/// and subscription state consistent across disconnects.
#[embassy_executor::task]
pub async fn ble_task(
    server: &'static Server,
    advertiser: Advertiser,
    conn_slot: &'static ConnectionSlot,
    indications: &'static IndicationChannel,
    poster: Poster<'static>,
) {
    update_device_info_characteristics(server);

    loop {
        match advertiser.advertise().await {
            Ok(conn) => {
                update_battery_characteristics(server);
                *conn_slot.lock().await = Some(conn.clone());
                gatt_server_task(server, &conn, indications, poster).await;
                // Peer gone: drop the handle and the subscription together.
                conn_slot.lock().await.take();
                indications.on_disconnect();
                info!("disconnected");
            }
            Err(e) => {
                error!("Advertisement error: {:?}", e);
                Timer::after_secs(1).await;
            }
        }
    }
}
