use embassy_sync::channel::Channel;

use super::{advertiser, enable_softdevice, softdevice_task, Advertiser};
use crate::prelude::*;
use embassy_executor::Spawner;
use embassy_futures::select::select4;
use irt_core::IndicationChannel;
use nrf_softdevice::ble::{gatt_server, Connection};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

use super::battery::BatteryService;
use super::device_info::DeviceInfoService;
use super::htm::HealthThermometerService;

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub battery: BatteryService,
    pub device_info: DeviceInfoService,
    pub htm: HealthThermometerService,
}

impl Server {
    pub fn start_gatt(
        name: &'static str,
        spawner: Spawner,
    ) -> (&'static Server, Advertiser, &'static Softdevice) {
        // Spawn the underlying softdevice task
        let sd = enable_softdevice(name);
        info!("softdevice initialized");
        // Create a BLE GATT server and make it static
        static SERVER: StaticCell<Server> = StaticCell::new();
        let server = SERVER.init(Server::new(sd).unwrap());
        info!("Starting Gatt Server");

        unwrap!(spawner.spawn(softdevice_task(sd)));

        let advertiser = advertiser::AdvertiserBuilder::new(name, sd).build();

        (server, advertiser, sd)
    }
}

/// Serve GATT events for one connection until it drops.
pub async fn gatt_server_task(
    server: &Server,
    conn: &Connection,
    indications: &'static IndicationChannel,
    poster: Poster<'static>,
) {
    let htm_channel: Channel<
        NoopRawMutex,
        HealthThermometerServiceEvent,
        4,
    > = Channel::new();
    let htm_sender = htm_channel.sender();
    let htm_receiver = htm_channel.receiver();

    let battery_channel: Channel<NoopRawMutex, BatteryServiceEvent, 4> =
        Channel::new();
    let battery_sender = battery_channel.sender();
    let battery_receiver = battery_channel.receiver();

    let device_info_channel: Channel<
        NoopRawMutex,
        DeviceInfoServiceEvent,
        4,
    > = Channel::new();
    let device_info_receiver = device_info_channel.receiver();

    let gatt_server_fut = gatt_server::run(conn, server, |e| match e {
        ServerEvent::Htm(e) => {
            if htm_sender.try_send(e).is_err() {
                warn!("Error when trying to send HealthThermometerServiceEvent!");
            }
        }
        ServerEvent::Battery(e) => {
            if battery_sender.try_send(e).is_err() {
                warn!("Error when trying to send BatteryServiceEvent!");
            }
        }
        ServerEvent::DeviceInfo(_) => {
            // Read-only service, nothing to dispatch.
        }
    });

    let htm_handle_fut =
        server.htm.handle(htm_receiver, indications, poster);
    let battery_handle_fut = server.battery.handle(battery_receiver);
    let device_info_handle_fut =
        server.device_info.handle(device_info_receiver);

    futures::pin_mut!(
        gatt_server_fut,
        htm_handle_fut,
        battery_handle_fut,
        device_info_handle_fut
    );

    let _ = select4(
        gatt_server_fut,
        htm_handle_fut,
        battery_handle_fut,
        device_info_handle_fut,
    )
    .await;

    info!("Gatt server task finished");
}
