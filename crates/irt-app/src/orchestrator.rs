//! Single consumer of the event bus.
//!
//! Every shared resource (sensor, display, buzzer, indication sink) is owned
//! here and touched from no other task. Producers only post events; this
//! loop drains the pending word in priority order and does the work, one
//! event at a time.

use embassy_nrf::gpio::Output;

use crate::prelude::*;
use crate::tasks::{
    AwakeSensor, Buzzer, DisplayManager, HtmIndicator, OneShotSensor,
    ProgressUi, TempSensor,
};
use irt_core::IndicationChannel;

pub struct OrchestratorContext {
    pub bus: &'static EventBus,
    pub indications: &'static IndicationChannel,
    pub sensor: TempSensor,
    pub display: DisplayManager,
    pub buzzer: Buzzer,
    pub led_green: Output<'static>,
    pub led_blue: Output<'static>,
    pub sink: HtmIndicator,
    /// Re-arms the button task once an acquisition finishes.
    pub button_rearm: &'static WakeSignal,
    /// Restarts the display idle timer on any user-visible activity.
    pub display_kick: &'static WakeSignal,
}

#[embassy_executor::task]
pub async fn orchestrate(mut ctx: OrchestratorContext) {
    let mut sampler = Sampler::new();
    loop {
        ctx.bus.wait().await;
        while let Some(event) = ctx.bus.take_next() {
            match event {
                EventKind::Button => {
                    acquire_and_publish(&mut ctx, &mut sampler).await;
                }
                EventKind::DisplayTimeout => {
                    if ctx.display.is_powered()
                        && ctx.display.power_off().await.is_err()
                    {
                        warn!("display power-off failed");
                    }
                }
                EventKind::IndicateOne => {
                    indicate_one(&mut ctx).await;
                }
                EventKind::IndicateStream => {
                    info!("indication streaming started");
                    let mut source = OneShotSensor(&mut ctx.sensor);
                    ctx.indications
                        .run_stream(STREAM_PERIOD, &mut source, &ctx.sink)
                        .await;
                    info!("indication streaming stopped");
                }
            }
        }
    }
}

/// Button press: full acquisition window with cues, progress feedback and a
/// final indication of the mean. Blocks the loop for the whole window on
/// purpose; queued events are handled right after.
async fn acquire_and_publish(
    ctx: &mut OrchestratorContext,
    sampler: &mut Sampler,
) {
    // A timeout posted just before the press is stale now; left pending it
    // would blank the result screen as soon as this handler returns.
    ctx.bus.clear(EventKind::DisplayTimeout);

    ctx.buzzer.start_cue().await;
    if ctx.display.power_on().await.is_err() {
        warn!("display power-on failed");
    }
    if ctx.display.show_status("START", "MEASURE").await.is_err() {
        warn!("status redraw failed");
    }
    ctx.display_kick.signal(());

    // Keep the sensor out of sleep for the whole burst instead of
    // duty-cycling per read.
    ctx.sensor.wake().await;
    let mean = {
        let mut source = AwakeSensor(&mut ctx.sensor);
        let mut ui = ProgressUi::new(
            &mut ctx.display,
            &mut ctx.led_green,
            &mut ctx.led_blue,
        );
        sampler
            .run_for(MEASURE_WINDOW, MEASURE_POLL_INTERVAL, &mut source, &mut ui)
            .await
    };
    ctx.sensor.sleep().await;
    ctx.led_green.set_low();
    ctx.led_blue.set_low();

    info!(
        "acquisition complete: {} samples, mean {} C, std dev {}",
        sampler.count(),
        mean,
        sampler.std_dev()
    );

    if ctx.display.show_result(mean).await.is_err() {
        warn!("result redraw failed");
    }
    ctx.buzzer.end_cue().await;

    if ctx.indications.send_one(mean, &ctx.sink).await.is_err() {
        warn!("result indication failed");
    }

    ctx.button_rearm.signal(());
    ctx.display_kick.signal(());
}

/// One instantaneous reading to the peer, skipped entirely without a
/// subscriber.
async fn indicate_one(ctx: &mut OrchestratorContext) {
    if !ctx.indications.is_subscribed() {
        return;
    }
    let celsius = ctx.sensor.read_single().await;
    if ctx.indications.send_one(celsius, &ctx.sink).await.is_err() {
        warn!("one-shot indication failed");
    }
}
