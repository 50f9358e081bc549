use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::task::Poll;

use embassy_futures::poll_once;
use embassy_time::{Duration, Timer};
use irt_core::{
    decode_temperature, encode, EventBus, EventKind, IndicationChannel,
    IndicationSink, MeasurementRecord, SampleSource, SendOutcome,
    FLAG_TYPE_PRESENT, RECORD_LEN, TEMPERATURE_TYPE_BODY,
};

#[derive(Default)]
struct MockSink {
    updates: Cell<u32>,
    indications: Cell<u32>,
    last: RefCell<Option<MeasurementRecord>>,
}

impl IndicationSink for MockSink {
    type Error = Infallible;

    fn update(&self, record: &MeasurementRecord) {
        self.updates.set(self.updates.get() + 1);
        *self.last.borrow_mut() = Some(*record);
    }

    async fn indicate(
        &self,
        _record: &MeasurementRecord,
    ) -> Result<(), Infallible> {
        self.indications.set(self.indications.get() + 1);
        Ok(())
    }
}

struct FailingSink;

impl IndicationSink for FailingSink {
    type Error = ();

    fn update(&self, _record: &MeasurementRecord) {}

    async fn indicate(&self, _record: &MeasurementRecord) -> Result<(), ()> {
        Err(())
    }
}

struct ConstSource(f32);

impl SampleSource for ConstSource {
    async fn read(&mut self) -> f32 {
        self.0
    }
}

#[test]
fn record_layout_is_fixed() {
    let record = encode(36.6);
    let bytes = record.as_bytes();

    assert_eq!(bytes.len(), RECORD_LEN);
    assert_eq!(bytes[0], FLAG_TYPE_PRESENT);
    assert_eq!(bytes[5], TEMPERATURE_TYPE_BODY);
    // 36.6 C -> mantissa 3660, exponent -2 (0xFE), little endian.
    assert_eq!(&bytes[1..5], &[0x4C, 0x0E, 0x00, 0xFE]);
}

#[test]
fn encode_is_deterministic() {
    assert_eq!(encode(36.6), encode(36.6));
    assert_eq!(encode(-0.0), encode(-0.0));
}

#[test]
fn float_field_round_trips_clinical_range() {
    for celsius in [-40.0_f32, 0.0, 25.0, 36.6, 37.5, 125.0] {
        let decoded = decode_temperature(&encode(celsius));
        assert!(
            (decoded - celsius).abs() < 0.01,
            "{celsius} decoded as {decoded}"
        );
    }
}

#[test]
fn negative_values_keep_their_sign() {
    let decoded = decode_temperature(&encode(-12.34));
    assert!((decoded - -12.34).abs() < 0.01);
}

#[test]
fn non_finite_readings_map_to_special_values() {
    assert!(decode_temperature(&encode(f32::NAN)).is_nan());

    // Infinities use the reserved mantissas with exponent 0.
    let plus = encode(f32::INFINITY);
    assert_eq!(&plus.as_bytes()[1..5], &[0xFE, 0xFF, 0x7F, 0x00]);
    let minus = encode(f32::NEG_INFINITY);
    assert_eq!(&minus.as_bytes()[1..5], &[0x02, 0x00, 0x80, 0x00]);
}

#[test]
fn out_of_range_values_saturate() {
    // Far beyond the 24-bit mantissa at two decimal places.
    let decoded = decode_temperature(&encode(1.0e6));
    assert!(decoded.is_finite());
    assert!((decoded - 83886.0).abs() < 1.0);
}

#[futures_test::test]
async fn send_one_while_unsubscribed_caches_only() {
    let channel = IndicationChannel::new();
    let sink = MockSink::default();

    let outcome = channel.send_one(36.6, &sink).await.unwrap();

    assert_eq!(outcome, SendOutcome::CachedOnly);
    assert_eq!(sink.updates.get(), 1);
    assert_eq!(sink.indications.get(), 0);
    assert_eq!(*sink.last.borrow(), Some(encode(36.6)));
    assert!((channel.last_celsius() - 36.6).abs() < 1e-6);
}

#[futures_test::test]
async fn send_one_while_subscribed_indicates() {
    let bus = EventBus::new();
    let channel = IndicationChannel::new();
    channel.set_subscribed(true, &bus.poster());

    let sink = MockSink::default();
    let outcome = channel.send_one(37.2, &sink).await.unwrap();

    assert_eq!(outcome, SendOutcome::Indicated);
    assert_eq!(sink.updates.get(), 1);
    assert_eq!(sink.indications.get(), 1);
}

#[test]
fn subscribe_rising_edge_posts_stream_event_once() {
    let bus = EventBus::new();
    let channel = IndicationChannel::new();
    let poster = bus.poster();

    channel.set_subscribed(true, &poster);
    assert_eq!(bus.take_next(), Some(EventKind::IndicateStream));

    // Re-writing the same CCCD value is not a new edge.
    channel.set_subscribed(true, &poster);
    assert_eq!(bus.take_next(), None);

    // Unsubscribe then resubscribe is.
    channel.set_subscribed(false, &poster);
    assert_eq!(bus.take_next(), None);
    channel.set_subscribed(true, &poster);
    assert_eq!(bus.take_next(), Some(EventKind::IndicateStream));
}

#[test]
fn disconnect_clears_subscription_without_posting() {
    let bus = EventBus::new();
    let channel = IndicationChannel::new();
    channel.set_subscribed(true, &bus.poster());
    assert_eq!(bus.take_next(), Some(EventKind::IndicateStream));

    channel.on_disconnect();
    assert!(!channel.is_subscribed());
    assert!(bus.is_idle());
}

#[futures_test::test]
async fn run_stream_exits_when_never_subscribed() {
    let channel = IndicationChannel::new();
    let sink = MockSink::default();
    let mut source = ConstSource(36.6);

    channel
        .run_stream(Duration::from_millis(10), &mut source, &sink)
        .await;

    assert_eq!(sink.indications.get(), 0);
}

#[futures_test::test]
async fn run_stream_stops_within_one_period_of_unsubscribe() {
    let bus = EventBus::new();
    let channel = IndicationChannel::new();
    channel.set_subscribed(true, &bus.poster());

    let sink = MockSink::default();
    let mut source = ConstSource(36.6);

    embassy_futures::join::join(
        channel.run_stream(Duration::from_millis(10), &mut source, &sink),
        async {
            Timer::after(Duration::from_millis(35)).await;
            channel.on_disconnect();
        },
    )
    .await;

    // Roughly one send per period until the flag dropped, all indicated.
    assert!(sink.indications.get() >= 2);
    assert!(sink.indications.get() <= 6);
    assert_eq!(sink.updates.get(), sink.indications.get());
}

#[futures_test::test]
async fn run_stream_survives_a_failed_indication() {
    let bus = EventBus::new();
    let channel = IndicationChannel::new();
    channel.set_subscribed(true, &bus.poster());

    let mut source = ConstSource(36.6);
    let stream =
        channel.run_stream(Duration::from_millis(10), &mut source, &FailingSink);

    // The first failed send must not terminate the loop; it parks on the
    // period timer instead.
    let mut stream = core::pin::pin!(stream);
    assert!(matches!(poll_once(stream.as_mut()), Poll::Pending));

    channel.on_disconnect();
    Timer::after(Duration::from_millis(15)).await;
    stream.await;
}
