use core::task::Poll;

use embassy_futures::poll_once;
use irt_core::{EventBus, EventKind};

#[test]
fn empty_bus_is_idle() {
    let bus = EventBus::new();
    assert!(bus.is_idle());
    assert_eq!(bus.take_next(), None);
}

#[test]
fn post_wakes_and_dispatches_once() {
    let bus = EventBus::new();
    let poster = bus.poster();

    poster.post(EventKind::Button);

    assert!(matches!(poll_once(bus.wait()), Poll::Ready(())));
    assert_eq!(bus.take_next(), Some(EventKind::Button));
    assert_eq!(bus.take_next(), None);
    assert!(bus.is_idle());
}

#[test]
fn duplicate_posts_accumulate_idempotently() {
    let bus = EventBus::new();
    let poster = bus.poster();

    poster.post(EventKind::IndicateOne);
    poster.post(EventKind::IndicateOne);
    poster.post(EventKind::IndicateOne);

    assert_eq!(bus.take_next(), Some(EventKind::IndicateOne));
    assert_eq!(bus.take_next(), None);
}

#[test]
fn drain_follows_fixed_priority_order() {
    let bus = EventBus::new();
    let poster = bus.poster();

    // Posted lowest priority first; drained highest priority first.
    poster.post(EventKind::IndicateStream);
    poster.post(EventKind::IndicateOne);
    poster.post(EventKind::DisplayTimeout);
    poster.post(EventKind::Button);

    assert_eq!(bus.take_next(), Some(EventKind::Button));
    assert_eq!(bus.take_next(), Some(EventKind::DisplayTimeout));
    assert_eq!(bus.take_next(), Some(EventKind::IndicateOne));
    assert_eq!(bus.take_next(), Some(EventKind::IndicateStream));
    assert_eq!(bus.take_next(), None);
}

#[test]
fn button_preempts_unrelated_pending_bit() {
    let bus = EventBus::new();
    let poster = bus.poster();

    poster.post(EventKind::DisplayTimeout);
    poster.post(EventKind::Button);

    // Both dispatched in the same drain pass, Button first.
    assert_eq!(bus.take_next(), Some(EventKind::Button));
    assert_eq!(bus.take_next(), Some(EventKind::DisplayTimeout));
}

#[test]
fn post_during_drain_is_seen_before_reparking() {
    let bus = EventBus::new();
    let poster = bus.poster();

    poster.post(EventKind::Button);
    assert!(matches!(poll_once(bus.wait()), Poll::Ready(())));
    assert_eq!(bus.take_next(), Some(EventKind::Button));

    // A producer fires while the consumer is still handling Button.
    poster.post(EventKind::IndicateOne);

    // The same drain pass picks it up...
    assert_eq!(bus.take_next(), Some(EventKind::IndicateOne));
    assert_eq!(bus.take_next(), None);

    // ...and even if the consumer had already re-parked, the latched signal
    // would wake it again rather than losing the event.
    poster.post(EventKind::DisplayTimeout);
    assert!(matches!(poll_once(bus.wait()), Poll::Ready(())));
    assert_eq!(bus.take_next(), Some(EventKind::DisplayTimeout));
}

#[test]
fn consumer_clear_drops_a_stale_kind_before_drain() {
    let bus = EventBus::new();
    let poster = bus.poster();

    // Timeout lands first, then the user presses the button.
    poster.post(EventKind::DisplayTimeout);
    poster.post(EventKind::Button);

    assert_eq!(bus.take_next(), Some(EventKind::Button));
    // Handling Button relit the display, so the pending timeout is stale
    // and must not power it back off.
    bus.clear(EventKind::DisplayTimeout);
    assert_eq!(bus.take_next(), None);
    assert!(bus.is_idle());
}

#[test]
fn clear_leaves_other_pending_kinds_alone() {
    let bus = EventBus::new();
    let poster = bus.poster();

    poster.post(EventKind::DisplayTimeout);
    poster.post(EventKind::IndicateOne);

    bus.clear(EventKind::DisplayTimeout);

    assert_eq!(bus.take_next(), Some(EventKind::IndicateOne));
    assert_eq!(bus.take_next(), None);
}

#[test]
fn wait_parks_until_a_post_arrives() {
    let bus = EventBus::new();

    assert!(matches!(poll_once(bus.wait()), Poll::Pending));

    bus.poster().post(EventKind::IndicateStream);
    assert!(matches!(poll_once(bus.wait()), Poll::Ready(())));
}
