use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU32, Ordering};

/// The fixed vocabulary of work the consumer task can be woken for.
///
/// Each kind occupies one bit of the pending word, so posting a kind twice
/// before the consumer drains it dispatches it once (bitmask, not a queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    /// User button pressed; starts a full acquisition window.
    Button,
    /// Display-off deadline elapsed.
    DisplayTimeout,
    /// One instantaneous reading should be indicated to the peer.
    IndicateOne,
    /// The peer enabled indications; start continuous streaming.
    IndicateStream,
}

impl EventKind {
    /// Dispatch order for a drain pass, highest priority first.
    pub const PRIORITY: [EventKind; 4] = [
        EventKind::Button,
        EventKind::DisplayTimeout,
        EventKind::IndicateOne,
        EventKind::IndicateStream,
    ];

    const fn mask(self) -> u32 {
        1 << self as u32
    }
}

/// Pending-event word plus the binary wake signal the consumer parks on.
///
/// Producers (GATT callbacks, timer tasks, the button task) hold a [`Poster`]
/// and only ever OR bits in and latch the signal; the single consumer drains
/// bits with [`take_next`](EventBus::take_next) until the word is empty and
/// re-parks on [`wait`](EventBus::wait). Because the signal saturates, bits
/// posted while the consumer is mid-drain are observed before it re-parks.
pub struct EventBus {
    pending: AtomicU32,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl EventBus {
    pub const fn new() -> Self {
        Self { pending: AtomicU32::new(0), wake: Signal::new() }
    }

    /// Hand out a producer capability. Posting is all a producer may do.
    pub fn poster(&self) -> Poster<'_> {
        Poster { bus: self }
    }

    fn post(&self, kind: EventKind) {
        self.pending.fetch_or(kind.mask(), Ordering::Release);
        self.wake.signal(());
    }

    /// Park until a producer signals. Consumer side only.
    pub async fn wait(&self) {
        self.wake.wait().await;
    }

    /// Pop the highest-priority pending kind, clearing its bit.
    ///
    /// Returns `None` once the word is empty; the consumer then goes back to
    /// [`wait`](EventBus::wait).
    pub fn take_next(&self) -> Option<EventKind> {
        let pending = self.pending.load(Ordering::Acquire);
        if pending == 0 {
            return None;
        }
        for kind in EventKind::PRIORITY {
            if pending & kind.mask() != 0 {
                self.pending.fetch_and(!kind.mask(), Ordering::AcqRel);
                return Some(kind);
            }
        }
        None
    }

    /// Drop a pending kind without dispatching it. Consumer side only, for
    /// events made stale by work the consumer just did (a display timeout
    /// posted right before the button press that relit the display).
    pub fn clear(&self, kind: EventKind) {
        self.pending.fetch_and(!kind.mask(), Ordering::AcqRel);
    }

    /// True when no events are pending.
    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Restricted producer handle for the event bus.
///
/// Exposes only [`post`](Poster::post), which never blocks, so interrupt and
/// callback contexts cannot misuse the bus by construction.
#[derive(Clone, Copy)]
pub struct Poster<'a> {
    bus: &'a EventBus,
}

impl Poster<'_> {
    /// Set the bit for `kind` and latch the wake signal. Never blocks.
    pub fn post(&self, kind: EventKind) {
        self.bus.post(kind);
    }
}
