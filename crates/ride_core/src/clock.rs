//! Virtual clock and timer scheduler.
//!
//! Every delayed step of the ride flow (booking confirmation, driver search,
//! tracking ticks, the arrived → in-progress hop) is a timer on this clock.
//! Timers are either one-shot or repeating; both return a [`TimerHandle`] that
//! can be cancelled, which removes every queued firing of that timer.
//!
//! Time only moves when the runner pops an event or advances the clock
//! explicitly, so tests drive the whole flow with no real sleeping.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use bevy_ecs::prelude::Resource;

pub const ONE_SEC_MS: u64 = 1000;

/// Wall-clock epoch used when no explicit epoch is configured
/// (2026-02-13T10:00:00Z).
pub const DEFAULT_EPOCH_MS: i64 = 1_770_976_800_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    BookingConfirmed,
    DriverFound,
    DriverArrivingNotice,
    TrackingTick,
    ArrivalCheck,
    RideStarted,
    HistoryLoaded,
    AuthCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub timer: TimerHandle,
}

/// The event currently being processed by the schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Once,
    Every(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    event: Event,
    seq: u64,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap; ties fire in scheduling order.
        other
            .event
            .timestamp
            .cmp(&self.event.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Resource)]
pub struct SimulationClock {
    now: u64,
    epoch_ms: i64,
    next_seq: u64,
    next_timer: u64,
    events: BinaryHeap<Scheduled>,
    timers: HashMap<TimerHandle, (EventKind, Repeat)>,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH_MS)
    }
}

impl SimulationClock {
    pub fn with_epoch(epoch_ms: i64) -> Self {
        Self {
            now: 0,
            epoch_ms,
            next_seq: 0,
            next_timer: 0,
            events: BinaryHeap::new(),
            timers: HashMap::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    /// Wall-clock milliseconds for a simulation timestamp.
    pub fn sim_to_real_ms(&self, sim_ms: u64) -> i64 {
        self.epoch_ms.saturating_add(sim_ms as i64)
    }

    /// Wall-clock milliseconds for the current instant.
    pub fn now_real_ms(&self) -> i64 {
        self.sim_to_real_ms(self.now)
    }

    /// Schedules a one-shot timer at an absolute simulation time.
    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind) -> TimerHandle {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let handle = self.allocate(kind, Repeat::Once);
        self.push(timestamp.max(self.now), kind, handle);
        handle
    }

    /// Schedules a one-shot timer `delay_ms` from now.
    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind) -> TimerHandle {
        self.schedule_at(self.now.saturating_add(delay_ms), kind)
    }

    pub fn schedule_in_secs(&mut self, delay_secs: u64, kind: EventKind) -> TimerHandle {
        self.schedule_in(delay_secs.saturating_mul(ONE_SEC_MS), kind)
    }

    /// Schedules a repeating timer. The first firing is one period from now and the
    /// timer keeps re-arming itself until cancelled.
    pub fn schedule_every(&mut self, period_ms: u64, kind: EventKind) -> TimerHandle {
        let period_ms = period_ms.max(1);
        let handle = self.allocate(kind, Repeat::Every(period_ms));
        self.push(self.now.saturating_add(period_ms), kind, handle);
        handle
    }

    /// Cancels a timer. Returns `false` when the timer had already fired (one-shot)
    /// or was cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.timers.remove(&handle).is_none() {
            return false;
        }
        self.events.retain(|scheduled| scheduled.event.timer != handle);
        true
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Number of live timers (repeating timers count once).
    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let Scheduled { event, .. } = self.events.pop()?;
        self.now = event.timestamp;
        match self.timers.get(&event.timer).copied() {
            Some((kind, Repeat::Every(period_ms))) => {
                self.push(event.timestamp.saturating_add(period_ms), kind, event.timer);
            }
            Some((_, Repeat::Once)) => {
                self.timers.remove(&event.timer);
            }
            None => {}
        }
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|scheduled| scheduled.event.timestamp)
    }

    /// Moves the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, timestamp: u64) {
        debug_assert!(
            self.next_event_time().map_or(true, |next| next >= timestamp),
            "advancing past a pending event"
        );
        self.now = self.now.max(timestamp);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn allocate(&mut self, kind: EventKind, repeat: Repeat) -> TimerHandle {
        let handle = TimerHandle(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(handle, (kind, repeat));
        handle
    }

    fn push(&mut self, timestamp: u64, kind: EventKind, timer: TimerHandle) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Scheduled {
            event: Event {
                timestamp,
                kind,
                timer,
            },
            seq,
        });
    }
}
