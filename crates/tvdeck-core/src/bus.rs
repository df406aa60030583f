//! In-process publish/subscribe bus with a virtual clock
//!
//! Signals are queued and delivered one at a time by the owner of the bus;
//! every handler runs to completion before the next signal is taken. Timers
//! are delayed signals: when their deadline is reached they join the queue
//! like any other publication.

use crate::signal::{Signal, SignalKind, Subscriber};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;
use tracing::trace;

/// Handle to a scheduled signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Default)]
pub struct EventBus {
    now: Duration,
    queue: VecDeque<Signal>,
    timers: BTreeMap<(Duration, u64), Signal>,
    deadlines: HashMap<TimerId, Duration>,
    next_timer: u64,
    subscriptions: HashMap<SignalKind, Vec<Subscriber>>,
    recorded: Option<Vec<Signal>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time since the bus was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn publish(&mut self, signal: Signal) {
        trace!(kind = ?signal.kind(), "publish");
        if let Some(recorded) = self.recorded.as_mut() {
            recorded.push(signal.clone());
        }
        self.queue.push_back(signal);
    }

    /// Deliver `signal` once `delay` has elapsed
    pub fn schedule(&mut self, delay: Duration, signal: Signal) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;

        let deadline = self.now + delay;
        self.timers.insert((deadline, id.0), signal);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer. Returns false if it already fired.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.timers.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock to the earliest deadline not after `until` and queue
    /// its signal. Returns false when nothing is due.
    pub fn fire_next_due(&mut self, until: Duration) -> bool {
        let Some((&(deadline, id), _)) = self.timers.iter().next() else {
            return false;
        };
        if deadline > until {
            return false;
        }

        if let Some(signal) = self.timers.remove(&(deadline, id)) {
            self.deadlines.remove(&TimerId(id));
            self.now = self.now.max(deadline);
            self.publish(signal);
        }
        true
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Take the next queued signal
    pub fn pop(&mut self) -> Option<Signal> {
        self.queue.pop_front()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn subscribe(&mut self, kind: SignalKind, subscriber: Subscriber) {
        let list = self.subscriptions.entry(kind).or_default();
        if !list.contains(&subscriber) {
            list.push(subscriber);
        }
    }

    pub fn unsubscribe(&mut self, kind: SignalKind, subscriber: Subscriber) {
        if let Some(list) = self.subscriptions.get_mut(&kind) {
            list.retain(|s| *s != subscriber);
        }
    }

    /// Drop every subscription `subscriber` holds
    pub fn unsubscribe_all(&mut self, subscriber: Subscriber) {
        for list in self.subscriptions.values_mut() {
            list.retain(|s| *s != subscriber);
        }
    }

    /// Subscribers of `kind`, in subscription order
    pub fn subscribers(&self, kind: SignalKind) -> Vec<Subscriber> {
        self.subscriptions.get(&kind).cloned().unwrap_or_default()
    }

    pub fn subscription_count(&self, subscriber: Subscriber) -> usize {
        self.subscriptions
            .values()
            .filter(|list| list.contains(&subscriber))
            .count()
    }

    /// Keep a copy of every published signal until [`EventBus::take_recorded`]
    pub fn record(&mut self, enabled: bool) {
        self.recorded = enabled.then(Vec::new);
    }

    pub fn take_recorded(&mut self) -> Vec<Signal> {
        self.recorded.as_mut().map(std::mem::take).unwrap_or_default()
    }
}
