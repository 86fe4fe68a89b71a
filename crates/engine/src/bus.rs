// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event fan-out.
//!
//! Publishing never blocks: each subscriber gets a bounded queue, and a
//! full queue drops the event for that subscriber while a counter records
//! the loss. Blocking the publisher here would let a slow sink stall the
//! sync jobs feeding it.

use parking_lot::Mutex;
use pcs_core::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default per-subscriber queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct BusState {
    subscribers: Mutex<Vec<mpsc::Sender<Event>>>,
    dropped: AtomicU64,
    closed: std::sync::atomic::AtomicBool,
}

/// Fan-out bus for session events.
///
/// Cloneable handle; all clones share the subscriber set. Created at
/// session start and closed once at session end, after the sinks drain.
#[derive(Clone)]
pub struct EventBus {
    state: Arc<BusState>,
    capacity: usize,
}

/// A subscriber's receiving end.
///
/// `recv()` returns `None` once the bus is closed and the queue drained —
/// that is the shutdown sentinel.
pub struct Subscription {
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(BusState {
                subscribers: Mutex::new(Vec::new()),
                dropped: AtomicU64::new(0),
                closed: std::sync::atomic::AtomicBool::new(false),
            }),
            capacity,
        }
    }

    /// Register a new subscriber; it receives events published after this
    /// call, until the bus is closed. Subscribing to a closed bus yields
    /// a queue that is already at its sentinel.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        if !self.state.closed.load(Ordering::SeqCst) {
            self.state.subscribers.lock().push(tx);
        }
        Subscription { rx }
    }

    /// Deliver an event to every subscriber without blocking.
    ///
    /// Full queues drop the event; disconnected subscribers are pruned.
    /// Publishing on a closed bus is a silent no-op.
    pub fn publish(&self, event: Event) {
        if self.state.closed.load(Ordering::SeqCst) {
            return;
        }
        let mut subscribers = self.state.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.state.dropped.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Close the bus: refuse further publishes and post the shutdown
    /// sentinel to every subscriber by dropping their senders.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
        self.state.subscribers.lock().clear();
    }

    /// Events dropped on full subscriber queues so far.
    pub fn dropped_count(&self) -> u64 {
        self.state.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
