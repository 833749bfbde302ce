//! Position reporter — a periodic relay from the transport clock to UI
//! observers.
//!
//! While the transport is playing, a task samples the position every
//! 100 ms and notifies every registered observer. This is purely a
//! convenience relay: the engine's `get_position()` stays the source of
//! truth, and callers should read it directly when they need an exact
//! value (e.g. right after a manual stop).

use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

const REPORT_INTERVAL: Duration = Duration::from_millis(100);

type Observer = Box<dyn Fn(f64) + Send + 'static>;
type ObserverList = Arc<Mutex<Vec<(u64, Observer)>>>;

/// Relays transport positions to registered observers while playing.
pub struct PositionReporter {
    observers: ObserverList,
    next_id: u64,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PositionReporter {
    pub fn new() -> Self {
        Self {
            observers: Arc::new(Mutex::new(Vec::new())),
            next_id: 0,
            task: None,
        }
    }

    /// Register an observer. Observers are independent; dropping the
    /// returned subscription unregisters only that observer.
    pub fn subscribe(&mut self, observer: impl Fn(f64) + Send + 'static) -> PositionSubscription {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.lock().push((id, Box::new(observer)));
        PositionSubscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    /// Push one position to every observer.
    pub fn notify(&self, position: f64) {
        for (_, observer) in self.observers.lock().iter() {
            observer(position);
        }
    }

    /// Start the sampling task. No-op if already running or when called
    /// outside a tokio runtime (observers then only see the final
    /// position pushed on stop).
    pub fn start(&mut self, transport: Arc<Mutex<Transport>>) {
        if self.task.is_some() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime; position sampling disabled");
            return;
        };
        let observers = Arc::clone(&self.observers);
        self.task = Some(handle.spawn(async move {
            let mut interval = tokio::time::interval(REPORT_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let position = transport.lock().position();
                for (_, observer) in observers.lock().iter() {
                    observer(position);
                }
            }
        }));
    }

    /// Stop sampling immediately.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for PositionReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PositionReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle for a registered position observer; unsubscribes on drop.
pub struct PositionSubscription {
    id: u64,
    observers: Weak<Mutex<Vec<(u64, Observer)>>>,
}

impl Drop for PositionSubscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
