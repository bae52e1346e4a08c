use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::QueueClosed;

/// End of the queue that [`MessageQueue::receive`] takes values from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DrainOrder {
    /// Oldest value first.
    #[default]
    Fifo,
    /// Most recently sent value first.
    Lifo,
}

/// Counters of values accepted by `send` and handed out by `receive`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub sent: u64,
    pub received: u64,
}

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    stats: QueueStats,
}

/// Unbounded blocking queue with non-blocking send and blocking receive.
///
/// Every value sent is handed to exactly one receiver. Mutex and Condvar can
/// be shared between threads, so can `MessageQueue<T>` as long as `T: Send`.
pub struct MessageQueue<T> {
    state: Mutex<State<T>>,
    item_ready: Condvar,
    order: DrainOrder,
}

/// Poisoning only means another thread panicked while holding the guard; the
/// values we protect are never left half-written, so keep going.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        Self::with_order(DrainOrder::Fifo)
    }

    pub fn with_order(order: DrainOrder) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
                stats: QueueStats::default(),
            }),
            item_ready: Condvar::new(),
            order,
        }
    }

    pub fn order(&self) -> DrainOrder {
        self.order
    }

    /// Appends `message` and wakes one waiting receiver.
    ///
    /// Never blocks. Messages sent after [`close`](Self::close) are dropped.
    pub fn send(&self, message: T) {
        {
            let mut state = lock(&self.state);
            if state.closed {
                debug!("dropping message sent to a closed queue");
                return;
            }
            state.items.push_back(message);
            state.stats.sent += 1;
        }
        self.item_ready.notify_one();
    }

    /// Blocks until a message is available and removes it.
    ///
    /// Returns [`QueueClosed`] only once the queue is closed and empty, so
    /// messages buffered before the close are still delivered.
    pub fn receive(&self) -> Result<T, QueueClosed> {
        let mut state = lock(&self.state);

        loop {
            if let Some(message) = self.take(&mut state) {
                return Ok(message);
            }
            if state.closed {
                return Err(QueueClosed);
            }

            // wait() will unlock the Mutex and lock again if it returns to
            // not keep the lock while waiting; the loop re-checks after
            // spurious wake-ups or when another receiver got there first
            state = self
                .item_ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            trace!("receiver woke up");
        }
    }

    pub fn try_receive(&self) -> Option<T> {
        let mut state = lock(&self.state);
        self.take(&mut state)
    }

    /// Closes the queue and wakes every blocked receiver.
    pub fn close(&self) {
        {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.closed = true;
        }
        debug!("message queue closed");
        self.item_ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        lock(&self.state).stats
    }

    fn take(&self, state: &mut State<T>) -> Option<T> {
        let message = match self.order {
            DrainOrder::Fifo => state.items.pop_front(),
            DrainOrder::Lifo => state.items.pop_back(),
        }?;
        state.stats.received += 1;
        Some(message)
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MessageQueue")
            .field("order", &self.order)
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .field("stats", &state.stats)
            .finish()
    }
}
