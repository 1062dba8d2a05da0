use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{QueueError, Result};

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded FIFO whose consumers block until an item is available.
///
/// The item count lives under the same lock as the items, so checking for
/// availability and waiting for it are atomic. Items come out in the order
/// their `enqueue` calls took the lock.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    // State is consistent between statements, so a panic in another holder
    // leaves nothing half-done.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item and wake one waiting consumer.
    ///
    /// Fails with [`QueueError::Closed`] after [`close`](Self::close); the
    /// item is dropped.
    pub fn enqueue(&self, item: T) -> Result<()> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.items.push_back(item);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Remove the front item, waiting as long as it takes.
    ///
    /// Returns [`QueueError::Closed`] once the queue is closed and drained.
    pub fn dequeue(&self) -> Result<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(QueueError::Closed);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the front item, waiting at most `timeout`.
    ///
    /// `Duration::ZERO` waits indefinitely, same as [`dequeue`](Self::dequeue).
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<T> {
        if timeout.is_zero() {
            return self.dequeue();
        }

        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(QueueError::Closed);
            }

            let Some(deadline) = deadline else {
                // Deadline overflowed Instant; treat as unbounded.
                state = self
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            };
            let now = Instant::now();
            if now >= deadline {
                return Err(QueueError::Timeout(timeout));
            }
            let (guard, _) = self
                .available
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Remove the front item if one is present, without blocking.
    pub fn try_dequeue(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Drop every queued item, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let removed = state.items.len();
        state.items.clear();
        removed
    }

    /// Close the queue and wake every blocked consumer.
    ///
    /// Items already queued can still be dequeued; new enqueues fail.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let remaining = {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.items.len()
        };
        self.available.notify_all();
        debug!(remaining, "queue closed");
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T: Clone> BlockingQueue<T> {
    /// Clone of the front item, without removing it.
    ///
    /// Another consumer may dequeue that item before the caller acts on the
    /// copy.
    pub fn head(&self) -> Option<T> {
        self.lock().items.front().cloned()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("BlockingQueue")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
