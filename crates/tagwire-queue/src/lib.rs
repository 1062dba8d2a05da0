//! Thread-safe blocking FIFO for handing values between threads.
//!
//! A [`BlockingQueue`] is a single monitor: one mutex guards the items and
//! the closed flag, and one condition variable wakes consumers. Producers
//! never block; consumers block until an item arrives, a timeout elapses, or
//! the queue is closed.

pub mod error;
pub mod queue;

pub use error::{QueueError, Result};
pub use queue::BlockingQueue;
