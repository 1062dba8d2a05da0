use std::time::Duration;

/// Errors returned by blocking queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// No item arrived before the timeout elapsed.
    #[error("no item available within {0:?}")]
    Timeout(Duration),

    /// The queue was closed and holds no more items.
    #[error("queue closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, QueueError>;
