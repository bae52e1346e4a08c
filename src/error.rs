use std::io;

use thiserror::Error;

/// Returned by [`MessageQueue::receive`](crate::MessageQueue::receive) once the
/// queue has been closed and every buffered value has been handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message queue is closed")]
pub struct QueueClosed;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cycle range [{min}, {max}) ms is empty")]
    EmptyCycleRange { min: u64, max: u64 },
}

#[derive(Debug, Error)]
pub enum TrafficLightError {
    #[error("traffic light is already cycling")]
    AlreadyStarted,
    #[error("traffic light has been stopped")]
    Stopped,
    #[error("failed to spawn the phase cycling thread")]
    Spawn(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<QueueClosed> for TrafficLightError {
    fn from(_: QueueClosed) -> Self {
        TrafficLightError::Stopped
    }
}
