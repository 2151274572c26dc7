use tokio::sync::mpsc;

use crate::model::OutcomeEvent;

/// Sink for per-item progress. `report` must not fail; a faulting
/// reporter is a caller bug the executor does not guard against.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &OutcomeEvent);
}

/// Swallows every event.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _event: &OutcomeEvent) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(&OutcomeEvent) + Send + Sync,
{
    fn report(&self, event: &OutcomeEvent) {
        self(event)
    }
}

/// Fans events out over an mpsc channel for callers that consume
/// progress as a stream. Dropped receivers are tolerated; a full buffer
/// drops the event rather than blocking the run.
pub struct ChannelReporter {
    tx: mpsc::Sender<OutcomeEvent>,
}

impl ChannelReporter {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<OutcomeEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: &OutcomeEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            tracing::warn!(index = event.index, error = %e, "progress event dropped");
        }
    }
}
