use crate::executor::classifier::Verdict;

/// Lifecycle states of one batch item inside the executor.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ItemPhase {
    /// Returning the session to the entry surface before acting.
    Resetting,
    /// Running the adapter's action sequence.
    Acting,
    /// Polling the outcome indicators.
    AwaitingConfirmation,
    /// A verdict exists; the terminal event has not been emitted yet.
    Classified { verdict: Verdict },
    /// Terminal event emitted; the executor moves to the next item.
    Advancing { verdict: Verdict },
}

impl ItemPhase {
    pub fn name(&self) -> &'static str {
        match self {
            ItemPhase::Resetting => "resetting",
            ItemPhase::Acting => "acting",
            ItemPhase::AwaitingConfirmation => "awaiting_confirmation",
            ItemPhase::Classified { .. } => "classified",
            ItemPhase::Advancing { .. } => "advancing",
        }
    }
}
