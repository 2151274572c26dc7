//! The generic action executor: one state machine over the adapter
//! contract, a pure outcome classifier, and the progress-reporting
//! seam.

pub mod classifier;
pub mod engine;
pub mod reporter;
pub mod state;

pub use classifier::{classify, Observation, Verdict};
pub use engine::BatchExecutor;
pub use reporter::{ChannelReporter, NullReporter, ProgressReporter};
pub use state::ItemPhase;
