//! MsgPilot — web messenger automation engine.
//!
//! Drives persistent, authenticated browser sessions against messaging
//! web front-ends to run bulk contact imports and message dispatches,
//! reporting one outcome per batch item. One generic executor state
//! machine runs every platform through its [`adapter::AdapterContract`].

pub mod adapter;
pub mod auth;
pub mod config;
pub mod driver;
pub mod errors;
pub mod executor;
pub mod model;
pub mod poll;
pub mod service;
pub mod session;
pub mod storage;
pub mod store;

pub use adapter::Platform;
pub use config::AppConfig;
pub use errors::{PilotError, PilotResult};
pub use executor::{ChannelReporter, NullReporter, ProgressReporter};
pub use model::{AuthResult, BatchReport, Contact, Message, OutcomeEvent, OutcomeStatus};
pub use service::Messenger;

/// Installs the global tracing subscriber. Honors `RUST_LOG`; defaults
/// to `info` for this crate and warnings elsewhere.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,msgpilot=info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
