use thiserror::Error;

#[derive(Debug, Error)]
pub enum PilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session init failed: {0}")]
    SessionInit(String),

    #[error("Session lost: {0}")]
    SessionLost(String),

    #[error("Step '{step}' timed out after {waited_ms}ms")]
    StepTimeout { step: String, waited_ms: u64 },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Driver error [{code}]: {message}")]
    Driver { code: String, message: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl PilotError {
    /// Faults that invalidate the whole run rather than one batch item.
    /// Everything else is contained at the executor's item loop.
    pub fn is_batch_fatal(&self) -> bool {
        match self {
            PilotError::SessionInit(_)
            | PilotError::SessionLost(_)
            | PilotError::Navigation(_) => true,
            PilotError::Driver { code, .. } => {
                matches!(code.as_str(), "invalid session id" | "session not created")
            }
            _ => false,
        }
    }
}

pub type PilotResult<T> = Result<T, PilotError>;
