use serde::{Deserialize, Serialize};

use crate::errors::{PilotError, PilotResult};

/// One contact to import. `phone` may carry a country-code prefix;
/// adapters normalize it by their own platform rule before entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Display name for progress reporting; an unnamed contact is
    /// referred to by its phone number.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.phone
        } else {
            &self.name
        }
    }
}

/// One outgoing message. `body` may be empty only when at least one
/// attachment is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub recipient: String,
    pub body: String,
    pub attachments: Vec<String>,
}

impl Message {
    pub fn new(
        recipient: impl Into<String>,
        body: impl Into<String>,
        attachments: Vec<String>,
    ) -> PilotResult<Self> {
        let recipient = recipient.into();
        let body = body.into();
        if recipient.trim().is_empty() {
            return Err(PilotError::InvalidItem("message has no recipient".into()));
        }
        if body.trim().is_empty() && attachments.is_empty() {
            return Err(PilotError::InvalidItem(
                "message has neither body nor attachments".into(),
            ));
        }
        Ok(Self {
            recipient,
            body,
            attachments,
        })
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// Profile snapshot produced once by the login flow and stored next to
/// the session's cookies. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResult {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Processing,
    Success,
    Failure,
}

impl OutcomeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutcomeStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Processing => "processing",
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failure => "failure",
        }
    }
}

/// One progress event for one batch item. A `Processing` event may
/// precede the single terminal `Success`/`Failure` event per index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub index: usize,
    pub status: OutcomeStatus,
    pub detail: String,
    pub ts: chrono::DateTime<chrono::Utc>,
}

impl OutcomeEvent {
    pub fn new(index: usize, status: OutcomeStatus, detail: impl Into<String>) -> Self {
        Self {
            index,
            status,
            detail: detail.into(),
            ts: chrono::Utc::now(),
        }
    }

    pub fn processing(index: usize, detail: impl Into<String>) -> Self {
        Self::new(index, OutcomeStatus::Processing, detail)
    }

    pub fn success(index: usize, detail: impl Into<String>) -> Self {
        Self::new(index, OutcomeStatus::Success, detail)
    }

    pub fn failure(index: usize, detail: impl Into<String>) -> Self {
        Self::new(index, OutcomeStatus::Failure, detail)
    }
}

/// Result of one batch run. `summary` is a short human-readable line,
/// never a raw error chain; `completed` counts items that reached a
/// terminal event before any batch-level abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub overall_success: bool,
    pub summary: String,
    pub completed: usize,
}

impl BatchReport {
    pub fn aborted(summary: impl Into<String>, completed: usize) -> Self {
        Self {
            overall_success: false,
            summary: summary.into(),
            completed,
        }
    }
}

/// Keeps digits and a single leading `+`, dropping separators and
/// formatting noise. Platform-specific prefix rules live in adapters.
pub fn sanitize_phone(raw: &str) -> String {
    let re = regex::Regex::new(r"[^0-9+]").expect("valid phone regex");
    let cleaned = re.replace_all(raw.trim(), "");
    match cleaned.strip_prefix('+') {
        Some(rest) => format!("+{}", rest.replace('+', "")),
        None => cleaned.replace('+', ""),
    }
}
