//! Platform adapters: the per-target mapping from abstract operations to
//! concrete UI queries. All control flow lives in the executor; adapters
//! are selector tables plus thin step sequences.

pub mod bale;
pub mod eitaa;
pub mod rubika;
pub mod whatsapp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;
use crate::errors::PilotResult;
use crate::model::{sanitize_phone, Contact};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Eitaa,
    Bale,
    Rubika,
    Whatsapp,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Eitaa,
        Platform::Bale,
        Platform::Rubika,
        Platform::Whatsapp,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Platform::Eitaa => "eitaa",
            Platform::Bale => "bale",
            Platform::Rubika => "rubika",
            Platform::Whatsapp => "whatsapp",
        }
    }

    /// Stable index used to derive per-platform driver ports.
    pub fn index(&self) -> u16 {
        match self {
            Platform::Eitaa => 0,
            Platform::Bale => 1,
            Platform::Rubika => 2,
            Platform::Whatsapp => 3,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Classification hint read off the UI after an action. Probed in fixed
/// precedence order: success indicator, then target-does-not-exist, then
/// generic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSignal {
    ConfirmedSuccess,
    ConfirmedNotFound,
    ConfirmedOtherError,
    NoSignal,
}

/// Result of locating a dispatch recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientLookup {
    Found,
    NotFound,
}

/// Which batch operation the executor is currently driving; outcome
/// probes differ between the two surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ContactImport,
    MessageDispatch,
}

/// The fixed operation set every platform adapter implements. Each step
/// waits for its own readiness element with a bounded budget; an unmet
/// wait escalates to `StepTimeout` and is contained per item by the
/// executor.
#[async_trait]
pub trait AdapterContract: Send + Sync {
    fn platform(&self) -> Platform;

    fn home_url(&self) -> &'static str;

    /// Browser identity this front insists on, if any; config may still
    /// override it.
    fn user_agent(&self) -> Option<&'static str> {
        None
    }

    /// Brings the session to the platform's known-good starting surface.
    /// Idempotent: short-circuits when the anchor element is already
    /// present, so it can run before every item to recover from a
    /// previous item's partial state.
    async fn ensure_entry_point(&self, session: &Session) -> PilotResult<()>;

    /// Forced full reload back to the entry surface.
    async fn reload(&self, session: &Session) -> PilotResult<()>;

    /// Whether UI state leaks between items badly enough to force a
    /// reload before each one of the given operation.
    fn reset_between_items(&self, op: Operation) -> bool {
        let _ = op;
        false
    }

    /// Platforms without a scripted add-contact surface return false and
    /// the import entry point fails fast.
    fn supports_contact_import(&self) -> bool {
        true
    }

    /// Platform-specific phone normalization applied before entry.
    fn normalize_phone(&self, phone: &str) -> String {
        sanitize_phone(phone)
    }

    /// Opens the add-contact form from the entry surface.
    async fn start_add_contact(&self, session: &Session) -> PilotResult<()>;

    /// Fills and submits the add-contact form.
    async fn fill_contact(&self, session: &Session, contact: &Contact) -> PilotResult<()>;

    /// Locates the recipient and opens the conversation. `NotFound` is a
    /// value, not an error; the executor never reaches the compose step
    /// after it.
    async fn start_compose(
        &self,
        session: &Session,
        recipient: &str,
    ) -> PilotResult<RecipientLookup>;

    /// Uploads and submits the attachment set, including the platform's
    /// own upload-completion wait.
    async fn attach(&self, session: &Session, paths: &[String]) -> PilotResult<()>;

    /// Types and submits the message body.
    async fn send_text(&self, session: &Session, body: &str) -> PilotResult<()>;

    /// One cheap probe of the outcome indicators, in precedence order.
    /// Polling and classification policy belong to the executor.
    async fn observe_outcome(
        &self,
        session: &Session,
        op: Operation,
    ) -> PilotResult<OutcomeSignal>;

    /// Secondary check for the unconfirmed-outcome policy: is the
    /// action's input surface still open?
    async fn input_surface_open(&self, session: &Session, op: Operation) -> PilotResult<bool>;
}

/// Builds the adapter for `platform` (the tagged-variant dispatch point;
/// there is exactly one generic executor over this contract).
pub fn adapter_for(platform: Platform, timing: TimingConfig) -> Box<dyn AdapterContract> {
    match platform {
        Platform::Eitaa => Box::new(eitaa::EitaaAdapter::new(timing)),
        Platform::Bale => Box::new(bale::BaleAdapter::new(timing)),
        Platform::Rubika => Box::new(rubika::RubikaAdapter::new(timing)),
        Platform::Whatsapp => Box::new(whatsapp::WhatsappAdapter::new(timing)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_platform() {
        for platform in Platform::ALL {
            let adapter = adapter_for(platform, TimingConfig::default());
            assert_eq!(adapter.platform(), platform);
            assert!(adapter.home_url().starts_with("https://"));
        }
    }

    #[test]
    fn import_support_matches_platform_surfaces() {
        let timing = TimingConfig::default;
        assert!(adapter_for(Platform::Eitaa, timing()).supports_contact_import());
        assert!(adapter_for(Platform::Bale, timing()).supports_contact_import());
        assert!(adapter_for(Platform::Rubika, timing()).supports_contact_import());
        assert!(!adapter_for(Platform::Whatsapp, timing()).supports_contact_import());
    }
}
