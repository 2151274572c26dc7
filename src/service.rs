use std::time::Duration;

use crate::adapter::{adapter_for, AdapterContract, Platform};
use crate::config::AppConfig;
use crate::errors::PilotResult;
use crate::executor::{BatchExecutor, NullReporter, ProgressReporter};
use crate::model::{AuthResult, BatchReport, Contact, Message};
use crate::session::{Session, SessionConfig};
use crate::storage;

/// One platform's automation service: an exclusively owned session plus
/// its adapter. Batches run strictly sequentially on it; independent
/// platforms get independent `Messenger` values with their own storage
/// directories and driver ports.
pub struct Messenger {
    session: Session,
    adapter: Box<dyn AdapterContract>,
    config: AppConfig,
}

impl Messenger {
    /// Opens (or reuses) the persistent session for `platform`. Fatal
    /// when the driver cannot attach; callers must `close()` on every
    /// exit path, which `Drop` backstops.
    pub async fn open(platform: Platform, config: AppConfig) -> PilotResult<Self> {
        let adapter = adapter_for(platform, config.timing.clone());
        let entry = config.platform_entry(platform.slug());
        let session_cfg = SessionConfig {
            storage_dir: storage::session_dir(&config.data_root(), platform.slug()),
            headless: entry.headless,
            driver_binary: config.driver.binary.clone(),
            port: config.driver.base_port + platform.index(),
            slow_mo: Duration::from_millis(entry.slow_mo_ms),
            user_agent: entry
                .user_agent
                .clone()
                .or_else(|| adapter.user_agent().map(str::to_string)),
            nav_timeout: config.timing.nav_timeout(),
        };
        let session = Session::open(&session_cfg).await?;
        Ok(Self {
            session,
            adapter,
            config,
        })
    }

    pub fn platform(&self) -> Platform {
        self.adapter.platform()
    }

    /// Profile snapshot recorded by the login flow, if one exists.
    pub fn profile(&self) -> PilotResult<Option<AuthResult>> {
        storage::read_profile(self.session.storage_dir())
    }

    /// Bulk contact import. One terminal event per contact reaches
    /// `reporter`; the report carries the run summary.
    pub async fn add_contacts(
        &self,
        contacts: &[Contact],
        reporter: &dyn ProgressReporter,
    ) -> BatchReport {
        let executor = BatchExecutor::new(
            &self.session,
            self.adapter.as_ref(),
            self.config.timing.clone(),
            self.config.policy.unconfirmed,
        );
        executor.run_import(contacts, reporter).await
    }

    /// Sends one message with optional attachments. `Ok(false)` covers
    /// every per-item failure, including an absent recipient; `Err` is
    /// reserved for session-level faults.
    pub async fn send_message(
        &self,
        recipient: &str,
        body: &str,
        attachments: &[String],
    ) -> PilotResult<bool> {
        let message = Message::new(recipient, body, attachments.to_vec())?;
        let executor = BatchExecutor::new(
            &self.session,
            self.adapter.as_ref(),
            self.config.timing.clone(),
            self.config.policy.unconfirmed,
        );
        let verdict = executor.dispatch_one(&message, &NullReporter).await?;
        if let Some(reason) = (!verdict.is_success()).then(|| verdict.detail()) {
            tracing::info!(recipient, reason, "message not delivered");
        }
        Ok(verdict.is_success())
    }

    /// Explicit teardown; idempotent and safe after any failure.
    pub async fn close(&mut self) {
        self.session.close().await;
    }
}
