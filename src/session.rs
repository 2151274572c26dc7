use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::driver::client::{DriverClient, SessionCaps};
use crate::driver::protocol::Locator;
use crate::driver::transport::DriverTransport;
use crate::driver::DriverProcess;
use crate::errors::{PilotError, PilotResult};
use crate::poll::{poll_until, PollPlan};

const QUERY_INTERVAL: Duration = Duration::from_millis(250);

/// Launch options for one automation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Persistent browser-profile directory; reused when it exists,
    /// created when it does not.
    pub storage_dir: PathBuf,
    pub headless: bool,
    pub driver_binary: String,
    pub port: u16,
    /// Per-action pacing delay; zero disables it.
    pub slow_mo: Duration,
    pub user_agent: Option<String>,
    pub nav_timeout: Duration,
}

/// One exclusive, persistent UI-driver context bound to a storage
/// directory. Strictly sequential: a session is driven by one executor
/// at a time and shares nothing.
pub struct Session {
    client: DriverClient,
    session_id: Option<String>,
    driver: Option<DriverProcess>,
    storage_dir: PathBuf,
    slow_mo: Duration,
    nav_timeout: Duration,
}

impl Session {
    /// Spawns a driver bound to `cfg.storage_dir` and opens a browser
    /// session on it. Fails with `SessionInit` when the driver cannot
    /// attach (binary missing, profile locked).
    pub async fn open(cfg: &SessionConfig) -> PilotResult<Self> {
        std::fs::create_dir_all(&cfg.storage_dir).map_err(|e| {
            PilotError::SessionInit(format!(
                "cannot create storage dir {}: {e}",
                cfg.storage_dir.display()
            ))
        })?;

        let (driver, transport) = DriverProcess::launch(&cfg.driver_binary, cfg.port).await?;
        let client = DriverClient::new(Arc::new(transport));
        let caps = SessionCaps {
            user_data_dir: cfg.storage_dir.display().to_string(),
            headless: cfg.headless,
            user_agent: cfg.user_agent.clone(),
        };

        let mut session = Self {
            client,
            session_id: None,
            driver: Some(driver),
            storage_dir: cfg.storage_dir.clone(),
            slow_mo: cfg.slow_mo,
            nav_timeout: cfg.nav_timeout,
        };

        match session.client.new_session(&caps).await {
            Ok(id) => {
                let _ = session
                    .client
                    .set_page_load_timeout(&id, cfg.nav_timeout.as_millis() as u64)
                    .await;
                tracing::info!(
                    storage = %cfg.storage_dir.display(),
                    port = cfg.port,
                    headless = cfg.headless,
                    "session opened"
                );
                session.session_id = Some(id);
                Ok(session)
            }
            Err(e) => {
                // Partial open: the driver process is already up and must
                // not leak. close() stays safe to call again afterwards.
                session.close().await;
                Err(e)
            }
        }
    }

    /// Joins an already running driver instead of spawning one.
    pub fn attach(
        transport: Arc<dyn DriverTransport>,
        session_id: impl Into<String>,
        storage_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client: DriverClient::new(transport),
            session_id: Some(session_id.into()),
            driver: None,
            storage_dir: storage_dir.into(),
            slow_mo: Duration::ZERO,
            nav_timeout: Duration::from_secs(90),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn id(&self) -> PilotResult<&str> {
        self.session_id
            .as_deref()
            .ok_or_else(|| PilotError::SessionLost("session already closed".into()))
    }

    async fn pace(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }

    /// Full page navigation. A page-load timeout surfaces as
    /// `StepTimeout`; the executor escalates it only at the batch-reset
    /// boundary.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> PilotResult<()> {
        let id = self.id()?;
        let _ = self
            .client
            .set_page_load_timeout(id, timeout.as_millis() as u64)
            .await;
        let result = self.client.navigate(id, url).await;
        let _ = self
            .client
            .set_page_load_timeout(id, self.nav_timeout.as_millis() as u64)
            .await;
        match result {
            Ok(()) => {
                tracing::debug!(url, "navigated");
                Ok(())
            }
            Err(PilotError::Driver { code, .. }) if code == "timeout" => {
                Err(PilotError::StepTimeout {
                    step: format!("navigate {url}"),
                    waited_ms: timeout.as_millis() as u64,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn current_url(&self) -> PilotResult<String> {
        self.client.current_url(self.id()?).await
    }

    /// Single lookup; absence is `None`, never an error.
    pub async fn query(&self, locator: &Locator) -> PilotResult<Option<Element<'_>>> {
        let id = self.id()?;
        Ok(self
            .client
            .find(id, locator)
            .await?
            .map(|element_id| Element {
                session: self,
                id: element_id,
            }))
    }

    /// Waits for `locator` to appear within `timeout`; an unmet wait is a
    /// `StepTimeout` carrying the locator as the step name.
    pub async fn wait_for(&self, locator: &Locator, timeout: Duration) -> PilotResult<Element<'_>> {
        let plan = plan_for(timeout);
        let found = poll_until(plan, || async move {
            self.client.find(self.id()?, locator).await
        })
        .await?;
        match found {
            Some(element_id) => Ok(Element {
                session: self,
                id: element_id,
            }),
            None => Err(PilotError::StepTimeout {
                step: locator.to_string(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Waits for `locator` to be absent or hidden.
    pub async fn wait_gone(&self, locator: &Locator, timeout: Duration) -> PilotResult<()> {
        let plan = plan_for(timeout);
        let gone = poll_until(plan, || async move {
            Ok::<_, PilotError>((!self.is_visible(locator).await?).then_some(()))
        })
        .await?;
        match gone {
            Some(()) => Ok(()),
            None => Err(PilotError::StepTimeout {
                step: format!("gone: {locator}"),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    pub async fn is_visible(&self, locator: &Locator) -> PilotResult<bool> {
        let id = self.id()?;
        match self.client.find(id, locator).await? {
            Some(element_id) => self.client.displayed(id, &element_id).await,
            None => Ok(false),
        }
    }

    /// Global key press (focused element receives it).
    pub async fn press(&self, key: &str) -> PilotResult<()> {
        self.client.press_key(self.id()?, key).await?;
        self.pace().await;
        Ok(())
    }

    /// Restores a serialized cookie set exported by the login flow.
    /// Individual rejects are logged and skipped; the session stays
    /// usable either way.
    pub async fn restore_cookies(&self, path: &Path) -> PilotResult<()> {
        if !path.exists() {
            return Ok(());
        }
        let raw = std::fs::read_to_string(path)?;
        let cookies: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
        let id = self.id()?;
        let total = cookies.len();
        let mut restored = 0usize;
        for cookie in &cookies {
            match self.client.add_cookie(id, cookie).await {
                Ok(()) => restored += 1,
                Err(e) => tracing::warn!(error = %e, "cookie rejected"),
            }
        }
        tracing::info!(restored, total, path = %path.display(), "cookies restored");
        Ok(())
    }

    pub async fn export_cookies(&self, path: &Path) -> PilotResult<()> {
        let cookies = self.client.cookies(self.id()?).await?;
        std::fs::write(path, serde_json::to_string(&cookies)?)?;
        Ok(())
    }

    /// Idempotent teardown: deletes the browser session and stops the
    /// driver process. Safe after a failed `open` and safe to call twice;
    /// never raises once the driver is already gone.
    pub async fn close(&mut self) {
        if let Some(id) = self.session_id.take() {
            if let Err(e) = self.client.delete_session(&id).await {
                tracing::debug!(error = %e, "delete_session after driver exit");
            }
        }
        if let Some(mut driver) = self.driver.take() {
            driver.shutdown().await;
        }
        tracing::info!(storage = %self.storage_dir.display(), "session closed");
    }

    pub(crate) fn client(&self) -> &DriverClient {
        &self.client
    }

    pub(crate) fn session_id(&self) -> PilotResult<&str> {
        self.id()
    }
}

/// A handle to one located element, borrowed from its session.
pub struct Element<'s> {
    session: &'s Session,
    id: String,
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element").field("id", &self.id).finish()
    }
}

impl Element<'_> {
    pub async fn click(&self) -> PilotResult<()> {
        self.session
            .client()
            .click(self.session.session_id()?, &self.id)
            .await?;
        self.session.pace().await;
        Ok(())
    }

    /// Clears the field and types `text` into it.
    pub async fn fill(&self, text: &str) -> PilotResult<()> {
        let sid = self.session.session_id()?;
        let client = self.session.client();
        client.clear(sid, &self.id).await?;
        client.send_keys(sid, &self.id, text).await?;
        self.session.pace().await;
        Ok(())
    }

    /// Types without clearing; file inputs take newline-joined paths.
    pub async fn send_keys(&self, text: &str) -> PilotResult<()> {
        self.session
            .client()
            .send_keys(self.session.session_id()?, &self.id, text)
            .await?;
        self.session.pace().await;
        Ok(())
    }

    pub async fn text(&self) -> PilotResult<String> {
        self.session
            .client()
            .text(self.session.session_id()?, &self.id)
            .await
    }

    pub async fn attribute(&self, name: &str) -> PilotResult<Option<String>> {
        self.session
            .client()
            .attribute(self.session.session_id()?, &self.id, name)
            .await
    }

    pub async fn displayed(&self) -> PilotResult<bool> {
        self.session
            .client()
            .displayed(self.session.session_id()?, &self.id)
            .await
    }
}

fn plan_for(timeout: Duration) -> PollPlan {
    let attempts = (timeout.as_millis() / QUERY_INTERVAL.as_millis()).max(1) as u32;
    PollPlan::new(QUERY_INTERVAL, attempts)
}
