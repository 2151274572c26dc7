use std::time::Duration;

use async_trait::async_trait;

use crate::adapter::{AdapterContract, Operation, OutcomeSignal, Platform, RecipientLookup};
use crate::config::TimingConfig;
use crate::driver::protocol::keys;
use crate::driver::Locator;
use crate::errors::{PilotError, PilotResult};
use crate::model::Contact;
use crate::poll::{poll_until, PollPlan};
use crate::session::Session;

const HOME_URL: &str = "https://web.whatsapp.com";

/// This front gates the web client on the reported browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

const CHAT_LIST: &str = "div[aria-label=\"chat-list-filters\"]";
const COMPOSER: &str = "div[aria-placeholder=\"Type a message\"]";
const INVALID_NUMBER_DIALOG: &str = "div[data-animate-modal-popup='true']";
const ATTACH_BUTTON: &str = "span[data-icon=\"plus-rounded\"]";
const FILE_INPUT: &str = "input[type=\"file\"][accept=\"*\"]";
const SEND_BUTTON: &str = "div[role=\"button\"][aria-label=\"Send\"]";
/// Pending-send clock on the newest message row.
const SENDING_CLOCK: &str = "div[role='row']:last-child span[data-icon='msg-time']";

const ENTRY_BUDGET: Duration = Duration::from_secs(120);
const COMPOSE_BUDGET: Duration = Duration::from_secs(30);
const CLOCK_APPEAR_BUDGET: Duration = Duration::from_secs(10);
const CLOCK_DRAIN_BUDGET: Duration = Duration::from_secs(60);

pub struct WhatsappAdapter {
    timing: TimingConfig,
}

impl WhatsappAdapter {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Waits out a submitted message: the clock appears while queued and
    /// drains once the server takes it. A fast send may skip the visible
    /// clock entirely.
    async fn drain_sending_clock(&self, session: &Session) -> PilotResult<()> {
        if session
            .wait_for(&Locator::css(SENDING_CLOCK), CLOCK_APPEAR_BUDGET)
            .await
            .is_ok()
        {
            session
                .wait_gone(&Locator::css(SENDING_CLOCK), CLOCK_DRAIN_BUDGET)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AdapterContract for WhatsappAdapter {
    fn platform(&self) -> Platform {
        Platform::Whatsapp
    }

    fn home_url(&self) -> &'static str {
        HOME_URL
    }

    fn user_agent(&self) -> Option<&'static str> {
        Some(USER_AGENT)
    }

    fn supports_contact_import(&self) -> bool {
        // There is no scripted add-contact surface on this front; the
        // import entry point refuses instead of guessing.
        false
    }

    async fn ensure_entry_point(&self, session: &Session) -> PilotResult<()> {
        if session.current_url().await?.contains("web.whatsapp.com")
            && session.is_visible(&Locator::css(CHAT_LIST)).await?
        {
            return Ok(());
        }
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        session
            .wait_for(&Locator::css(CHAT_LIST), ENTRY_BUDGET)
            .await?;
        Ok(())
    }

    async fn reload(&self, session: &Session) -> PilotResult<()> {
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        session
            .wait_for(&Locator::css(CHAT_LIST), ENTRY_BUDGET)
            .await?;
        Ok(())
    }

    async fn start_add_contact(&self, _session: &Session) -> PilotResult<()> {
        Err(PilotError::Unsupported(
            "whatsapp has no add-contact surface".into(),
        ))
    }

    async fn fill_contact(&self, _session: &Session, _contact: &Contact) -> PilotResult<()> {
        Err(PilotError::Unsupported(
            "whatsapp has no add-contact surface".into(),
        ))
    }

    async fn start_compose(
        &self,
        session: &Session,
        recipient: &str,
    ) -> PilotResult<RecipientLookup> {
        // Recipient lookup is URL-based here: the send endpoint either
        // opens the conversation or raises an invalid-number dialog.
        let phone = self.normalize_phone(recipient).replace('+', "");
        let url = format!("{HOME_URL}/send?phone={phone}");
        session.navigate(&url, self.timing.nav_timeout()).await?;

        let plan = PollPlan::new(Duration::from_millis(500), (COMPOSE_BUDGET.as_secs() * 2) as u32);
        let lookup = poll_until(plan, || async move {
            if session
                .is_visible(&Locator::css(INVALID_NUMBER_DIALOG))
                .await?
            {
                return Ok::<_, PilotError>(Some(RecipientLookup::NotFound));
            }
            if session.query(&Locator::css(COMPOSER)).await?.is_some() {
                return Ok(Some(RecipientLookup::Found));
            }
            Ok(None)
        })
        .await?;
        match lookup {
            Some(found) => {
                if found == RecipientLookup::NotFound {
                    tracing::info!(recipient, "send endpoint rejected the number");
                }
                Ok(found)
            }
            None => Err(PilotError::StepTimeout {
                step: "open conversation".into(),
                waited_ms: COMPOSE_BUDGET.as_millis() as u64,
            }),
        }
    }

    async fn attach(&self, session: &Session, paths: &[String]) -> PilotResult<()> {
        session
            .wait_for(&Locator::css(ATTACH_BUTTON), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(FILE_INPUT), self.timing.step_timeout())
            .await?
            .send_keys(&paths.join("\n"))
            .await?;
        session
            .wait_for(&Locator::css(SEND_BUTTON), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        self.drain_sending_clock(session).await?;
        Ok(())
    }

    async fn send_text(&self, session: &Session, body: &str) -> PilotResult<()> {
        session
            .wait_for(&Locator::css(COMPOSER), COMPOSE_BUDGET)
            .await?
            .fill(body)
            .await?;
        session.press(keys::ENTER).await?;
        Ok(())
    }

    async fn observe_outcome(
        &self,
        session: &Session,
        op: Operation,
    ) -> PilotResult<OutcomeSignal> {
        match op {
            Operation::ContactImport => Ok(OutcomeSignal::ConfirmedOtherError),
            Operation::MessageDispatch => {
                if session.is_visible(&Locator::css(SENDING_CLOCK)).await? {
                    Ok(OutcomeSignal::NoSignal)
                } else {
                    Ok(OutcomeSignal::ConfirmedSuccess)
                }
            }
        }
    }

    async fn input_surface_open(&self, session: &Session, op: Operation) -> PilotResult<bool> {
        match op {
            Operation::ContactImport => Ok(false),
            Operation::MessageDispatch => {
                session.is_visible(&Locator::css(SENDING_CLOCK)).await
            }
        }
    }
}
