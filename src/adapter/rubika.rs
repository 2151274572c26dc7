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

const HOME_URL: &str = "https://web.rubika.ir";

const SIDEBAR_MENU: &str = "div.sidebar-header__btn-container";
const NEW_MENU: &str = "div#new-menu";
const CONTACTS_ITEM: &str = "div.btn-menu-item.rbico-user";
const ADD_CONTACT_BUTTON: &str = "button.btn-circle";
const NAME_FIELD: &str = "input[name=\"first_name\"]";
const PHONE_FIELD: &str = "input[name=\"phone\"][type=\"tel\"]";
const SAVE_BUTTON: &str = "div.popup-header button.btn-primary.btn-color-primary.rp";
const ERROR_POPUP: &str = "div.popup.popup-peer.popup-error.active";

const SEARCH_BOX: &str = "input[type='search']";
const EMPTY_RESULT: &str = "ul.chatlist.contacts-container li.chatlist-empty";
const FIRST_RESULT: &str =
    "(//ul[contains(@class, 'contacts-container')]/li[not(contains(@class, 'chatlist-empty'))])[1]";
const BACK_BUTTON: &str = "button.sidebar-close-button";
const COMPOSER: &str = "div.composer_rich_textarea";
const ATTACH_BUTTON: &str = "div.rbico-attach";
const ATTACH_DOCUMENT: &str = "div.btn-menu-item.rbico-document";
const FILE_INPUT: &str = "input[type='file']";
const FILE_SEND_BUTTON: &str = "button.btn-primary.btn-color-primary";
const LAST_BUBBLE: &str =
    "(//div[contains(@class, 'bubbles-date-group')])[last()]//div[contains(@class, 'bubbles-group')][last()]";

const SEARCH_SETTLE: Duration = Duration::from_secs(1);
const FILE_SEND_BUDGET: Duration = Duration::from_secs(20);
/// Uploads get two minutes to earn a server-assigned message id.
const UPLOAD_CONFIRM: PollPlan = PollPlan {
    interval: Duration::from_millis(500),
    attempts: 240,
};

pub struct RubikaAdapter {
    timing: TimingConfig,
}

impl RubikaAdapter {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// A message bubble is server-acknowledged once its id is replaced
    /// by a long server-assigned one.
    async fn upload_acknowledged(&self, session: &Session, provisional: &str) -> PilotResult<bool> {
        let Some(bubble) = session.query(&Locator::xpath(LAST_BUBBLE)).await? else {
            return Ok(false);
        };
        let current = bubble.attribute("data-msg-id").await?.unwrap_or_default();
        Ok(!current.is_empty() && current != provisional && current.len() > 10)
    }
}

#[async_trait]
impl AdapterContract for RubikaAdapter {
    fn platform(&self) -> Platform {
        Platform::Rubika
    }

    fn home_url(&self) -> &'static str {
        HOME_URL
    }

    async fn ensure_entry_point(&self, session: &Session) -> PilotResult<()> {
        if session.is_visible(&Locator::css(SIDEBAR_MENU)).await? {
            return Ok(());
        }
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        session
            .wait_for(&Locator::css(SIDEBAR_MENU), self.timing.entry_timeout())
            .await?;
        Ok(())
    }

    async fn reload(&self, session: &Session) -> PilotResult<()> {
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        session
            .wait_for(&Locator::css(SIDEBAR_MENU), self.timing.entry_timeout())
            .await?;
        Ok(())
    }

    fn reset_between_items(&self, _op: Operation) -> bool {
        // Leftover popups and open chats wedge the next item; this front
        // gets a full reload every time.
        true
    }

    async fn start_add_contact(&self, session: &Session) -> PilotResult<()> {
        session
            .wait_for(&Locator::css(SIDEBAR_MENU), self.timing.entry_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(CONTACTS_ITEM), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(ADD_CONTACT_BUTTON), Duration::from_secs(10))
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(NAME_FIELD), self.timing.step_timeout())
            .await?;
        Ok(())
    }

    async fn fill_contact(&self, session: &Session, contact: &Contact) -> PilotResult<()> {
        session
            .wait_for(&Locator::css(NAME_FIELD), self.timing.step_timeout())
            .await?
            .fill(contact.label())
            .await?;
        session
            .wait_for(&Locator::css(PHONE_FIELD), self.timing.step_timeout())
            .await?
            .fill(&self.normalize_phone(&contact.phone))
            .await?;
        session
            .wait_for(&Locator::css(SAVE_BUTTON), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        Ok(())
    }

    async fn start_compose(
        &self,
        session: &Session,
        recipient: &str,
    ) -> PilotResult<RecipientLookup> {
        session
            .wait_for(&Locator::css(NEW_MENU), self.timing.entry_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(CONTACTS_ITEM), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(SEARCH_BOX), self.timing.step_timeout())
            .await?
            .fill(recipient)
            .await?;
        tokio::time::sleep(SEARCH_SETTLE).await;

        if session.is_visible(&Locator::css(EMPTY_RESULT)).await? {
            tracing::info!(recipient, "contact search came back empty");
            if let Some(back) = session.query(&Locator::css(BACK_BUTTON)).await? {
                let _ = back.click().await;
            }
            return Ok(RecipientLookup::NotFound);
        }
        session
            .wait_for(&Locator::xpath(FIRST_RESULT), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        Ok(RecipientLookup::Found)
    }

    async fn attach(&self, session: &Session, paths: &[String]) -> PilotResult<()> {
        let provisional = match session.query(&Locator::xpath(LAST_BUBBLE)).await? {
            Some(bubble) => bubble.attribute("data-msg-id").await?.unwrap_or_default(),
            None => String::new(),
        };

        session
            .wait_for(&Locator::css(ATTACH_BUTTON), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(ATTACH_DOCUMENT), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(FILE_INPUT), self.timing.step_timeout())
            .await?
            .send_keys(&paths.join("\n"))
            .await?;
        session
            .wait_for(&Locator::css(FILE_SEND_BUTTON), FILE_SEND_BUDGET)
            .await?
            .click()
            .await?;

        let provisional = provisional.as_str();
        let acknowledged = poll_until(UPLOAD_CONFIRM, || async move {
            Ok::<_, PilotError>(
                self.upload_acknowledged(session, provisional)
                    .await?
                    .then_some(()),
            )
        })
        .await?;
        if acknowledged.is_none() {
            return Err(PilotError::StepTimeout {
                step: "file upload server ack".into(),
                waited_ms: UPLOAD_CONFIRM.budget().as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn send_text(&self, session: &Session, body: &str) -> PilotResult<()> {
        let composer = session
            .wait_for(&Locator::css(COMPOSER), Duration::from_secs(10))
            .await?;
        composer.fill(body).await?;
        session.press(keys::ENTER).await?;
        Ok(())
    }

    async fn observe_outcome(
        &self,
        session: &Session,
        op: Operation,
    ) -> PilotResult<OutcomeSignal> {
        match op {
            Operation::ContactImport => {
                if session.is_visible(&Locator::css(ERROR_POPUP)).await? {
                    return Ok(OutcomeSignal::ConfirmedNotFound);
                }
                if !session.is_visible(&Locator::css(NAME_FIELD)).await? {
                    return Ok(OutcomeSignal::ConfirmedSuccess);
                }
                Ok(OutcomeSignal::NoSignal)
            }
            Operation::MessageDispatch => {
                if session.query(&Locator::xpath(LAST_BUBBLE)).await?.is_some() {
                    Ok(OutcomeSignal::ConfirmedSuccess)
                } else {
                    Ok(OutcomeSignal::NoSignal)
                }
            }
        }
    }

    async fn input_surface_open(&self, session: &Session, op: Operation) -> PilotResult<bool> {
        match op {
            Operation::ContactImport => session.is_visible(&Locator::css(NAME_FIELD)).await,
            // The composer is always mounted in an open chat; there is no
            // still-open surface to downgrade on.
            Operation::MessageDispatch => Ok(false),
        }
    }
}
