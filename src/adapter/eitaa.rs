use std::time::Duration;

use async_trait::async_trait;

use crate::adapter::{AdapterContract, Operation, OutcomeSignal, Platform, RecipientLookup};
use crate::config::TimingConfig;
use crate::driver::protocol::keys;
use crate::driver::Locator;
use crate::errors::PilotResult;
use crate::model::Contact;
use crate::session::Session;

const HOME_URL: &str = "https://web.eitaa.com";

const MENU: &str = "#new-menu";
const NEW_PRIVATE: &str = "div.btn-menu-item.tgico-newprivate.rp";
const ADD_CONTACT_BUTTON: &str = "button.tgico-add";
const CREATE_POPUP: &str = "div.popup-create-contact";
const NAME_FIELD: &str = "div.name-fields div.input-field-input[contenteditable='true']";
const PHONE_FIELD: &str = "div.input-field-phone div.input-field-input[contenteditable='true']";
const CONTACT_SEARCH: &str =
    "#contacts-container input.input-field-input.i18n.input-search-input";
const FIRST_RESULT: &str = "(//ul[contains(@class, 'contacts-container')]/li)[1]";
const COMPOSER: &str = "div.input-message-input[data-placeholder=\"پیام\"][dir=\"auto\"]";
const SENDING_BUBBLE: &str = "div.bubble.is-sending";
const ATTACH_BUTTON: &str = "div.btn-icon.btn-menu-toggle.attach-file.tgico-attach";
const ATTACH_DOCUMENT: &str = "div.btn-menu-item.tgico-document.rp";
const FILE_INPUT: &str = "input[type='file']";

/// The sending bubble may linger through slow uploads; give it the same
/// long leash the web client does.
const SEND_CONFIRM_BUDGET: Duration = Duration::from_secs(60);
const RESULT_BUDGET: Duration = Duration::from_secs(10);

pub struct EitaaAdapter {
    timing: TimingConfig,
}

impl EitaaAdapter {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Opens the contacts pane from the hamburger menu unless it is
    /// already showing.
    async fn open_contacts_pane(&self, session: &Session) -> PilotResult<()> {
        if session.is_visible(&Locator::css(ADD_CONTACT_BUTTON)).await? {
            return Ok(());
        }
        session
            .wait_for(&Locator::css(MENU), self.timing.entry_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(NEW_PRIVATE), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        Ok(())
    }

    /// A just-submitted message shows a pending bubble until the server
    /// acknowledges it.
    async fn message_pending(&self, session: &Session) -> PilotResult<bool> {
        session.is_visible(&Locator::css(SENDING_BUBBLE)).await
    }
}

#[async_trait]
impl AdapterContract for EitaaAdapter {
    fn platform(&self) -> Platform {
        Platform::Eitaa
    }

    fn home_url(&self) -> &'static str {
        HOME_URL
    }

    async fn ensure_entry_point(&self, session: &Session) -> PilotResult<()> {
        if session.is_visible(&Locator::css(MENU)).await? {
            return Ok(());
        }
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        session
            .wait_for(&Locator::css(MENU), self.timing.entry_timeout())
            .await?;
        Ok(())
    }

    async fn reload(&self, session: &Session) -> PilotResult<()> {
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        session
            .wait_for(&Locator::css(MENU), self.timing.entry_timeout())
            .await?;
        Ok(())
    }

    fn reset_between_items(&self, op: Operation) -> bool {
        // Chat state leaks between dispatches; the import pane survives
        // item to item.
        matches!(op, Operation::MessageDispatch)
    }

    async fn start_add_contact(&self, session: &Session) -> PilotResult<()> {
        self.open_contacts_pane(session).await?;
        session
            .wait_for(&Locator::css(ADD_CONTACT_BUTTON), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(CREATE_POPUP), self.timing.step_timeout())
            .await?;
        Ok(())
    }

    async fn fill_contact(&self, session: &Session, contact: &Contact) -> PilotResult<()> {
        let name = session
            .wait_for(&Locator::css(NAME_FIELD), self.timing.step_timeout())
            .await?;
        name.fill(contact.label()).await?;
        let phone = session
            .wait_for(&Locator::css(PHONE_FIELD), self.timing.step_timeout())
            .await?;
        phone.fill(&self.normalize_phone(&contact.phone)).await?;
        session.press(keys::ENTER).await?;
        Ok(())
    }

    async fn start_compose(
        &self,
        session: &Session,
        recipient: &str,
    ) -> PilotResult<RecipientLookup> {
        self.open_contacts_pane(session).await?;
        session
            .wait_for(&Locator::css(CONTACT_SEARCH), self.timing.step_timeout())
            .await?
            .fill(recipient)
            .await?;
        match session
            .wait_for(&Locator::xpath(FIRST_RESULT), RESULT_BUDGET)
            .await
        {
            Ok(result) => {
                result.click().await?;
                tracing::debug!(recipient, "conversation opened");
                Ok(RecipientLookup::Found)
            }
            Err(crate::errors::PilotError::StepTimeout { .. }) => {
                tracing::info!(recipient, "no contact search result");
                Ok(RecipientLookup::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    async fn attach(&self, session: &Session, paths: &[String]) -> PilotResult<()> {
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
        session.press(keys::ENTER).await?;
        // Upload completion: the pending bubble must drain fully.
        session
            .wait_gone(&Locator::css(SENDING_BUBBLE), SEND_CONFIRM_BUDGET)
            .await?;
        Ok(())
    }

    async fn send_text(&self, session: &Session, body: &str) -> PilotResult<()> {
        session
            .wait_for(&Locator::css(COMPOSER), self.timing.step_timeout())
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
            Operation::ContactImport => {
                // The create popup closing is the only success indicator
                // this front surfaces.
                if session.is_visible(&Locator::css(CREATE_POPUP)).await? {
                    Ok(OutcomeSignal::NoSignal)
                } else {
                    Ok(OutcomeSignal::ConfirmedSuccess)
                }
            }
            Operation::MessageDispatch => {
                if self.message_pending(session).await? {
                    Ok(OutcomeSignal::NoSignal)
                } else {
                    Ok(OutcomeSignal::ConfirmedSuccess)
                }
            }
        }
    }

    async fn input_surface_open(&self, session: &Session, op: Operation) -> PilotResult<bool> {
        match op {
            Operation::ContactImport => {
                let open = session.is_visible(&Locator::css(CREATE_POPUP)).await?;
                if open {
                    // Dismiss the stuck popup so the next item starts
                    // from a clean pane.
                    let _ = session.press(keys::ESCAPE).await;
                }
                Ok(open)
            }
            Operation::MessageDispatch => self.message_pending(session).await,
        }
    }
}
