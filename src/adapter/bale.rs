use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::adapter::{AdapterContract, Operation, OutcomeSignal, Platform, RecipientLookup};
use crate::config::TimingConfig;
use crate::driver::protocol::keys;
use crate::driver::Locator;
use crate::errors::PilotResult;
use crate::model::{sanitize_phone, Contact};
use crate::session::Session;
use crate::storage;

const HOME_URL: &str = "https://web.bale.ai";
const CONTACTS_URL: &str = "https://web.bale.ai/contacts";

const CONTACTS_NAV: &str = "div.Navigation-module__NavItem--mROrNt[style='order: 4;']";
const ADD_CONTACT_BUTTON: &str = "div[title='افزودن مخاطب']";
const NAME_FIELD: &str = "input[aria-label=\"نام\"]";
const PHONE_FIELD: &str = "input[aria-label=\"شماره همراه\"]";
const SAVE_BUTTON: &str = "button[aria-label='افزودن']";
const TOAST_BODY: &str = "Toastify__toast-body";
const SUCCESS_TOAST_TEXT: &str = "مخاطب مورد نظر به مخاطبین اضافه شد.";
const ERROR_TOAST_TEXT: &str = "مخاطب مورد نظر در «بله» حساب کاربری ندارد.";

const OPEN_SEARCH: &str = "(//div[contains(@class, 'RippleView-module__Wrapper--ZGzps0')])[1]";
const SEARCH_BOX: &str = "input.SearchBox-module__SearchInputbar--e8AzTv";
const FIRST_RESULT: &str = "(//div[contains(@class, 'DialogList-module__ContentWrapper--YgUC8J')])[1]";
const COMPOSER: &str = "#editable-message-text[contenteditable='true']";
const ATTACH_BUTTON: &str =
    "div[data-sentry-element='IconButton'][data-sentry-source-file='Attachment.tsx']";
const FILE_MENU_ITEM: &str =
    "//p[contains(@class, 'Menu-module__Title--YPxpUY') and contains(., 'فایل')]/ancestor::li";
const FILE_INPUT: &str = "input[type='file']";
const SEND_BUTTON: &str = "button[aria-label='ارسال']";
const UPLOAD_PROGRESS: &str = "div.CircularProgress-module__CircularWrapper--MW8BSd";

const RESULT_BUDGET: Duration = Duration::from_secs(10);
const COMPOSER_BUDGET: Duration = Duration::from_secs(10);
const UPLOAD_START_BUDGET: Duration = Duration::from_secs(10);
const UPLOAD_BUDGET: Duration = Duration::from_secs(120);

pub struct BaleAdapter {
    timing: TimingConfig,
    cookies_restored: AtomicBool,
}

impl BaleAdapter {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            cookies_restored: AtomicBool::new(false),
        }
    }

    fn success_toast() -> Locator {
        Locator::class_containing_text(TOAST_BODY, SUCCESS_TOAST_TEXT)
    }

    fn error_toast() -> Locator {
        Locator::class_containing_text(TOAST_BODY, ERROR_TOAST_TEXT)
    }

    /// Headless logins ride on the cookie set exported by the login
    /// flow; cookies can only be injected once a page of the domain is
    /// loaded, hence restore-then-reload on first entry.
    async fn restore_cookies_once(&self, session: &Session) -> PilotResult<()> {
        if self.cookies_restored.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let path = storage::cookie_path(session.storage_dir());
        if !path.exists() {
            return Ok(());
        }
        session.restore_cookies(&path).await?;
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        Ok(())
    }
}

#[async_trait]
impl AdapterContract for BaleAdapter {
    fn platform(&self) -> Platform {
        Platform::Bale
    }

    fn home_url(&self) -> &'static str {
        HOME_URL
    }

    async fn ensure_entry_point(&self, session: &Session) -> PilotResult<()> {
        if session.is_visible(&Locator::css(CONTACTS_NAV)).await? {
            return Ok(());
        }
        session.navigate(HOME_URL, self.timing.nav_timeout()).await?;
        self.restore_cookies_once(session).await?;
        session
            .wait_for(&Locator::css(CONTACTS_NAV), self.timing.entry_timeout())
            .await?;
        Ok(())
    }

    async fn reload(&self, session: &Session) -> PilotResult<()> {
        session
            .navigate(CONTACTS_URL, self.timing.nav_timeout())
            .await?;
        session
            .wait_for(&Locator::css(CONTACTS_NAV), self.timing.entry_timeout())
            .await?;
        Ok(())
    }

    fn reset_between_items(&self, op: Operation) -> bool {
        // The search overlay leaks between dispatches; the contacts
        // screen survives import items.
        matches!(op, Operation::MessageDispatch)
    }

    fn normalize_phone(&self, phone: &str) -> String {
        // This front expects national numbers: the country prefix is
        // stripped before entry.
        let digits = sanitize_phone(phone);
        if let Some(rest) = digits.strip_prefix("+98") {
            return rest.to_string();
        }
        if let Some(rest) = digits.strip_prefix("98") {
            return rest.to_string();
        }
        digits
    }

    async fn start_add_contact(&self, session: &Session) -> PilotResult<()> {
        if !session
            .is_visible(&Locator::css(ADD_CONTACT_BUTTON))
            .await?
        {
            session
                .wait_for(&Locator::css(CONTACTS_NAV), self.timing.entry_timeout())
                .await?
                .click()
                .await?;
        }
        session
            .wait_for(&Locator::css(ADD_CONTACT_BUTTON), RESULT_BUDGET)
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
        // The form closing marks submission; the toasts carry the verdict.
        session
            .wait_gone(&Locator::css(NAME_FIELD), RESULT_BUDGET)
            .await?;
        Ok(())
    }

    async fn start_compose(
        &self,
        session: &Session,
        recipient: &str,
    ) -> PilotResult<RecipientLookup> {
        session
            .wait_for(&Locator::xpath(OPEN_SEARCH), self.timing.step_timeout())
            .await?
            .click()
            .await?;
        session
            .wait_for(&Locator::css(SEARCH_BOX), self.timing.step_timeout())
            .await?
            .fill(recipient)
            .await?;
        session.press(keys::ENTER).await?;
        match session
            .wait_for(&Locator::xpath(FIRST_RESULT), RESULT_BUDGET)
            .await
        {
            Ok(result) => {
                result.click().await?;
                Ok(RecipientLookup::Found)
            }
            Err(crate::errors::PilotError::StepTimeout { .. }) => {
                tracing::info!(recipient, "no dialog search result");
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
            .wait_for(&Locator::xpath(FILE_MENU_ITEM), self.timing.step_timeout())
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
        // Upload completion: every circular progress indicator drains.
        session
            .wait_for(&Locator::css(UPLOAD_PROGRESS), UPLOAD_START_BUDGET)
            .await?;
        session
            .wait_gone(&Locator::css(UPLOAD_PROGRESS), UPLOAD_BUDGET)
            .await?;
        Ok(())
    }

    async fn send_text(&self, session: &Session, body: &str) -> PilotResult<()> {
        session
            .wait_for(&Locator::css(COMPOSER), COMPOSER_BUDGET)
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
                if session.is_visible(&Self::success_toast()).await? {
                    Ok(OutcomeSignal::ConfirmedSuccess)
                } else if session.is_visible(&Self::error_toast()).await? {
                    Ok(OutcomeSignal::ConfirmedNotFound)
                } else {
                    Ok(OutcomeSignal::NoSignal)
                }
            }
            // Text sends surface no reliable indicator on this front;
            // the unconfirmed policy decides.
            Operation::MessageDispatch => Ok(OutcomeSignal::NoSignal),
        }
    }

    async fn input_surface_open(&self, session: &Session, op: Operation) -> PilotResult<bool> {
        match op {
            Operation::ContactImport => session.is_visible(&Locator::css(NAME_FIELD)).await,
            Operation::MessageDispatch => {
                session.is_visible(&Locator::css(UPLOAD_PROGRESS)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_prefix_is_stripped_before_entry() {
        let adapter = BaleAdapter::new(TimingConfig::default());
        assert_eq!(adapter.normalize_phone("+98 912 000 1122"), "9120001122");
        assert_eq!(adapter.normalize_phone("989120001122"), "9120001122");
        assert_eq!(adapter.normalize_phone("0912-000-1122"), "09120001122");
    }

    #[test]
    fn toast_probes_are_text_scoped_xpath() {
        assert!(BaleAdapter::success_toast().value().contains(TOAST_BODY));
        assert!(BaleAdapter::error_toast().value().contains(ERROR_TOAST_TEXT));
    }
}
