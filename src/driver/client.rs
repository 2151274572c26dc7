use std::sync::Arc;

use serde_json::{json, Value};

use crate::driver::protocol::{Locator, NewSessionValue, ELEMENT_KEY};
use crate::driver::transport::{DriverTransport, Method};
use crate::errors::{PilotError, PilotResult};

/// Chrome capability knobs for a new driver session.
#[derive(Debug, Clone, Default)]
pub struct SessionCaps {
    pub user_data_dir: String,
    pub headless: bool,
    pub user_agent: Option<String>,
}

impl SessionCaps {
    fn to_payload(&self) -> Value {
        let mut args = vec![
            format!("--user-data-dir={}", self.user_data_dir),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

/// Typed command wrappers over a [`DriverTransport`]. One client per
/// session; every call is scoped by the session id it was created with.
#[derive(Clone)]
pub struct DriverClient {
    transport: Arc<dyn DriverTransport>,
}

impl DriverClient {
    pub fn new(transport: Arc<dyn DriverTransport>) -> Self {
        Self { transport }
    }

    pub async fn new_session(&self, caps: &SessionCaps) -> PilotResult<String> {
        let value = self
            .transport
            .execute(Method::Post, "/session", Some(caps.to_payload()))
            .await
            .map_err(|e| match e {
                PilotError::Driver { code, message } => {
                    PilotError::SessionInit(format!("{code}: {message}"))
                }
                PilotError::SessionLost(m) => PilotError::SessionInit(m),
                other => other,
            })?;
        let reply: NewSessionValue = serde_json::from_value(value)?;
        Ok(reply.session_id)
    }

    pub async fn delete_session(&self, session: &str) -> PilotResult<()> {
        self.transport
            .execute(Method::Delete, &format!("/session/{session}"), None)
            .await?;
        Ok(())
    }

    pub async fn set_page_load_timeout(&self, session: &str, ms: u64) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/timeouts"),
                Some(json!({ "pageLoad": ms })),
            )
            .await?;
        Ok(())
    }

    pub async fn navigate(&self, session: &str, url: &str) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/url"),
                Some(json!({ "url": url })),
            )
            .await?;
        Ok(())
    }

    pub async fn current_url(&self, session: &str) -> PilotResult<String> {
        let value = self
            .transport
            .execute(Method::Get, &format!("/session/{session}/url"), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Finds one element; absence is a value, not an error.
    pub async fn find(&self, session: &str, locator: &Locator) -> PilotResult<Option<String>> {
        let result = self
            .transport
            .execute(
                Method::Post,
                &format!("/session/{session}/element"),
                Some(json!({ "using": locator.strategy(), "value": locator.value() })),
            )
            .await;
        match result {
            Ok(value) => Ok(Some(extract_element_id(&value)?)),
            Err(PilotError::Driver { code, .. })
                if code == "no such element" || code == "stale element reference" =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_all(&self, session: &str, locator: &Locator) -> PilotResult<Vec<String>> {
        let value = self
            .transport
            .execute(
                Method::Post,
                &format!("/session/{session}/elements"),
                Some(json!({ "using": locator.strategy(), "value": locator.value() })),
            )
            .await?;
        let items = value.as_array().cloned().unwrap_or_default();
        items.iter().map(extract_element_id).collect()
    }

    pub async fn click(&self, session: &str, element: &str) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/element/{element}/click"),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn clear(&self, session: &str, element: &str) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/element/{element}/clear"),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn send_keys(&self, session: &str, element: &str, text: &str) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/element/{element}/value"),
                Some(json!({ "text": text })),
            )
            .await?;
        Ok(())
    }

    pub async fn text(&self, session: &str, element: &str) -> PilotResult<String> {
        let value = self
            .transport
            .execute(
                Method::Get,
                &format!("/session/{session}/element/{element}/text"),
                None,
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn attribute(
        &self,
        session: &str,
        element: &str,
        name: &str,
    ) -> PilotResult<Option<String>> {
        let value = self
            .transport
            .execute(
                Method::Get,
                &format!("/session/{session}/element/{element}/attribute/{name}"),
                None,
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    /// Element displayedness; a stale or vanished element counts as not
    /// displayed.
    pub async fn displayed(&self, session: &str, element: &str) -> PilotResult<bool> {
        let result = self
            .transport
            .execute(
                Method::Get,
                &format!("/session/{session}/element/{element}/displayed"),
                None,
            )
            .await;
        match result {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            Err(PilotError::Driver { code, .. })
                if code == "stale element reference" || code == "no such element" =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Global key press through the actions endpoint (down + up).
    pub async fn press_key(&self, session: &str, key: &str) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/actions"),
                Some(json!({
                    "actions": [{
                        "type": "key",
                        "id": "keyboard",
                        "actions": [
                            { "type": "keyDown", "value": key },
                            { "type": "keyUp", "value": key }
                        ]
                    }]
                })),
            )
            .await?;
        Ok(())
    }

    pub async fn add_cookie(&self, session: &str, cookie: &Value) -> PilotResult<()> {
        self.transport
            .execute(
                Method::Post,
                &format!("/session/{session}/cookie"),
                Some(json!({ "cookie": cookie })),
            )
            .await?;
        Ok(())
    }

    pub async fn cookies(&self, session: &str) -> PilotResult<Vec<Value>> {
        let value = self
            .transport
            .execute(Method::Get, &format!("/session/{session}/cookie"), None)
            .await?;
        Ok(value.as_array().cloned().unwrap_or_default())
    }
}

fn extract_element_id(value: &Value) -> PilotResult<String> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PilotError::Driver {
            code: "invalid element reply".into(),
            message: format!("missing {ELEMENT_KEY} in {value}"),
        })
}
