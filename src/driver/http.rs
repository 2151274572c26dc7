use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::protocol::{Reply, WireError};
use crate::driver::transport::{DriverTransport, Method};
use crate::errors::{PilotError, PilotResult};
use crate::poll::{poll_until, PollPlan};

/// A spawned chromedriver process. Killed on `shutdown()`; `Drop`
/// backstops the kill so an aborted run cannot leak the child.
pub struct DriverProcess {
    child: tokio::process::Child,
    port: u16,
}

impl DriverProcess {
    /// Spawns the driver binary on `port` and waits until its status
    /// endpoint reports ready.
    pub async fn launch(binary: &str, port: u16) -> PilotResult<(Self, HttpTransport)> {
        let child = tokio::process::Command::new(binary)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PilotError::SessionInit(format!("cannot spawn driver '{binary}': {e}"))
            })?;

        let transport = HttpTransport::new(port);
        let plan = PollPlan::new(Duration::from_millis(250), 40);
        let ready = poll_until(plan, || {
            let transport = transport.clone();
            async move { Ok::<_, PilotError>(transport.status_ready().await.then_some(())) }
        })
        .await?;
        if ready.is_none() {
            return Err(PilotError::SessionInit(format!(
                "driver on port {port} never became ready"
            )));
        }
        tracing::debug!(port, "driver process ready");
        Ok((Self { child, port }, transport))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Idempotent teardown of the driver process.
    pub async fn shutdown(&mut self) {
        match self.child.start_kill() {
            Ok(()) => {
                let _ = self.child.wait().await;
                tracing::debug!(port = self.port, "driver process stopped");
            }
            // Already exited.
            Err(_) => {}
        }
    }
}

/// WebDriver-over-HTTP transport for a local driver endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    base: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(port: u16) -> Self {
        Self {
            base: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
        }
    }

    pub async fn status_ready(&self) -> bool {
        let url = format!("{}/status", self.base);
        let Ok(resp) = self.client.get(url).send().await else {
            return false;
        };
        let Ok(reply) = resp.json::<Reply<crate::driver::protocol::StatusValue>>().await else {
            return false;
        };
        reply.value.ready
    }
}

#[async_trait]
impl DriverTransport for HttpTransport {
    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> PilotResult<Value> {
        let url = format!("{}{}", self.base, path);
        let mut req = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if method == Method::Post {
            // chromedriver rejects POSTs without a JSON body.
            req = req.json(body.as_ref().unwrap_or(&Value::Object(Default::default())));
        }
        tracing::trace!(method = method.as_str(), path, "driver command");

        let resp = req.send().await.map_err(|e| {
            PilotError::SessionLost(format!("driver unreachable at {}: {e}", self.base))
        })?;
        let status = resp.status();
        let payload: Value = resp.json().await?;

        if status.is_success() {
            return Ok(payload
                .get("value")
                .cloned()
                .unwrap_or(Value::Null));
        }

        let wire: WireError = match serde_json::from_value(
            payload.get("value").cloned().unwrap_or(Value::Null),
        ) {
            Ok(w) => w,
            Err(_) => WireError {
                error: "unknown error".into(),
                message: format!("HTTP {status} from driver"),
            },
        };
        tracing::debug!(code = %wire.error, msg = %wire.message, path, "driver command failed");
        Err(PilotError::Driver {
            code: wire.error,
            message: wire.message,
        })
    }
}
