use async_trait::async_trait;
use serde_json::Value;

use crate::errors::PilotResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// Carries one WebDriver command to wherever the driver lives. The HTTP
/// implementation talks to a spawned chromedriver; tests script replies
/// through `FakeTransport`.
#[async_trait]
pub trait DriverTransport: Send + Sync {
    /// Executes a command against the driver and returns the unwrapped
    /// `value` payload of its reply.
    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> PilotResult<Value>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::errors::PilotError;

    /// Scripted reply: a payload, or a wire error (code, message).
    pub(crate) type Scripted = Result<Value, (String, String)>;

    pub(crate) struct Request {
        pub method: Method,
        pub path: String,
        pub body: Option<Value>,
    }

    /// Scripted transport. Replies queue per path suffix and drain in
    /// FIFO order; the last reply in a queue is sticky so repeated polls
    /// observe persistent UI state. Unscripted non-GET commands succeed
    /// with null, matching clicks/clears/presses on the wire.
    pub(crate) struct FakeTransport {
        scripted: Mutex<Vec<(String, VecDeque<Scripted>)>>,
        pub(crate) log: Mutex<Vec<Request>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self {
                scripted: Mutex::new(Vec::new()),
                log: Mutex::new(Vec::new()),
            }
        }

        /// Queues a payload reply for commands whose path ends with
        /// `suffix`.
        pub(crate) fn push_ok(&self, suffix: &str, value: Value) {
            self.push(suffix, Ok(value));
        }

        /// Queues a wire-error reply (e.g. "no such element").
        pub(crate) fn push_err(&self, suffix: &str, code: &str, message: &str) {
            self.push(suffix, Err((code.to_string(), message.to_string())));
        }

        fn push(&self, suffix: &str, reply: Scripted) {
            let mut scripted = self.scripted.lock().unwrap();
            if let Some((_, queue)) = scripted.iter_mut().find(|(s, _)| s == suffix) {
                queue.push_back(reply);
            } else {
                scripted.push((suffix.to_string(), VecDeque::from([reply])));
            }
        }

        pub(crate) fn requests_to(&self, suffix: &str) -> usize {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.path.ends_with(suffix))
                .count()
        }
    }

    #[async_trait]
    impl DriverTransport for FakeTransport {
        async fn execute(
            &self,
            method: Method,
            path: &str,
            body: Option<Value>,
        ) -> PilotResult<Value> {
            self.log.lock().unwrap().push(Request {
                method,
                path: path.to_string(),
                body,
            });
            let mut scripted = self.scripted.lock().unwrap();
            for (suffix, queue) in scripted.iter_mut() {
                if !path.ends_with(suffix.as_str()) {
                    continue;
                }
                let reply = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                if let Some(reply) = reply {
                    return match reply {
                        Ok(value) => Ok(value),
                        Err((code, message)) => Err(PilotError::Driver { code, message }),
                    };
                }
            }
            match method {
                Method::Get => Err(PilotError::Driver {
                    code: "unknown command".into(),
                    message: format!("no scripted reply for GET {path}"),
                }),
                _ => Ok(Value::Null),
            }
        }
    }
}
