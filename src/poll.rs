use std::future::Future;
use std::time::Duration;

/// Bounded-polling budget: probe every `interval`, at most `attempts`
/// times. The default mirrors the confirmation window used across the
/// platform adapters (6 probes, 500ms apart).
#[derive(Debug, Clone, Copy)]
pub struct PollPlan {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollPlan {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            attempts: 6,
        }
    }
}

impl PollPlan {
    pub fn new(interval: Duration, attempts: u32) -> Self {
        Self { interval, attempts }
    }

    /// Total wall-clock budget this plan can consume.
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// Polls `probe` until it yields `Some`, sleeping `plan.interval` between
/// attempts. Returns `None` once the attempt budget is exhausted. The
/// first hit short-circuits; nothing is retried after it.
pub async fn poll_until<T, F, Fut, E>(plan: PollPlan, mut probe: F) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for attempt in 0..plan.attempts {
        if let Some(hit) = probe().await? {
            tracing::trace!(attempt, "poll_until hit");
            return Ok(Some(hit));
        }
        if attempt + 1 < plan.attempts {
            tokio::time::sleep(plan.interval).await;
        }
    }
    tracing::trace!(attempts = plan.attempts, "poll_until exhausted");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[tokio::test]
    async fn first_hit_short_circuits() {
        let plan = PollPlan::new(Duration::from_millis(1), 6);
        let mut calls = 0u32;
        let got: Option<u32> = poll_until(plan, || {
            calls += 1;
            let hit = if calls == 3 { Some(42) } else { None };
            async move { Ok::<_, Infallible>(hit) }
        })
        .await
        .unwrap();
        assert_eq!(got, Some(42));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn exhausts_attempt_budget() {
        let plan = PollPlan::new(Duration::from_millis(1), 4);
        let mut calls = 0u32;
        let got: Option<u32> = poll_until(plan, || {
            calls += 1;
            async move { Ok::<_, Infallible>(None) }
        })
        .await
        .unwrap();
        assert_eq!(got, None);
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn probe_errors_propagate() {
        let plan = PollPlan::new(Duration::from_millis(1), 3);
        let got: Result<Option<u32>, &str> = poll_until(plan, || async { Err("boom") }).await;
        assert_eq!(got, Err("boom"));
    }
}
