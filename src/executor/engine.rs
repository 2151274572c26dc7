use crate::adapter::{AdapterContract, Operation, OutcomeSignal, RecipientLookup};
use crate::config::{TimingConfig, UnconfirmedPolicy};
use crate::errors::{PilotError, PilotResult};
use crate::executor::classifier::{classify, Observation, Verdict, NOT_FOUND_DETAIL};
use crate::executor::reporter::ProgressReporter;
use crate::executor::state::ItemPhase;
use crate::model::{BatchReport, Contact, Message, OutcomeEvent};
use crate::poll::poll_until;
use crate::session::Session;

/// Detail reported when a UI step never became ready.
const STEP_NO_RESPONSE: &str = "no response";
const DETAIL_LIMIT: usize = 200;

enum Item<'a> {
    Contact(&'a Contact),
    Message(&'a Message),
}

impl Item<'_> {
    fn op(&self) -> Operation {
        match self {
            Item::Contact(_) => Operation::ContactImport,
            Item::Message(_) => Operation::MessageDispatch,
        }
    }

    fn label(&self) -> &str {
        match self {
            Item::Contact(c) => c.label(),
            Item::Message(m) => &m.recipient,
        }
    }
}

/// Generic batch engine: one state machine over the adapter contract,
/// shared by all platforms. Owns the session exclusively for the
/// duration of a run; emits exactly one terminal event per item, in
/// index order, and never lets a single item abort the batch.
pub struct BatchExecutor<'a> {
    session: &'a Session,
    adapter: &'a dyn AdapterContract,
    timing: TimingConfig,
    policy: UnconfirmedPolicy,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        session: &'a Session,
        adapter: &'a dyn AdapterContract,
        timing: TimingConfig,
        policy: UnconfirmedPolicy,
    ) -> Self {
        Self {
            session,
            adapter,
            timing,
            policy,
        }
    }

    /// Bulk contact import. Per-item outcomes go to `reporter`; the
    /// report summarizes the whole run.
    pub async fn run_import(
        &self,
        contacts: &[Contact],
        reporter: &dyn ProgressReporter,
    ) -> BatchReport {
        if !self.adapter.supports_contact_import() {
            return BatchReport::aborted(
                format!("{} does not support contact import", self.adapter.platform()),
                0,
            );
        }
        let items: Vec<Item<'_>> = contacts.iter().map(Item::Contact).collect();
        self.run_batch(&items, reporter).await
    }

    /// Message/attachment dispatch over a prepared batch.
    pub async fn run_dispatch(
        &self,
        messages: &[Message],
        reporter: &dyn ProgressReporter,
    ) -> BatchReport {
        let items: Vec<Item<'_>> = messages.iter().map(Item::Message).collect();
        self.run_batch(&items, reporter).await
    }

    /// Single-message dispatch outside a batch: one pass of the item
    /// machine, terminal event included. `Err` is reserved for
    /// session-level faults.
    pub async fn dispatch_one(
        &self,
        message: &Message,
        reporter: &dyn ProgressReporter,
    ) -> PilotResult<Verdict> {
        self.run_item(0, &Item::Message(message), reporter).await
    }

    async fn run_batch(&self, items: &[Item<'_>], reporter: &dyn ProgressReporter) -> BatchReport {
        let total = items.len();
        let mut completed = 0usize;
        let mut succeeded = 0usize;

        for (index, item) in items.iter().enumerate() {
            reporter.report(&OutcomeEvent::processing(
                index,
                format!("processing {}", item.label()),
            ));

            let verdict = match self.run_item(index, item, reporter).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::error!(index, error = %e, "batch aborted");
                    return BatchReport::aborted(
                        format!("aborted after {completed} of {total} items: {e}"),
                        completed,
                    );
                }
            };

            completed += 1;
            if verdict.is_success() {
                succeeded += 1;
            }
            if index + 1 < total && !self.timing.pacing().is_zero() {
                tokio::time::sleep(self.timing.pacing()).await;
            }
        }

        BatchReport {
            overall_success: true,
            summary: format!("finished: {succeeded} of {total} items succeeded"),
            completed,
        }
    }

    /// Drives one item through the full phase machine. `Err` means a
    /// batch-level fault; every per-item fault comes back as a verdict.
    async fn run_item(
        &self,
        index: usize,
        item: &Item<'_>,
        reporter: &dyn ProgressReporter,
    ) -> PilotResult<Verdict> {
        let op = item.op();
        let mut phase = ItemPhase::Resetting;
        loop {
            tracing::debug!(index, phase = phase.name(), "item phase");
            phase = match phase {
                ItemPhase::Resetting => {
                    let reset = if index > 0 && self.adapter.reset_between_items(op) {
                        self.adapter.reload(self.session).await
                    } else {
                        self.adapter.ensure_entry_point(self.session).await
                    };
                    match reset {
                        Ok(()) => ItemPhase::Acting,
                        Err(e) => return Err(escalate_reset_fault(e)),
                    }
                }

                ItemPhase::Acting => match self.perform(item).await {
                    Ok(None) => ItemPhase::AwaitingConfirmation,
                    Ok(Some(verdict)) => ItemPhase::Classified { verdict },
                    Err(e) if e.is_batch_fatal() => return Err(e),
                    Err(PilotError::StepTimeout { step, waited_ms }) => {
                        tracing::warn!(index, step = %step, waited_ms, "step timed out");
                        ItemPhase::Classified {
                            verdict: Verdict::failure(STEP_NO_RESPONSE),
                        }
                    }
                    Err(e) => {
                        tracing::warn!(index, error = %e, "item action faulted");
                        ItemPhase::Classified {
                            verdict: Verdict::failure(truncate_detail(&e.to_string())),
                        }
                    }
                },

                ItemPhase::AwaitingConfirmation => {
                    let observation = self.await_confirmation(op).await?;
                    ItemPhase::Classified {
                        verdict: classify(observation, self.policy),
                    }
                }

                ItemPhase::Classified { verdict } => {
                    let event = if verdict.is_success() {
                        OutcomeEvent::success(index, format!("{} handled", item.label()))
                    } else {
                        OutcomeEvent::failure(index, verdict.detail())
                    };
                    reporter.report(&event);
                    ItemPhase::Advancing { verdict }
                }

                ItemPhase::Advancing { verdict } => return Ok(verdict),
            };
        }
    }

    /// The adapter's action sequence for one item. `Some(verdict)` is an
    /// early terminal classification (recipient absent); `None` hands
    /// over to the confirmation window.
    async fn perform(&self, item: &Item<'_>) -> PilotResult<Option<Verdict>> {
        match item {
            Item::Contact(contact) => {
                self.adapter.start_add_contact(self.session).await?;
                self.adapter.fill_contact(self.session, contact).await?;
                Ok(None)
            }
            Item::Message(message) => {
                let lookup = self
                    .adapter
                    .start_compose(self.session, &message.recipient)
                    .await?;
                if lookup == RecipientLookup::NotFound {
                    return Ok(Some(Verdict::failure(NOT_FOUND_DETAIL)));
                }
                if message.has_attachments() {
                    self.adapter.attach(self.session, &message.attachments).await?;
                }
                if message.has_body() {
                    self.adapter.send_text(self.session, &message.body).await?;
                }
                Ok(None)
            }
        }
    }

    /// Polls the outcome indicators for the confirmation window. The
    /// first explicit signal short-circuits; an empty window falls back
    /// to the input-surface check. Probe faults count as no signal
    /// unless they are batch-fatal.
    async fn await_confirmation(&self, op: Operation) -> PilotResult<Observation> {
        let plan = self.timing.confirm_plan();
        let signal = poll_until(plan, || async move {
            match self.adapter.observe_outcome(self.session, op).await {
                Ok(OutcomeSignal::NoSignal) => Ok(None),
                Ok(signal) => Ok(Some(signal)),
                Err(e) if e.is_batch_fatal() => Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "outcome probe faulted");
                    Ok(None)
                }
            }
        })
        .await?;

        if let Some(signal) = signal {
            return Ok(Observation::Signal(signal));
        }
        let input_surface_open = match self.adapter.input_surface_open(self.session, op).await {
            Ok(open) => open,
            Err(e) if e.is_batch_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "input-surface probe faulted");
                false
            }
        };
        Ok(Observation::Unconfirmed { input_surface_open })
    }
}

/// Failing to get back to the entry surface invalidates everything that
/// would follow; escalate to a batch-level navigation fault.
fn escalate_reset_fault(e: PilotError) -> PilotError {
    if e.is_batch_fatal() {
        return e;
    }
    PilotError::Navigation(format!("entry surface unreachable: {e}"))
}

fn truncate_detail(detail: &str) -> String {
    if detail.len() <= DETAIL_LIMIT {
        return detail.to_string();
    }
    let cut = detail
        .char_indices()
        .take_while(|(i, _)| *i < DETAIL_LIMIT)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(DETAIL_LIMIT);
    format!("{}…", &detail[..cut])
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::adapter::Platform;
    use crate::driver::transport::fake::FakeTransport;
    use crate::executor::classifier::NO_RESPONSE_DETAIL;
    use crate::model::{OutcomeStatus, OutcomeEvent};

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            confirm_interval_ms: 1,
            confirm_attempts: 3,
            pacing_ms: 0,
            ..TimingConfig::default()
        }
    }

    fn test_session() -> Session {
        Session::attach(Arc::new(FakeTransport::new()), "s1", "/tmp/engine_test")
    }

    /// Per-item script for the scripted adapter.
    #[derive(Clone)]
    struct ItemScript {
        /// Error raised by the first action step, if any.
        perform_fault: Option<fn() -> PilotError>,
        lookup: RecipientLookup,
        /// Probe replies in order; the last one is sticky, empty means
        /// NoSignal throughout.
        signals: Vec<OutcomeSignal>,
        surface_open: bool,
        /// Raised by the reset step for this item.
        reset_fault: Option<fn() -> PilotError>,
    }

    impl Default for ItemScript {
        fn default() -> Self {
            Self {
                perform_fault: None,
                lookup: RecipientLookup::Found,
                signals: vec![OutcomeSignal::ConfirmedSuccess],
                surface_open: false,
                reset_fault: None,
            }
        }
    }

    impl ItemScript {
        fn signals(signals: Vec<OutcomeSignal>) -> Self {
            Self {
                signals,
                ..Self::default()
            }
        }

        fn unconfirmed(surface_open: bool) -> Self {
            Self {
                signals: vec![],
                surface_open,
                ..Self::default()
            }
        }
    }

    struct ScriptedAdapter {
        scripts: Vec<ItemScript>,
        current: AtomicUsize,
        probe_cursor: AtomicUsize,
        ensure_calls: AtomicUsize,
        reload_calls: AtomicUsize,
        compose_calls: AtomicUsize,
        send_text_calls: AtomicUsize,
        reset_per_item: bool,
        supports_import: bool,
    }

    impl ScriptedAdapter {
        fn new(scripts: Vec<ItemScript>) -> Self {
            Self {
                scripts,
                current: AtomicUsize::new(0),
                probe_cursor: AtomicUsize::new(0),
                ensure_calls: AtomicUsize::new(0),
                reload_calls: AtomicUsize::new(0),
                compose_calls: AtomicUsize::new(0),
                send_text_calls: AtomicUsize::new(0),
                reset_per_item: false,
                supports_import: true,
            }
        }

        fn script(&self) -> &ItemScript {
            &self.scripts[self.current.load(Ordering::SeqCst)]
        }

        /// Called once per item at reset time: advances the item cursor
        /// and rewinds the probe cursor.
        fn begin_item(&self, prior_resets: usize) -> Result<(), PilotError> {
            self.current
                .store(prior_resets.min(self.scripts.len() - 1), Ordering::SeqCst);
            self.probe_cursor.store(0, Ordering::SeqCst);
            if let Some(fault) = self.script().reset_fault {
                return Err(fault());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AdapterContract for ScriptedAdapter {
        fn platform(&self) -> Platform {
            Platform::Eitaa
        }

        fn home_url(&self) -> &'static str {
            "https://example.invalid"
        }

        fn reset_between_items(&self, _op: Operation) -> bool {
            self.reset_per_item
        }

        fn supports_contact_import(&self) -> bool {
            self.supports_import
        }

        async fn ensure_entry_point(&self, _session: &Session) -> PilotResult<()> {
            let prior = self.ensure_calls.fetch_add(1, Ordering::SeqCst)
                + self.reload_calls.load(Ordering::SeqCst);
            self.begin_item(prior)
        }

        async fn reload(&self, _session: &Session) -> PilotResult<()> {
            let prior = self.reload_calls.fetch_add(1, Ordering::SeqCst)
                + self.ensure_calls.load(Ordering::SeqCst);
            self.begin_item(prior)
        }

        async fn start_add_contact(&self, _session: &Session) -> PilotResult<()> {
            if let Some(fault) = self.script().perform_fault {
                return Err(fault());
            }
            Ok(())
        }

        async fn fill_contact(&self, _session: &Session, _contact: &Contact) -> PilotResult<()> {
            Ok(())
        }

        async fn start_compose(
            &self,
            _session: &Session,
            _recipient: &str,
        ) -> PilotResult<RecipientLookup> {
            self.compose_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(fault) = self.script().perform_fault {
                return Err(fault());
            }
            Ok(self.script().lookup)
        }

        async fn attach(&self, _session: &Session, _paths: &[String]) -> PilotResult<()> {
            Ok(())
        }

        async fn send_text(&self, _session: &Session, _body: &str) -> PilotResult<()> {
            self.send_text_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn observe_outcome(
            &self,
            _session: &Session,
            _op: Operation,
        ) -> PilotResult<OutcomeSignal> {
            let script = self.script();
            if script.signals.is_empty() {
                return Ok(OutcomeSignal::NoSignal);
            }
            let i = self.probe_cursor.fetch_add(1, Ordering::SeqCst);
            Ok(script.signals[i.min(script.signals.len() - 1)])
        }

        async fn input_surface_open(
            &self,
            _session: &Session,
            _op: Operation,
        ) -> PilotResult<bool> {
            Ok(self.script().surface_open)
        }
    }

    struct CollectingReporter {
        events: Mutex<Vec<OutcomeEvent>>,
    }

    impl CollectingReporter {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn terminal(&self) -> Vec<OutcomeEvent> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.status.is_terminal())
                .cloned()
                .collect()
        }
    }

    impl ProgressReporter for CollectingReporter {
        fn report(&self, event: &OutcomeEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn contacts(n: usize) -> Vec<Contact> {
        (0..n)
            .map(|i| Contact::new(format!("c{i}"), format!("0912000{i:04}")))
            .collect()
    }

    #[tokio::test]
    async fn emits_exactly_n_terminal_events_in_order() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![
            ItemScript::signals(vec![OutcomeSignal::ConfirmedSuccess]),
            ItemScript::signals(vec![OutcomeSignal::ConfirmedOtherError]),
            ItemScript::signals(vec![OutcomeSignal::ConfirmedSuccess]),
        ]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let report = executor.run_import(&contacts(3), &reporter).await;

        assert!(report.overall_success);
        assert_eq!(report.completed, 3);
        let terminal = reporter.terminal();
        assert_eq!(terminal.len(), 3);
        let indices: Vec<usize> = terminal.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(terminal[0].status, OutcomeStatus::Success);
        assert_eq!(terminal[1].status, OutcomeStatus::Failure);
        assert_eq!(terminal[2].status, OutcomeStatus::Success);
        assert!(report.summary.contains("2 of 3"));
    }

    #[tokio::test]
    async fn mixed_import_scenario_reports_both_outcomes() {
        // Item 0 confirms; item 1 surfaces a platform error.
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![
            ItemScript::signals(vec![OutcomeSignal::ConfirmedSuccess]),
            ItemScript::signals(vec![OutcomeSignal::ConfirmedOtherError]),
        ]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let batch = vec![
            Contact::new("A", "0051112223"),
            Contact::new("B", "+1badnumber"),
        ];
        let report = executor.run_import(&batch, &reporter).await;

        assert_eq!(report.completed, 2);
        let terminal = reporter.terminal();
        assert_eq!(terminal[0].status, OutcomeStatus::Success);
        assert_eq!(terminal[1].status, OutcomeStatus::Failure);
    }

    #[tokio::test]
    async fn step_timeout_fails_item_and_batch_continues() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![
            ItemScript {
                perform_fault: Some(|| PilotError::StepTimeout {
                    step: "popup".into(),
                    waited_ms: 10,
                }),
                ..ItemScript::default()
            },
            ItemScript::default(),
        ]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let report = executor.run_import(&contacts(2), &reporter).await;

        assert!(report.overall_success);
        assert_eq!(report.completed, 2);
        let terminal = reporter.terminal();
        assert_eq!(terminal[0].status, OutcomeStatus::Failure);
        assert_eq!(terminal[0].detail, STEP_NO_RESPONSE);
        assert_eq!(terminal[1].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn late_signal_short_circuits_polling() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![ItemScript::signals(vec![
            OutcomeSignal::NoSignal,
            OutcomeSignal::ConfirmedSuccess,
        ])]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let report = executor.run_import(&contacts(1), &reporter).await;

        assert_eq!(report.completed, 1);
        assert_eq!(reporter.terminal()[0].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn unconfirmed_open_surface_downgrades_to_failure() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![ItemScript::unconfirmed(true)]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        executor.run_import(&contacts(1), &reporter).await;

        let terminal = reporter.terminal();
        assert_eq!(terminal[0].status, OutcomeStatus::Failure);
        assert_eq!(terminal[0].detail, NO_RESPONSE_DETAIL);
    }

    #[tokio::test]
    async fn unconfirmed_closed_surface_is_optimistic_success() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![ItemScript::unconfirmed(false)]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        executor.run_import(&contacts(1), &reporter).await;

        assert_eq!(reporter.terminal()[0].status, OutcomeStatus::Success);
    }

    #[tokio::test]
    async fn pessimistic_policy_fails_unconfirmed_items() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![ItemScript::unconfirmed(false)]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Pessimistic,
        );
        executor.run_import(&contacts(1), &reporter).await;

        let terminal = reporter.terminal();
        assert_eq!(terminal[0].status, OutcomeStatus::Failure);
        assert_eq!(terminal[0].detail, NO_RESPONSE_DETAIL);
    }

    #[tokio::test]
    async fn recipient_not_found_never_reaches_compose() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![ItemScript {
            lookup: RecipientLookup::NotFound,
            ..ItemScript::default()
        }]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let message = Message::new("ghost", "hi", vec![]).unwrap();
        let report = executor.run_dispatch(&[message], &reporter).await;

        assert!(report.overall_success);
        assert_eq!(report.completed, 1);
        assert_eq!(reporter.terminal()[0].status, OutcomeStatus::Failure);
        assert_eq!(adapter.compose_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.send_text_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dispatch_one_returns_terminal_verdict() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![ItemScript::default()]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let message = Message::new("X", "hello", vec![]).unwrap();
        let verdict = executor.dispatch_one(&message, &reporter).await.unwrap();

        assert!(verdict.is_success());
        assert_eq!(adapter.send_text_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.terminal().len(), 1);
    }

    #[tokio::test]
    async fn reset_fault_aborts_batch_with_partial_count() {
        let session = test_session();
        let adapter = ScriptedAdapter::new(vec![
            ItemScript::default(),
            ItemScript {
                reset_fault: Some(|| PilotError::StepTimeout {
                    step: "entry anchor".into(),
                    waited_ms: 10,
                }),
                ..ItemScript::default()
            },
            ItemScript::default(),
        ]);
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let report = executor.run_import(&contacts(3), &reporter).await;

        assert!(!report.overall_success);
        assert_eq!(report.completed, 1);
        assert_eq!(reporter.terminal().len(), 1);
        assert!(report.summary.contains("aborted"));
    }

    #[tokio::test]
    async fn unsupported_import_fails_fast() {
        let session = test_session();
        let mut adapter = ScriptedAdapter::new(vec![ItemScript::default()]);
        adapter.supports_import = false;
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        let report = executor.run_import(&contacts(1), &reporter).await;

        assert!(!report.overall_success);
        assert_eq!(report.completed, 0);
        assert!(reporter.terminal().is_empty());
    }

    #[tokio::test]
    async fn reload_policy_drives_reset_between_items() {
        let session = test_session();
        let mut adapter = ScriptedAdapter::new(vec![
            ItemScript::default(),
            ItemScript::default(),
            ItemScript::default(),
        ]);
        adapter.reset_per_item = true;
        let reporter = CollectingReporter::new();
        let executor = BatchExecutor::new(
            &session,
            &adapter,
            fast_timing(),
            UnconfirmedPolicy::Optimistic,
        );
        executor.run_import(&contacts(3), &reporter).await;

        assert_eq!(adapter.ensure_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.reload_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn truncate_detail_caps_length() {
        let long = "x".repeat(500);
        let cut = truncate_detail(&long);
        assert!(cut.len() < 220);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate_detail("short"), "short");
    }
}
