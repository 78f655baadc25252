//! Flow orchestrator.
//!
//! Coordinates the pure flow state machine with its side effects: local
//! persistence, scoring, the bounded account lookup, the timed reveal and
//! the final remote upload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, info_span, warn, Instrument};

use sm_core::account::{AccountLookup, AccountRef};
use sm_core::config::FlowConfig;
use sm_core::flow::{
    FlowAction, FlowEvent, FlowRejection, FlowSignal, FlowState, FlowStateMachine,
    ScreenDestination, SignupPhase,
};
use sm_core::ports::{AccountLookupPort, FlowSignalPort, ProgressStorePort, ResultSyncPort};
use sm_core::quiz::{PendingResult, QuizAnswer, QuizResult, QuizStage, ScoringEngine};

use crate::flow::context::FlowContext;
use crate::flow::error::FlowError;
use crate::reveal::{RevealController, RevealError, RevealHandle};

/// Orchestrator that drives quiz flow state and side effects.
///
/// The single writer of the local progress store. All collaborators are
/// injected, so the whole flow is testable with in-memory ports.
pub struct FlowOrchestrator {
    context: Arc<FlowContext>,
    config: FlowConfig,

    store: Arc<dyn ProgressStorePort>,
    engine: Arc<dyn ScoringEngine>,
    accounts: Arc<dyn AccountLookupPort>,
    result_sync: Arc<dyn ResultSyncPort>,
    signals: Arc<dyn FlowSignalPort>,

    reveal: RevealController,
    reveal_handle: Mutex<Option<RevealHandle>>,
    sync_task: Mutex<Option<JoinHandle<()>>>,
    seeded: AtomicBool,
}

impl FlowOrchestrator {
    pub fn new(
        config: FlowConfig,
        store: Arc<dyn ProgressStorePort>,
        engine: Arc<dyn ScoringEngine>,
        accounts: Arc<dyn AccountLookupPort>,
        result_sync: Arc<dyn ResultSyncPort>,
        signals: Arc<dyn FlowSignalPort>,
    ) -> Self {
        let reveal = RevealController::new(
            Arc::clone(&store),
            Arc::clone(&signals),
            config.reveal_delay(),
            config.animation_duration(),
        );
        Self {
            context: FlowContext::idle().arc(),
            config,
            store,
            engine,
            accounts,
            result_sync,
            signals,
            reveal,
            reveal_handle: Mutex::new(None),
            sync_task: Mutex::new(None),
            seeded: AtomicBool::new(false),
        }
    }

    // === User-triggered events ===

    pub async fn submit_answer(&self, answer: QuizAnswer) -> Result<FlowState, FlowError> {
        self.dispatch(FlowEvent::AnswerSubmitted { answer }).await
    }

    /// Explicit "complete quiz". Fails with [`FlowError::Validation`] when
    /// fewer than the minimum number of questions have been answered; the
    /// flow stays in place.
    pub async fn submit_quiz(&self) -> Result<FlowState, FlowError> {
        let state = self.dispatch(FlowEvent::QuizSubmitted).await?;
        if let FlowState::InProgress {
            error: Some(FlowRejection::TooFewAnswers { answered, required }),
            ..
        } = &state
        {
            return Err(FlowError::Validation {
                answered: *answered,
                required: *required,
            });
        }
        Ok(state)
    }

    pub async fn submit_email(&self, email: String) -> Result<FlowState, FlowError> {
        self.dispatch(FlowEvent::EmailProvided { email }).await
    }

    pub async fn continue_as_new_user(&self) -> Result<FlowState, FlowError> {
        self.dispatch(FlowEvent::ContinueAsNewUser).await
    }

    /// Signup or sign-in finished; the reveal becomes reachable.
    pub async fn account_ready(&self, account: AccountRef) -> Result<FlowState, FlowError> {
        self.dispatch(FlowEvent::AccountReady { account }).await
    }

    /// User acknowledged the revealed result: upload (fire-and-forget with
    /// retry) and clear the local records.
    pub async fn acknowledge_result(&self) -> Result<FlowState, FlowError> {
        self.dispatch(FlowEvent::RevealAcknowledged).await
    }

    /// Explicit user-initiated restart; the only backward transition.
    pub async fn restart(&self) -> Result<FlowState, FlowError> {
        self.dispatch(FlowEvent::Restarted).await
    }

    // === Reveal re-entry ===

    /// Restart the reveal sequence, e.g. after the user navigated away and
    /// came back. Requires an unlocked result; never re-triggers signup.
    pub async fn begin_reveal(&self) -> Result<(), FlowError> {
        let state = self.state().await;
        if !matches!(state, FlowState::ResultsUnlocked { .. }) {
            return Err(FlowError::NotReady);
        }
        let handle = match self.reveal.begin().await {
            Ok(handle) => handle,
            Err(RevealError::NotReady) => {
                // The stored copy is missing (an earlier write was absorbed);
                // the in-memory result is still authoritative.
                let result = state.pending_result().cloned().ok_or(FlowError::NotReady)?;
                warn!("stored result missing, revealing from in-memory state");
                self.reveal.begin_with(result)
            }
        };
        self.replace_reveal_handle(Some(handle)).await;
        Ok(())
    }

    /// Abandon a running reveal sequence. The stored result is untouched;
    /// [`begin_reveal`](Self::begin_reveal) resumes from "ready to reveal".
    pub async fn cancel_reveal(&self) {
        self.replace_reveal_handle(None).await;
    }

    // === State access ===

    /// Current flow state, seeding from the local store on first access.
    pub async fn state(&self) -> FlowState {
        if !self.seeded.load(Ordering::SeqCst) {
            return self.resume().await;
        }
        self.context.state().await
    }

    /// Seed the flow from whatever survived the last shutdown.
    ///
    /// A stored result with stage `AwaitingSignup` re-enters signup without
    /// recomputation; a missing result with a complete answer sheet is
    /// recomputed (the engine is deterministic, so this reproduces the
    /// pre-crash values).
    pub async fn resume(&self) -> FlowState {
        let _guard = self.context.acquire_dispatch_lock().await;
        if self.seeded.swap(true, Ordering::SeqCst) {
            return self.context.state().await;
        }
        let state = self.seed_from_store().await;
        info!(stage = ?state.stage(), "flow resumed from local store");
        self.set_state_and_emit(state.clone()).await;
        state
    }

    /// Await a pending remote upload, if any. Intended for app shutdown so
    /// the fire-and-forget sync gets a chance to finish.
    pub async fn flush_pending_sync(&self) {
        let task = self.sync_task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    // === Internals ===

    async fn dispatch(&self, event: FlowEvent) -> Result<FlowState, FlowError> {
        if !self.seeded.load(Ordering::SeqCst) {
            self.resume().await;
        }
        // Serialize dispatch so transition + actions + persistence run as a
        // unit; a later transition's write can never be overtaken by an
        // earlier one's.
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!("flow.dispatch", event = event.label());
        async {
            let mut current = self.context.state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from_stage = current.stage();
                let (next, actions) =
                    FlowStateMachine::transition(current, event, &self.config.quiz);
                info!(from = ?from_stage, to = ?next.stage(), "flow transition");
                let follow_ups = self.execute_actions(&next, actions).await?;
                self.set_state_and_emit(next.clone()).await;
                current = next;
                pending_events.extend(follow_ups);
            }

            Ok(current)
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(
        &self,
        next: &FlowState,
        actions: Vec<FlowAction>,
    ) -> Result<Vec<FlowEvent>, FlowError> {
        let mut follow_ups = Vec::new();
        for action in actions {
            debug!(action = ?action_label(&action), "flow executing action");
            match action {
                FlowAction::PersistProgress => self.persist_progress(next).await,
                FlowAction::ComputeResult => {
                    let result = self.compute_result(next).await?;
                    follow_ups.push(FlowEvent::ResultComputed { result });
                }
                FlowAction::LookupAccount { email } => {
                    let outcome = self.lookup_account(&email).await;
                    follow_ups.push(FlowEvent::LookupResolved { outcome });
                }
                FlowAction::ScheduleReveal => self.schedule_reveal(next).await?,
                FlowAction::SyncResultRemote { account, result } => {
                    self.spawn_result_sync(account, result).await;
                }
                FlowAction::ClearLocalState => {
                    self.replace_reveal_handle(None).await;
                    if let Err(err) = self.store.clear_all().await {
                        warn!(error = %err, "failed to clear local flow state");
                    }
                }
            }
        }
        Ok(follow_ups)
    }

    /// Local write failures are absorbed: the in-memory state stays
    /// authoritative for this session and the next transition writes again.
    async fn persist_progress(&self, next: &FlowState) {
        let Some(snapshot) = next.progress_snapshot() else {
            return;
        };
        if let Err(err) = self.store.save_progress(&snapshot).await {
            warn!(error = %err, stage = ?snapshot.stage, "progress write failed, keeping in-memory state");
        }
    }

    /// Run the scoring engine, reusing an already-stored result so an
    /// interrupted flow never scores the same sheet twice. Reuse requires
    /// the stored sheet to match exactly: after a crash the user can still
    /// re-answer questions, and the old sheet's result must not survive
    /// that.
    async fn compute_result(&self, next: &FlowState) -> Result<QuizResult, FlowError> {
        let FlowState::InProgress { answers, .. } = next else {
            // ComputeResult is only ever produced from InProgress.
            return Err(FlowError::NotReady);
        };

        if let Some(stored) = self.store.load_result().await {
            if stored.matches_answers(answers) {
                debug!("reusing stored quiz result");
                return Ok(stored.result);
            }
            debug!("stored result is for a different answer sheet, rescoring");
        }

        let result = self
            .engine
            .score(answers, self.config.quiz.min_questions)?;
        let pending = PendingResult {
            answers: answers.clone(),
            result: result.clone(),
        };
        if let Err(err) = self.store.save_result(&pending).await {
            warn!(error = %err, "result write failed, keeping in-memory result");
        }
        Ok(result)
    }

    /// Bounded reconciliation lookup. Timeout and transport failures both
    /// come back as `LookupFailed`, which the machine treats as fail-open.
    async fn lookup_account(&self, email: &str) -> AccountLookup {
        match timeout(self.config.lookup_timeout(), self.accounts.lookup(email)).await {
            Ok(outcome) => {
                if let AccountLookup::LookupFailed(reason) = &outcome {
                    warn!(reason = %reason, "account lookup failed, proceeding as new user");
                }
                outcome
            }
            Err(_) => {
                warn!(timeout_ms = self.config.lookup_timeout_ms, "account lookup timed out");
                AccountLookup::LookupFailed("lookup timed out".into())
            }
        }
    }

    async fn schedule_reveal(&self, next: &FlowState) -> Result<(), FlowError> {
        let handle = match self.reveal.begin().await {
            Ok(handle) => handle,
            Err(RevealError::NotReady) => {
                let result = next.pending_result().cloned().ok_or(FlowError::NotReady)?;
                warn!("stored result missing, revealing from in-memory state");
                self.reveal.begin_with(result)
            }
        };
        self.replace_reveal_handle(Some(handle)).await;
        Ok(())
    }

    /// Fire-and-forget upload with bounded retry. Exhaustion is escalated
    /// through the signal port as a backfill request; the local flow has
    /// already moved on.
    async fn spawn_result_sync(&self, account: AccountRef, result: QuizResult) {
        let sync = Arc::clone(&self.result_sync);
        let signals = Arc::clone(&self.signals);
        let retry = self.config.sync_retry.clone();

        let task = tokio::spawn(
            async move {
                let mut attempt: u32 = 1;
                loop {
                    match sync.upsert_result(&account, &result).await {
                        Ok(()) => {
                            debug!(account = %account, "quiz result uploaded");
                            return;
                        }
                        Err(err) if attempt >= retry.max_attempts => {
                            error!(
                                account = %account,
                                attempts = attempt,
                                error = %err,
                                "abandoning quiz result upload, backfill required"
                            );
                            signals
                                .emit(FlowSignal::RemoteSyncAbandoned { account })
                                .await;
                            return;
                        }
                        Err(err) => {
                            warn!(
                                attempt,
                                max_attempts = retry.max_attempts,
                                error = %err,
                                "quiz result upload failed, retrying"
                            );
                            let backoff = retry.backoff().mul_f32(attempt as f32);
                            sleep(backoff).await;
                            attempt = attempt.saturating_add(1);
                        }
                    }
                }
            }
            .instrument(info_span!("flow.result_sync")),
        );

        // A superseded upload belongs to an abandoned flow; abort it rather
        // than stall dispatch behind its remaining retries.
        if let Some(previous) = self.sync_task.lock().await.replace(task) {
            previous.abort();
        }
    }

    async fn set_state_and_emit(&self, state: FlowState) {
        let destination = ScreenDestination::for_state(&state);
        let stage = state.stage();
        self.context.set_state(state).await;
        self.signals
            .emit(FlowSignal::StageChanged { stage, destination })
            .await;
    }

    async fn replace_reveal_handle(&self, handle: Option<RevealHandle>) {
        let mut guard = self.reveal_handle.lock().await;
        if let Some(previous) = guard.take() {
            previous.cancel();
        }
        *guard = handle;
    }

    async fn seed_from_store(&self) -> FlowState {
        let Some(progress) = self.store.load_progress().await else {
            return FlowState::Idle;
        };

        match progress.stage {
            QuizStage::InProgress => FlowState::InProgress {
                answers: progress.answers,
                error: None,
            },
            QuizStage::AwaitingSignup => self.seed_awaiting_signup(progress.answers).await,
            QuizStage::ResultsUnlocked => {
                match (self.store.load_result().await, progress.account) {
                    (Some(pending), Some(account)) => FlowState::ResultsUnlocked {
                        result: pending.result,
                        account,
                    },
                    // Account link never made it to disk; the result is
                    // intact, so fall back to signup rather than drop it.
                    (Some(pending), None) => FlowState::AwaitingSignup {
                        answers: progress.answers,
                        result: pending.result,
                        phase: SignupPhase::CollectingEmail,
                    },
                    (None, _) => self.seed_awaiting_signup(progress.answers).await,
                }
            }
            QuizStage::Completed => {
                // Completion clears the store; a stored Completed record is
                // leftover from a crash mid-clear.
                if let Err(err) = self.store.clear_all().await {
                    warn!(error = %err, "failed to clear stale completed flow");
                }
                FlowState::Idle
            }
        }
    }

    /// Re-enter signup with the stored result, recomputing when the stored
    /// copy is missing or was scored from a different sheet.
    async fn seed_awaiting_signup(&self, answers: Vec<QuizAnswer>) -> FlowState {
        if let Some(stored) = self.store.load_result().await {
            if stored.matches_answers(&answers) {
                return FlowState::AwaitingSignup {
                    answers,
                    result: stored.result,
                    phase: SignupPhase::CollectingEmail,
                };
            }
            debug!("stored result is for a different answer sheet, rescoring");
        }
        match self
            .engine
            .score(&answers, self.config.quiz.min_questions)
        {
            Ok(result) => {
                let pending = PendingResult {
                    answers: answers.clone(),
                    result: result.clone(),
                };
                if let Err(err) = self.store.save_result(&pending).await {
                    warn!(error = %err, "result write failed during resume");
                }
                FlowState::AwaitingSignup {
                    answers,
                    result,
                    phase: SignupPhase::CollectingEmail,
                }
            }
            Err(err) => {
                warn!(error = %err, "stored answers no longer score, reopening quiz");
                FlowState::InProgress {
                    answers,
                    error: None,
                }
            }
        }
    }
}

fn action_label(action: &FlowAction) -> &'static str {
    match action {
        FlowAction::PersistProgress => "persist_progress",
        FlowAction::ComputeResult => "compute_result",
        FlowAction::LookupAccount { .. } => "lookup_account",
        FlowAction::ScheduleReveal => "schedule_reveal",
        FlowAction::SyncResultRemote { .. } => "sync_result_remote",
        FlowAction::ClearLocalState => "clear_local_state",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use sm_core::flow::RevealPhase;
    use sm_core::quiz::{Classification, QuizProgress, ScoringError, WeightedScoring};

    #[derive(Default)]
    struct InMemoryStore {
        progress: StdMutex<Option<QuizProgress>>,
        result: StdMutex<Option<PendingResult>>,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl ProgressStorePort for InMemoryStore {
        async fn load_progress(&self) -> Option<QuizProgress> {
            self.progress.lock().unwrap().clone()
        }
        async fn save_progress(&self, progress: &QuizProgress) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            *self.progress.lock().unwrap() = Some(progress.clone());
            Ok(())
        }
        async fn load_result(&self) -> Option<PendingResult> {
            self.result.lock().unwrap().clone()
        }
        async fn save_result(&self, pending: &PendingResult) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("disk full");
            }
            *self.result.lock().unwrap() = Some(pending.clone());
            Ok(())
        }
        async fn clear_all(&self) -> anyhow::Result<()> {
            *self.progress.lock().unwrap() = None;
            *self.result.lock().unwrap() = None;
            Ok(())
        }
    }

    /// Scripted reconciliation endpoint; `Hang` simulates a dead transport.
    enum LookupScript {
        Respond(AccountLookup),
        Hang,
    }

    struct ScriptedLookup {
        script: LookupScript,
        calls: AtomicU32,
    }

    impl ScriptedLookup {
        fn new(script: LookupScript) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl AccountLookupPort for ScriptedLookup {
        async fn lookup(&self, _email: &str) -> AccountLookup {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                LookupScript::Respond(outcome) => outcome.clone(),
                LookupScript::Hang => std::future::pending().await,
            }
        }
    }

    /// Counts upload attempts, failing the first `fail_first` of them.
    struct FlakySync {
        fail_first: u32,
        attempts: AtomicU32,
    }

    impl FlakySync {
        fn new(fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                fail_first,
                attempts: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ResultSyncPort for FlakySync {
        async fn upsert_result(
            &self,
            _account: &AccountRef,
            _result: &QuizResult,
        ) -> anyhow::Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.fail_first {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSignals {
        seen: StdMutex<Vec<FlowSignal>>,
    }

    impl RecordingSignals {
        fn snapshot(&self) -> Vec<FlowSignal> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FlowSignalPort for RecordingSignals {
        async fn emit(&self, signal: FlowSignal) {
            self.seen.lock().unwrap().push(signal);
        }
    }

    /// Scoring engine wrapper counting invocations.
    struct CountingEngine {
        calls: AtomicU32,
    }

    impl CountingEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }
    }

    impl ScoringEngine for CountingEngine {
        fn score(
            &self,
            answers: &[QuizAnswer],
            min_questions: usize,
        ) -> Result<QuizResult, ScoringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            WeightedScoring.score(answers, min_questions)
        }
    }

    struct Harness {
        orchestrator: FlowOrchestrator,
        store: Arc<InMemoryStore>,
        engine: Arc<CountingEngine>,
        sync: Arc<FlakySync>,
        signals: Arc<RecordingSignals>,
    }

    fn harness(lookup: Arc<ScriptedLookup>, sync_fail_first: u32) -> Harness {
        let store = Arc::new(InMemoryStore::default());
        let engine = CountingEngine::new();
        let sync = FlakySync::new(sync_fail_first);
        let signals = Arc::new(RecordingSignals::default());
        let orchestrator = FlowOrchestrator::new(
            FlowConfig::default(),
            store.clone(),
            engine.clone(),
            lookup,
            sync.clone(),
            signals.clone(),
        );
        Harness {
            orchestrator,
            store,
            engine,
            sync,
            signals,
        }
    }

    async fn answer_all(orchestrator: &FlowOrchestrator) -> FlowState {
        let mut state = FlowState::Idle;
        for q in 1..=10u16 {
            state = orchestrator
                .submit_answer(QuizAnswer::new(q, (q % 4) as u8))
                .await
                .unwrap();
        }
        state
    }

    #[tokio::test]
    async fn completing_the_quiz_stores_result_without_revealing() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );

        let state = answer_all(&h.orchestrator).await;

        assert_eq!(state.stage(), Some(QuizStage::AwaitingSignup));
        let stored = h.store.load_result().await.expect("result persisted");
        assert!(stored.result.score <= 100);
        // Nothing reveal-shaped has crossed the signal port yet.
        assert!(h
            .signals
            .snapshot()
            .iter()
            .all(|s| !matches!(s, FlowSignal::Reveal(_))));
    }

    #[tokio::test]
    async fn early_submit_fails_validation_and_keeps_stage() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        for q in 1..=9u16 {
            h.orchestrator
                .submit_answer(QuizAnswer::new(q, 1))
                .await
                .unwrap();
        }

        let err = h.orchestrator.submit_quiz().await.unwrap_err();

        assert!(matches!(
            err,
            FlowError::Validation {
                answered: 9,
                required: 10
            }
        ));
        assert_eq!(
            h.orchestrator.state().await.stage(),
            Some(QuizStage::InProgress)
        );
        assert!(h.store.load_result().await.is_none());
    }

    #[tokio::test]
    async fn found_account_routes_to_sign_in() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::Found(
                AccountRef::new("acct_existing"),
            ))),
            0,
        );
        answer_all(&h.orchestrator).await;

        let state = h
            .orchestrator
            .submit_email("existing@example.com".into())
            .await
            .unwrap();

        assert!(matches!(
            state,
            FlowState::AwaitingSignup {
                phase: SignupPhase::ExistingAccount { .. },
                ..
            }
        ));
        assert!(h.signals.snapshot().contains(&FlowSignal::StageChanged {
            stage: Some(QuizStage::AwaitingSignup),
            destination: ScreenDestination::Signup {
                existing_account: true
            },
        }));
    }

    #[tokio::test]
    async fn failed_lookup_proceeds_as_new_user() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::LookupFailed(
                "503".into(),
            ))),
            0,
        );
        answer_all(&h.orchestrator).await;

        let state = h
            .orchestrator
            .submit_email("user@example.com".into())
            .await
            .unwrap();

        assert!(matches!(
            state,
            FlowState::AwaitingSignup {
                phase: SignupPhase::NewAccount,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_lookup_times_out_and_fails_open() {
        let lookup = ScriptedLookup::new(LookupScript::Hang);
        let h = harness(lookup.clone(), 0);
        answer_all(&h.orchestrator).await;

        let state = h
            .orchestrator
            .submit_email("user@example.com".into())
            .await
            .unwrap();

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            state,
            FlowState::AwaitingSignup {
                phase: SignupPhase::NewAccount,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn full_flow_completes_and_clears_local_state() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        answer_all(&h.orchestrator).await;
        h.orchestrator
            .submit_email("user@example.com".into())
            .await
            .unwrap();
        h.orchestrator
            .account_ready(AccountRef::new("acct_new"))
            .await
            .unwrap();

        // Let the reveal sequence play out under paused time.
        tokio::time::sleep(Duration::from_millis(4000)).await;
        tokio::task::yield_now().await;

        let state = h.orchestrator.acknowledge_result().await.unwrap();
        h.orchestrator.flush_pending_sync().await;

        assert_eq!(state, FlowState::Completed);
        assert!(h.store.load_progress().await.is_none());
        assert!(h.store.load_result().await.is_none());
        assert_eq!(h.sync.attempts.load(Ordering::SeqCst), 1);

        let signals = h.signals.snapshot();
        assert!(signals
            .iter()
            .any(|s| matches!(s, FlowSignal::Reveal(RevealPhase::Revealing { .. }))));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_upload_retries_escalate_but_do_not_block() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            u32::MAX, // never succeeds
        );
        answer_all(&h.orchestrator).await;
        h.orchestrator
            .submit_email("user@example.com".into())
            .await
            .unwrap();
        h.orchestrator
            .account_ready(AccountRef::new("acct_new"))
            .await
            .unwrap();

        let state = h.orchestrator.acknowledge_result().await.unwrap();
        h.orchestrator.flush_pending_sync().await;

        // The flow still completed and cleared local state.
        assert_eq!(state, FlowState::Completed);
        assert!(h.store.load_progress().await.is_none());
        assert_eq!(h.sync.attempts.load(Ordering::SeqCst), 3);
        assert!(h
            .signals
            .snapshot()
            .iter()
            .any(|s| matches!(s, FlowSignal::RemoteSyncAbandoned { .. })));
    }

    #[tokio::test]
    async fn relaunch_resumes_awaiting_signup_without_rescoring() {
        let first = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        answer_all(&first.orchestrator).await;
        let before = first.store.load_result().await.unwrap();

        // "Relaunch": a fresh orchestrator over the same store contents.
        let store = first.store.clone();
        let engine = CountingEngine::new();
        let relaunched = FlowOrchestrator::new(
            FlowConfig::default(),
            store.clone(),
            engine.clone(),
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            FlakySync::new(0),
            Arc::new(RecordingSignals::default()),
        );

        let state = relaunched.resume().await;

        assert_eq!(state.stage(), Some(QuizStage::AwaitingSignup));
        assert_eq!(state.pending_result(), Some(&before.result));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0, "no rescoring");
    }

    #[tokio::test]
    async fn relaunch_at_results_unlocked_is_ready_to_reveal() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        answer_all(&h.orchestrator).await;
        h.orchestrator
            .submit_email("user@example.com".into())
            .await
            .unwrap();
        h.orchestrator
            .account_ready(AccountRef::new("acct_new"))
            .await
            .unwrap();
        h.orchestrator.cancel_reveal().await;

        let relaunched = FlowOrchestrator::new(
            FlowConfig::default(),
            h.store.clone(),
            CountingEngine::new(),
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            FlakySync::new(0),
            Arc::new(RecordingSignals::default()),
        );

        let state = relaunched.resume().await;
        assert!(matches!(state, FlowState::ResultsUnlocked { .. }));
        assert!(relaunched.begin_reveal().await.is_ok());
        relaunched.cancel_reveal().await;
    }

    #[tokio::test]
    async fn write_failures_are_absorbed_and_state_stays_authoritative() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        h.store.fail_writes.store(true, Ordering::SeqCst);

        let state = answer_all(&h.orchestrator).await;

        // Nothing reached disk, but the session carried on to signup.
        assert_eq!(state.stage(), Some(QuizStage::AwaitingSignup));
        assert!(h.store.load_progress().await.is_none());

        // Once writes recover, the next transition persists again.
        h.store.fail_writes.store(false, Ordering::SeqCst);
        h.orchestrator
            .submit_email("user@example.com".into())
            .await
            .unwrap();
        h.orchestrator
            .account_ready(AccountRef::new("acct_new"))
            .await
            .unwrap();
        assert_eq!(
            h.store.load_progress().await.unwrap().stage,
            QuizStage::ResultsUnlocked
        );
        h.orchestrator.cancel_reveal().await;
    }

    #[tokio::test]
    async fn restart_clears_everything_and_returns_to_idle() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        answer_all(&h.orchestrator).await;

        let state = h.orchestrator.restart().await.unwrap();

        assert_eq!(state, FlowState::Idle);
        assert!(h.store.load_progress().await.is_none());
        assert!(h.store.load_result().await.is_none());
        assert_eq!(h.engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn begin_reveal_before_unlock_is_not_ready() {
        let h = harness(
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            0,
        );
        answer_all(&h.orchestrator).await;

        assert!(matches!(
            h.orchestrator.begin_reveal().await,
            Err(FlowError::NotReady)
        ));
    }

    /// A crash can land between the result write and the stage write,
    /// leaving `InProgress` progress next to a stored result. If the user
    /// then re-answers a question, that result belongs to the old sheet and
    /// must be recomputed, not reused.
    #[tokio::test]
    async fn reanswering_after_relaunch_rescores_instead_of_reusing_stale_result() {
        let max_sheet: Vec<QuizAnswer> = (1..=10u16).map(|q| QuizAnswer::new(q, 3)).collect();
        let old_sheet: Vec<QuizAnswer> = (1..=10u16).map(|q| QuizAnswer::new(q, 0)).collect();

        let store = Arc::new(InMemoryStore::default());
        *store.progress.lock().unwrap() = Some(QuizProgress {
            answers: max_sheet.clone(),
            stage: QuizStage::InProgress,
            account: None,
        });
        *store.result.lock().unwrap() = Some(PendingResult {
            answers: old_sheet,
            result: QuizResult {
                classification: Classification::Doubter,
                score: 0,
            },
        });

        let engine = CountingEngine::new();
        let orchestrator = FlowOrchestrator::new(
            FlowConfig::default(),
            store.clone(),
            engine.clone(),
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            FlakySync::new(0),
            Arc::new(RecordingSignals::default()),
        );
        assert_eq!(
            orchestrator.resume().await.stage(),
            Some(QuizStage::InProgress)
        );

        // Re-answering the final sheet completes the quiz again.
        let state = orchestrator
            .submit_answer(QuizAnswer::new(1, 3))
            .await
            .unwrap();

        assert_eq!(state.stage(), Some(QuizStage::AwaitingSignup));
        let result = state.pending_result().unwrap();
        assert_eq!(result.classification, Classification::Overanalyzer);
        assert_eq!(result.score, 100);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        // The stored record now belongs to the current sheet.
        let stored = store.load_result().await.unwrap();
        assert!(stored.matches_answers(&max_sheet));
    }

    /// Upload that never returns; later calls succeed immediately.
    struct StallingSync {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl ResultSyncPort for StallingSync {
        async fn upsert_result(
            &self,
            _account: &AccountRef,
            _result: &QuizResult,
        ) -> anyhow::Result<()> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending().await
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_upload_is_aborted_and_never_stalls_dispatch() {
        let sync = Arc::new(StallingSync {
            attempts: AtomicU32::new(0),
        });
        let store = Arc::new(InMemoryStore::default());
        let orchestrator = FlowOrchestrator::new(
            FlowConfig::default(),
            store.clone(),
            CountingEngine::new(),
            ScriptedLookup::new(LookupScript::Respond(AccountLookup::NotFound)),
            sync.clone(),
            Arc::new(RecordingSignals::default()),
        );

        async fn run_flow(o: &FlowOrchestrator) -> FlowState {
            answer_all(o).await;
            o.submit_email("user@example.com".into()).await.unwrap();
            o.account_ready(AccountRef::new("acct_new")).await.unwrap();
            o.acknowledge_result().await.unwrap()
        }

        // First flow's upload stalls in the background. Yield so the
        // spawned upload task is actually polled (and stalls) before the
        // second flow supersedes it.
        run_flow(&orchestrator).await;
        tokio::task::yield_now().await;
        orchestrator.restart().await.unwrap();

        // The second flow must not wait behind the stalled upload.
        let state = tokio::time::timeout(Duration::from_secs(60), async {
            let state = run_flow(&orchestrator).await;
            orchestrator.flush_pending_sync().await;
            state
        })
        .await
        .expect("dispatch stalled behind a superseded upload");

        assert_eq!(state, FlowState::Completed);
        assert_eq!(sync.attempts.load(Ordering::SeqCst), 2);
    }
}
