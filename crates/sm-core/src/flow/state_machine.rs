//! Flow state machine.
//!
//! Defines a pure state transition function for the quiz onboarding and
//! results-unlock flow. No side effects here: transitions return the next
//! state plus the actions the application layer must execute (persist,
//! score, look up an account, schedule the reveal, upload, clear).
//!
//! Unmatched (state, event) pairs fall through to the ignore arm. That arm
//! is load-bearing: a lookup response arriving after the user has already
//! moved on simply no longer matches and is dropped.

use serde::{Deserialize, Serialize};

use crate::account::{AccountLookup, AccountRef};
use crate::config::QuizRules;
use crate::quiz::{QuizAnswer, QuizProgress, QuizResult, QuizStage};

/// Quiz flow state.
///
/// Richer than the persisted [`QuizStage`]: the signup branch and the
/// validation error live only in memory, the stage is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    /// No quiz has been started (or an explicit restart cleared everything).
    Idle,
    /// Quiz is being answered.
    InProgress {
        answers: Vec<QuizAnswer>,
        error: Option<FlowRejection>,
    },
    /// Result computed and stored, reveal gated behind signup.
    AwaitingSignup {
        answers: Vec<QuizAnswer>,
        result: QuizResult,
        phase: SignupPhase,
    },
    /// Account exists, reveal scheduled or running.
    ResultsUnlocked {
        result: QuizResult,
        account: AccountRef,
    },
    /// Flow finished, local records cleared.
    Completed,
}

/// Where the signup branch currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignupPhase {
    /// Waiting for the user to enter an email.
    CollectingEmail,
    /// Reconciliation lookup running for this email.
    LookupInFlight { email: String },
    /// Lookup found an existing account; user must sign in.
    ExistingAccount { account: AccountRef },
    /// No existing account (or lookup failed open); create a new one.
    NewAccount,
}

/// Events that drive the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// User selected an option for a question.
    AnswerSubmitted { answer: QuizAnswer },
    /// User explicitly completed the quiz.
    QuizSubmitted,
    /// Scoring finished (follow-up from the `ComputeResult` action).
    ResultComputed { result: QuizResult },
    /// User entered an email on the signup screen.
    EmailProvided { email: String },
    /// Reconciliation lookup resolved (follow-up from `LookupAccount`).
    LookupResolved { outcome: AccountLookup },
    /// User chose to skip waiting and sign up fresh.
    ContinueAsNewUser,
    /// Account was created or authenticated.
    AccountReady { account: AccountRef },
    /// User acknowledged the revealed result.
    RevealAcknowledged,
    /// Explicit user-initiated restart.
    Restarted,
}

impl FlowEvent {
    /// Short name for log fields; payloads (emails in particular) stay out
    /// of the logs.
    pub fn label(&self) -> &'static str {
        match self {
            FlowEvent::AnswerSubmitted { .. } => "answer_submitted",
            FlowEvent::QuizSubmitted => "quiz_submitted",
            FlowEvent::ResultComputed { .. } => "result_computed",
            FlowEvent::EmailProvided { .. } => "email_provided",
            FlowEvent::LookupResolved { .. } => "lookup_resolved",
            FlowEvent::ContinueAsNewUser => "continue_as_new_user",
            FlowEvent::AccountReady { .. } => "account_ready",
            FlowEvent::RevealAcknowledged => "reveal_acknowledged",
            FlowEvent::Restarted => "restarted",
        }
    }
}

/// Side effects produced by transitions, executed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    /// Write the current progress snapshot to the local store.
    PersistProgress,
    /// Run the scoring engine over the completed answer sheet.
    ComputeResult,
    /// Start a bounded account reconciliation lookup.
    LookupAccount { email: String },
    /// Start the timed reveal sequence.
    ScheduleReveal,
    /// Upload the final result, keyed by account (bounded retry).
    SyncResultRemote {
        account: AccountRef,
        result: QuizResult,
    },
    /// Remove both local records.
    ClearLocalState,
}

/// Recoverable rejections surfaced inline on the quiz screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowRejection {
    TooFewAnswers { answered: usize, required: usize },
}

/// Pure flow state machine.
pub struct FlowStateMachine;

impl FlowStateMachine {
    pub fn transition(
        state: FlowState,
        event: FlowEvent,
        rules: &QuizRules,
    ) -> (FlowState, Vec<FlowAction>) {
        match (state, event) {
            (FlowState::Idle, FlowEvent::AnswerSubmitted { answer }) => (
                FlowState::InProgress {
                    answers: vec![answer],
                    error: None,
                },
                vec![FlowAction::PersistProgress],
            ),
            (FlowState::InProgress { mut answers, .. }, FlowEvent::AnswerSubmitted { answer }) => {
                QuizProgress::record_answer(&mut answers, answer);
                // The final answer submits the quiz implicitly.
                let actions = if answers.len() >= rules.total_questions {
                    vec![FlowAction::PersistProgress, FlowAction::ComputeResult]
                } else {
                    vec![FlowAction::PersistProgress]
                };
                (
                    FlowState::InProgress {
                        answers,
                        error: None,
                    },
                    actions,
                )
            }
            (FlowState::InProgress { answers, .. }, FlowEvent::QuizSubmitted) => {
                if answers.len() < rules.min_questions {
                    let rejection = FlowRejection::TooFewAnswers {
                        answered: answers.len(),
                        required: rules.min_questions,
                    };
                    return (
                        FlowState::InProgress {
                            answers,
                            error: Some(rejection),
                        },
                        Vec::new(),
                    );
                }
                (
                    FlowState::InProgress {
                        answers,
                        error: None,
                    },
                    vec![FlowAction::ComputeResult],
                )
            }
            (FlowState::InProgress { answers, .. }, FlowEvent::ResultComputed { result }) => (
                FlowState::AwaitingSignup {
                    answers,
                    result,
                    phase: SignupPhase::CollectingEmail,
                },
                vec![FlowAction::PersistProgress],
            ),
            (
                FlowState::AwaitingSignup {
                    answers,
                    result,
                    phase,
                },
                FlowEvent::EmailProvided { email },
            ) => {
                // A second submit while a lookup is running is ignored.
                if matches!(phase, SignupPhase::LookupInFlight { .. }) {
                    return (
                        FlowState::AwaitingSignup {
                            answers,
                            result,
                            phase,
                        },
                        Vec::new(),
                    );
                }
                (
                    FlowState::AwaitingSignup {
                        answers,
                        result,
                        phase: SignupPhase::LookupInFlight {
                            email: email.clone(),
                        },
                    },
                    vec![FlowAction::LookupAccount { email }],
                )
            }
            (
                FlowState::AwaitingSignup {
                    answers,
                    result,
                    phase: SignupPhase::LookupInFlight { .. },
                },
                FlowEvent::LookupResolved { outcome },
            ) => {
                // Fail-open: a failed lookup proceeds exactly like NotFound.
                let phase = match outcome {
                    AccountLookup::Found(account) => SignupPhase::ExistingAccount { account },
                    AccountLookup::NotFound | AccountLookup::LookupFailed(_) => {
                        SignupPhase::NewAccount
                    }
                };
                (
                    FlowState::AwaitingSignup {
                        answers,
                        result,
                        phase,
                    },
                    Vec::new(),
                )
            }
            (
                FlowState::AwaitingSignup {
                    answers, result, ..
                },
                FlowEvent::ContinueAsNewUser,
            ) => (
                FlowState::AwaitingSignup {
                    answers,
                    result,
                    phase: SignupPhase::NewAccount,
                },
                Vec::new(),
            ),
            (FlowState::AwaitingSignup { result, .. }, FlowEvent::AccountReady { account }) => (
                FlowState::ResultsUnlocked { result, account },
                vec![FlowAction::PersistProgress, FlowAction::ScheduleReveal],
            ),
            (
                FlowState::ResultsUnlocked { result, account },
                FlowEvent::RevealAcknowledged,
            ) => (
                FlowState::Completed,
                vec![
                    FlowAction::SyncResultRemote { account, result },
                    FlowAction::ClearLocalState,
                ],
            ),
            (_, FlowEvent::Restarted) => (FlowState::Idle, vec![FlowAction::ClearLocalState]),
            // Everything else (stale lookup responses included) is a no-op.
            (state, _event) => (state, Vec::new()),
        }
    }
}

impl FlowState {
    /// Persisted stage corresponding to this state, `None` before the first
    /// answer.
    pub fn stage(&self) -> Option<QuizStage> {
        match self {
            FlowState::Idle => None,
            FlowState::InProgress { .. } => Some(QuizStage::InProgress),
            FlowState::AwaitingSignup { .. } => Some(QuizStage::AwaitingSignup),
            FlowState::ResultsUnlocked { .. } => Some(QuizStage::ResultsUnlocked),
            FlowState::Completed => Some(QuizStage::Completed),
        }
    }

    /// Snapshot written by the `PersistProgress` action, when applicable.
    pub fn progress_snapshot(&self) -> Option<QuizProgress> {
        match self {
            FlowState::InProgress { answers, .. } => Some(QuizProgress {
                answers: answers.clone(),
                stage: QuizStage::InProgress,
                account: None,
            }),
            FlowState::AwaitingSignup { answers, .. } => Some(QuizProgress {
                answers: answers.clone(),
                stage: QuizStage::AwaitingSignup,
                account: None,
            }),
            FlowState::ResultsUnlocked { account, .. } => Some(QuizProgress {
                answers: Vec::new(),
                stage: QuizStage::ResultsUnlocked,
                account: Some(account.clone()),
            }),
            FlowState::Idle | FlowState::Completed => None,
        }
    }

    /// The computed result, if this state carries one. Never exposed to the
    /// reveal surface before `ResultsUnlocked`; presentation code must go
    /// through [`ScreenDestination`](crate::flow::ScreenDestination) and the
    /// reveal signals instead of reading this directly.
    pub fn pending_result(&self) -> Option<&QuizResult> {
        match self {
            FlowState::AwaitingSignup { result, .. }
            | FlowState::ResultsUnlocked { result, .. } => Some(result),
            _ => None,
        }
    }
}
