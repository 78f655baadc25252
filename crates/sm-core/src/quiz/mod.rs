//! Quiz domain models
//!
//! This module defines the records the onboarding quiz persists across
//! restarts: the in-flight answer sheet and the computed-but-unrevealed
//! result. Both are serialized as JSON by the infrastructure layer.

mod scoring;

pub use scoring::{ScoringEngine, ScoringError, WeightedScoring, MAX_SCORE, MIN_SCORE};

use serde::{Deserialize, Serialize};

use crate::account::AccountRef;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: u16,
    pub option_id: u8,
}

impl QuizAnswer {
    pub fn new(question_id: u16, option_id: u8) -> Self {
        Self {
            question_id,
            option_id,
        }
    }
}

/// Stage of the onboarding flow persisted across app restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStage {
    InProgress,
    AwaitingSignup,
    ResultsUnlocked,
    Completed,
}

/// In-flight quiz progress.
///
/// Created on the first answer, rewritten on every answer and stage change,
/// cleared when the flow completes. `account` is only set once signup has
/// succeeded, so a relaunch at `ResultsUnlocked` can still upload the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub answers: Vec<QuizAnswer>,
    pub stage: QuizStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountRef>,
}

impl QuizProgress {
    /// Record a selection. A re-answer of an already-answered question
    /// replaces the previous selection; otherwise the answer is appended.
    pub fn record_answer(answers: &mut Vec<QuizAnswer>, answer: QuizAnswer) {
        match answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => existing.option_id = answer.option_id,
            None => answers.push(answer),
        }
    }
}

/// The closed set of overthinker types the scoring engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Doubter,
    Worrier,
    Perfectionist,
    Ruminator,
    Overanalyzer,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Doubter => "doubter",
            Classification::Worrier => "worrier",
            Classification::Perfectionist => "perfectionist",
            Classification::Ruminator => "ruminator",
            Classification::Overanalyzer => "overanalyzer",
        }
    }
}

/// Computed quiz outcome.
///
/// Exists only once the answer sheet satisfies the minimum-question
/// threshold. Held locally, unrevealed, until an account exists; uploaded
/// and discarded when the flow completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub classification: Classification,
    /// Always within `[MIN_SCORE, MAX_SCORE]` (0–100 inclusive).
    pub score: u8,
}

/// The persisted pending-result record.
///
/// Carries the answer sheet the result was scored from. A stored result is
/// only reusable while the sheet is unchanged; after a crash the user can
/// still re-answer questions, and a result computed from the old sheet must
/// not survive that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResult {
    pub answers: Vec<QuizAnswer>,
    pub result: QuizResult,
}

impl PendingResult {
    pub fn matches_answers(&self, answers: &[QuizAnswer]) -> bool {
        self.answers == answers
    }
}
