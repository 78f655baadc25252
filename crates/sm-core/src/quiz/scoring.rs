//! Scoring engine contract and the default weighted implementation.
//!
//! The flow treats scoring as a black box: a pure, deterministic function
//! from a complete answer sheet to a `(classification, score)` pair. The
//! authoritative score range is 0–100 inclusive; any smaller display scale
//! is a presentation concern.

use thiserror::Error;

use super::{Classification, QuizAnswer, QuizResult};

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 100;

/// Highest option index a question offers (options are 0-based).
const MAX_OPTION_WEIGHT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("quiz submitted with {answered} answers, {required} required")]
    TooFewAnswers { answered: usize, required: usize },
}

/// Black-box scoring contract.
///
/// Determinism is required: an interrupted flow may re-enter with the same
/// answer sheet, and recomputation must reproduce the stored result exactly.
pub trait ScoringEngine: Send + Sync {
    fn score(&self, answers: &[QuizAnswer], min_questions: usize)
        -> Result<QuizResult, ScoringError>;
}

/// Default engine: each selected option contributes its index as weight,
/// the total is normalized to 0–100 and mapped onto classification bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScoring;

impl WeightedScoring {
    fn classify(score: u8) -> Classification {
        match score {
            0..=19 => Classification::Doubter,
            20..=39 => Classification::Worrier,
            40..=59 => Classification::Perfectionist,
            60..=79 => Classification::Ruminator,
            _ => Classification::Overanalyzer,
        }
    }
}

impl ScoringEngine for WeightedScoring {
    fn score(
        &self,
        answers: &[QuizAnswer],
        min_questions: usize,
    ) -> Result<QuizResult, ScoringError> {
        if answers.len() < min_questions {
            return Err(ScoringError::TooFewAnswers {
                answered: answers.len(),
                required: min_questions,
            });
        }

        let raw: u32 = answers
            .iter()
            .map(|a| u32::from(a.option_id).min(MAX_OPTION_WEIGHT))
            .sum();
        let ceiling = answers.len() as u32 * MAX_OPTION_WEIGHT;

        // ceiling is non-zero because min_questions >= 1 is enforced above
        // only when min_questions > 0; guard the degenerate configuration.
        let score = if ceiling == 0 {
            MIN_SCORE
        } else {
            ((raw * u32::from(MAX_SCORE) + ceiling / 2) / ceiling) as u8
        };
        let score = score.clamp(MIN_SCORE, MAX_SCORE);

        Ok(QuizResult {
            classification: Self::classify(score),
            score,
        })
    }
}
