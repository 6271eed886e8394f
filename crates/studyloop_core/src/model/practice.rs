//! Practice journal records for study techniques.
//!
//! # Responsibility
//! - Retrieval practice cards with attempt statistics.
//! - Elaboration notes and reflection journal entries.
//!
//! # Invariants
//! - `times_correct <= times_attempted` on every quiz card.
//! - `last_practiced` is set once `times_attempted > 0`.

use crate::model::topic::UnitKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type QuizCardId = Uuid;
pub type ElaborationId = Uuid;
pub type ReflectionId = Uuid;

/// Question/answer pair used for retrieval practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCard {
    pub id: QuizCardId,
    pub question: String,
    pub answer: String,
    pub related_unit: Option<UnitKey>,
    pub times_correct: u32,
    pub times_attempted: u32,
    pub last_practiced: Option<DateTime<Utc>>,
}

impl QuizCard {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        related_unit: Option<UnitKey>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            related_unit,
            times_correct: 0,
            times_attempted: 0,
            last_practiced: None,
        }
    }

    pub fn record_attempt(&mut self, correct: bool, at: DateTime<Utc>) {
        self.times_attempted = self.times_attempted.saturating_add(1);
        if correct {
            self.times_correct = self.times_correct.saturating_add(1);
        }
        self.last_practiced = Some(at);
    }

    /// Rounded share of correct answers, `None` before the first attempt.
    pub fn accuracy_percent(&self) -> Option<u32> {
        if self.times_attempted == 0 {
            return None;
        }
        let ratio = f64::from(self.times_correct) / f64::from(self.times_attempted);
        Some((ratio * 100.0).round() as u32)
    }
}

/// Free-form note connecting new material to prior knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elaboration {
    pub id: ElaborationId,
    pub text: String,
    pub related_unit: Option<UnitKey>,
    pub created_at: DateTime<Utc>,
}

/// Caller input for a reflection journal entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionDraft {
    /// What was learned. Required.
    pub learned: String,
    pub connections: Option<String>,
    pub open_questions: Option<String>,
    pub applications: Option<String>,
}

/// End-of-session reflection, combining retrieval and elaboration prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: ReflectionId,
    pub learned: String,
    pub connections: Option<String>,
    pub open_questions: Option<String>,
    pub applications: Option<String>,
    pub created_at: DateTime<Utc>,
}
