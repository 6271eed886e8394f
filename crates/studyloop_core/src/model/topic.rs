//! Topic and unit domain model.
//!
//! # Responsibility
//! - Define the records tracked by the content store.
//! - Keep completion state and study recency consistent per unit.
//!
//! # Invariants
//! - `Unit::completed` is `true` iff `Unit::last_studied` is set.
//! - `TopicId`/`UnitId` are stable and never reused for another record.
//! - Unit order inside a topic is insertion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a topic (project) inside the content store.
pub type TopicId = Uuid;

/// Stable identifier of a unit. Globally unique, not only inside its topic.
pub type UnitId = Uuid;

/// Composite address of one unit.
///
/// Mutations always resolve units through their parent topic, so the pair is
/// what callers pass around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub topic_id: TopicId,
    pub unit_id: UnitId,
}

impl UnitKey {
    pub fn new(topic_id: TopicId, unit_id: UnitId) -> Self {
        Self { topic_id, unit_id }
    }
}

/// Display projection of one unit together with its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRef {
    pub topic_id: TopicId,
    pub topic_name: String,
    pub unit_id: UnitId,
    pub unit_name: String,
}

impl UnitRef {
    pub fn new(topic: &Topic, unit: &Unit) -> Self {
        Self {
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            unit_id: unit.id,
            unit_name: unit.name.clone(),
        }
    }

    pub fn key(&self) -> UnitKey {
        UnitKey::new(self.topic_id, self.unit_id)
    }
}

/// Validation failures for unit records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitValidationError {
    /// Unit has a nil id.
    NilId,
    /// `completed` and `last_studied` disagree.
    CompletionMismatch { unit_id: UnitId, completed: bool },
    /// Estimate is present but zero.
    ZeroEstimate(UnitId),
}

impl Display for UnitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "unit id must not be nil"),
            Self::CompletionMismatch { unit_id, completed } => write!(
                f,
                "unit {unit_id} has completed={completed} but last_studied is {}",
                if *completed { "missing" } else { "set" }
            ),
            Self::ZeroEstimate(unit_id) => {
                write!(f, "unit {unit_id} has a zero-minute estimate")
            }
        }
    }
}

impl Error for UnitValidationError {}

/// One learnable piece of content ("chunk"/"component").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// 1-based position at creation time; display numbering only.
    pub ordinal: u32,
    pub name: String,
    pub completed: bool,
    pub last_studied: Option<DateTime<Utc>>,
    /// Positive minutes; `None` means no estimate was recorded.
    pub estimated_minutes: Option<u32>,
}

impl Unit {
    /// Creates a fresh, never-studied unit with a generated id.
    pub fn new(ordinal: u32, name: impl Into<String>, estimated_minutes: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ordinal,
            name: name.into(),
            completed: false,
            last_studied: None,
            estimated_minutes,
        }
    }

    /// Records a study pass at `at`.
    ///
    /// Writes `completed` and `last_studied` together. Re-studying keeps
    /// `completed` and moves `last_studied` forward to `at`.
    pub fn mark_studied(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.last_studied = Some(at);
    }

    /// Checks record invariants. Used on every persistence read.
    pub fn validate(&self) -> Result<(), UnitValidationError> {
        if self.id.is_nil() {
            return Err(UnitValidationError::NilId);
        }
        if self.completed != self.last_studied.is_some() {
            return Err(UnitValidationError::CompletionMismatch {
                unit_id: self.id,
                completed: self.completed,
            });
        }
        if self.estimated_minutes == Some(0) {
            return Err(UnitValidationError::ZeroEstimate(self.id));
        }
        Ok(())
    }
}

/// Named grouping of units ("project"/"topic").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub ordinal: u32,
    pub name: String,
    pub description: Option<String>,
    pub units: Vec<Unit>,
}

impl Topic {
    pub fn new(ordinal: u32, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ordinal,
            name: name.into(),
            description,
            units: Vec::new(),
        }
    }

    pub fn unit(&self, unit_id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == unit_id)
    }

    pub fn completed_count(&self) -> usize {
        self.units.iter().filter(|unit| unit.completed).count()
    }

    /// Completed fraction in `[0, 1]`; `0.0` when the topic has no units.
    pub fn progress(&self) -> f64 {
        if self.units.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.units.len() as f64
    }

    /// Progress rounded to a whole percentage.
    pub fn progress_percent(&self) -> u32 {
        (self.progress() * 100.0).round() as u32
    }
}
