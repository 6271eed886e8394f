//! Copy-on-write content store with versioned snapshots.
//!
//! # Responsibility
//! - Own every mutation of topics, units and the practice journal.
//! - Publish immutable snapshots that derived views are computed from.
//!
//! # Invariants
//! - A failed mutation leaves the current snapshot untouched.
//! - Each accepted mutation publishes a new snapshot with `version + 1`.
//! - Snapshots handed out earlier are never modified; they only go stale.
//! - Topics are shared between snapshots; a mutation clones only the topic
//!   it touches.

use crate::config::PlannerConfig;
use crate::model::practice::{
    Elaboration, ElaborationId, QuizCard, QuizCardId, Reflection, ReflectionDraft, ReflectionId,
};
use crate::model::topic::{Topic, TopicId, Unit, UnitId, UnitKey, UnitValidationError};
use crate::store::seed::seed_topics;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejected store mutation. The store is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Name or text input is empty after trim; carries the field name.
    BlankInput(&'static str),
    /// Explicit estimate of zero minutes.
    ZeroEstimate,
    TopicNotFound(TopicId),
    UnitNotFound(UnitKey),
    QuizCardNotFound(QuizCardId),
}

impl StoreError {
    /// Stable code for metadata-only log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlankInput(_) => "blank_input",
            Self::ZeroEstimate => "zero_estimate",
            Self::TopicNotFound(_) => "topic_not_found",
            Self::UnitNotFound(_) => "unit_not_found",
            Self::QuizCardNotFound(_) => "quiz_card_not_found",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TopicNotFound(_) | Self::UnitNotFound(_) | Self::QuizCardNotFound(_)
        )
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankInput(field) => write!(f, "{field} must not be blank"),
            Self::ZeroEstimate => write!(f, "estimated minutes must be >= 1"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::UnitNotFound(key) => {
                write!(f, "unit not found: {} in topic {}", key.unit_id, key.topic_id)
            }
            Self::QuizCardNotFound(id) => write!(f, "quiz card not found: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Per-topic progress row for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicProgress {
    pub topic_id: TopicId,
    pub name: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

/// Owned parts used to rebuild a snapshot, e.g. from persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotParts {
    pub version: u64,
    pub topics: Vec<Topic>,
    pub quiz_cards: Vec<QuizCard>,
    pub elaborations: Vec<Elaboration>,
    pub reflections: Vec<Reflection>,
}

/// Immutable view of the whole store at one version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    version: u64,
    topics: Vec<Arc<Topic>>,
    quiz_cards: Arc<Vec<QuizCard>>,
    elaborations: Arc<Vec<Elaboration>>,
    reflections: Arc<Vec<Reflection>>,
}

impl StoreSnapshot {
    /// Rebuilds a snapshot, validating every unit.
    pub fn from_parts(parts: SnapshotParts) -> Result<Self, UnitValidationError> {
        for topic in &parts.topics {
            for unit in &topic.units {
                unit.validate()?;
            }
        }

        Ok(Self {
            version: parts.version,
            topics: parts.topics.into_iter().map(Arc::new).collect(),
            quiz_cards: Arc::new(parts.quiz_cards),
            elaborations: Arc::new(parts.elaborations),
            reflections: Arc::new(parts.reflections),
        })
    }

    /// Version token; bumps on every accepted mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn topics(&self) -> impl ExactSizeIterator<Item = &Topic> + '_ {
        self.topics.iter().map(|topic| topic.as_ref())
    }

    pub fn topic(&self, topic_id: TopicId) -> Option<&Topic> {
        self.topics().find(|topic| topic.id == topic_id)
    }

    /// Resolves a unit through its parent topic.
    pub fn unit(&self, key: UnitKey) -> Option<(&Topic, &Unit)> {
        let topic = self.topic(key.topic_id)?;
        let unit = topic.unit(key.unit_id)?;
        Some((topic, unit))
    }

    pub fn quiz_cards(&self) -> &[QuizCard] {
        &self.quiz_cards
    }

    pub fn quiz_card(&self, card_id: QuizCardId) -> Option<&QuizCard> {
        self.quiz_cards.iter().find(|card| card.id == card_id)
    }

    pub fn elaborations(&self) -> &[Elaboration] {
        &self.elaborations
    }

    pub fn reflections(&self) -> &[Reflection] {
        &self.reflections
    }

    pub fn total_units(&self) -> usize {
        self.topics().map(|topic| topic.units.len()).sum()
    }

    pub fn completed_units(&self) -> usize {
        self.topics().map(Topic::completed_count).sum()
    }

    /// Rounded percentage of completed units across all topics.
    pub fn overall_progress_percent(&self) -> u32 {
        let total = self.total_units();
        if total == 0 {
            return 0;
        }
        (self.completed_units() as f64 / total as f64 * 100.0).round() as u32
    }

    pub fn topic_progress(&self) -> Vec<TopicProgress> {
        self.topics()
            .map(|topic| TopicProgress {
                topic_id: topic.id,
                name: topic.name.clone(),
                completed: topic.completed_count(),
                total: topic.units.len(),
                percent: topic.progress_percent(),
            })
            .collect()
    }

    fn topic_slot_mut(&mut self, topic_id: TopicId) -> StoreResult<&mut Topic> {
        self.topics
            .iter_mut()
            .find(|topic| topic.id == topic_id)
            .map(Arc::make_mut)
            .ok_or(StoreError::TopicNotFound(topic_id))
    }

    #[cfg(test)]
    fn shares_topic_with(&self, other: &StoreSnapshot, topic_id: TopicId) -> bool {
        let find = |snapshot: &StoreSnapshot| {
            snapshot
                .topics
                .iter()
                .find(|topic| topic.id == topic_id)
                .cloned()
        };
        match (find(self), find(other)) {
            (Some(left), Some(right)) => Arc::ptr_eq(&left, &right),
            _ => false,
        }
    }
}

/// Mutable handle over the current snapshot.
#[derive(Debug, Clone)]
pub struct ContentStore {
    current: Arc<StoreSnapshot>,
    default_estimated_minutes: u32,
}

impl ContentStore {
    /// Creates an empty store.
    pub fn new(config: &PlannerConfig) -> Self {
        Self::from_snapshot(StoreSnapshot::default(), config)
    }

    /// Creates a store holding the built-in example projects.
    pub fn seeded(config: &PlannerConfig) -> Self {
        let snapshot = StoreSnapshot {
            topics: seed_topics().into_iter().map(Arc::new).collect(),
            ..StoreSnapshot::default()
        };
        Self::from_snapshot(snapshot, config)
    }

    pub fn from_snapshot(snapshot: StoreSnapshot, config: &PlannerConfig) -> Self {
        Self {
            current: Arc::new(snapshot),
            default_estimated_minutes: config.default_estimated_minutes.max(1),
        }
    }

    /// Returns the current snapshot. Cheap; shares storage with the store.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    /// Appends a topic without description.
    pub fn add_topic(&mut self, name: &str) -> StoreResult<TopicId> {
        self.add_topic_with_description(name, None)
    }

    /// Appends a topic; `ordinal` is the topic count before insertion + 1.
    pub fn add_topic_with_description(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> StoreResult<TopicId> {
        let name = non_blank(name, "topic name")?;
        let description = description
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let mut next = StoreSnapshot::clone(&self.current);
        let topic = Topic::new(next_ordinal(next.topics.len()), name, description);
        let topic_id = topic.id;
        next.topics.push(Arc::new(topic));
        self.commit(next, "add_topic");
        Ok(topic_id)
    }

    /// Appends a unit with the configured default estimate.
    pub fn add_unit(&mut self, topic_id: TopicId, name: &str) -> StoreResult<UnitId> {
        self.add_unit_with_estimate(topic_id, name, self.default_estimated_minutes)
    }

    pub fn add_unit_with_estimate(
        &mut self,
        topic_id: TopicId,
        name: &str,
        estimated_minutes: u32,
    ) -> StoreResult<UnitId> {
        let name = non_blank(name, "unit name")?;
        if estimated_minutes == 0 {
            return Err(StoreError::ZeroEstimate);
        }

        let mut next = StoreSnapshot::clone(&self.current);
        let topic = next.topic_slot_mut(topic_id)?;
        let unit = Unit::new(
            next_ordinal(topic.units.len()),
            name,
            Some(estimated_minutes),
        );
        let unit_id = unit.id;
        topic.units.push(unit);
        self.commit(next, "add_unit");
        Ok(unit_id)
    }

    /// Marks a unit studied at `at`. Idempotent on `completed`; always
    /// refreshes `last_studied`.
    pub fn mark_studied(
        &mut self,
        topic_id: TopicId,
        unit_id: UnitId,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let key = UnitKey::new(topic_id, unit_id);
        if self.current.unit(key).is_none() {
            return Err(StoreError::UnitNotFound(key));
        }

        let mut next = StoreSnapshot::clone(&self.current);
        let topic = next.topic_slot_mut(topic_id)?;
        let unit = topic
            .units
            .iter_mut()
            .find(|unit| unit.id == unit_id)
            .ok_or(StoreError::UnitNotFound(key))?;
        unit.mark_studied(at);
        self.commit(next, "mark_studied");
        Ok(())
    }

    pub fn add_quiz_card(
        &mut self,
        question: &str,
        answer: &str,
        related_unit: Option<UnitKey>,
    ) -> StoreResult<QuizCardId> {
        let question = non_blank(question, "question")?;
        let answer = non_blank(answer, "answer")?;
        self.ensure_unit(related_unit)?;

        let mut next = StoreSnapshot::clone(&self.current);
        let card = QuizCard::new(question, answer, related_unit);
        let card_id = card.id;
        Arc::make_mut(&mut next.quiz_cards).push(card);
        self.commit(next, "add_quiz_card");
        Ok(card_id)
    }

    pub fn record_quiz_attempt(
        &mut self,
        card_id: QuizCardId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut next = StoreSnapshot::clone(&self.current);
        let card = Arc::make_mut(&mut next.quiz_cards)
            .iter_mut()
            .find(|card| card.id == card_id)
            .ok_or(StoreError::QuizCardNotFound(card_id))?;
        card.record_attempt(correct, at);
        self.commit(next, "record_quiz_attempt");
        Ok(())
    }

    pub fn add_elaboration(
        &mut self,
        text: &str,
        related_unit: Option<UnitKey>,
        at: DateTime<Utc>,
    ) -> StoreResult<ElaborationId> {
        let text = non_blank(text, "elaboration text")?;
        self.ensure_unit(related_unit)?;

        let mut next = StoreSnapshot::clone(&self.current);
        let elaboration = Elaboration {
            id: Uuid::new_v4(),
            text: text.to_string(),
            related_unit,
            created_at: at,
        };
        let elaboration_id = elaboration.id;
        Arc::make_mut(&mut next.elaborations).push(elaboration);
        self.commit(next, "add_elaboration");
        Ok(elaboration_id)
    }

    pub fn add_reflection(
        &mut self,
        draft: &ReflectionDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<ReflectionId> {
        let learned = non_blank(&draft.learned, "reflection")?;
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        let mut next = StoreSnapshot::clone(&self.current);
        let reflection = Reflection {
            id: Uuid::new_v4(),
            learned: learned.to_string(),
            connections: optional(&draft.connections),
            open_questions: optional(&draft.open_questions),
            applications: optional(&draft.applications),
            created_at: at,
        };
        let reflection_id = reflection.id;
        Arc::make_mut(&mut next.reflections).push(reflection);
        self.commit(next, "add_reflection");
        Ok(reflection_id)
    }

    fn ensure_unit(&self, key: Option<UnitKey>) -> StoreResult<()> {
        match key {
            Some(key) if self.current.unit(key).is_none() => Err(StoreError::UnitNotFound(key)),
            _ => Ok(()),
        }
    }

    fn commit(&mut self, mut next: StoreSnapshot, operation: &str) {
        next.version = self.current.version + 1;
        debug!(
            "event=store_commit module=store status=ok op={} version={}",
            operation, next.version
        );
        self.current = Arc::new(next);
    }
}

fn non_blank<'a>(value: &'a str, field: &'static str) -> StoreResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::BlankInput(field));
    }
    Ok(trimmed)
}

fn next_ordinal(existing: usize) -> u32 {
    u32::try_from(existing).map_or(u32::MAX, |count| count.saturating_add(1))
}
