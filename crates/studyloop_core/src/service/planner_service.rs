//! Planner use-case service.
//!
//! # Responsibility
//! - Own the content store for one process and route every mutation.
//! - Persist accepted mutations through a `SnapshotRepository`.
//! - Assemble derived views (due reviews, calendar, practice sets) for a UI.
//!
//! # Invariants
//! - Rejected store mutations are logged and ignored, never surfaced as
//!   failures; callers see `Ok(None)` / `Ok(false)`.
//! - A mutation whose save fails is rolled back, so memory never runs ahead
//!   of the repository.
//! - Log lines carry ids, counts and codes only, never user text.

use crate::config::{ConfigError, PlannerConfig};
use crate::model::practice::{ElaborationId, QuizCardId, ReflectionDraft, ReflectionId};
use crate::model::topic::{TopicId, UnitId, UnitKey};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use crate::schedule::{due_for_review, upcoming_sessions, DueReviewEntry, SessionEntry};
use crate::session::{mixed_session, quick_wins, MixedSessionEntry, QuickWinEntry};
use crate::store::{ContentStore, StoreResult, StoreSnapshot, TopicProgress};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rand::Rng;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Config(ConfigError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid planner config: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Everything a dashboard screen shows, computed for one instant.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub version: u64,
    pub total_units: usize,
    pub completed_units: usize,
    pub overall_progress_percent: u32,
    pub topics: Vec<TopicProgress>,
    /// First `review_preview_limit` due entries.
    pub due_reviews: Vec<DueReviewEntry>,
    pub due_review_total: usize,
    /// First `calendar_preview_sessions` sessions.
    pub upcoming_sessions: Vec<SessionEntry>,
    pub micro_wins: Vec<QuickWinEntry>,
    pub short_wins: Vec<QuickWinEntry>,
    pub mixed_session: Vec<MixedSessionEntry>,
}

/// Service facade over the content store and a snapshot repository.
pub struct PlannerService<R: SnapshotRepository> {
    store: ContentStore,
    repo: R,
    config: PlannerConfig,
}

impl<R: SnapshotRepository> PlannerService<R> {
    /// Loads the stored snapshot, or seeds and saves a fresh one.
    ///
    /// # Errors
    /// - `ServiceError::Config` when `config` fails validation.
    /// - `ServiceError::Repo` when loading or the initial save fails.
    pub fn open(repo: R, config: PlannerConfig) -> ServiceResult<Self> {
        config.validate()?;

        let store = match repo.load()? {
            Some(snapshot) => {
                info!(
                    "event=planner_open module=service status=ok source=repository version={} topics={}",
                    snapshot.version(),
                    snapshot.topics().len()
                );
                ContentStore::from_snapshot(snapshot, &config)
            }
            None => {
                let store = ContentStore::seeded(&config);
                repo.save(&store.snapshot())?;
                info!(
                    "event=planner_open module=service status=ok source=seed topics={}",
                    store.snapshot().topics().len()
                );
                store
            }
        };

        Ok(Self {
            store,
            repo,
            config,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.store.snapshot()
    }

    pub fn add_topic(&mut self, name: &str) -> ServiceResult<Option<TopicId>> {
        self.apply("add_topic", |store| store.add_topic(name))
    }

    pub fn add_topic_with_description(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Option<TopicId>> {
        self.apply("add_topic", |store| {
            store.add_topic_with_description(name, description)
        })
    }

    pub fn add_unit(&mut self, topic_id: TopicId, name: &str) -> ServiceResult<Option<UnitId>> {
        self.apply("add_unit", |store| store.add_unit(topic_id, name))
    }

    pub fn add_unit_with_estimate(
        &mut self,
        topic_id: TopicId,
        name: &str,
        estimated_minutes: u32,
    ) -> ServiceResult<Option<UnitId>> {
        self.apply("add_unit", |store| {
            store.add_unit_with_estimate(topic_id, name, estimated_minutes)
        })
    }

    /// Marks a unit studied now. Returns `false` when the unit is unknown.
    pub fn mark_studied(&mut self, topic_id: TopicId, unit_id: UnitId) -> ServiceResult<bool> {
        self.mark_studied_at(topic_id, unit_id, Utc::now())
    }

    pub fn mark_studied_at(
        &mut self,
        topic_id: TopicId,
        unit_id: UnitId,
        at: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        self.apply("mark_studied", |store| store.mark_studied(topic_id, unit_id, at))
            .map(|applied| applied.is_some())
    }

    pub fn add_quiz_card(
        &mut self,
        question: &str,
        answer: &str,
        related_unit: Option<UnitKey>,
    ) -> ServiceResult<Option<QuizCardId>> {
        self.apply("add_quiz_card", |store| {
            store.add_quiz_card(question, answer, related_unit)
        })
    }

    pub fn record_quiz_attempt(
        &mut self,
        card_id: QuizCardId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> ServiceResult<bool> {
        self.apply("record_quiz_attempt", |store| {
            store.record_quiz_attempt(card_id, correct, at)
        })
        .map(|applied| applied.is_some())
    }

    pub fn add_elaboration(
        &mut self,
        text: &str,
        related_unit: Option<UnitKey>,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<ElaborationId>> {
        self.apply("add_elaboration", |store| {
            store.add_elaboration(text, related_unit, at)
        })
    }

    pub fn add_reflection(
        &mut self,
        draft: &ReflectionDraft,
        at: DateTime<Utc>,
    ) -> ServiceResult<Option<ReflectionId>> {
        self.apply("add_reflection", |store| store.add_reflection(draft, at))
    }

    pub fn due_for_review(&self, today: DateTime<Utc>) -> Vec<DueReviewEntry> {
        due_for_review(&self.snapshot(), today, &self.config.review_offsets_days)
    }

    pub fn upcoming_sessions(&self, today: DateTime<Utc>) -> Vec<SessionEntry> {
        upcoming_sessions(
            &self.snapshot(),
            today,
            &self.config.review_offsets_days,
            self.config.initial_spread_days,
        )
    }

    pub fn quick_wins(&self, max_minutes: u32) -> Vec<QuickWinEntry> {
        quick_wins(&self.snapshot(), max_minutes)
    }

    /// Samples an interleaved session from the configured pool.
    pub fn mixed_session<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec<MixedSessionEntry> {
        mixed_session(&self.snapshot(), self.config.interleave_pool, rng)
    }

    pub fn dashboard<G: Rng + ?Sized>(&self, today: DateTime<Utc>, rng: &mut G) -> Dashboard {
        let snapshot = self.snapshot();
        let config = &self.config;

        let mut due_reviews = due_for_review(&snapshot, today, &config.review_offsets_days);
        let due_review_total = due_reviews.len();
        due_reviews.truncate(config.review_preview_limit);

        let mut sessions = upcoming_sessions(
            &snapshot,
            today,
            &config.review_offsets_days,
            config.initial_spread_days,
        );
        sessions.truncate(config.calendar_preview_sessions);

        Dashboard {
            generated_at: today,
            version: snapshot.version(),
            total_units: snapshot.total_units(),
            completed_units: snapshot.completed_units(),
            overall_progress_percent: snapshot.overall_progress_percent(),
            topics: snapshot.topic_progress(),
            due_reviews,
            due_review_total,
            upcoming_sessions: sessions,
            micro_wins: quick_wins(&snapshot, config.micro_win_minutes),
            short_wins: quick_wins(&snapshot, config.short_win_minutes),
            mixed_session: mixed_session(&snapshot, config.interleave_pool, rng),
        }
    }

    fn apply<T>(
        &mut self,
        operation: &'static str,
        mutate: impl FnOnce(&mut ContentStore) -> StoreResult<T>,
    ) -> ServiceResult<Option<T>> {
        let previous = self.store.clone();
        let value = match mutate(&mut self.store) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=store_mutation module=service status=ignored op={} error_code={}",
                    operation,
                    err.code()
                );
                return Ok(None);
            }
        };

        if let Err(err) = self.repo.save(&self.store.snapshot()) {
            error!(
                "event=snapshot_save module=service status=error op={} version={} error={}",
                operation,
                self.store.version(),
                err
            );
            self.store = previous;
            return Err(err.into());
        }

        info!(
            "event=store_mutation module=service status=ok op={} version={}",
            operation,
            self.store.version()
        );
        Ok(Some(value))
    }
}
