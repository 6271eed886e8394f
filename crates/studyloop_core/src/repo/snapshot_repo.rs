//! Snapshot persistence contracts and implementations.
//!
//! # Responsibility
//! - Load and save whole store snapshots through one small trait.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save` replaces the stored snapshot atomically.
//! - `load` rejects invalid persisted state instead of masking it.
//! - Topic, unit and journal order round-trips exactly.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::practice::{Elaboration, QuizCard, Reflection};
use crate::model::topic::{Topic, Unit, UnitKey, UnitValidationError};
use crate::store::{SnapshotParts, StoreSnapshot};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Validation(UnitValidationError),
    /// Connection schema is not the version this build writes.
    SchemaMismatch { found: u32, expected: u32 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::SchemaMismatch { found, expected } => write!(
                f,
                "snapshot schema version {found} does not match expected {expected}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::SchemaMismatch { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<UnitValidationError> for RepoError {
    fn from(value: UnitValidationError) -> Self {
        Self::Validation(value)
    }
}

/// External persistence collaborator for the content store.
pub trait SnapshotRepository {
    /// Returns the last saved snapshot, or `None` when nothing was saved.
    fn load(&self) -> RepoResult<Option<StoreSnapshot>>;
    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &StoreSnapshot) -> RepoResult<()>;
}

/// Process-local repository; keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    saved: RefCell<Option<StoreSnapshot>>,
    save_count: Cell<usize>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `snapshot` already stored.
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            saved: RefCell::new(Some(snapshot)),
            save_count: Cell::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.save_count.get()
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self) -> RepoResult<Option<StoreSnapshot>> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> RepoResult<()> {
        *self.saved.borrow_mut() = Some(snapshot.clone());
        self.save_count.set(self.save_count.get() + 1);
        Ok(())
    }
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `RepoError::SchemaMismatch` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let found = schema_version(conn)?;
        let expected = latest_version();
        if found != expected {
            return Err(RepoError::SchemaMismatch { found, expected });
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load(&self) -> RepoResult<Option<StoreSnapshot>> {
        let version = {
            let mut stmt = self
                .conn
                .prepare("SELECT version FROM store_meta WHERE id = 1;")?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => row.get::<_, i64>(0)?,
                None => return Ok(None),
            }
        };
        let version = u64::try_from(version)
            .map_err(|_| RepoError::InvalidData(format!("negative store version `{version}`")))?;

        let topics = self.load_topics()?;
        let quiz_cards = self.load_quiz_cards()?;
        let elaborations = self.load_elaborations()?;
        let reflections = self.load_reflections()?;

        let snapshot = StoreSnapshot::from_parts(SnapshotParts {
            version,
            topics,
            quiz_cards,
            elaborations,
            reflections,
        })?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM units;
             DELETE FROM topics;
             DELETE FROM quiz_cards;
             DELETE FROM elaborations;
             DELETE FROM reflections;",
        )?;

        for (position, topic) in snapshot.topics().enumerate() {
            tx.execute(
                "INSERT INTO topics (uuid, position, ordinal, name, description)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    topic.id.to_string(),
                    position as i64,
                    topic.ordinal,
                    topic.name.as_str(),
                    topic.description.as_deref(),
                ],
            )?;
            for (unit_position, unit) in topic.units.iter().enumerate() {
                tx.execute(
                    "INSERT INTO units (
                        uuid, topic_uuid, position, ordinal, name,
                        completed, last_studied, estimated_minutes
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        unit.id.to_string(),
                        topic.id.to_string(),
                        unit_position as i64,
                        unit.ordinal,
                        unit.name.as_str(),
                        i64::from(unit.completed),
                        unit.last_studied.map(timestamp_to_db),
                        unit.estimated_minutes,
                    ],
                )?;
            }
        }

        for (position, card) in snapshot.quiz_cards().iter().enumerate() {
            tx.execute(
                "INSERT INTO quiz_cards (
                    uuid, position, question, answer, related_topic_uuid,
                    related_unit_uuid, times_correct, times_attempted, last_practiced
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    card.id.to_string(),
                    position as i64,
                    card.question.as_str(),
                    card.answer.as_str(),
                    card.related_unit.map(|key| key.topic_id.to_string()),
                    card.related_unit.map(|key| key.unit_id.to_string()),
                    card.times_correct,
                    card.times_attempted,
                    card.last_practiced.map(timestamp_to_db),
                ],
            )?;
        }

        for (position, elaboration) in snapshot.elaborations().iter().enumerate() {
            tx.execute(
                "INSERT INTO elaborations (
                    uuid, position, text, related_topic_uuid, related_unit_uuid, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    elaboration.id.to_string(),
                    position as i64,
                    elaboration.text.as_str(),
                    elaboration.related_unit.map(|key| key.topic_id.to_string()),
                    elaboration.related_unit.map(|key| key.unit_id.to_string()),
                    timestamp_to_db(elaboration.created_at),
                ],
            )?;
        }

        for (position, reflection) in snapshot.reflections().iter().enumerate() {
            tx.execute(
                "INSERT INTO reflections (
                    uuid, position, learned, connections, open_questions,
                    applications, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    reflection.id.to_string(),
                    position as i64,
                    reflection.learned.as_str(),
                    reflection.connections.as_deref(),
                    reflection.open_questions.as_deref(),
                    reflection.applications.as_deref(),
                    timestamp_to_db(reflection.created_at),
                ],
            )?;
        }

        let version = i64::try_from(snapshot.version()).map_err(|_| {
            RepoError::InvalidData(format!("store version {} overflows", snapshot.version()))
        })?;
        tx.execute(
            "INSERT INTO store_meta (id, version, saved_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                version = excluded.version,
                saved_at = excluded.saved_at;",
            params![version, timestamp_to_db(Utc::now())],
        )?;

        tx.commit()?;
        Ok(())
    }
}

impl SqliteSnapshotRepository<'_> {
    fn load_topics(&self) -> RepoResult<Vec<Topic>> {
        let mut topics = Vec::new();
        let mut index_by_id = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT uuid, ordinal, name, description FROM topics ORDER BY position ASC;",
            )?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let id = parse_uuid(row, "uuid", "topics.uuid")?;
                index_by_id.insert(id, topics.len());
                topics.push(Topic {
                    id,
                    ordinal: row.get("ordinal")?,
                    name: row.get("name")?,
                    description: row.get("description")?,
                    units: Vec::new(),
                });
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT uuid, topic_uuid, ordinal, name, completed, last_studied, estimated_minutes
             FROM units
             ORDER BY topic_uuid ASC, position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let topic_id = parse_uuid(row, "topic_uuid", "units.topic_uuid")?;
            let index = *index_by_id.get(&topic_id).ok_or_else(|| {
                RepoError::InvalidData(format!("unit references unknown topic `{topic_id}`"))
            })?;
            let unit = Unit {
                id: parse_uuid(row, "uuid", "units.uuid")?,
                ordinal: row.get("ordinal")?,
                name: row.get("name")?,
                completed: parse_bool(row.get("completed")?, "units.completed")?,
                last_studied: parse_optional_timestamp(row, "last_studied", "units.last_studied")?,
                estimated_minutes: row.get("estimated_minutes")?,
            };
            unit.validate()?;
            topics[index].units.push(unit);
        }

        Ok(topics)
    }

    fn load_quiz_cards(&self) -> RepoResult<Vec<QuizCard>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, question, answer, related_topic_uuid, related_unit_uuid,
                    times_correct, times_attempted, last_practiced
             FROM quiz_cards
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(QuizCard {
                id: parse_uuid(row, "uuid", "quiz_cards.uuid")?,
                question: row.get("question")?,
                answer: row.get("answer")?,
                related_unit: parse_related_unit(row, "quiz_cards")?,
                times_correct: row.get("times_correct")?,
                times_attempted: row.get("times_attempted")?,
                last_practiced: parse_optional_timestamp(
                    row,
                    "last_practiced",
                    "quiz_cards.last_practiced",
                )?,
            });
        }
        Ok(cards)
    }

    fn load_elaborations(&self) -> RepoResult<Vec<Elaboration>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, text, related_topic_uuid, related_unit_uuid, created_at
             FROM elaborations
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut elaborations = Vec::new();
        while let Some(row) = rows.next()? {
            elaborations.push(Elaboration {
                id: parse_uuid(row, "uuid", "elaborations.uuid")?,
                text: row.get("text")?,
                related_unit: parse_related_unit(row, "elaborations")?,
                created_at: parse_timestamp(row.get("created_at")?, "elaborations.created_at")?,
            });
        }
        Ok(elaborations)
    }

    fn load_reflections(&self) -> RepoResult<Vec<Reflection>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, learned, connections, open_questions, applications, created_at
             FROM reflections
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut reflections = Vec::new();
        while let Some(row) = rows.next()? {
            reflections.push(Reflection {
                id: parse_uuid(row, "uuid", "reflections.uuid")?,
                learned: row.get("learned")?,
                connections: row.get("connections")?,
                open_questions: row.get("open_questions")?,
                applications: row.get("applications")?,
                created_at: parse_timestamp(row.get("created_at")?, "reflections.created_at")?,
            });
        }
        Ok(reflections)
    }
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(value: String, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| RepoError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

fn parse_optional_timestamp(
    row: &Row<'_>,
    name: &str,
    column: &str,
) -> RepoResult<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(name)?
        .map(|value| parse_timestamp(value, column))
        .transpose()
}

fn parse_uuid(row: &Row<'_>, name: &str, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(name)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn parse_optional_uuid(row: &Row<'_>, name: &str, column: &str) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(name)? {
        Some(text) => Uuid::parse_str(&text).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}"))
        }),
        None => Ok(None),
    }
}

fn parse_related_unit(row: &Row<'_>, table: &str) -> RepoResult<Option<UnitKey>> {
    let topic_id = parse_optional_uuid(
        row,
        "related_topic_uuid",
        &format!("{table}.related_topic_uuid"),
    )?;
    let unit_id = parse_optional_uuid(
        row,
        "related_unit_uuid",
        &format!("{table}.related_unit_uuid"),
    )?;
    match (topic_id, unit_id) {
        (Some(topic_id), Some(unit_id)) => Ok(Some(UnitKey::new(topic_id, unit_id))),
        (None, None) => Ok(None),
        _ => Err(RepoError::InvalidData(format!(
            "half-set related unit reference in {table}"
        ))),
    }
}

fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
