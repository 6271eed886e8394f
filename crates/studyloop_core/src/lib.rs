//! Core planning logic for studyloop.
//! This crate is the single source of truth for study-plan invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;
pub mod session;
pub mod store;

pub use config::{ConfigError, InterleavePool, PlannerConfig, DEFAULT_REVIEW_OFFSETS_DAYS};
pub use logging::{
    default_log_level, flush_logging, init_logging, init_stderr_logging, logging_status, LogSink,
    LoggingError,
};
pub use model::practice::{
    Elaboration, ElaborationId, QuizCard, QuizCardId, Reflection, ReflectionDraft, ReflectionId,
};
pub use model::topic::{Topic, TopicId, Unit, UnitId, UnitKey, UnitRef, UnitValidationError};
pub use repo::snapshot_repo::{
    MemorySnapshotRepository, RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository,
};
pub use schedule::{
    days_since, due_for_review, format_study_date, review_bucket, upcoming_sessions,
    DueReviewEntry, SessionEntry, SessionTag,
};
pub use service::planner_service::{Dashboard, PlannerService, ServiceError, ServiceResult};
pub use session::{
    mixed_session, pick_quiz_card, quick_wins, MixedSessionEntry, QuickWinEntry,
};
pub use store::{
    ContentStore, SnapshotParts, StoreError, StoreResult, StoreSnapshot, TopicProgress,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
