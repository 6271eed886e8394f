use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use studyloop_core::db::open_db_in_memory;
use studyloop_core::{
    ConfigError, MemorySnapshotRepository, PlannerConfig, PlannerService, ReflectionDraft,
    RepoError, RepoResult, ServiceError, SnapshotRepository, SqliteSnapshotRepository,
    StoreSnapshot,
};
use uuid::Uuid;

fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn open_memory_service() -> PlannerService<MemorySnapshotRepository> {
    PlannerService::open(MemorySnapshotRepository::new(), PlannerConfig::default()).unwrap()
}

/// Repository whose saves start failing once `fail` is set.
#[derive(Default)]
struct FlakyRepository {
    inner: MemorySnapshotRepository,
    fail: Cell<bool>,
}

impl SnapshotRepository for FlakyRepository {
    fn load(&self) -> RepoResult<Option<StoreSnapshot>> {
        self.inner.load()
    }

    fn save(&self, snapshot: &StoreSnapshot) -> RepoResult<()> {
        if self.fail.get() {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        self.inner.save(snapshot)
    }
}

#[test]
fn open_seeds_and_saves_an_empty_repository() {
    let service = open_memory_service();

    let snapshot = service.snapshot();
    assert_eq!(snapshot.topics().len(), 3);
    assert_eq!(snapshot.total_units(), 12);
    assert_eq!(snapshot.version(), 0);
    assert_eq!(service.repository().save_count(), 1);
}

#[test]
fn open_rejects_invalid_config() {
    let config = PlannerConfig {
        initial_spread_days: 0,
        ..PlannerConfig::default()
    };

    match PlannerService::open(MemorySnapshotRepository::new(), config) {
        Err(ServiceError::Config(err)) => assert_eq!(err, ConfigError::ZeroSpreadDays),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("invalid config should be rejected"),
    }
}

#[test]
fn accepted_mutations_are_saved() {
    let mut service = open_memory_service();

    let topic_id = service.add_topic("Statistics").unwrap().expect("added");
    let unit_id = service
        .add_unit_with_estimate(topic_id, "Bayes rule", 10)
        .unwrap()
        .expect("added");
    assert!(service.mark_studied_at(topic_id, unit_id, today()).unwrap());

    assert_eq!(service.repository().save_count(), 4);
    assert_eq!(service.snapshot().version(), 3);
    let stored = service.repository().load().unwrap().unwrap();
    assert_eq!(stored, *service.snapshot());
}

#[test]
fn rejected_mutations_are_ignored_without_saving() {
    let mut service = open_memory_service();
    let topic_id = service.add_topic("Statistics").unwrap().unwrap();
    let saves = service.repository().save_count();
    let version = service.snapshot().version();

    assert_eq!(service.add_topic("   ").unwrap(), None);
    assert_eq!(service.add_unit(Uuid::new_v4(), "Orphan").unwrap(), None);
    assert_eq!(service.add_unit(topic_id, "").unwrap(), None);
    assert_eq!(
        service.add_unit_with_estimate(topic_id, "Zero", 0).unwrap(),
        None
    );
    assert!(!service.mark_studied(topic_id, Uuid::new_v4()).unwrap());
    assert!(!service
        .record_quiz_attempt(Uuid::new_v4(), true, today())
        .unwrap());
    assert_eq!(
        service
            .add_reflection(&ReflectionDraft::default(), today())
            .unwrap(),
        None
    );

    assert_eq!(service.repository().save_count(), saves);
    assert_eq!(service.snapshot().version(), version);
}

#[test]
fn failed_save_rolls_back_the_mutation() {
    let mut service = PlannerService::open(FlakyRepository::default(), PlannerConfig::default())
        .unwrap();
    let before = service.snapshot();

    service.repository().fail.set(true);
    let err = service.add_topic("Never stored").unwrap_err();

    assert!(matches!(err, ServiceError::Repo(RepoError::InvalidData(_))));
    assert_eq!(*service.snapshot(), *before);

    service.repository().fail.set(false);
    assert!(service.add_topic("Stored").unwrap().is_some());
    assert_eq!(service.snapshot().version(), before.version() + 1);
}

#[test]
fn reopen_restores_saved_state_instead_of_seeding() {
    let mut service = open_memory_service();
    let topic_id = service.add_topic("Statistics").unwrap().unwrap();
    let saved = StoreSnapshot::clone(&service.snapshot());

    let reopened = PlannerService::open(
        MemorySnapshotRepository::with_snapshot(saved),
        PlannerConfig::default(),
    )
    .unwrap();

    assert_eq!(reopened.repository().save_count(), 0);
    assert_eq!(reopened.snapshot().topics().len(), 4);
    assert!(reopened.snapshot().topic(topic_id).is_some());
}

#[test]
fn sqlite_backed_service_persists_across_reopen() {
    let conn = open_db_in_memory().unwrap();
    let topic_id = {
        let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
        let mut service = PlannerService::open(repo, PlannerConfig::default()).unwrap();
        service.add_topic("Statistics").unwrap().unwrap()
    };

    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let service = PlannerService::open(repo, PlannerConfig::default()).unwrap();
    assert_eq!(service.snapshot().version(), 1);
    assert_eq!(service.snapshot().topic(topic_id).unwrap().name, "Statistics");
}

#[test]
fn journal_operations_flow_through_the_service() {
    let mut service = open_memory_service();
    let card_id = service
        .add_quiz_card("Define variance", "E[(X - mu)^2]", None)
        .unwrap()
        .unwrap();
    assert!(service.record_quiz_attempt(card_id, true, today()).unwrap());
    service
        .add_elaboration("Spread around the mean", None, today())
        .unwrap()
        .unwrap();

    let snapshot = service.snapshot();
    assert_eq!(snapshot.quiz_card(card_id).unwrap().accuracy_percent(), Some(100));
    assert_eq!(snapshot.elaborations().len(), 1);
}

#[test]
fn dashboard_truncates_previews_and_reports_totals() {
    let config = PlannerConfig {
        review_preview_limit: 1,
        calendar_preview_sessions: 2,
        ..PlannerConfig::default()
    };
    let mut service = PlannerService::open(MemorySnapshotRepository::new(), config).unwrap();
    let studied_at = today() - Duration::days(1);
    let first_units: Vec<_> = service
        .snapshot()
        .topics()
        .map(|topic| (topic.id, topic.units[0].id))
        .collect();
    for (topic_id, unit_id) in first_units {
        assert!(service.mark_studied_at(topic_id, unit_id, studied_at).unwrap());
    }

    let mut rng = StdRng::seed_from_u64(5);
    let dashboard = service.dashboard(today(), &mut rng);

    assert_eq!(dashboard.version, 3);
    assert_eq!(dashboard.total_units, 12);
    assert_eq!(dashboard.completed_units, 3);
    assert_eq!(dashboard.overall_progress_percent, 25);
    assert_eq!(dashboard.due_review_total, 3);
    assert_eq!(dashboard.due_reviews.len(), 1);
    assert_eq!(dashboard.upcoming_sessions.len(), 2);
    assert_eq!(dashboard.mixed_session.len(), 3);
    // Every topic still has one unfinished 5-minute unit.
    assert_eq!(dashboard.micro_wins.len(), 3);
    assert_eq!(dashboard.short_wins.len(), 9);

    let json = serde_json::to_value(&dashboard).unwrap();
    assert_eq!(json["upcoming_sessions"][0]["date"], "2026-03-02");
    assert_eq!(
        json["upcoming_sessions"][0]["tags"],
        serde_json::json!(["initial", "review-1"])
    );
    assert_eq!(json["topics"][0]["percent"], 25);
}
