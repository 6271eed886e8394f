use chrono::{Duration, TimeZone, Utc};
use studyloop_core::{ContentStore, PlannerConfig, ReflectionDraft, StoreError, UnitKey};
use uuid::Uuid;

fn empty_store() -> ContentStore {
    ContentStore::new(&PlannerConfig::default())
}

#[test]
fn add_topic_appends_with_count_based_ordinal() {
    let mut store = empty_store();

    let first = store.add_topic("Rust").unwrap();
    let second = store.add_topic("  Databases  ").unwrap();

    let snapshot = store.snapshot();
    let topics: Vec<_> = snapshot.topics().collect();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].id, first);
    assert_eq!(topics[0].ordinal, 1);
    assert_eq!(topics[1].id, second);
    assert_eq!(topics[1].ordinal, 2);
    assert_eq!(topics[1].name, "Databases");
    assert!(topics[1].units.is_empty());
    assert_ne!(first, second);
}

#[test]
fn topic_description_is_absent_unless_given() {
    let mut store = empty_store();

    let bare = store.add_topic("Rust").unwrap();
    let blank = store
        .add_topic_with_description("SQL", Some("   "))
        .unwrap();
    let described = store
        .add_topic_with_description("Kafka", Some("  Streaming logs "))
        .unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.topic(bare).unwrap().description, None);
    assert_eq!(snapshot.topic(blank).unwrap().description, None);
    assert_eq!(
        snapshot.topic(described).unwrap().description.as_deref(),
        Some("Streaming logs")
    );
}

#[test]
fn blank_names_leave_store_unchanged() {
    let mut store = empty_store();
    let topic_id = store.add_topic("Rust").unwrap();
    let version = store.version();

    assert_eq!(
        store.add_topic("   ").unwrap_err(),
        StoreError::BlankInput("topic name")
    );
    assert_eq!(
        store.add_unit(topic_id, "\t\n").unwrap_err(),
        StoreError::BlankInput("unit name")
    );
    assert_eq!(store.version(), version);
    assert_eq!(store.snapshot().topics().len(), 1);
    assert_eq!(store.snapshot().total_units(), 0);
}

#[test]
fn add_unit_defaults_and_not_found() {
    let mut store = empty_store();
    let topic_id = store.add_topic("Rust").unwrap();

    let first = store.add_unit(topic_id, "Ownership").unwrap();
    let second = store.add_unit_with_estimate(topic_id, "Lifetimes", 15).unwrap();

    let snapshot = store.snapshot();
    let topic = snapshot.topic(topic_id).unwrap();
    assert_eq!(topic.units.len(), 2);
    let unit = topic.unit(first).unwrap();
    assert_eq!(unit.ordinal, 1);
    assert!(!unit.completed);
    assert_eq!(unit.last_studied, None);
    assert_eq!(unit.estimated_minutes, Some(5));
    assert_eq!(topic.unit(second).unwrap().ordinal, 2);
    assert_eq!(topic.unit(second).unwrap().estimated_minutes, Some(15));

    let missing = Uuid::new_v4();
    assert_eq!(
        store.add_unit(missing, "Orphan").unwrap_err(),
        StoreError::TopicNotFound(missing)
    );
    assert_eq!(
        store.add_unit_with_estimate(topic_id, "Zero", 0).unwrap_err(),
        StoreError::ZeroEstimate
    );
}

#[test]
fn mark_studied_is_idempotent_on_completed_and_refreshes_timestamp() {
    let mut store = empty_store();
    let topic_id = store.add_topic("Rust").unwrap();
    let unit_id = store.add_unit(topic_id, "Traits").unwrap();
    let other_id = store.add_unit(topic_id, "Macros").unwrap();
    let first = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();
    let second = first + Duration::days(2);

    store.mark_studied(topic_id, unit_id, first).unwrap();
    store.mark_studied(topic_id, unit_id, second).unwrap();

    let snapshot = store.snapshot();
    let topic = snapshot.topic(topic_id).unwrap();
    let unit = topic.unit(unit_id).unwrap();
    assert!(unit.completed);
    assert_eq!(unit.last_studied, Some(second));
    let other = topic.unit(other_id).unwrap();
    assert!(!other.completed);
    assert_eq!(other.last_studied, None);
}

#[test]
fn mark_studied_rejects_unit_from_another_topic() {
    let mut store = empty_store();
    let rust = store.add_topic("Rust").unwrap();
    let sql = store.add_topic("SQL").unwrap();
    let unit_id = store.add_unit(rust, "Traits").unwrap();
    let at = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();

    let err = store.mark_studied(sql, unit_id, at).unwrap_err();
    assert_eq!(err, StoreError::UnitNotFound(UnitKey::new(sql, unit_id)));
    assert!(!store.snapshot().topic(rust).unwrap().units[0].completed);
}

#[test]
fn old_snapshots_stay_readable_after_mutation() {
    let mut store = empty_store();
    let topic_id = store.add_topic("Rust").unwrap();
    let unit_id = store.add_unit(topic_id, "Traits").unwrap();
    let before = store.snapshot();

    store
        .mark_studied(topic_id, unit_id, Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap())
        .unwrap();

    assert!(!before.topic(topic_id).unwrap().units[0].completed);
    assert!(store.snapshot().topic(topic_id).unwrap().units[0].completed);
    assert_eq!(store.snapshot().version(), before.version() + 1);
}

#[test]
fn progress_stays_within_bounds() {
    let mut store = empty_store();
    let empty = store.add_topic("Empty").unwrap();
    let busy = store.add_topic("Busy").unwrap();
    let unit_a = store.add_unit(busy, "a").unwrap();
    store.add_unit(busy, "b").unwrap();
    store
        .mark_studied(busy, unit_a, Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap())
        .unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.topic(empty).unwrap().progress(), 0.0);
    for topic in snapshot.topics() {
        let progress = topic.progress();
        assert!((0.0..=1.0).contains(&progress));
    }
    assert_eq!(snapshot.overall_progress_percent(), 50);

    let rows = snapshot.topic_progress();
    assert_eq!(rows[0].percent, 0);
    assert_eq!(rows[1].completed, 1);
    assert_eq!(rows[1].total, 2);
    assert_eq!(rows[1].percent, 50);
}

#[test]
fn practice_journal_records_attempts_and_notes() {
    let mut store = empty_store();
    let topic_id = store.add_topic("Rust").unwrap();
    let unit_id = store.add_unit(topic_id, "Borrowing").unwrap();
    let key = UnitKey::new(topic_id, unit_id);
    let at = Utc.with_ymd_and_hms(2026, 4, 2, 20, 0, 0).unwrap();

    let card_id = store
        .add_quiz_card("What does &mut guarantee?", "Exclusive access", Some(key))
        .unwrap();
    store.record_quiz_attempt(card_id, true, at).unwrap();
    store.record_quiz_attempt(card_id, false, at).unwrap();
    store
        .add_elaboration("Like a write lock checked at compile time", Some(key), at)
        .unwrap();
    store
        .add_reflection(
            &ReflectionDraft {
                learned: "Reborrowing".to_string(),
                connections: Some("  ".to_string()),
                ..ReflectionDraft::default()
            },
            at,
        )
        .unwrap();

    let snapshot = store.snapshot();
    let card = snapshot.quiz_card(card_id).unwrap();
    assert_eq!(card.times_attempted, 2);
    assert_eq!(card.times_correct, 1);
    assert_eq!(card.accuracy_percent(), Some(50));
    assert_eq!(snapshot.elaborations().len(), 1);
    assert_eq!(snapshot.reflections()[0].connections, None);

    let missing = Uuid::new_v4();
    assert_eq!(
        store.record_quiz_attempt(missing, true, at).unwrap_err(),
        StoreError::QuizCardNotFound(missing)
    );
    assert_eq!(
        store.add_quiz_card("q", " ", None).unwrap_err(),
        StoreError::BlankInput("answer")
    );
    let dangling = UnitKey::new(topic_id, Uuid::new_v4());
    assert_eq!(
        store.add_elaboration("text", Some(dangling), at).unwrap_err(),
        StoreError::UnitNotFound(dangling)
    );
    assert_eq!(
        store
            .add_reflection(&ReflectionDraft::default(), at)
            .unwrap_err(),
        StoreError::BlankInput("reflection")
    );
}
