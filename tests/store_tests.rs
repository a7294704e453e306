use chrono::{TimeDelta, TimeZone, Utc};
use taskdeck::models::RecurrencePattern;
use taskdeck::store::{self, TaskStore};
use taskdeck::{Database, Task, TaskBoard};

#[test]
fn sqlite_store_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("taskdeck.db");
    let path = path.to_str().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap() + TimeDelta::milliseconds(250);

    let saved = {
        let mut board = TaskBoard::open(Database::new(path).unwrap(), "alice");
        board
            .add_recurring("Standup", now, RecurrencePattern::Weekly, 1, now)
            .unwrap();
        board.add_timer("Focus", 45, now).unwrap();
        board.tasks().to_vec()
    };

    let board = TaskBoard::open(Database::new(path).unwrap(), "alice");
    assert_eq!(board.tasks(), saved.as_slice());
}

#[test]
fn users_are_kept_apart() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut db = Database::open_in_memory().unwrap();
    store::save_tasks(&mut db, "alice", &[Task::new("alice", "Hers", now)]).unwrap();
    store::save_tasks(&mut db, "bob", &[Task::new("bob", "His", now)]).unwrap();

    assert_eq!(store::load_tasks(&db, "alice")[0].text, "Hers");
    assert_eq!(store::load_tasks(&db, "bob")[0].text, "His");
    assert!(store::load_tasks(&db, "carol").is_empty());
}

#[test]
fn persisted_json_uses_camel_case_and_iso_dates() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut db = Database::open_in_memory().unwrap();
    let task = Task::new("alice", "Plan trip", now).goal(now, now + TimeDelta::days(30));
    store::save_tasks(&mut db, "alice", &[task]).unwrap();

    let raw = db.get("tasks-alice").unwrap().unwrap();
    assert!(raw.contains("\"createdAt\":\"2024-03-01T00:00:00Z\""));
    assert!(raw.contains("\"goalEndDate\":\"2024-03-31T00:00:00Z\""));
    assert!(raw.contains("\"isGoal\":true"));
    assert!(raw.contains("\"userId\":\"alice\""));
}

#[test]
fn documents_written_by_other_clients_are_read() {
    let mut db = Database::open_in_memory().unwrap();
    db.set(
        "tasks-alice",
        r#"[{"id":"t1","text":"Stretch","completed":false,"createdAt":"2024-01-01T09:00:00.000Z",
            "userId":"alice","dueDate":"2024-01-02T00:00:00.000Z","isRecurring":true,
            "recurrencePattern":"daily","recurrenceInterval":"3"}]"#,
    )
    .unwrap();

    let tasks = store::load_tasks(&db, "alice");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].effective_interval(), 3);
    assert_eq!(tasks[0].recurrence_pattern, Some(RecurrencePattern::Daily));
}
