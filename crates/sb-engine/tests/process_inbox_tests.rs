// Inbox processing against a scripted classifier

use rusqlite::Connection;
use sb_core::errors::{Result, SbError, SbErrorKind, SecondBrainError};
use sb_core::logging_facility::test_capture::init_test_capture;
use sb_core::routing::Aliases;
use sb_core::schema::{EVENT_END, EVENT_START};
use sb_engine::commands::process::{process_inbox, ProcessOptions, PREFIX_MODEL};
use sb_engine::Classifier;
use sb_store::SqliteRepo;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

const MODEL: &str = "test-model";

/// Replays canned responses in order; fails once they run out
struct ScriptedClassifier {
    responses: RefCell<VecDeque<Result<String>>>,
    calls: Cell<usize>,
}

impl ScriptedClassifier {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: Cell::new(0),
        }
    }

    fn replying(outputs: &[&str]) -> Self {
        Self::new(outputs.iter().map(|s| Ok(s.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Classifier for ScriptedClassifier {
    fn model(&self) -> &str {
        MODEL
    }

    fn classify(&self, prompt: &str) -> Result<String> {
        assert!(prompt.contains("User text:"), "prompt must carry the sorter instructions");
        self.calls.set(self.calls.get() + 1);
        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(SbError::from(SecondBrainError::ClassifierFailed {
                reason: "script exhausted".to_string(),
            }))
        })
    }
}

fn setup(captures: &[&str]) -> (Connection, Vec<i64>) {
    let mut conn = sb_store::db::open_in_memory().unwrap();
    sb_store::migrations::apply_migrations(&mut conn).unwrap();
    let ids = captures
        .iter()
        .map(|c| SqliteRepo::insert_inbox(&conn, c).unwrap())
        .collect();
    (conn, ids)
}

#[derive(Debug)]
struct InboxRow {
    status: String,
    category: Option<String>,
    confidence: Option<f64>,
    model: Option<String>,
    error: Option<String>,
}

fn inbox(conn: &Connection, id: i64) -> InboxRow {
    conn.query_row(
        "SELECT status, category, confidence, model, error FROM inbox WHERE id = ?1",
        [id],
        |r| {
            Ok(InboxRow {
                status: r.get(0)?,
                category: r.get(1)?,
                confidence: r.get(2)?,
                model: r.get(3)?,
                error: r.get(4)?,
            })
        },
    )
    .unwrap()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

fn events_for(conn: &Connection, id: i64) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare("SELECT event, details FROM log_events WHERE inbox_id = ?1 ORDER BY id")
        .unwrap();
    let rows = stmt
        .query_map([id], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<std::result::Result<Vec<(String, String)>, _>>()
        .unwrap();
    rows
}

#[test]
fn test_prefix_routes_without_classifier() {
    let (mut conn, ids) = setup(&[
        "Admin: renew passport",
        "project: paint the shed",
        "Ideas: solar kettle",
        "person: Sam",
    ]);
    let classifier = ScriptedClassifier::replying(&[]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(report.processed, 4);
    assert_eq!(report.needs_review, 0);
    assert_eq!(classifier.calls(), 0);

    for id in &ids {
        let row = inbox(&conn, *id);
        assert_eq!(row.status, "processed");
        assert_eq!(row.model.as_deref(), Some(PREFIX_MODEL));
        assert_eq!(row.confidence, Some(1.0));
        assert_eq!(row.error.as_deref(), Some(""));
    }
    assert_eq!(inbox(&conn, ids[1]).category.as_deref(), Some("projects"));

    let task: String = conn
        .query_row("SELECT task FROM admin", [], |r| r.get(0))
        .unwrap();
    assert_eq!(task, "renew passport");
    let (name, follow_up): (String, String) = conn
        .query_row("SELECT name, follow_up FROM people", [], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap();
    assert_eq!(name, "Sam");
    assert_eq!(follow_up, "person: Sam");

    assert_eq!(
        events_for(&conn, ids[0]),
        vec![("processed".to_string(), "prefix_route -> admin".to_string())]
    );
}

#[test]
fn test_empty_prefix_needs_review() {
    let (mut conn, ids) = setup(&["admin:"]);
    let classifier = ScriptedClassifier::replying(&[]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(report.needs_review, 1);
    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert_eq!(row.category.as_deref(), Some("admin"));
    assert_eq!(row.error.as_deref(), Some("empty after prefix"));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM admin"), 0);
    assert_eq!(
        events_for(&conn, ids[0]),
        vec![("needs_review".to_string(), "prefix admin but empty".to_string())]
    );
}

#[test]
fn test_prefixed_person_with_blank_alias_needs_review() {
    let (mut conn, ids) = setup(&["person: bob"]);
    let aliases = Aliases::from_map([("bob", "")]);

    let report = process_inbox(
        &mut conn,
        &ScriptedClassifier::replying(&[]),
        &aliases,
        &ProcessOptions::default(),
    )
    .unwrap();

    assert_eq!((report.processed, report.needs_review), (0, 1));
    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert_eq!(row.category.as_deref(), Some("people"));
    assert_eq!(row.confidence, Some(1.0));
    assert_eq!(row.model.as_deref(), Some(PREFIX_MODEL));
    assert_eq!(row.error.as_deref(), Some("missing person name"));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM people"), 0);
    assert_eq!(
        events_for(&conn, ids[0]),
        vec![(
            "needs_review".to_string(),
            "missing person name (prefix)".to_string()
        )]
    );
}

#[test]
fn test_classified_person_without_usable_name_needs_review() {
    let (mut conn, ids) = setup(&["call dad about the boat"]);
    let aliases = Aliases::from_map([("dad", " ")]);
    let classifier = ScriptedClassifier::replying(&[
        r#"{"category": "people", "confidence": 0.9, "fields": {"name": ""}}"#,
    ]);

    process_inbox(&mut conn, &classifier, &aliases, &ProcessOptions::default()).unwrap();

    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert_eq!(row.category.as_deref(), Some("people"));
    assert_eq!(row.confidence, Some(0.9));
    assert_eq!(row.error.as_deref(), Some("missing person name"));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM people"), 0);
}

#[test]
fn test_prefixed_person_resolves_alias() {
    let (mut conn, _) = setup(&["person: Mom"]);
    let aliases = Aliases::from_map([("mom", "Margaret")]);

    process_inbox(
        &mut conn,
        &ScriptedClassifier::replying(&[]),
        &aliases,
        &ProcessOptions::default(),
    )
    .unwrap();

    let name: String = conn
        .query_row("SELECT name FROM people", [], |r| r.get(0))
        .unwrap();
    assert_eq!(name, "Margaret");
}

#[test]
fn test_classifier_routes_project() {
    let (mut conn, ids) = setup(&["need to fix the fence before winter"]);
    let classifier = ScriptedClassifier::replying(&[
        r#"{"category": "projects", "confidence": 0.92, "title": "Fence",
            "fields": {"name": "Fix fence", "status": "waiting", "next_action": "buy posts"}}"#,
    ]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(report.processed, 1);
    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "processed");
    assert_eq!(row.category.as_deref(), Some("projects"));
    assert_eq!(row.confidence, Some(0.92));
    assert_eq!(row.model.as_deref(), Some(MODEL));

    let (name, status, next): (String, String, String) = conn
        .query_row("SELECT name, status, next_action FROM projects", [], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
        })
        .unwrap();
    assert_eq!((name.as_str(), status.as_str(), next.as_str()), ("Fix fence", "waiting", "buy posts"));

    let events = events_for(&conn, ids[0]);
    assert_eq!(events.len(), 1);
    assert!(events[0].1.starts_with("{\"category\": \"projects\", \"confidence\": 0.92"));
}

#[test]
fn test_invalid_json_is_retried() {
    let (mut conn, ids) = setup(&["some thought"]);
    let classifier = ScriptedClassifier::replying(&[
        "I think this is an idea",
        r#"Here: {"category": "ideas", "confidence": 0.8, "fields": {"title": "Some thought"}}"#,
    ]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(classifier.calls(), 2);
    assert_eq!(report.processed, 1);
    assert_eq!(inbox(&conn, ids[0]).category.as_deref(), Some("ideas"));
}

#[test]
fn test_exhausted_retries_needs_review_with_last_error() {
    let (mut conn, ids) = setup(&["gibberish"]);
    let classifier = ScriptedClassifier::replying(&["nope", "still nope", "never"]);
    let options = ProcessOptions {
        max_retries: 2,
        ..ProcessOptions::default()
    };

    let report = process_inbox(&mut conn, &classifier, &Aliases::default(), &options).unwrap();

    assert_eq!(classifier.calls(), 3);
    assert_eq!(report.needs_review, 1);
    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert_eq!(row.category, None);
    assert_eq!(row.model.as_deref(), Some(MODEL));
    assert_eq!(row.error.as_deref(), Some("invalid json (attempt 2)"));
}

#[test]
fn test_empty_object_replies_are_retried() {
    let (mut conn, ids) = setup(&["something vague"]);
    let classifier = ScriptedClassifier::replying(&["{}", "{ }", "Sure: {}"]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(classifier.calls(), 3);
    assert_eq!(report.needs_review, 1);
    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert_eq!(row.category, None);
    assert_eq!(row.confidence, None);
    assert_eq!(row.error.as_deref(), Some("invalid json (attempt 2)"));
    assert_eq!(
        events_for(&conn, ids[0]),
        vec![("needs_review".to_string(), "invalid json (attempt 2)".to_string())]
    );
}

#[test]
fn test_non_object_replies_are_retried() {
    let (mut conn, ids) = setup(&["something vague"]);
    let classifier = ScriptedClassifier::replying(&[
        "[1, 2]",
        "\"ideas\"",
        r#"{"category": "ideas", "confidence": 0.7, "fields": {"title": "Vague"}}"#,
    ]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(classifier.calls(), 3);
    assert_eq!(report.processed, 1);
    assert_eq!(inbox(&conn, ids[0]).category.as_deref(), Some("ideas"));
}

#[test]
fn test_database_error_names_inbox_row() {
    let (mut conn, ids) = setup(&["project: shed"]);
    conn.execute_batch("DROP TABLE projects;").unwrap();

    let err = process_inbox(
        &mut conn,
        &ScriptedClassifier::replying(&[]),
        &Aliases::default(),
        &ProcessOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), SbErrorKind::Persistence);
    assert_eq!(err.inbox_id(), Some(ids[0]));
    assert_eq!(inbox(&conn, ids[0]).status, "unprocessed");
}

#[test]
fn test_classifier_process_error_recorded() {
    let (mut conn, ids) = setup(&["gibberish"]);
    let classifier = ScriptedClassifier::new(vec![]);
    let options = ProcessOptions {
        max_retries: 0,
        ..ProcessOptions::default()
    };

    process_inbox(&mut conn, &classifier, &Aliases::default(), &options).unwrap();

    assert_eq!(classifier.calls(), 1);
    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert!(row.error.unwrap().contains("script exhausted"));
}

#[test]
fn test_low_confidence_and_unknown_category() {
    let (mut conn, ids) = setup(&["maybe a project?", "a recipe for soup"]);
    let classifier = ScriptedClassifier::replying(&[
        r#"{"category": "projects", "confidence": 0.3, "fields": {"name": "Maybe"}}"#,
        r#"{"category": "recipes", "confidence": 0.9}"#,
    ]);

    let report =
        process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
            .unwrap();

    assert_eq!(report.needs_review, 2);
    let low = inbox(&conn, ids[0]);
    assert_eq!(low.category.as_deref(), Some("projects"));
    assert_eq!(low.confidence, Some(0.3));
    assert_eq!(low.error.as_deref(), Some(""));

    let unknown = inbox(&conn, ids[1]);
    assert_eq!(unknown.category.as_deref(), Some("unknown"));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM projects"), 0);
}

#[test]
fn test_missing_admin_task_needs_review() {
    let (mut conn, ids) = setup(&["do the thing"]);
    let classifier = ScriptedClassifier::replying(&[
        r#"{"category": "admin", "confidence": 0.9, "fields": {"task": "  "}}"#,
    ]);

    process_inbox(&mut conn, &classifier, &Aliases::default(), &ProcessOptions::default())
        .unwrap();

    let row = inbox(&conn, ids[0]);
    assert_eq!(row.status, "needs_review");
    assert_eq!(row.category.as_deref(), Some("admin"));
    assert_eq!(row.error.as_deref(), Some("missing admin task"));
    assert_eq!(
        events_for(&conn, ids[0]),
        vec![("needs_review".to_string(), "missing admin task".to_string())]
    );
}

#[test]
fn test_limit_and_order() {
    let (mut conn, ids) = setup(&["idea: one", "idea: two", "idea: three"]);
    let options = ProcessOptions {
        limit: 2,
        ..ProcessOptions::default()
    };

    let report = process_inbox(
        &mut conn,
        &ScriptedClassifier::replying(&[]),
        &Aliases::default(),
        &options,
    )
    .unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(inbox(&conn, ids[0]).status, "processed");
    assert_eq!(inbox(&conn, ids[1]).status, "processed");
    assert_eq!(inbox(&conn, ids[2]).status, "unprocessed");
}

#[test]
fn test_every_handled_row_has_one_event() {
    let (mut conn, _) = setup(&["idea: a", "admin:", "unrouted text"]);
    let classifier = ScriptedClassifier::replying(&[]);
    let options = ProcessOptions {
        max_retries: 0,
        ..ProcessOptions::default()
    };

    process_inbox(&mut conn, &classifier, &Aliases::default(), &options).unwrap();

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM log_events"), 3);
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM inbox i WHERE (SELECT COUNT(*) FROM log_events e WHERE e.inbox_id = i.id) != 1"
        ),
        0
    );
}

#[test]
fn test_emits_boundary_events() {
    let capture = init_test_capture();
    let (mut conn, _) = setup(&["idea: logged"]);

    process_inbox(
        &mut conn,
        &ScriptedClassifier::replying(&[]),
        &Aliases::default(),
        &ProcessOptions::default(),
    )
    .unwrap();

    capture.assert_event_exists("process_inbox", EVENT_START);
    capture.assert_event_exists("process_inbox", EVENT_END);
}
