use std::collections::HashMap;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    COUNTER_KEY, Engine, EngineError, ExpenseFields, LOCATION_KEY, Sheet, Spreadsheets,
    UserState,
    fields::{self, parse_create_form},
};
use migration::MigratorTrait;

const BASE_URL: &str = "https://sheets.test";
const MISSING_ID: &str = "00000000-0000-4000-8000-000000000000";

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .base_url(BASE_URL)
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn expense(date: &str, amount: &str, description: &str) -> ExpenseFields {
    ExpenseFields::new(date, amount, description).unwrap()
}

async fn sheet(engine: &Engine, url: &str) -> engine::DbSheet {
    engine.records().spreadsheets().open(url).await.unwrap()
}

async fn rows(engine: &Engine, url: &str) -> Vec<Vec<String>> {
    let sheet = sheet(engine, url).await;
    let mut out = Vec::new();
    for row in 1..=sheet.last_row().await.unwrap() {
        out.push(sheet.row(row).await.unwrap());
    }
    out
}

/// A spreadsheet without the header row, so record `0` lands in row 1.
async fn blank_sheet(engine: &Engine) -> String {
    let (url, _) = engine.records().spreadsheets().create("Blank").await.unwrap();
    url
}

#[tokio::test]
async fn create_then_edit_round_trip() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    let id = engine
        .log_expense("alice", &url, &expense("2024-01-01", "$5.00", "coffee"))
        .await
        .unwrap();
    assert_eq!(id, 0);
    let opened = sheet(&engine, &url).await;
    assert_eq!(opened.location(), url);
    assert_eq!(
        opened.row(1).await.unwrap(),
        vec!["0", "2024-01-01", "$5.00", "coffee"]
    );

    let edited = engine
        .edit_expense("alice", &expense("2024-01-02", "$6.00", "lunch"))
        .await
        .unwrap();
    assert_eq!(edited, 0);
    assert_eq!(
        sheet(&engine, &url).await.row(1).await.unwrap(),
        vec!["0", "2024-01-02", "$6.00", "lunch"]
    );
}

#[tokio::test]
async fn ids_are_sequential_regardless_of_edits() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    let mut ids = Vec::new();
    for n in 0..4 {
        let id = engine
            .log_expense("alice", &url, &expense("1/1/2024", "$1.00", &format!("item {n}")))
            .await
            .unwrap();
        ids.push(id);
        engine
            .edit_expense("alice", &expense("1/2/2024", "$2.00", "edited"))
            .await
            .unwrap();
    }

    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(engine.expense_counter("alice").await.unwrap(), 4);

    let leading: Vec<String> = rows(&engine, &url)
        .await
        .into_iter()
        .map(|row| row[0].clone())
        .collect();
    assert_eq!(leading, vec!["0", "1", "2", "3"]);
}

#[tokio::test]
async fn edit_targets_latest_record_only() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    for description in ["first", "second"] {
        engine
            .log_expense("alice", &url, &expense("d", "$1.00", description))
            .await
            .unwrap();
    }
    engine
        .edit_expense("alice", &expense("d2", "$9.99", "changed"))
        .await
        .unwrap();

    assert_eq!(
        rows(&engine, &url).await,
        vec![
            vec!["0", "d", "$1.00", "first"],
            vec!["1", "d2", "$9.99", "changed"],
        ]
    );
}

#[tokio::test]
async fn edit_prefers_bottom_most_duplicate() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    for description in ["zero", "one"] {
        engine
            .log_expense("alice", &url, &expense("d", "$1.00", description))
            .await
            .unwrap();
    }
    let duplicate: Vec<String> = ["1", "d", "$1.00", "dup"].map(String::from).to_vec();
    sheet(&engine, &url).await.append_row(&duplicate).await.unwrap();

    engine
        .edit_expense("alice", &expense("d", "$3.00", "edited"))
        .await
        .unwrap();

    assert_eq!(
        rows(&engine, &url).await,
        vec![
            vec!["0", "d", "$1.00", "zero"],
            vec!["1", "d", "$1.00", "one"],
            vec!["1", "d", "$3.00", "edited"],
        ]
    );
}

#[tokio::test]
async fn edit_without_matching_row_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    engine
        .log_expense("alice", &url, &expense("d", "$1.00", "x"))
        .await
        .unwrap();
    // Counter out of sync with the spreadsheet.
    let state = engine.user_state("alice");
    state.set(COUNTER_KEY, "5").await.unwrap();
    let before = rows(&engine, &url).await;

    let err = engine
        .edit_expense("alice", &expense("d", "$2.00", "y"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::RecordNotFound(4));
    assert_eq!(rows(&engine, &url).await, before);
}

#[tokio::test]
async fn validation_failure_mutates_nothing() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    let form: HashMap<String, String> = [
        (fields::DATE, "1/1/2024"),
        (fields::AMOUNT, ""),
        (fields::DESCRIPTION, "coffee"),
        (fields::SPREADSHEET_URL, url.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(
        parse_create_form(&form).unwrap_err(),
        EngineError::Validation {
            field: fields::AMOUNT.to_string()
        }
    );

    let err = engine
        .log_expense("alice", "  ", &expense("d", "$1.00", "x"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation {
            field: fields::SPREADSHEET_URL.to_string()
        }
    );

    let state = engine.user_state("alice");
    assert_eq!(state.get(COUNTER_KEY).await.unwrap(), None);
    assert_eq!(state.get(LOCATION_KEY).await.unwrap(), None);
    assert!(rows(&engine, &url).await.is_empty());
}

#[tokio::test]
async fn invalid_location_mutates_nothing() {
    let (engine, _db) = engine_with_db().await;

    for location in [
        "https://elsewhere.test/spreadsheets/d/x/edit".to_string(),
        format!("{BASE_URL}/spreadsheets/d/{MISSING_ID}/edit"),
    ] {
        let err = engine
            .log_expense("alice", &location, &expense("d", "$1.00", "x"))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidLocation(location.clone()));
    }

    let state = engine.user_state("alice");
    assert_eq!(state.get(COUNTER_KEY).await.unwrap(), None);
    assert_eq!(engine.active_location("alice").await.unwrap(), None);
}

#[tokio::test]
async fn edit_before_any_create_is_a_precondition_error() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .edit_expense("alice", &expense("d", "$1.00", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Precondition(_)));
    assert_eq!(engine.user_state("alice").get(COUNTER_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn counter_is_initialized_on_first_read() {
    let (engine, _db) = engine_with_db().await;
    let state = engine.user_state("alice");

    assert_eq!(state.get(COUNTER_KEY).await.unwrap(), None);
    assert_eq!(engine.expense_counter("alice").await.unwrap(), 0);
    assert_eq!(state.get(COUNTER_KEY).await.unwrap().as_deref(), Some("0"));
}

#[tokio::test]
async fn counter_is_shared_across_spreadsheets() {
    let (engine, _db) = engine_with_db().await;
    let first = blank_sheet(&engine).await;
    let second = blank_sheet(&engine).await;

    engine
        .log_expense("alice", &first, &expense("d", "$1.00", "a"))
        .await
        .unwrap();
    let id = engine
        .log_expense("alice", &second, &expense("d", "$1.00", "b"))
        .await
        .unwrap();

    assert_eq!(id, 1);
    assert_eq!(
        engine.active_location("alice").await.unwrap().as_deref(),
        Some(second.as_str())
    );
    assert_eq!(rows(&engine, &second).await, vec![vec!["1", "d", "$1.00", "b"]]);
}

#[tokio::test]
async fn user_state_is_scoped_per_user() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;

    engine
        .log_expense("alice", &url, &expense("d", "$1.00", "a"))
        .await
        .unwrap();
    let bob_id = engine
        .log_expense("bob", &url, &expense("d", "$1.00", "b"))
        .await
        .unwrap();

    assert_eq!(bob_id, 0);
    assert_eq!(engine.expense_counter("alice").await.unwrap(), 1);
    assert_eq!(engine.expense_counter("bob").await.unwrap(), 1);
}

#[tokio::test]
async fn corrupted_counter_is_reported() {
    let (engine, _db) = engine_with_db().await;
    let url = blank_sheet(&engine).await;
    engine.user_state("alice").set(COUNTER_KEY, "abc").await.unwrap();

    let err = engine
        .log_expense("alice", &url, &expense("d", "$1.00", "x"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::CorruptState(COUNTER_KEY.to_string()));
    assert!(rows(&engine, &url).await.is_empty());
}

#[tokio::test]
async fn new_spreadsheet_has_header_and_protection() {
    let (engine, db) = engine_with_db().await;

    let (name, url) = engine.new_spreadsheet(Some("  ")).await.unwrap();
    assert_eq!(name, engine::DEFAULT_SHEET_NAME);
    assert_eq!(
        rows(&engine, &url).await,
        vec![vec!["Expense ID", "Date", "Amount", "Description"]]
    );

    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT frozen_rows, protected_column, protection_description \
             FROM spreadsheets WHERE url = ?",
            vec![url.clone().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<i32>("", "frozen_rows").unwrap(), 1);
    assert_eq!(row.try_get::<Option<i32>>("", "protected_column").unwrap(), Some(1));
    assert_eq!(
        row.try_get::<Option<String>>("", "protection_description")
            .unwrap()
            .as_deref(),
        Some(engine::ID_PROTECTION)
    );

    // Provisioning does not change the active spreadsheet.
    assert_eq!(engine.active_location("alice").await.unwrap(), None);

    let id = engine
        .log_expense("alice", &url, &expense("d", "$1.00", "x"))
        .await
        .unwrap();
    assert_eq!(id, 0);
    assert_eq!(
        sheet(&engine, &url).await.row(2).await.unwrap(),
        vec!["0", "d", "$1.00", "x"]
    );
}
