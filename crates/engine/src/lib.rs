//! Expense logging engine.
//!
//! The engine logs expenses as rows of a spreadsheet and lets the user edit the
//! most recent one. See [`RecordStore`] for the row/identifier rules and
//! [`Engine`] for the per-user entry points used by the server and the admin
//! CLI.

use sea_orm::DatabaseConnection;

pub use amount::Amount;
pub use error::EngineError;
pub use fields::ExpenseFields;
pub use records::{DEFAULT_SHEET_NAME, ID_PROTECTION, RecordStore, find_record_row};
pub use sheets::{DbSheet, Sheet, SpreadsheetService, Spreadsheets};
pub use state::{COUNTER_KEY, LOCATION_KEY, UserProperties, UserState};

mod amount;
mod error;
pub mod extract;
pub mod fields;
mod records;
mod sheets;
mod spreadsheet_cells;
mod spreadsheets;
mod state;
mod user_properties;

type ResultEngine<T> = Result<T, EngineError>;

/// Spreadsheet base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://sheets.local";

#[derive(Debug)]
pub struct Engine {
    records: RecordStore<SpreadsheetService>,
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn records(&self) -> &RecordStore<SpreadsheetService> {
        &self.records
    }

    /// Persistent state scoped to `user_id`.
    pub fn user_state(&self, user_id: &str) -> UserProperties {
        UserProperties::new(self.database.clone(), user_id)
    }

    /// Log a new expense for `user_id` in the spreadsheet at `location`.
    pub async fn log_expense(
        &self,
        user_id: &str,
        location: &str,
        fields: &ExpenseFields,
    ) -> ResultEngine<u64> {
        let state = self.user_state(user_id);
        self.records.create(&state, location, fields).await
    }

    /// Overwrite the most recent expense of `user_id`.
    pub async fn edit_expense(&self, user_id: &str, fields: &ExpenseFields) -> ResultEngine<u64> {
        let state = self.user_state(user_id);
        self.records.edit(&state, fields).await
    }

    /// Next expense id of `user_id`.
    pub async fn expense_counter(&self, user_id: &str) -> ResultEngine<u64> {
        let state = self.user_state(user_id);
        self.records.counter(&state).await
    }

    /// Id of the expense an edit of `user_id` would target.
    pub async fn latest_expense(&self, user_id: &str) -> ResultEngine<Option<u64>> {
        let state = self.user_state(user_id);
        self.records.latest(&state).await
    }

    /// Spreadsheet currently targeted by `user_id`.
    pub async fn active_location(&self, user_id: &str) -> ResultEngine<Option<String>> {
        let state = self.user_state(user_id);
        self.records.active_location(&state).await
    }

    /// Provision a spreadsheet for expenses. Returns the name used and its URL.
    pub async fn new_spreadsheet(&self, name: Option<&str>) -> ResultEngine<(String, String)> {
        self.records.new_spreadsheet(name).await
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    base_url: Option<String>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Base URL spreadsheets are addressed under.
    pub fn base_url(mut self, base_url: &str) -> EngineBuilder {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let sheets = SpreadsheetService::new(self.database.clone(), base_url);
        Ok(Engine {
            records: RecordStore::new(sheets),
            database: self.database,
        })
    }
}
