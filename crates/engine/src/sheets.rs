//! Tabular store service.
//!
//! [`Spreadsheets`] opens or provisions a spreadsheet from its URL and hands
//! back a [`Sheet`] handle with row-level access. Rows and columns are 1-based
//! and a sheet's rows are contiguous from row 1 to [`Sheet::last_row`].
//!
//! [`SpreadsheetService`] is the database-backed implementation used by the
//! engine.

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, spreadsheet_cells, spreadsheets};

/// Opens and provisions spreadsheets.
#[async_trait]
pub trait Spreadsheets: Send + Sync {
    type Sheet: Sheet;

    /// Open the spreadsheet at `location`.
    ///
    /// Fails with [`EngineError::InvalidLocation`] when the URL is malformed
    /// or does not point to an existing spreadsheet.
    async fn open(&self, location: &str) -> ResultEngine<Self::Sheet>;

    /// Provision an empty spreadsheet and return its URL with a handle.
    async fn create(&self, name: &str) -> ResultEngine<(String, Self::Sheet)>;
}

/// Row-level access to one opened spreadsheet.
#[async_trait]
pub trait Sheet: Send + Sync {
    /// URL of the spreadsheet.
    fn location(&self) -> &str;

    /// Append `cells` below the last row, returning the new row index.
    async fn append_row(&self, cells: &[String]) -> ResultEngine<u32>;

    /// Index of the last non-empty row, `0` for an empty sheet.
    async fn last_row(&self) -> ResultEngine<u32>;

    async fn cell(&self, row: u32, col: u32) -> ResultEngine<Option<String>>;

    /// Overwrite `cells.len()` cells of `row` starting at `start_col`.
    async fn set_cells(&self, row: u32, start_col: u32, cells: &[String]) -> ResultEngine<()>;

    /// All cells of `row`, gaps filled with empty strings.
    async fn row(&self, row: u32) -> ResultEngine<Vec<String>>;

    async fn freeze_rows(&self, rows: u32) -> ResultEngine<()>;

    /// Mark `col` as protected. Protection is warning-only: writes still succeed.
    async fn protect_column(&self, col: u32, description: &str) -> ResultEngine<()>;
}

/// Database-backed spreadsheets, addressed as
/// `{base_url}/spreadsheets/d/{id}/edit`.
#[derive(Clone, Debug)]
pub struct SpreadsheetService {
    database: DatabaseConnection,
    base_url: String,
}

impl SpreadsheetService {
    pub fn new(database: DatabaseConnection, base_url: &str) -> Self {
        Self {
            database,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, id: Uuid) -> String {
        format!("{}/spreadsheets/d/{id}/edit", self.base_url)
    }

    fn parse_location(&self, location: &str) -> ResultEngine<Uuid> {
        let invalid = || EngineError::InvalidLocation(location.to_string());

        let rest = location
            .trim()
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix("/spreadsheets/d/"))
            .ok_or_else(invalid)?;
        let id = rest.split(['/', '?', '#']).next().unwrap_or_default();
        Uuid::parse_str(id).map_err(|_| invalid())
    }
}

#[async_trait]
impl Spreadsheets for SpreadsheetService {
    type Sheet = DbSheet;

    async fn open(&self, location: &str) -> ResultEngine<DbSheet> {
        let id = self.parse_location(location)?;
        let model = spreadsheets::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                tracing::warn!("spreadsheet {id} does not exist");
                EngineError::InvalidLocation(location.to_string())
            })?;

        Ok(DbSheet {
            database: self.database.clone(),
            id: model.id,
            url: model.url,
        })
    }

    async fn create(&self, name: &str) -> ResultEngine<(String, DbSheet)> {
        let id = Uuid::new_v4();
        let url = self.url_for(id);

        spreadsheets::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            name: ActiveValue::Set(name.to_string()),
            url: ActiveValue::Set(url.clone()),
            frozen_rows: ActiveValue::Set(0),
            protected_column: ActiveValue::Set(None),
            protection_description: ActiveValue::Set(None),
        }
        .insert(&self.database)
        .await?;
        tracing::info!("created spreadsheet \"{name}\" at {url}");

        let sheet = DbSheet {
            database: self.database.clone(),
            id: id.to_string(),
            url: url.clone(),
        };
        Ok((url, sheet))
    }
}

/// Handle on a spreadsheet stored in the database.
#[derive(Clone, Debug)]
pub struct DbSheet {
    database: DatabaseConnection,
    id: String,
    url: String,
}

fn stored_index(value: i64) -> ResultEngine<u32> {
    u32::try_from(value).map_err(|_| EngineError::CorruptState(format!("cell index {value}")))
}

fn upsert_cell() -> OnConflict {
    OnConflict::columns([
        spreadsheet_cells::Column::SpreadsheetId,
        spreadsheet_cells::Column::RowIndex,
        spreadsheet_cells::Column::ColIndex,
    ])
    .update_column(spreadsheet_cells::Column::Value)
    .to_owned()
}

impl DbSheet {
    fn cell_model(&self, row: u32, col: u32, value: &str) -> spreadsheet_cells::ActiveModel {
        spreadsheet_cells::ActiveModel {
            spreadsheet_id: ActiveValue::Set(self.id.clone()),
            row_index: ActiveValue::Set(i64::from(row)),
            col_index: ActiveValue::Set(i64::from(col)),
            value: ActiveValue::Set(value.to_string()),
        }
    }

    async fn last_row_in<C: ConnectionTrait>(&self, conn: &C) -> ResultEngine<u32> {
        let last = spreadsheet_cells::Entity::find()
            .filter(spreadsheet_cells::Column::SpreadsheetId.eq(self.id.clone()))
            .order_by_desc(spreadsheet_cells::Column::RowIndex)
            .one(conn)
            .await?;
        match last {
            Some(cell) => stored_index(cell.row_index),
            None => Ok(0),
        }
    }

    async fn update_spreadsheet(&self, model: spreadsheets::ActiveModel) -> ResultEngine<()> {
        model.update(&self.database).await?;
        Ok(())
    }
}

#[async_trait]
impl Sheet for DbSheet {
    fn location(&self) -> &str {
        &self.url
    }

    async fn append_row(&self, cells: &[String]) -> ResultEngine<u32> {
        if cells.is_empty() {
            return Err(EngineError::Precondition(
                "cannot append an empty row".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        let row = self.last_row_in(&db_tx).await? + 1;
        let models = cells
            .iter()
            .zip(1u32..)
            .map(|(value, col)| self.cell_model(row, col, value));
        spreadsheet_cells::Entity::insert_many(models)
            .exec_without_returning(&db_tx)
            .await?;
        db_tx.commit().await?;

        Ok(row)
    }

    async fn last_row(&self) -> ResultEngine<u32> {
        self.last_row_in(&self.database).await
    }

    async fn cell(&self, row: u32, col: u32) -> ResultEngine<Option<String>> {
        let cell = spreadsheet_cells::Entity::find_by_id((
            self.id.clone(),
            i64::from(row),
            i64::from(col),
        ))
        .one(&self.database)
        .await?;
        Ok(cell.map(|cell| cell.value))
    }

    async fn set_cells(&self, row: u32, start_col: u32, cells: &[String]) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;
        for (value, col) in cells.iter().zip(start_col..) {
            spreadsheet_cells::Entity::insert(self.cell_model(row, col, value))
                .on_conflict(upsert_cell())
                .exec_without_returning(&db_tx)
                .await?;
        }
        db_tx.commit().await?;
        Ok(())
    }

    async fn row(&self, row: u32) -> ResultEngine<Vec<String>> {
        let cells = spreadsheet_cells::Entity::find()
            .filter(spreadsheet_cells::Column::SpreadsheetId.eq(self.id.clone()))
            .filter(spreadsheet_cells::Column::RowIndex.eq(i64::from(row)))
            .order_by_asc(spreadsheet_cells::Column::ColIndex)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(cells.len());
        for cell in cells {
            let col = stored_index(cell.col_index)?.max(1) as usize;
            if col > out.len() {
                out.resize(col - 1, String::new());
            }
            out.push(cell.value);
        }
        Ok(out)
    }

    async fn freeze_rows(&self, rows: u32) -> ResultEngine<()> {
        let frozen = i32::try_from(rows)
            .map_err(|_| EngineError::Precondition(format!("cannot freeze {rows} rows")))?;
        self.update_spreadsheet(spreadsheets::ActiveModel {
            id: ActiveValue::Set(self.id.clone()),
            frozen_rows: ActiveValue::Set(frozen),
            ..Default::default()
        })
        .await
    }

    async fn protect_column(&self, col: u32, description: &str) -> ResultEngine<()> {
        let column = i32::try_from(col)
            .map_err(|_| EngineError::Precondition(format!("cannot protect column {col}")))?;
        self.update_spreadsheet(spreadsheets::ActiveModel {
            id: ActiveValue::Set(self.id.clone()),
            protected_column: ActiveValue::Set(Some(column)),
            protection_description: ActiveValue::Set(Some(description.to_string())),
            ..Default::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SpreadsheetService {
        SpreadsheetService::new(DatabaseConnection::default(), "https://sheets.test/")
    }

    #[test]
    fn url_round_trips_through_parse() {
        let service = service();
        let id = Uuid::new_v4();
        let url = service.url_for(id);
        assert_eq!(url, format!("https://sheets.test/spreadsheets/d/{id}/edit"));
        assert_eq!(service.parse_location(&url).unwrap(), id);
    }

    #[test]
    fn parse_accepts_urls_without_suffix() {
        let service = service();
        let id = Uuid::new_v4();
        let url = format!("https://sheets.test/spreadsheets/d/{id}?usp=sharing");
        assert_eq!(service.parse_location(&url).unwrap(), id);
    }

    #[test]
    fn parse_rejects_foreign_or_malformed_urls() {
        let service = service();
        for url in [
            "not a url",
            "https://elsewhere.test/spreadsheets/d/abc/edit",
            "https://sheets.test/spreadsheets/d/not-a-uuid/edit",
            "",
        ] {
            assert_eq!(
                service.parse_location(url).unwrap_err(),
                EngineError::InvalidLocation(url.to_string())
            );
        }
    }
}
