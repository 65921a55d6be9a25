//! Expense records kept as spreadsheet rows.
//!
//! A record is a row whose first cell is the record id, followed by the
//! [`EXPENSE_FIELDS`] values. Ids come from a per-user counter stored under
//! [`COUNTER_KEY`]; the spreadsheet that received the last record is stored
//! under [`LOCATION_KEY`] and is the one every edit targets.
//!
//! Only the most recent record (`counter - 1`) can be edited. Nothing here is
//! atomic across calls: two concurrent creates for the same user can read the
//! same counter and append two rows carrying the same id.

use crate::{
    EngineError, ExpenseFields, ResultEngine,
    fields::{EXPENSE_FIELDS, ID_HEADER, SPREADSHEET_URL, non_empty},
    sheets::{Sheet, Spreadsheets},
    state::{COUNTER_KEY, LOCATION_KEY, UserState},
};

/// Name given to a provisioned spreadsheet when the user leaves it blank.
pub const DEFAULT_SHEET_NAME: &str = "Expenses";
/// Description attached to the protected id column.
pub const ID_PROTECTION: &str = "IDs Protected";

/// Maps the per-user id counter onto rows of a tabular store.
#[derive(Clone, Debug)]
pub struct RecordStore<S> {
    sheets: S,
}

impl<S: Spreadsheets> RecordStore<S> {
    pub fn new(sheets: S) -> Self {
        Self { sheets }
    }

    pub fn spreadsheets(&self) -> &S {
        &self.sheets
    }

    /// Next id to assign. An unset counter is initialized to `0`.
    pub async fn counter<U: UserState + ?Sized>(&self, state: &U) -> ResultEngine<u64> {
        match stored_counter(state).await? {
            Some(counter) => Ok(counter),
            None => {
                state.set(COUNTER_KEY, "0").await?;
                Ok(0)
            }
        }
    }

    /// Id of the most recent record, without initializing the counter.
    pub async fn latest<U: UserState + ?Sized>(&self, state: &U) -> ResultEngine<Option<u64>> {
        Ok(stored_counter(state)
            .await?
            .and_then(|counter| counter.checked_sub(1)))
    }

    /// URL of the spreadsheet that received the last record, if any.
    pub async fn active_location<U: UserState + ?Sized>(
        &self,
        state: &U,
    ) -> ResultEngine<Option<String>> {
        Ok(state
            .get(LOCATION_KEY)
            .await?
            .filter(|location| !location.trim().is_empty()))
    }

    /// Append a new record to the spreadsheet at `location` and make it the
    /// active one. Returns the assigned id.
    pub async fn create<U: UserState + ?Sized>(
        &self,
        state: &U,
        location: &str,
        fields: &ExpenseFields,
    ) -> ResultEngine<u64> {
        let location = non_empty(SPREADSHEET_URL, Some(location))?;
        let sheet = self.sheets.open(location).await?;

        let id = self.counter(state).await?;
        let next = id
            .checked_add(1)
            .ok_or_else(|| EngineError::CorruptState(COUNTER_KEY.to_string()))?;

        let mut cells = Vec::with_capacity(EXPENSE_FIELDS.len() + 1);
        cells.push(id.to_string());
        cells.extend(fields.cells());
        let row = sheet.append_row(&cells).await?;

        state.set(COUNTER_KEY, &next.to_string()).await?;
        state.set(LOCATION_KEY, location).await?;

        tracing::info!("logged expense {id} at row {row} of {}", sheet.location());
        Ok(id)
    }

    /// Overwrite the values of the most recent record. Returns its id.
    pub async fn edit<U: UserState + ?Sized>(
        &self,
        state: &U,
        fields: &ExpenseFields,
    ) -> ResultEngine<u64> {
        let target = self
            .latest(state)
            .await?
            .ok_or_else(|| EngineError::Precondition("no expense has been logged yet".to_string()))?;
        let location = self.active_location(state).await?.ok_or_else(|| {
            EngineError::Precondition("no spreadsheet has been linked yet".to_string())
        })?;

        let sheet = self.sheets.open(&location).await?;
        let row = find_record_row(&sheet, target)
            .await?
            .ok_or(EngineError::RecordNotFound(target))?;
        sheet.set_cells(row, 2, &fields.cells()).await?;

        tracing::info!("edited expense {target} at row {row} of {}", sheet.location());
        Ok(target)
    }

    /// Provision a spreadsheet ready to receive records: header row, frozen
    /// first row and a protected id column. Returns the name used and the URL.
    ///
    /// The new spreadsheet does not become the active one until a record is
    /// created in it.
    pub async fn new_spreadsheet(&self, name: Option<&str>) -> ResultEngine<(String, String)> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SHEET_NAME);

        let (url, sheet) = self.sheets.create(name).await?;
        let mut header = Vec::with_capacity(EXPENSE_FIELDS.len() + 1);
        header.push(ID_HEADER.to_string());
        header.extend(EXPENSE_FIELDS.iter().map(ToString::to_string));
        sheet.append_row(&header).await?;
        sheet.freeze_rows(1).await?;
        sheet.protect_column(1, ID_PROTECTION).await?;

        Ok((name.to_string(), url))
    }
}

async fn stored_counter<U: UserState + ?Sized>(state: &U) -> ResultEngine<Option<u64>> {
    match state.get(COUNTER_KEY).await? {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| EngineError::CorruptState(COUNTER_KEY.to_string())),
        None => Ok(None),
    }
}

/// Find the row holding record `id`, scanning from the last row upward.
///
/// When several rows carry the same id the bottom-most one wins.
pub async fn find_record_row<H: Sheet + ?Sized>(sheet: &H, id: u64) -> ResultEngine<Option<u32>> {
    for row in (1..=sheet.last_row().await?).rev() {
        if let Some(cell) = sheet.cell(row, 1).await?
            && cell.trim().parse::<u64>().ok() == Some(id)
        {
            return Ok(Some(row));
        }
    }
    Ok(None)
}
