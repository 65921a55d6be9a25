//! Add-on API endpoints
//!
//! Domain failures never surface as HTTP errors here: they are rendered as an
//! `Error: ` status on the card the user is looking at. Only storage failures
//! and corrupted user state become error responses.

use api_types::{
    addon::{FormAction, MessageContext},
    card::Card,
    state::ExpenseState,
};
use axum::{Extension, Json, extract::State};
use engine::{
    EngineError, ExpenseFields,
    extract::{expense_description, largest_amount, received_date},
    fields::{SHEET_NAME, parse_create_form},
};

use crate::{
    ServerError,
    cards::{self, Prefills, STATUS_PARAM},
    server::ServerState,
    user,
};

const LOGGED: &str = "Logged expense successfully!";
const EDITED: &str = "Edited expense successfully!";

/// Turn a recoverable failure into a status string.
fn failure(err: EngineError) -> Result<String, ServerError> {
    match err {
        EngineError::Database(_) | EngineError::CorruptState(_) => Err(err.into()),
        other => {
            tracing::warn!("add-on action failed: {other}");
            Ok(cards::error_status(other))
        }
    }
}

async fn edit_card(
    state: &ServerState,
    username: &str,
    prefills: &Prefills,
    status: Option<&str>,
) -> Result<Json<Card>, ServerError> {
    let latest = state.engine.latest_expense(username).await?;
    let location = state.engine.active_location(username).await?;
    Ok(Json(cards::edit_card(
        prefills,
        status,
        latest,
        location.as_deref(),
    )))
}

async fn expenses_card(
    state: &ServerState,
    username: &str,
    prefills: &Prefills,
    status: Option<&str>,
) -> Result<Json<Card>, ServerError> {
    let counter = state.engine.expense_counter(username).await?;
    Ok(Json(cards::expenses_card(prefills, status, counter)))
}

/// Handle the opening of a message: prefill the expenses card from it.
pub async fn context(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<MessageContext>,
) -> Result<Json<Card>, ServerError> {
    let prefills = Prefills {
        date: Some(received_date(payload.date)),
        amount: largest_amount(&payload.body),
        description: Some(expense_description(&payload.from, &payload.subject)),
        spreadsheet_url: state.engine.active_location(&user.username).await?,
    };

    expenses_card(&state, &user.username, &prefills, None).await
}

/// Handle the submission of the expenses card
pub async fn submit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FormAction>,
) -> Result<Json<Card>, ServerError> {
    let mut prefills = Prefills::from_form(&payload.form_input);

    let logged = match parse_create_form(&payload.form_input) {
        Ok((location, fields)) => {
            state
                .engine
                .log_expense(&user.username, &location, &fields)
                .await
        }
        Err(err) => Err(err),
    };

    match logged {
        Ok(_) => edit_card(&state, &user.username, &prefills, Some(LOGGED)).await,
        Err(err) => {
            if matches!(err, EngineError::InvalidLocation(_)) {
                prefills.spreadsheet_url = None;
            }
            let status = failure(err)?;
            expenses_card(&state, &user.username, &prefills, Some(&status)).await
        }
    }
}

/// Handle the submission of the edit card
pub async fn edit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FormAction>,
) -> Result<Json<Card>, ServerError> {
    let prefills = Prefills::from_form(&payload.form_input);

    let edited = match ExpenseFields::from_form(&payload.form_input) {
        Ok(fields) => state.engine.edit_expense(&user.username, &fields).await,
        Err(err) => Err(err),
    };

    let status = match edited {
        Ok(_) => EDITED.to_string(),
        Err(err) => failure(err)?,
    };
    edit_card(&state, &user.username, &prefills, Some(&status)).await
}

/// Handle requests for provisioning a new expenses spreadsheet
pub async fn new_sheet(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FormAction>,
) -> Result<Json<Card>, ServerError> {
    let mut prefills = Prefills::from_form(&payload.form_input);
    let name = payload.form_input.get(SHEET_NAME).map(String::as_str);

    let status = match state.engine.new_spreadsheet(name).await {
        Ok((name, url)) => {
            prefills.spreadsheet_url = Some(url);
            format!("Created and linked the spreadsheet <i>{name}</i> for expenses!")
        }
        Err(err) => failure(err)?,
    };
    expenses_card(&state, &user.username, &prefills, Some(&status)).await
}

/// Re-render an empty expenses card, keeping the status
pub async fn clear(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FormAction>,
) -> Result<Json<Card>, ServerError> {
    let status = payload.parameters.get(STATUS_PARAM).map(String::as_str);
    expenses_card(&state, &user.username, &Prefills::default(), status).await
}

/// Re-render an empty edit card, keeping the status
pub async fn clear_edit(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FormAction>,
) -> Result<Json<Card>, ServerError> {
    let status = payload.parameters.get(STATUS_PARAM).map(String::as_str);
    edit_card(&state, &user.username, &Prefills::default(), status).await
}

/// Handle requests for the expense state of the user
pub async fn state(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ExpenseState>, ServerError> {
    Ok(Json(ExpenseState {
        counter: state.engine.expense_counter(&user.username).await?,
        active_location: state.engine.active_location(&user.username).await?,
    }))
}
