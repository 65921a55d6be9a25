use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{router, run_with_listener};

mod addon;
pub mod cards;
mod server;
mod user;

pub mod types {
    pub mod addon {
        pub use api_types::addon::{FormAction, MessageContext};
    }

    pub mod card {
        pub use api_types::card::{
            Button, Card, CardAction, CardHeader, OnClick, Section, Status, StatusKind, Widget,
        };
    }

    pub mod state {
        pub use api_types::state::ExpenseState;
    }
}

pub enum ServerError {
    Engine(EngineError),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Precondition(_) => StatusCode::CONFLICT,
        EngineError::Validation { .. }
        | EngineError::InvalidLocation(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::CorruptState(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::CorruptState(key) => {
            tracing::error!("corrupted user property {key}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let (status, error) = (status_for_engine_error(&err), message_for_engine_error(err));

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::RecordNotFound(3)).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_precondition_maps_to_409() {
        let res = ServerError::from(EngineError::Precondition("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation {
            field: "Date".to_string(),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let res = ServerError::from(EngineError::InvalidLocation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn corrupt_state_maps_to_500() {
        let res =
            ServerError::from(EngineError::CorruptState("EXPENSE_ID".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
