//! HTTP transport for the ledger engine.
//!
//! The transport decodes requests into engine calls and maps the
//! three-way outcome onto status codes: validation failures are 400s,
//! insufficient funds is 402, store failures are opaque 500s. The engine
//! itself never sees the network.

use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use serde::Serialize;

pub use rates::RatesClient;
pub use server::{run, run_with_listener, spawn_with_listener};

mod balance;
mod funds;
mod rates;
mod server;
mod transactions;

pub enum ServerError {
    Engine(EngineError),
    /// A malformed request the transport itself rejects (bad query
    /// params, unknown currency).
    Generic(String),
    /// An upstream failure whose detail is logged, not exposed.
    Internal(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidAmount(_)
        | EngineError::InvalidUser(_)
        | EngineError::WrongSortParam(_) => StatusCode::BAD_REQUEST,
        EngineError::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Internal(err) => {
                tracing::error!("{err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
