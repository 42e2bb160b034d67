//! Funds mutation endpoints.

use api_types::funds::{FundsChange, FundsTransfer};
use axum::{Json, extract::State, http::StatusCode};
use engine::Amount;

use crate::{ServerError, server::ServerState};

pub async fn add(
    State(state): State<ServerState>,
    Json(payload): Json<FundsChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .add(payload.user_id, Amount::new(payload.sum))
        .await?;
    Ok(StatusCode::OK)
}

pub async fn withdraw(
    State(state): State<ServerState>,
    Json(payload): Json<FundsChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .withdraw(payload.user_id, Amount::new(payload.sum))
        .await?;
    Ok(StatusCode::OK)
}

pub async fn transfer(
    State(state): State<ServerState>,
    Json(payload): Json<FundsTransfer>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .transfer(
            payload.user_id,
            payload.user_from_id,
            Amount::new(payload.sum),
        )
        .await?;
    Ok(StatusCode::OK)
}
