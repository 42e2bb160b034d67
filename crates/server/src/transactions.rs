//! Transaction history endpoint.

use api_types::transaction::{HistoryParams, Operation, TransactionView, TransactionsGet};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};

use crate::{ServerError, server::ServerState};

fn map_operation(op: engine::OperationKind) -> Operation {
    match op {
        engine::OperationKind::Add => Operation::Add,
        engine::OperationKind::Withdraw => Operation::Withdraw,
        engine::OperationKind::Transfer => Operation::Transfer,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<HistoryParams>,
    Json(payload): Json<TransactionsGet>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let since = params
        .since
        .as_deref()
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| ServerError::Generic("bad since query param".to_string()))
        })
        .transpose()?;

    let entries = state
        .engine
        .transactions(
            payload.user_id,
            params.limit,
            since,
            params.sort.as_deref(),
            params.desc.unwrap_or(false),
        )
        .await?;

    let views = entries
        .into_iter()
        .map(|entry| TransactionView {
            id: entry.id,
            user_id: entry.user_id,
            user_from_id: entry.user_from_id,
            operation: map_operation(entry.operation),
            sum: entry.sum.minor(),
            created: entry.created_at,
        })
        .collect();

    Ok(Json(views))
}
