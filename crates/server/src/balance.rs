//! Balance endpoint, with optional currency conversion.

use api_types::balance::{BalanceGet, BalanceView};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{ServerError, server::ServerState};

#[derive(Debug, Deserialize)]
pub struct CurrencyParam {
    pub currency: Option<String>,
}

/// Returns the current balance, provisioning the account on first
/// reference.
///
/// With `?currency=XXX` the balance is multiplied by the externally
/// looked-up exchange rate and labeled with that currency; conversion is
/// purely presentational, stored balances are untouched.
pub async fn get(
    State(state): State<ServerState>,
    Query(params): Query<CurrencyParam>,
    Json(payload): Json<BalanceGet>,
) -> Result<Json<BalanceView>, ServerError> {
    let account = state.engine.balance(payload.user_id).await?;

    let view = match params.currency {
        Some(code) if !code.is_empty() => {
            let rate = state.rates.rate_for(&code).await?;
            BalanceView {
                user_id: account.user_id,
                balance: account.balance.to_major() * rate,
                currency: code,
            }
        }
        _ => BalanceView {
            user_id: account.user_id,
            balance: account.balance.to_major(),
            currency: state.rates.base_currency().to_string(),
        },
    };

    Ok(Json(view))
}
