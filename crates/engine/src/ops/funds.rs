//! Funds operations: deposits, withdrawals, transfers, balance and
//! history lookups.
//!
//! Each operation resolves the involved account(s), creating them on
//! first reference, then validates the request, projects the new
//! balance(s) as a fast pre-check, and delegates the authoritative
//! read-validate-write to the transaction store.

use chrono::{DateTime, Utc};

use crate::{
    Account, Amount, EngineError, Entry, HistoryQuery, NewEntry, OperationKind, ResultEngine,
    SortField, StoreError,
};

use super::Engine;

/// Reserved user id that is never valid.
const INVALID_USER_ID: i64 = 0;

impl Engine {
    /// Credits `sum` to `user_id`'s account.
    pub async fn add(&self, user_id: i64, sum: Amount) -> ResultEngine<Entry> {
        let account = self.account_or_create(user_id).await?;
        ensure_positive(sum)?;
        account
            .balance
            .checked_add(sum)
            .ok_or_else(amount_overflow)?;

        let entry = self
            .ledger
            .append(NewEntry {
                user_id,
                user_from_id: None,
                operation: OperationKind::Add,
                sum,
                created_at: Utc::now(),
            })
            .await?;
        Ok(entry)
    }

    /// Debits `sum` from `user_id`'s account.
    ///
    /// A projected negative balance fails with
    /// [`EngineError::InsufficientFunds`], distinct from a validation
    /// failure: the request was well-formed, the balance rule blocked it.
    pub async fn withdraw(&self, user_id: i64, sum: Amount) -> ResultEngine<Entry> {
        let account = self.account_or_create(user_id).await?;
        ensure_positive(sum)?;
        let projected = account
            .balance
            .checked_sub(sum)
            .ok_or_else(amount_overflow)?;
        if projected.is_negative() {
            return Err(EngineError::InsufficientFunds(
                "you don't have enough funds".to_string(),
            ));
        }

        let entry = self
            .ledger
            .append(NewEntry {
                user_id,
                user_from_id: None,
                operation: OperationKind::Withdraw,
                sum,
                created_at: Utc::now(),
            })
            .await?;
        Ok(entry)
    }

    /// Moves `sum` from `user_from_id`'s account to `user_id`'s.
    ///
    /// Both balance changes land in one atomic store append; the single
    /// entry carries both post-operation snapshots.
    pub async fn transfer(
        &self,
        user_id: i64,
        user_from_id: i64,
        sum: Amount,
    ) -> ResultEngine<Entry> {
        if user_from_id == user_id {
            return Err(EngineError::InvalidUser(
                "cannot transfer to the same account".to_string(),
            ));
        }
        let to_account = self.account_or_create(user_id).await?;
        let from_account = self.account_or_create(user_from_id).await?;
        ensure_positive(sum)?;

        let from_projected = from_account
            .balance
            .checked_sub(sum)
            .ok_or_else(amount_overflow)?;
        if from_projected.is_negative() {
            return Err(EngineError::InsufficientFunds(
                "user doesn't have enough funds".to_string(),
            ));
        }
        to_account
            .balance
            .checked_add(sum)
            .ok_or_else(amount_overflow)?;

        let entry = self
            .ledger
            .append(NewEntry {
                user_id,
                user_from_id: Some(user_from_id),
                operation: OperationKind::Transfer,
                sum,
                created_at: Utc::now(),
            })
            .await?;
        Ok(entry)
    }

    /// Returns the account for `user_id`, provisioning it on first
    /// reference, so a first-time balance check reads 0.
    pub async fn balance(&self, user_id: i64) -> ResultEngine<Account> {
        ensure_valid_user(user_id)?;
        self.account_or_create(user_id).await
    }

    /// Returns `user_id`'s ledger entries, filtered and ordered per the
    /// raw query parameters.
    ///
    /// A user that never transacted yields an empty list, not an error,
    /// and no account is created. An unknown `sort` value is rejected
    /// regardless of account state.
    pub async fn transactions(
        &self,
        user_id: i64,
        limit: Option<u64>,
        since: Option<DateTime<Utc>>,
        sort: Option<&str>,
        descending: bool,
    ) -> ResultEngine<Vec<Entry>> {
        ensure_valid_user(user_id)?;
        let sort = SortField::parse(sort)?;

        match self.balances.balance(user_id).await {
            Ok(_) => {}
            Err(StoreError::AccountNotFound) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        }

        let query = HistoryQuery {
            limit,
            since,
            sort,
            descending,
        };
        Ok(self.ledger.history(user_id, &query).await?)
    }
}

fn ensure_positive(sum: Amount) -> ResultEngine<()> {
    if sum.is_positive() {
        Ok(())
    } else {
        Err(EngineError::InvalidAmount(
            "sum must be positive".to_string(),
        ))
    }
}

fn ensure_valid_user(user_id: i64) -> ResultEngine<()> {
    if user_id == INVALID_USER_ID {
        return Err(EngineError::InvalidUser("incorrect user id".to_string()));
    }
    Ok(())
}

fn amount_overflow() -> EngineError {
    EngineError::InvalidAmount("sum is too large".to_string())
}
