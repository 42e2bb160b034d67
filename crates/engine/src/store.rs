//! Store interfaces consumed by the engine.
//!
//! The engine reaches balance and ledger state only through these traits;
//! it never computes or persists a balance itself. The SQL
//! implementations live in [`crate::sql`]; tests may substitute anything
//! that honors the contracts below.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Account, EngineError, Entry, NewEntry, StoreError};

/// Validated sort axis for history queries.
///
/// Making this an enum (instead of threading the raw string through to
/// the store) means an invalid sort field is rejected exactly once, and
/// the store has a single composed query path for every flag
/// combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    /// Order by `created_at`.
    Date,
    /// Order by entry sum.
    Sum,
}

impl SortField {
    /// Parses the textual sort parameter.
    ///
    /// Absent or empty means store-default order; anything other than
    /// `date`/`sum` is a caller error.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, EngineError> {
        match raw {
            None | Some("") => Ok(None),
            Some("date") => Ok(Some(Self::Date)),
            Some("sum") => Ok(Some(Self::Sum)),
            Some(other) => Err(EngineError::WrongSortParam(other.to_string())),
        }
    }
}

/// A validated history query.
///
/// Every combination of the four axes is meaningful:
/// - `limit`: `None` returns all matching entries.
/// - `since`: restricts to entries at or after that instant when
///   ascending, at or before it when descending.
/// - `sort`: `None` means insertion order (entry id).
/// - `descending` reverses the direction; ties are always broken by
///   entry id so the order is stable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: Option<u64>,
    pub since: Option<DateTime<Utc>>,
    pub sort: Option<SortField>,
    pub descending: bool,
}

/// Lookup and provisioning surface for account balances.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Fetches the account for `user_id`.
    ///
    /// Fails with [`StoreError::AccountNotFound`] when no account exists,
    /// distinct from a database failure.
    async fn balance(&self, user_id: i64) -> Result<Account, StoreError>;

    /// Creates a zero-balance account for `user_id`.
    async fn create_account(&self, user_id: i64) -> Result<Account, StoreError>;
}

/// Append and query surface for the ledger.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Atomically applies the balance change(s) described by `new` and
    /// appends the entry.
    ///
    /// This is the authoritative balance check: implementations must
    /// serialize the read-validate-write per account (across **both**
    /// accounts for a transfer) and reject with
    /// [`StoreError::InsufficientFunds`] when a debit would drive a
    /// balance negative, even if the engine's pre-check passed.
    async fn append(&self, new: NewEntry) -> Result<Entry, StoreError>;

    /// Returns the entries where `user_id` is the primary or the source
    /// account, filtered and ordered per `query`.
    async fn history(
        &self,
        user_id: i64,
        query: &HistoryQuery,
    ) -> Result<Vec<Entry>, StoreError>;
}
