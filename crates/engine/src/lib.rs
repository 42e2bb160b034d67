//! The ledger engine: per-user balances and an append-only transaction
//! history.
//!
//! The engine owns the business rules (balance non-negativity, lazy
//! account provisioning, atomicity of two-account transfers and the
//! history query semantics) and reaches persistent state only through
//! the [`BalanceStore`] and [`TransactionStore`] interfaces. The SQL
//! implementations of those interfaces live here too, but callers may
//! inject anything that honors the contracts.

pub use accounts::Account;
pub use entries::{Entry, NewEntry, OperationKind};
pub use error::{EngineError, StoreError};
pub use money::Amount;
pub use ops::Engine;
pub use sql::{SqlBalanceStore, SqlTransactionStore};
pub use store::{BalanceStore, HistoryQuery, SortField, TransactionStore};

mod accounts;
mod entries;
mod error;
mod money;
mod ops;
mod sql;
mod store;

type ResultEngine<T> = Result<T, EngineError>;
