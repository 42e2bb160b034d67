use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod funds {
    use super::*;

    /// Request body for `POST /funds/add` and `POST /funds/withdraw`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundsChange {
        pub user_id: i64,
        /// Amount in minor units. Must be strictly positive; direction is
        /// implied by the endpoint.
        pub sum: i64,
    }

    /// Request body for `POST /funds/transfer`.
    ///
    /// `user_id` receives, `user_from_id` pays.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundsTransfer {
        pub user_id: i64,
        pub user_from_id: i64,
        pub sum: i64,
    }
}

pub mod balance {
    use super::*;

    /// Request body for `POST /funds/get`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceGet {
        pub user_id: i64,
    }

    /// Response body for `POST /funds/get`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub user_id: i64,
        /// Balance in major units, converted when a currency was
        /// requested.
        pub balance: f64,
        pub currency: String,
    }
}

pub mod transaction {
    use super::*;

    /// Request body for `POST /funds/details`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionsGet {
        pub user_id: i64,
    }

    /// Query string for `POST /funds/details`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct HistoryParams {
        pub limit: Option<u64>,
        /// RFC 3339 timestamp.
        pub since: Option<String>,
        /// `date`, `sum`, or absent for insertion order.
        pub sort: Option<String>,
        pub desc: Option<bool>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Operation {
        Add,
        Withdraw,
        Transfer,
    }

    /// One ledger entry as shown to callers.
    ///
    /// Balance snapshots are internal and deliberately not exposed.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub user_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub user_from_id: Option<i64>,
        pub operation: Operation,
        pub sum: i64,
        pub created: DateTime<Utc>,
    }
}
