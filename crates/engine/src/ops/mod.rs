use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    Account, BalanceStore, ResultEngine, SqlBalanceStore, SqlTransactionStore, StoreError,
    TransactionStore,
};

mod funds;

/// The ledger engine.
///
/// Stateless: every operation is a single-shot call and all balance and
/// history state lives behind the store interfaces passed at
/// construction. Cloning is cheap and shares the stores.
#[derive(Clone)]
pub struct Engine {
    balances: Arc<dyn BalanceStore>,
    ledger: Arc<dyn TransactionStore>,
}

impl Engine {
    /// Builds an engine over explicit store implementations.
    pub fn new(balances: Arc<dyn BalanceStore>, ledger: Arc<dyn TransactionStore>) -> Self {
        Self { balances, ledger }
    }

    /// Builds an engine backed by the SQL stores sharing `database`.
    pub fn with_database(database: DatabaseConnection) -> Self {
        Self::new(
            Arc::new(SqlBalanceStore::new(database.clone())),
            Arc::new(SqlTransactionStore::new(database)),
        )
    }

    /// Returns the account for `user_id`, creating it with a zero balance
    /// on first reference.
    async fn account_or_create(&self, user_id: i64) -> ResultEngine<Account> {
        match self.balances.balance(user_id).await {
            Ok(account) => Ok(account),
            Err(StoreError::AccountNotFound) => {
                Ok(self.balances.create_account(user_id).await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}
