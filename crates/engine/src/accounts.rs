//! The module contains the `Account` struct and its implementation.

use sea_orm::entity::prelude::*;

use crate::Amount;

/// A per-user balance record.
///
/// Accounts are provisioned lazily: the first operation referencing an
/// unknown user id creates the row with a zero balance, so there is no
/// explicit registration step. The row is the source of truth for the
/// balance; ledger entries only carry snapshots of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    /// External identity the account is keyed by. Unique.
    pub user_id: i64,
    /// Current balance. Never negative after a successful operation.
    pub balance: Amount,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            balance: Amount::new(model.balance),
        }
    }
}
