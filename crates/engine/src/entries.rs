//! Ledger entry primitives.
//!
//! An `Entry` is an immutable record of one balance-affecting operation,
//! carrying a snapshot of the affected balance(s) immediately after the
//! operation. Entries are append-only: once written they are never
//! mutated or deleted.

use chrono::{DateTime, Utc};
use sea_orm::{DbErr, entity::prelude::*};

use crate::Amount;

/// The kind of balance-affecting operation an entry records.
///
/// Direction (credit vs debit) is encoded here, never by the sign of the
/// entry sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Withdraw,
    Transfer,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Withdraw => "withdraw",
            Self::Transfer => "transfer",
        }
    }

    /// Parses the canonical operation string stored in the database.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add" => Some(Self::Add),
            "withdraw" => Some(Self::Withdraw),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// A persisted ledger entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Monotonically non-decreasing sequence number; breaks ordering
    /// ties.
    pub id: i64,
    /// Receiving (primary) account.
    pub user_id: i64,
    /// Source account; `None` unless the operation is a transfer.
    pub user_from_id: Option<i64>,
    pub operation: OperationKind,
    /// Strictly positive.
    pub sum: Amount,
    /// `user_id`'s balance immediately after this entry.
    pub balance_after: Amount,
    /// `user_from_id`'s balance immediately after this entry; `Some` only
    /// for transfers.
    pub balance_from_after: Option<Amount>,
    pub created_at: DateTime<Utc>,
}

/// A not-yet-persisted ledger entry.
///
/// The balance snapshots are intentionally absent: the transaction store
/// computes them inside its atomic unit of work, so they can never
/// disagree with the account rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: i64,
    pub user_from_id: Option<i64>,
    pub operation: OperationKind,
    pub sum: Amount,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub user_from_id: Option<i64>,
    pub operation: String,
    pub sum: i64,
    pub balance_after: i64,
    pub balance_from_after: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Entry {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let operation = OperationKind::parse(model.operation.as_str())
            .ok_or_else(|| DbErr::Type(format!("invalid operation kind: {}", model.operation)))?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            user_from_id: model.user_from_id,
            operation,
            sum: Amount::new(model.sum),
            balance_after: Amount::new(model.balance_after),
            balance_from_after: model.balance_from_after.map(Amount::new),
            created_at: model.created_at,
        })
    }
}
