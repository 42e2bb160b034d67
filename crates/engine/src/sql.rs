//! SQL-backed implementations of the store interfaces.
//!
//! `append` is the atomic unit of work: the guarded balance update(s),
//! the post-update snapshot read and the entry insert all happen inside
//! one database transaction. The engine's projected balances are a fast
//! pre-check only; the guard here is authoritative and may reject a
//! debit the pre-check let through.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, sea_query::Expr,
};

use crate::{
    Account, Amount, BalanceStore, Entry, HistoryQuery, NewEntry, OperationKind, SortField,
    StoreError, TransactionStore, accounts, entries,
};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

/// Balance store over the `accounts` table.
#[derive(Clone, Debug)]
pub struct SqlBalanceStore {
    database: DatabaseConnection,
}

impl SqlBalanceStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl BalanceStore for SqlBalanceStore {
    async fn balance(&self, user_id: i64) -> Result<Account, StoreError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or(StoreError::AccountNotFound)?;
        Ok(model.into())
    }

    async fn create_account(&self, user_id: i64) -> Result<Account, StoreError> {
        let model = accounts::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            balance: ActiveValue::Set(0),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        Ok(model.into())
    }
}

/// Transaction store over the append-only `transactions` table.
#[derive(Clone, Debug)]
pub struct SqlTransactionStore {
    database: DatabaseConnection,
}

impl SqlTransactionStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl TransactionStore for SqlTransactionStore {
    async fn append(&self, new: NewEntry) -> Result<Entry, StoreError> {
        with_tx!(self, |db_tx| {
            let (balance_after, balance_from_after) = match new.operation {
                OperationKind::Add => (credit(&db_tx, new.user_id, new.sum).await?, None),
                OperationKind::Withdraw => (debit(&db_tx, new.user_id, new.sum).await?, None),
                OperationKind::Transfer => {
                    let from = new.user_from_id.ok_or_else(|| {
                        StoreError::Database(DbErr::Custom(
                            "transfer entry without a source account".to_string(),
                        ))
                    })?;
                    if from == new.user_id {
                        return Err(StoreError::Database(DbErr::Custom(
                            "transfer source and destination must differ".to_string(),
                        )));
                    }
                    // Touch the two rows in ascending user-id order so two
                    // concurrent opposite-direction transfers cannot
                    // deadlock.
                    if from < new.user_id {
                        let from_balance = debit(&db_tx, from, new.sum).await?;
                        let to_balance = credit(&db_tx, new.user_id, new.sum).await?;
                        (to_balance, Some(from_balance))
                    } else {
                        let to_balance = credit(&db_tx, new.user_id, new.sum).await?;
                        let from_balance = debit(&db_tx, from, new.sum).await?;
                        (to_balance, Some(from_balance))
                    }
                }
            };

            let model = entries::ActiveModel {
                user_id: ActiveValue::Set(new.user_id),
                user_from_id: ActiveValue::Set(new.user_from_id),
                operation: ActiveValue::Set(new.operation.as_str().to_string()),
                sum: ActiveValue::Set(new.sum.minor()),
                balance_after: ActiveValue::Set(balance_after.minor()),
                balance_from_after: ActiveValue::Set(balance_from_after.map(Amount::minor)),
                created_at: ActiveValue::Set(new.created_at),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            Ok(Entry::try_from(model)?)
        })
    }

    async fn history(
        &self,
        user_id: i64,
        query: &HistoryQuery,
    ) -> Result<Vec<Entry>, StoreError> {
        let mut select = entries::Entity::find().filter(
            Condition::any()
                .add(entries::Column::UserId.eq(user_id))
                .add(entries::Column::UserFromId.eq(user_id)),
        );

        if let Some(since) = query.since {
            select = if query.descending {
                select.filter(entries::Column::CreatedAt.lte(since))
            } else {
                select.filter(entries::Column::CreatedAt.gte(since))
            };
        }

        let column = match query.sort {
            Some(SortField::Date) => entries::Column::CreatedAt,
            Some(SortField::Sum) => entries::Column::Sum,
            None => entries::Column::Id,
        };
        select = if query.descending {
            select.order_by_desc(column)
        } else {
            select.order_by_asc(column)
        };
        if query.sort.is_some() {
            // Stable ordering for ties on the sort key.
            select = if query.descending {
                select.order_by_desc(entries::Column::Id)
            } else {
                select.order_by_asc(entries::Column::Id)
            };
        }

        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let rows = select.all(&self.database).await?;
        rows.into_iter()
            .map(|model| Entry::try_from(model).map_err(StoreError::from))
            .collect()
    }
}

/// Applies `balance = balance + sum` and returns the new balance.
async fn credit(
    db_tx: &DatabaseTransaction,
    user_id: i64,
    sum: Amount,
) -> Result<Amount, StoreError> {
    let updated = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(sum.minor()),
        )
        .filter(accounts::Column::UserId.eq(user_id))
        .exec(db_tx)
        .await?;
    if updated.rows_affected == 0 {
        return Err(StoreError::AccountNotFound);
    }
    read_balance(db_tx, user_id).await
}

/// Applies `balance = balance - sum`, guarded by `balance >= sum`, and
/// returns the new balance.
///
/// Zero rows affected with the account present means a concurrent writer
/// spent the funds after the engine's pre-check.
async fn debit(
    db_tx: &DatabaseTransaction,
    user_id: i64,
    sum: Amount,
) -> Result<Amount, StoreError> {
    let updated = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).sub(sum.minor()),
        )
        .filter(accounts::Column::UserId.eq(user_id))
        .filter(accounts::Column::Balance.gte(sum.minor()))
        .exec(db_tx)
        .await?;
    if updated.rows_affected == 0 {
        let exists = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .is_some();
        return Err(if exists {
            StoreError::InsufficientFunds
        } else {
            StoreError::AccountNotFound
        });
    }
    read_balance(db_tx, user_id).await
}

async fn read_balance(db_tx: &DatabaseTransaction, user_id: i64) -> Result<Amount, StoreError> {
    let model = accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(user_id))
        .one(db_tx)
        .await?
        .ok_or(StoreError::AccountNotFound)?;
    Ok(Amount::new(model.balance))
}
