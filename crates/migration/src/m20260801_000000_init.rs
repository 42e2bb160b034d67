//! Initial schema: `accounts` and the append-only `transactions` ledger.
//!
//! - `accounts`: one row per external user id, with the authoritative
//!   balance and a database-level non-negativity constraint.
//! - `transactions`: one immutable row per operation, with a positive-sum
//!   constraint and an auto-increment id for stable ordering ties.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    Balance,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    UserFromId,
    Operation,
    Sum,
    BalanceAfter,
    BalanceFromAfter,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Accounts::Balance).gte(0)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::UserFromId).big_integer())
                    .col(ColumnDef::new(Transactions::Operation).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Sum)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::Sum).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Transactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::BalanceFromAfter).big_integer())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_from_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserFromId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}
