//! PostgreSQL-backed `CoinLedgerRepository`.
//!
//! Each credit or debit runs in one database transaction: the ledger row and
//! the balance delta commit together or not at all. One-time credits rely on
//! the partial unique index over `(user_id, action, reference_id)` and
//! `ON CONFLICT DO NOTHING`, so two racing awards produce one row.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{CoinLedgerRepository, CoinLedgerRepositoryError};
use crate::domain::{
    CoinAction, CoinBalance, CoinReference, CoinTransaction, LedgerEntry, TransactionKind,
    TransactionPage, TransactionQuery, UserId,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CoinBalanceRow, CoinTransactionRow, NewCoinBalanceRow, NewCoinTransactionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{coin_balances, coin_transactions};

/// Diesel implementation of the coin ledger.
#[derive(Clone)]
pub struct DieselCoinLedgerRepository {
    pool: DbPool,
}

impl DieselCoinLedgerRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a ledger transaction.
#[derive(Debug)]
enum LedgerTxError {
    Diesel(diesel::result::Error),
    Insufficient { available: i64, requested: i64 },
}

impl From<diesel::result::Error> for LedgerTxError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

fn pool_error(error: PoolError) -> CoinLedgerRepositoryError {
    map_pool_error(error, CoinLedgerRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CoinLedgerRepositoryError {
    map_diesel_error(
        error,
        CoinLedgerRepositoryError::query,
        CoinLedgerRepositoryError::connection,
    )
}

fn tx_error(error: LedgerTxError) -> CoinLedgerRepositoryError {
    match error {
        LedgerTxError::Diesel(err) => diesel_error(err),
        LedgerTxError::Insufficient {
            available,
            requested,
        } => CoinLedgerRepositoryError::insufficient_balance(available, requested),
    }
}

fn row_to_balance(row: CoinBalanceRow) -> CoinBalance {
    CoinBalance {
        user_id: UserId::from_uuid(row.user_id),
        balance: row.balance,
        lifetime_earned: row.lifetime_earned,
        lifetime_spent: row.lifetime_spent,
    }
}

fn row_to_transaction(row: CoinTransactionRow) -> Result<CoinTransaction, CoinLedgerRepositoryError> {
    let action = CoinAction::new(row.action.as_str()).map_err(|err| {
        warn!(transaction_id = %row.id, action = %row.action, "stored action is invalid");
        CoinLedgerRepositoryError::query(err.to_string())
    })?;
    let reference = match (row.reference_type, row.reference_id) {
        (Some(kind), Some(id)) => Some(
            CoinReference::new(kind, id)
                .map_err(|err| CoinLedgerRepositoryError::query(err.to_string()))?,
        ),
        _ => None,
    };
    Ok(CoinTransaction {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        amount: row.amount,
        action,
        reference,
        metadata: row.metadata,
        created_at: row.created_at,
    })
}

fn new_transaction_row(entry: &LedgerEntry, amount: i64) -> NewCoinTransactionRow<'_> {
    NewCoinTransactionRow {
        id: Uuid::new_v4(),
        user_id: *entry.user_id.as_uuid(),
        amount,
        action: entry.action.as_str(),
        reference_type: entry.reference.as_ref().map(CoinReference::reference_type),
        reference_id: entry.reference.as_ref().map(CoinReference::reference_id),
        metadata: &entry.metadata,
        one_time: entry.one_time,
    }
}

async fn insert_missing_balance(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(coin_balances::table)
        .values(&NewCoinBalanceRow { user_id })
        .on_conflict(coin_balances::user_id)
        .do_nothing()
        .execute(conn)
        .await
        .map(|_| ())
}

fn filtered_transactions(
    user_id: Uuid,
    kind: Option<TransactionKind>,
) -> coin_transactions::BoxedQuery<'static, Pg> {
    let query = coin_transactions::table
        .filter(coin_transactions::user_id.eq(user_id))
        .into_boxed();
    match kind {
        Some(TransactionKind::Earn) => query.filter(coin_transactions::amount.gt(0)),
        Some(TransactionKind::Spend) => query.filter(coin_transactions::amount.lt(0)),
        None => query,
    }
}

#[async_trait]
impl CoinLedgerRepository for DieselCoinLedgerRepository {
    async fn ensure_balance(
        &self,
        user_id: &UserId,
    ) -> Result<CoinBalance, CoinLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        insert_missing_balance(&mut conn, *user_id.as_uuid())
            .await
            .map_err(diesel_error)?;

        let row: CoinBalanceRow = coin_balances::table
            .find(user_id.as_uuid())
            .select(CoinBalanceRow::as_select())
            .first(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(row_to_balance(row))
    }

    async fn record_credit(
        &self,
        entry: &LedgerEntry,
    ) -> Result<Option<CoinTransaction>, CoinLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let user_id = *entry.user_id.as_uuid();
        let amount = entry.amount;
        let new_row = new_transaction_row(entry, amount);

        let inserted = conn
            .transaction::<_, LedgerTxError, _>(|conn| {
                async move {
                    insert_missing_balance(conn, user_id).await?;

                    let row: Option<CoinTransactionRow> = if new_row.one_time {
                        diesel::insert_into(coin_transactions::table)
                            .values(&new_row)
                            .on_conflict_do_nothing()
                            .returning(CoinTransactionRow::as_returning())
                            .get_result(conn)
                            .await
                            .optional()?
                    } else {
                        Some(
                            diesel::insert_into(coin_transactions::table)
                                .values(&new_row)
                                .returning(CoinTransactionRow::as_returning())
                                .get_result(conn)
                                .await?,
                        )
                    };
                    let Some(row) = row else {
                        return Ok(None);
                    };

                    diesel::update(coin_balances::table.find(user_id))
                        .set((
                            coin_balances::balance.eq(coin_balances::balance + amount),
                            coin_balances::lifetime_earned
                                .eq(coin_balances::lifetime_earned + amount),
                            coin_balances::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;
                    Ok(Some(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(tx_error)?;

        if inserted.is_none() {
            debug!(user_id = %entry.user_id, action = %entry.action, "duplicate one-time credit");
        }
        inserted.map(row_to_transaction).transpose()
    }

    async fn record_debit(
        &self,
        entry: &LedgerEntry,
    ) -> Result<CoinTransaction, CoinLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let user_id = *entry.user_id.as_uuid();
        let amount = entry.amount;
        let new_row = new_transaction_row(entry, -amount);

        let row = conn
            .transaction::<_, LedgerTxError, _>(|conn| {
                async move {
                    insert_missing_balance(conn, user_id).await?;

                    let current: CoinBalanceRow = coin_balances::table
                        .find(user_id)
                        .select(CoinBalanceRow::as_select())
                        .for_update()
                        .first(conn)
                        .await?;
                    if current.balance < amount {
                        return Err(LedgerTxError::Insufficient {
                            available: current.balance,
                            requested: amount,
                        });
                    }

                    let row: CoinTransactionRow = diesel::insert_into(coin_transactions::table)
                        .values(&new_row)
                        .returning(CoinTransactionRow::as_returning())
                        .get_result(conn)
                        .await?;

                    diesel::update(coin_balances::table.find(user_id))
                        .set((
                            coin_balances::balance.eq(coin_balances::balance - amount),
                            coin_balances::lifetime_spent
                                .eq(coin_balances::lifetime_spent + amount),
                            coin_balances::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(tx_error)?;

        row_to_transaction(row)
    }

    async fn list_transactions(
        &self,
        user_id: &UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, CoinLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let owner = *user_id.as_uuid();

        let total: i64 = filtered_transactions(owner, query.kind())
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        let rows: Vec<CoinTransactionRow> = filtered_transactions(owner, query.kind())
            .select(CoinTransactionRow::as_select())
            .order_by((
                coin_transactions::created_at.desc(),
                coin_transactions::id.desc(),
            ))
            .limit(i64::from(query.limit()))
            .offset(i64::from(query.offset()))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        let transactions = rows
            .into_iter()
            .map(row_to_transaction)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TransactionPage {
            transactions,
            total: u64::try_from(total).unwrap_or_default(),
            limit: query.limit(),
            offset: query.offset(),
        })
    }
}
