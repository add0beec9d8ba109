//! Port for coin ledger persistence.
//!
//! The ledger keeps a balance row and an append-only transaction log that
//! must move together. Adapters apply each [`LedgerEntry`] inside a single
//! storage transaction and enforce one-time entries with a uniqueness
//! constraint rather than a read-before-write check.

use async_trait::async_trait;

use crate::domain::{
    CoinBalance, CoinTransaction, LedgerEntry, TransactionPage, TransactionQuery, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by coin ledger adapters.
    pub enum CoinLedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "coin ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "coin ledger query failed: {message}",
        /// Debit exceeds the available balance.
        InsufficientBalance { available: i64, requested: i64 } =>
            "insufficient balance: {available} available, {requested} requested",
    }
}

/// Storage contract for balances and transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoinLedgerRepository: Send + Sync {
    /// Create the balance row when missing and return the current balance.
    ///
    /// Concurrent calls for the same user produce exactly one row and never
    /// reset an existing balance.
    async fn ensure_balance(&self, user_id: &UserId)
    -> Result<CoinBalance, CoinLedgerRepositoryError>;

    /// Insert a credit and add it to the balance atomically.
    ///
    /// Returns `None` when `entry.one_time` is set and a transaction with the
    /// same `(user_id, action, reference_id)` already exists; the balance is
    /// left untouched in that case.
    async fn record_credit(
        &self,
        entry: &LedgerEntry,
    ) -> Result<Option<CoinTransaction>, CoinLedgerRepositoryError>;

    /// Lock the balance, check funds, insert a negative transaction and
    /// subtract it atomically.
    async fn record_debit(
        &self,
        entry: &LedgerEntry,
    ) -> Result<CoinTransaction, CoinLedgerRepositoryError>;

    /// Page through a user's transactions, newest first.
    async fn list_transactions(
        &self,
        user_id: &UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, CoinLedgerRepositoryError>;
}
