//! In-process coin ledger.
//!
//! Serves development runs without a database and the ledger property tests.
//! One mutex guards balances and transactions together, which gives the same
//! all-or-nothing behaviour as the database transaction in the Diesel
//! adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{CoinLedgerRepository, CoinLedgerRepositoryError};
use crate::domain::{
    CoinBalance, CoinTransaction, LedgerEntry, TransactionKind, TransactionPage, TransactionQuery,
    UserId,
};

#[derive(Default)]
struct LedgerState {
    balances: HashMap<UserId, CoinBalance>,
    transactions: Vec<StoredTransaction>,
}

struct StoredTransaction {
    transaction: CoinTransaction,
    one_time: bool,
}

impl StoredTransaction {
    fn duplicates(&self, entry: &LedgerEntry) -> bool {
        let tx = &self.transaction;
        self.one_time
            && tx.user_id == entry.user_id
            && tx.action == entry.action
            && tx.reference.as_ref().map(|r| r.reference_id())
                == entry.reference.as_ref().map(|r| r.reference_id())
    }

    fn matches(&self, user_id: &UserId, kind: Option<TransactionKind>) -> bool {
        let tx = &self.transaction;
        tx.user_id == *user_id
            && match kind {
                Some(TransactionKind::Earn) => tx.amount > 0,
                Some(TransactionKind::Spend) => tx.amount < 0,
                None => true,
            }
    }
}

impl LedgerState {
    fn balance_mut(&mut self, user_id: &UserId) -> &mut CoinBalance {
        self.balances
            .entry(user_id.clone())
            .or_insert_with(|| CoinBalance::empty(user_id.clone()))
    }
}

/// Mutex-guarded ledger implementing [`CoinLedgerRepository`].
pub struct InMemoryCoinLedger {
    state: Mutex<LedgerState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCoinLedger {
    /// Create an empty ledger.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            clock,
        }
    }

    fn transaction(&self, entry: &LedgerEntry, amount: i64) -> CoinTransaction {
        CoinTransaction {
            id: Uuid::new_v4(),
            user_id: entry.user_id.clone(),
            amount,
            action: entry.action.clone(),
            reference: entry.reference.clone(),
            metadata: entry.metadata.clone(),
            created_at: self.clock.utc(),
        }
    }
}

#[async_trait]
impl CoinLedgerRepository for InMemoryCoinLedger {
    async fn ensure_balance(
        &self,
        user_id: &UserId,
    ) -> Result<CoinBalance, CoinLedgerRepositoryError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.balance_mut(user_id).clone())
    }

    async fn record_credit(
        &self,
        entry: &LedgerEntry,
    ) -> Result<Option<CoinTransaction>, CoinLedgerRepositoryError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if entry.one_time && state.transactions.iter().any(|tx| tx.duplicates(entry)) {
            return Ok(None);
        }

        let transaction = self.transaction(entry, entry.amount);
        let balance = state.balance_mut(&entry.user_id);
        balance.balance += entry.amount;
        balance.lifetime_earned += entry.amount;
        state.transactions.push(StoredTransaction {
            transaction: transaction.clone(),
            one_time: entry.one_time,
        });
        Ok(Some(transaction))
    }

    async fn record_debit(
        &self,
        entry: &LedgerEntry,
    ) -> Result<CoinTransaction, CoinLedgerRepositoryError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let balance = state.balance_mut(&entry.user_id);
        if balance.balance < entry.amount {
            return Err(CoinLedgerRepositoryError::insufficient_balance(
                balance.balance,
                entry.amount,
            ));
        }
        balance.balance -= entry.amount;
        balance.lifetime_spent += entry.amount;

        let transaction = self.transaction(entry, -entry.amount);
        state.transactions.push(StoredTransaction {
            transaction: transaction.clone(),
            one_time: entry.one_time,
        });
        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        user_id: &UserId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, CoinLedgerRepositoryError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<&CoinTransaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.matches(user_id, query.kind()))
            .map(|tx| &tx.transaction)
            .collect();

        Ok(TransactionPage {
            total: matching.len() as u64,
            transactions: matching
                .into_iter()
                .skip(query.offset() as usize)
                .take(query.limit() as usize)
                .cloned()
                .collect(),
            limit: query.limit(),
            offset: query.offset(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoinAction, Milestone, SpendRequest};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn ledger() -> InMemoryCoinLedger {
        InMemoryCoinLedger::new(Arc::new(DefaultClock))
    }

    fn milestone(user_id: &UserId, reference: &str) -> LedgerEntry {
        Milestone::ITINERARY_10_VIEWS
            .award(user_id.clone(), reference, json!({}))
            .expect("award")
            .into_entry()
    }

    fn spend(user_id: &UserId, amount: i64) -> LedgerEntry {
        SpendRequest::new(
            user_id.clone(),
            amount,
            CoinAction::new("boost_itinerary").expect("action"),
            None,
            json!({}),
        )
        .expect("spend")
        .into_entry()
    }

    #[rstest]
    #[tokio::test]
    async fn one_time_credits_are_recorded_once(ledger: InMemoryCoinLedger) {
        let user = UserId::random();

        let first = ledger.record_credit(&milestone(&user, "trip-1")).await.expect("credit");
        let again = ledger.record_credit(&milestone(&user, "trip-1")).await.expect("credit");
        let other = ledger.record_credit(&milestone(&user, "trip-2")).await.expect("credit");

        assert!(first.is_some());
        assert!(again.is_none());
        assert!(other.is_some());
        let balance = ledger.ensure_balance(&user).await.expect("balance");
        assert_eq!(balance.balance, 20);
        assert_eq!(balance.lifetime_earned, 20);
    }

    #[rstest]
    #[tokio::test]
    async fn debits_require_funds(ledger: InMemoryCoinLedger) {
        let user = UserId::random();
        ledger.record_credit(&milestone(&user, "trip")).await.expect("credit");

        let error = ledger.record_debit(&spend(&user, 11)).await.expect_err("short");
        let tx = ledger.record_debit(&spend(&user, 4)).await.expect("debit");

        assert_eq!(error, CoinLedgerRepositoryError::insufficient_balance(10, 11));
        assert_eq!(tx.amount, -4);
        let balance = ledger.ensure_balance(&user).await.expect("balance");
        assert_eq!(
            (balance.balance, balance.lifetime_earned, balance.lifetime_spent),
            (6, 10, 4)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn lists_newest_first_with_kind_filter(ledger: InMemoryCoinLedger) {
        let user = UserId::random();
        ledger.record_credit(&milestone(&user, "a")).await.expect("credit");
        ledger.record_credit(&milestone(&user, "b")).await.expect("credit");
        ledger.record_debit(&spend(&user, 5)).await.expect("debit");

        let all = ledger
            .list_transactions(&user, &TransactionQuery::default())
            .await
            .expect("list");
        let earned = ledger
            .list_transactions(
                &user,
                &TransactionQuery::new(Some(1), Some(1), Some(TransactionKind::Earn)),
            )
            .await
            .expect("list");

        assert_eq!(all.total, 3);
        assert_eq!(all.transactions.first().map(|tx| tx.amount), Some(-5));
        assert_eq!(earned.total, 2);
        assert_eq!(earned.transactions.len(), 1);
        assert_eq!(
            earned
                .transactions
                .first()
                .and_then(|tx| tx.reference.as_ref())
                .map(|r| r.reference_id().to_owned()),
            Some("a".to_owned())
        );
    }
}
