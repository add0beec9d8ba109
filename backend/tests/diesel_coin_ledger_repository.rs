//! Integration tests for the Diesel ledger, view counter and trending
//! repositories against embedded PostgreSQL.
//!
//! The in-memory adapters cannot show that the partial unique index, row
//! locks and `RETURNING` clauses behave under real concurrency, so these
//! suites drive the Diesel adapters against a migrated database.

use chrono::{Duration, Utc};
use futures::future::join_all;
use itinera::domain::ports::{
    CoinLedgerRepository, CoinLedgerRepositoryError, InteractionRepository, ItineraryRepository,
};
use itinera::domain::{
    AwardRequest, CoinAction, Interaction, InteractionType, ItineraryId, LedgerEntry, Milestone,
    SpendRequest, TrendingScore, UserId,
};
use itinera::outbound::persistence::{
    DbPool, DieselCoinLedgerRepository, DieselInteractionRepository, DieselItineraryRepository,
    PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Runtime;
use uuid::Uuid;

mod support;

use support::{
    format_postgres_error, handle_cluster_setup_failure, provision_template_database,
    shared_cluster,
};

const CONCURRENT_CALLS: usize = 8;

struct TestContext {
    runtime: Runtime,
    pool: DbPool,
    user_id: UserId,
    itinerary_id: ItineraryId,
    database_url: String,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn ledger(&self) -> DieselCoinLedgerRepository {
        DieselCoinLedgerRepository::new(self.pool.clone())
    }

    fn client(&self) -> Client {
        Client::connect(self.database_url.as_str(), NoTls)
            .unwrap_or_else(|err| panic!("connect: {}", format_postgres_error(&err)))
    }

    fn scalar(&self, sql: &str) -> i64 {
        self.client()
            .query_one(sql, &[self.user_id.as_uuid()])
            .unwrap_or_else(|err| panic!("{sql}: {}", format_postgres_error(&err)))
            .get(0)
    }

    fn transaction_rows(&self) -> i64 {
        self.scalar("SELECT count(*) FROM coin_transactions WHERE user_id = $1")
    }

    fn balance_rows(&self) -> i64 {
        self.scalar("SELECT count(*) FROM coin_balances WHERE user_id = $1")
    }

    fn stored_balance(&self) -> i64 {
        self.scalar("SELECT balance FROM coin_balances WHERE user_id = $1")
    }
}

fn seed_owner_and_itinerary(
    url: &str,
    user_id: &UserId,
    itinerary_id: ItineraryId,
    view_count: i64,
) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let owner = *user_id.as_uuid();

    client
        .execute(
            "INSERT INTO users (id, display_name) VALUES ($1, $2)",
            &[&owner, &"Ledger Test Owner"],
        )
        .map_err(|err| format_postgres_error(&err))?;
    client
        .execute(
            concat!(
                "INSERT INTO itineraries (id, owner_id, title, view_count) ",
                "VALUES ($1, $2, $3, $4)"
            ),
            &[itinerary_id.as_uuid(), &owner, &"Lisbon in three days", &view_count],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster().map_err(|err| err.to_string())?;
    let temp_db = provision_template_database(cluster)?;
    let database_url = temp_db.url().to_string();

    let user_id = UserId::random();
    let itinerary_id = ItineraryId::from_uuid(Uuid::new_v4());
    seed_owner_and_itinerary(database_url.as_str(), &user_id, itinerary_id, 9)?;

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(CONCURRENT_CALLS as u32)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        pool,
        user_id,
        itinerary_id,
        database_url,
        _database: temp_db,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn milestone_entry(context: &TestContext) -> LedgerEntry {
    Milestone::ITINERARY_10_VIEWS
        .award(
            context.user_id.clone(),
            context.itinerary_id.to_string(),
            json!({ "viewCount": 10 }),
        )
        .map(AwardRequest::into_entry)
        .expect("milestone entry")
}

#[rstest]
fn racing_one_time_credits_write_one_row(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: racing_one_time_credits_write_one_row skipped");
        return;
    };
    let ledger = context.ledger();
    let entry = milestone_entry(&context);

    let results = context.runtime.block_on(join_all(
        (0..CONCURRENT_CALLS).map(|_| ledger.record_credit(&entry)),
    ));

    let awarded = results
        .into_iter()
        .map(|result| result.expect("credit succeeds"))
        .filter(Option::is_some)
        .count();
    assert_eq!(awarded, 1, "exactly one caller wins the milestone");
    assert_eq!(context.transaction_rows(), 1);
    assert_eq!(context.stored_balance(), 10);
}

#[rstest]
fn repeated_credit_after_commit_is_ignored(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: repeated_credit_after_commit_is_ignored skipped");
        return;
    };
    let ledger = context.ledger();
    let entry = milestone_entry(&context);

    let (first, second) = context.runtime.block_on(async {
        let first = ledger.record_credit(&entry).await.expect("first credit");
        let second = ledger.record_credit(&entry).await.expect("second credit");
        (first, second)
    });

    let first = first.expect("first credit inserts");
    assert_eq!(first.amount, 10);
    assert_eq!(first.user_id, context.user_id);
    assert!(second.is_none());
    assert_eq!(context.transaction_rows(), 1);
    assert_eq!(context.stored_balance(), 10);
}

#[rstest]
fn concurrent_balance_creation_yields_one_empty_row(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_balance_creation_yields_one_empty_row skipped");
        return;
    };
    let ledger = context.ledger();

    let results = context.runtime.block_on(join_all(
        (0..CONCURRENT_CALLS).map(|_| ledger.ensure_balance(&context.user_id)),
    ));

    for result in results {
        let balance = result.expect("ensure balance");
        assert_eq!(balance.balance, 0);
        assert_eq!(balance.lifetime_earned, 0);
    }
    assert_eq!(context.balance_rows(), 1);
    assert_eq!(context.stored_balance(), 0);
}

#[rstest]
fn ensuring_an_existing_balance_keeps_it(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: ensuring_an_existing_balance_keeps_it skipped");
        return;
    };
    let ledger = context.ledger();
    let entry = milestone_entry(&context);

    let balance = context.runtime.block_on(async {
        ledger.record_credit(&entry).await.expect("credit");
        ledger.ensure_balance(&context.user_id).await
    });

    let balance = balance.expect("ensure balance");
    assert_eq!(balance.balance, 10);
    assert_eq!(balance.lifetime_earned, 10);
    assert_eq!(context.balance_rows(), 1);
}

#[rstest]
fn overspend_rolls_back_without_writing_a_transaction(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: overspend_rolls_back_without_writing_a_transaction skipped");
        return;
    };
    let ledger = context.ledger();
    let credit = milestone_entry(&context);
    let spend = SpendRequest::new(
        context.user_id.clone(),
        25,
        CoinAction::new("premium_unlock").expect("action"),
        None,
        json!({}),
    )
    .map(SpendRequest::into_entry)
    .expect("spend entry");

    let result = context.runtime.block_on(async {
        ledger.record_credit(&credit).await.expect("credit");
        ledger.record_debit(&spend).await
    });

    match result {
        Err(CoinLedgerRepositoryError::InsufficientBalance {
            available,
            requested,
        }) => {
            assert_eq!(available, 10);
            assert_eq!(requested, 25);
        }
        other => panic!("expected insufficient balance, got {other:?}"),
    }
    assert_eq!(context.transaction_rows(), 1, "only the credit is stored");
    assert_eq!(context.stored_balance(), 10);
    assert_eq!(
        context.scalar("SELECT lifetime_spent FROM coin_balances WHERE user_id = $1"),
        0
    );
}

#[rstest]
fn debit_within_balance_subtracts_and_records(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: debit_within_balance_subtracts_and_records skipped");
        return;
    };
    let ledger = context.ledger();
    let credit = milestone_entry(&context);
    let spend = SpendRequest::new(
        context.user_id.clone(),
        4,
        CoinAction::new("premium_unlock").expect("action"),
        None,
        json!({ "feature": "offline_maps" }),
    )
    .map(SpendRequest::into_entry)
    .expect("spend entry");

    let debit = context.runtime.block_on(async {
        ledger.record_credit(&credit).await.expect("credit");
        ledger.record_debit(&spend).await
    });

    let debit = debit.expect("debit");
    assert_eq!(debit.amount, -4);
    assert_eq!(debit.metadata, json!({ "feature": "offline_maps" }));
    assert_eq!(context.transaction_rows(), 2);
    assert_eq!(context.stored_balance(), 6);
}

#[rstest]
fn view_counter_increments_through_the_milestone(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: view_counter_increments_through_the_milestone skipped");
        return;
    };
    let repository = DieselItineraryRepository::new(context.pool.clone());

    let (tenth, eleventh) = context.runtime.block_on(async {
        let tenth = repository.record_view(&context.itinerary_id).await;
        let eleventh = repository.record_view(&context.itinerary_id).await;
        (tenth, eleventh)
    });

    let tenth = tenth.expect("tenth view").expect("itinerary exists");
    assert_eq!(tenth.view_count, 10);
    assert_eq!(tenth.owner_id, context.user_id);
    assert_eq!(tenth.itinerary_id, context.itinerary_id);
    let eleventh = eleventh.expect("eleventh view").expect("itinerary exists");
    assert_eq!(eleventh.view_count, 11);
}

#[rstest]
fn view_of_missing_itinerary_returns_none(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: view_of_missing_itinerary_returns_none skipped");
        return;
    };
    let repository = DieselItineraryRepository::new(context.pool.clone());
    let missing = ItineraryId::from_uuid(Uuid::new_v4());

    let views = context
        .runtime
        .block_on(repository.record_view(&missing))
        .expect("record view");

    assert!(views.is_none());
}

#[rstest]
fn activity_groups_recent_interactions_per_itinerary(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: activity_groups_recent_interactions_per_itinerary skipped");
        return;
    };
    let repository = DieselInteractionRepository::new(context.pool.clone());
    let kinds = [
        InteractionType::View,
        InteractionType::View,
        InteractionType::View,
        InteractionType::Like,
        InteractionType::Share,
    ];
    let since = Utc::now() - Duration::hours(1);

    let activity = context.runtime.block_on(async {
        for kind in kinds {
            repository
                .record(&Interaction {
                    user_id: context.user_id.clone(),
                    itinerary_id: context.itinerary_id,
                    kind,
                })
                .await
                .expect("record interaction");
        }
        repository.activity_since(since).await
    });

    let activity = activity.expect("activity");
    assert_eq!(activity.len(), 1);
    let entry = &activity[0];
    assert_eq!(entry.itinerary_id, context.itinerary_id);
    assert_eq!(entry.counts.views, 3);
    assert_eq!(entry.counts.likes, 1);
    assert_eq!(entry.counts.shares, 1);
    assert_eq!(entry.counts.comments, 0);

    let later = context
        .runtime
        .block_on(repository.activity_since(Utc::now() + Duration::hours(1)))
        .expect("activity");
    assert!(later.is_empty(), "events before the window are excluded");
}

#[rstest]
fn replacing_scores_overwrites_the_previous_run(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: replacing_scores_overwrites_the_previous_run skipped");
        return;
    };
    let repository = DieselInteractionRepository::new(context.pool.clone());
    let score = |value: f64| TrendingScore {
        itinerary_id: context.itinerary_id,
        score: value,
        computed_at: Utc::now(),
    };

    context.runtime.block_on(async {
        repository
            .replace_scores(&[score(1.5)])
            .await
            .expect("first run");
        repository
            .replace_scores(&[score(4.25)])
            .await
            .expect("second run");
    });

    let rows = context
        .client()
        .query("SELECT score FROM trending_scores", &[])
        .unwrap_or_else(|err| panic!("scores: {}", format_postgres_error(&err)));
    let scores: Vec<f64> = rows.iter().map(|row| row.get(0)).collect();
    assert_eq!(scores, vec![4.25]);
}
