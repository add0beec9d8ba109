//! Internal Diesel row structs.
//!
//! These never leave the persistence layer; repositories convert them to
//! domain types at the boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    coin_balances, coin_transactions, login_events, notification_preferences, push_subscriptions,
    trending_scores, user_interactions, users,
};

/// Contact fields read from `users`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserContactRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
}

/// Balance row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coin_balances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CoinBalanceRow {
    pub user_id: Uuid,
    pub balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
}

/// Insertable zero balance.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coin_balances)]
pub(crate) struct NewCoinBalanceRow {
    pub user_id: Uuid,
}

/// Ledger row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coin_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CoinTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub action: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable ledger row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coin_transactions)]
pub(crate) struct NewCoinTransactionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub action: &'a str,
    pub reference_type: Option<&'a str>,
    pub reference_id: Option<&'a str>,
    pub metadata: &'a serde_json::Value,
    pub one_time: bool,
}

/// Stored preference document.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notification_preferences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationPreferencesRow {
    pub preferences: serde_json::Value,
}

/// Insertable preference document.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notification_preferences)]
pub(crate) struct NewNotificationPreferencesRow<'a> {
    pub user_id: Uuid,
    pub preferences: &'a serde_json::Value,
}

/// Push subscription row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = push_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PushSubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable push subscription.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_subscriptions)]
pub(crate) struct NewPushSubscriptionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub endpoint: &'a str,
    pub p256dh: &'a str,
    pub auth: &'a str,
}

/// Insertable login event.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = login_events)]
pub(crate) struct NewLoginEventRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Insertable interaction.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_interactions)]
pub(crate) struct NewInteractionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub itinerary_id: Uuid,
    pub interaction_type: &'a str,
}

/// Insertable trending score.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = trending_scores)]
pub(crate) struct NewTrendingScoreRow {
    pub itinerary_id: Uuid,
    pub score: f64,
    pub computed_at: DateTime<Utc>,
}
