//! Diesel table definitions.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered users and their contact address.
    users (id) {
        id -> Uuid,
        display_name -> Varchar,
        /// Nullable: accounts without a verified address get no email.
        email -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shared itineraries with their cumulative view counter.
    itineraries (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Varchar,
        view_count -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One balance row per user, created lazily.
    coin_balances (user_id) {
        user_id -> Uuid,
        balance -> Int8,
        lifetime_earned -> Int8,
        lifetime_spent -> Int8,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only ledger.
    ///
    /// A partial unique index on `(user_id, action, reference_id)` where
    /// `one_time` holds makes milestone credits insert-if-absent.
    coin_transactions (id) {
        id -> Uuid,
        user_id -> Uuid,
        amount -> Int8,
        action -> Varchar,
        reference_type -> Nullable<Varchar>,
        reference_id -> Nullable<Varchar>,
        metadata -> Jsonb,
        one_time -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stored notification flags as a JSON object of optional booleans.
    notification_preferences (user_id) {
        user_id -> Uuid,
        preferences -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Web push endpoints; `endpoint` is unique.
    push_subscriptions (id) {
        id -> Uuid,
        user_id -> Uuid,
        endpoint -> Text,
        p256dh -> Text,
        auth -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Sign-in audit log.
    login_events (id) {
        id -> Uuid,
        user_id -> Uuid,
        ip_address -> Nullable<Varchar>,
        user_agent -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Typed interactions feeding the trending scorer.
    user_interactions (id) {
        id -> Uuid,
        user_id -> Uuid,
        itinerary_id -> Uuid,
        interaction_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Latest trending score per itinerary.
    trending_scores (itinerary_id) {
        itinerary_id -> Uuid,
        score -> Float8,
        computed_at -> Timestamptz,
    }
}

diesel::joinable!(user_interactions -> itineraries (itinerary_id));

// Trending activity groups interaction rows by the itinerary's age.
diesel::allow_columns_to_appear_in_same_group_by_clause!(
    user_interactions::itinerary_id,
    itineraries::created_at,
);
diesel::allow_columns_to_appear_in_same_group_by_clause!(
    user_interactions::interaction_type,
    itineraries::created_at,
);

diesel::allow_tables_to_appear_in_same_query!(
    users,
    itineraries,
    coin_balances,
    coin_transactions,
    notification_preferences,
    push_subscriptions,
    login_events,
    user_interactions,
    trending_scores,
);
