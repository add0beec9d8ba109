//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities and the services that implement
//! the driving ports. Nothing here depends on actix, Diesel or Redis; those
//! live behind the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - RateLimiter and RateLimitPolicy: fixed-window request budgets.
//! - CoinLedgerService: balances, awards and spending.
//! - ItineraryViewService: view counting and the view milestone.
//! - NotificationDispatcher / NotificationSettingsService: delivery and
//!   preferences.
//! - DiscoveryService: interaction tracking and trending scores.
//! - AccountService: sign-in, password reset and welcome.
//! - BestEffort: side effects whose failures are logged, never returned.

pub mod ports;

mod accounts;
mod auth;
mod best_effort;
mod coin_ledger_service;
mod coins;
mod discovery;
pub mod error;
mod itinerary_views;
mod notification_dispatcher;
mod notification_settings_service;
mod notifications;
mod rate_limit;
mod service_support;
mod trace_id;
mod user;

pub use self::accounts::{AccountPorts, AccountService, WelcomeOutcome};
pub use self::auth::{ClientInfo, LoginCredentials, LoginEvent, LoginValidationError};
pub use self::best_effort::BestEffort;
pub use self::coin_ledger_service::CoinLedgerService;
pub use self::coins::{
    AwardOutcome, AwardRequest, CoinAction, CoinBalance, CoinReference, CoinTransaction,
    CoinValidationError, LedgerEntry, Milestone, SpendRequest, TransactionKind, TransactionPage,
    TransactionQuery,
};
pub use self::discovery::{
    DiscoveryService, GravityTrendingPolicy, Interaction, InteractionActivity, InteractionCounts,
    InteractionType, InteractionWeights, TrendingPolicy, TrendingRefresh, TrendingScore,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::itinerary_views::{
    ItineraryId, ItineraryViewService, VIEW_MILESTONE_THRESHOLD, ViewRecorded,
};
pub use self::notification_dispatcher::{NotificationDispatcher, NotificationPorts};
pub use self::notification_settings_service::NotificationSettingsService;
pub use self::notifications::{
    DispatchOutcome, EmailMessage, NewPushSubscription, NotificationContext, NotificationEvent,
    NotificationKind, NotificationPreferences, NotificationPreferencesPatch,
    NotificationValidationError, PushPayload, PushSubscription, RenderedNotification, SkipReason,
};
pub use self::rate_limit::{
    FailureMode, RateLimitDecision, RateLimitKey, RateLimitPolicy, RateLimiter,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, UserContact, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use itinera::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
