//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};
use mockable::DefaultClock;

use crate::domain::ports::{
    MockAccountCommand, MockCoinLedgerCommand, MockCoinLedgerQuery, MockDiscoveryCommand,
    MockItineraryViewCommand, MockNotificationDispatch, MockNotificationSettings,
    MockRateLimitStore, RateLimitStore,
};
use crate::domain::{Error, RateLimiter, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::rate_limit::InMemoryRateLimitStore;

/// Path of the sign-in shortcut mounted by handler tests.
pub const TEST_SIGN_IN_PATH: &str = "/test/sign-in/{user_id}";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Copy the `session` cookie out of a response.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Handler for [`TEST_SIGN_IN_PATH`]: binds the session to the path's user.
pub async fn test_sign_in(
    session: SessionContext,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(path.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.sign_in(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign `user_id` in through [`TEST_SIGN_IN_PATH`] and return the cookie.
pub async fn signed_in_cookie<S, B>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!("/test/sign-in/{user_id}"))
            .to_request(),
    )
    .await;
    session_cookie(&res)
}

/// Mocked driving ports; unset expectations panic when called.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountCommand,
    pub coins: MockCoinLedgerCommand,
    pub coins_query: MockCoinLedgerQuery,
    pub itinerary_views: MockItineraryViewCommand,
    pub notifications: MockNotificationDispatch,
    pub notification_settings: MockNotificationSettings,
    pub discovery: MockDiscoveryCommand,
}

impl MockPorts {
    /// State backed by these mocks and a fresh in-memory limiter.
    pub fn into_state(self) -> HttpState {
        let clock = Arc::new(DefaultClock);
        self.into_state_with_store(Arc::new(InMemoryRateLimitStore::new(clock)))
    }

    /// State whose limiter uses `store`.
    pub fn into_state_with_store(self, store: Arc<dyn RateLimitStore>) -> HttpState {
        let ports = HttpStatePorts {
            accounts: Arc::new(self.accounts),
            coins: Arc::new(self.coins),
            coins_query: Arc::new(self.coins_query),
            itinerary_views: Arc::new(self.itinerary_views),
            notifications: Arc::new(self.notifications),
            notification_settings: Arc::new(self.notification_settings),
            discovery: Arc::new(self.discovery),
        };
        HttpState::new(ports, RateLimiter::new(store, Arc::new(DefaultClock)))
    }
}

/// Store that always fails, for exercising limiter failure modes.
pub fn failing_rate_limit_store() -> Arc<dyn RateLimitStore> {
    use crate::domain::ports::RateLimitStoreError;

    let mut store = MockRateLimitStore::new();
    store
        .expect_hit()
        .returning(|_, _| Err(RateLimitStoreError::unavailable("redis unreachable")));
    Arc::new(store)
}
