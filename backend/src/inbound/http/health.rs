//! Orchestrator probes, mounted outside `/api/v1`.
//!
//! ```text
//! GET /health/ready -> 200 {"status":"ok"} | 503 {"status":"unavailable"}
//! GET /health/live  -> 200 {"status":"ok"} | 503 {"status":"unavailable"}
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Readiness and liveness flags shared between the server and the probes.
///
/// Starts live but not ready; `main` flips readiness once migrations ran and
/// the listener is bound, and clears liveness when draining.
#[derive(Debug)]
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so the orchestrator stops routing before shutdown.
    pub fn mark_draining(&self) {
        self.ready.store(false, Ordering::Release);
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    Unavailable,
}

/// Probe body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProbeResponse {
    pub status: ProbeStatus,
}

fn probe(ok: bool) -> HttpResponse {
    let (mut builder, status) = if ok {
        (HttpResponse::Ok(), ProbeStatus::Ok)
    } else {
        (HttpResponse::ServiceUnavailable(), ProbeStatus::Unavailable)
    };
    builder
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(ProbeResponse { status })
}

/// Readiness probe: 200 once dependencies are initialised.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Ready to handle traffic", body = ProbeResponse),
        (status = 503, description = "Not ready", body = ProbeResponse)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe(state.is_ready())
}

/// Liveness probe: 503 once the process is draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Alive", body = ProbeResponse),
        (status = 503, description = "Draining", body = ProbeResponse)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    async fn call(state: web::Data<HealthState>, uri: &str) -> (StatusCode, Option<String>, Value) {
        let app = test::init_service(App::new().app_data(state).service(ready).service(live)).await;
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = res.status();
        let cache = res
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body: Value = test::read_body_json(res).await;
        (status, cache, body)
    }

    #[rstest]
    #[case("/health/ready", StatusCode::SERVICE_UNAVAILABLE, "unavailable")]
    #[case("/health/live", StatusCode::OK, "ok")]
    #[actix_rt::test]
    async fn fresh_state_is_live_but_not_ready(
        #[case] uri: &str,
        #[case] expected: StatusCode,
        #[case] status: &str,
    ) {
        let (code, cache, body) = call(web::Data::new(HealthState::new()), uri).await;

        assert_eq!(code, expected);
        assert_eq!(cache.as_deref(), Some("no-store"));
        assert_eq!(body, json!({ "status": status }));
    }

    #[actix_rt::test]
    async fn ready_after_startup() {
        let state = web::Data::new(HealthState::new());
        state.mark_ready();

        let (code, _, body) = call(state, "/health/ready").await;

        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[actix_rt::test]
    async fn draining_fails_both_probes() {
        let state = web::Data::new(HealthState::new());
        state.mark_ready();
        state.mark_draining();

        let (ready_code, _, _) = call(state.clone(), "/health/ready").await;
        let (live_code, _, _) = call(state, "/health/live").await;

        assert_eq!(ready_code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(live_code, StatusCode::SERVICE_UNAVAILABLE);
    }
}
