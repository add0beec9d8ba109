//! Scheduled-job trigger endpoints.
//!
//! ```text
//! POST /api/v1/cron/trending   Authorization: Bearer <secret>
//! ```
//!
//! The scheduler is external; it authenticates with a shared bearer secret
//! rather than a user session.

use std::fmt;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, post, web};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{Error, TrendingRefresh};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Shared secret presented by the scheduler.
///
/// Compared through SHA-256 digests so the check takes the same time
/// whatever prefix of the secret a caller guesses.
#[derive(Clone)]
pub struct CronSecret(Zeroizing<String>);

impl CronSecret {
    /// Wrap `secret`; blank secrets are rejected.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    fn matches(&self, presented: &str) -> bool {
        let expected = Sha256::digest(self.0.as_bytes());
        let presented = Sha256::digest(presented.as_bytes());
        expected
            .iter()
            .zip(presented.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for CronSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CronSecret(<redacted>)")
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn authorise(state: &HttpState, req: &HttpRequest) -> Result<(), Error> {
    let Some(secret) = state.cron_secret.as_ref() else {
        return Err(Error::service_unavailable("scheduled jobs are not configured"));
    };
    match bearer_token(req) {
        Some(token) if secret.matches(token) => Ok(()),
        _ => {
            warn!("rejected cron trigger with missing or wrong secret");
            Err(Error::unauthorized("invalid cron credentials"))
        }
    }
}

/// Response body for a trending refresh.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRefreshResponse {
    pub success: bool,
    pub scored: usize,
}

impl From<TrendingRefresh> for TrendingRefreshResponse {
    fn from(value: TrendingRefresh) -> Self {
        Self {
            success: true,
            scored: value.scored,
        }
    }
}

/// Recompute and persist trending scores.
#[utoipa::path(
    post,
    path = "/api/v1/cron/trending",
    responses(
        (status = 200, description = "Scores recomputed", body = TrendingRefreshResponse),
        (status = 401, description = "Missing or wrong bearer secret", body = Error),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Cron secret not configured", body = Error)
    ),
    tags = ["cron"],
    operation_id = "refreshTrending",
    security(("CronBearer" = []))
)]
#[post("/cron/trending")]
pub async fn refresh_trending(
    state: web::Data<HttpState>,
    req: HttpRequest,
) -> ApiResult<web::Json<TrendingRefreshResponse>> {
    authorise(&state, &req)?;
    let refresh = state.discovery.refresh_trending().await?;
    Ok(web::Json(refresh.into()))
}
