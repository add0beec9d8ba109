//! Itinerary analytics endpoints.
//!
//! ```text
//! POST /api/v1/itineraries/{id}/view
//! POST /api/v1/itineraries/{id}/interactions {"type":"like"}
//! ```
//!
//! Both are throttled with the fail-open view-tracking policy: a limiter
//! outage must not stop itineraries from being read.

use std::str::FromStr;

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Interaction, InteractionType, ItineraryId, RateLimitPolicy};
use crate::inbound::http::ApiResult;
use crate::inbound::http::client_ip::RequestClient;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, parse_uuid, require};

const ITINERARY_ID: FieldName = FieldName::new("id");
const INTERACTION_TYPE: FieldName = FieldName::new("type");

/// Acknowledgement body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ViewResponse {
    pub success: bool,
}

/// Interaction request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct InteractionRequest {
    /// One of `view`, `like`, `comment`, `save`, `share`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn parse_itinerary_id(raw: &str) -> Result<ItineraryId, Error> {
    parse_uuid(raw, ITINERARY_ID).map(ItineraryId::from_uuid)
}

fn parse_interaction_type(payload: InteractionRequest) -> Result<InteractionType, Error> {
    let raw = require(payload.kind, INTERACTION_TYPE)?;
    InteractionType::from_str(&raw)
        .map_err(|err| invalid_value_error(INTERACTION_TYPE, &raw, err.message()))
}

/// Count one view of an itinerary.
///
/// Anonymous callers are allowed; throttling is per client address.
#[utoipa::path(
    post,
    path = "/api/v1/itineraries/{id}/view",
    params(("id" = String, Path, description = "Itinerary UUID")),
    responses(
        (status = 200, description = "View counted", body = ViewResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown itinerary", body = Error),
        (status = 429, description = "Too many requests", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "trackItineraryView",
    security([])
)]
#[post("/itineraries/{id}/view")]
pub async fn track_view(
    state: web::Data<HttpState>,
    client: RequestClient,
    path: web::Path<String>,
) -> ApiResult<web::Json<ViewResponse>> {
    let itinerary_id = parse_itinerary_id(&path)?;
    let policy = RateLimitPolicy::VIEW_TRACKING;
    state
        .rate_limiter
        .enforce(&policy.key_for(client.rate_limit_subject()), &policy)
        .await?;

    state.itinerary_views.record_view(&itinerary_id).await?;
    Ok(web::Json(ViewResponse { success: true }))
}

/// Record a typed interaction by the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/itineraries/{id}/interactions",
    params(("id" = String, Path, description = "Itinerary UUID")),
    request_body = InteractionRequest,
    responses(
        (status = 204, description = "Interaction recorded"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown itinerary", body = Error),
        (status = 429, description = "Too many requests", body = Error)
    ),
    tags = ["itineraries"],
    operation_id = "trackItineraryInteraction"
)]
#[post("/itineraries/{id}/interactions")]
pub async fn track_interaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<InteractionRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let itinerary_id = parse_itinerary_id(&path)?;
    let kind = parse_interaction_type(payload.into_inner())?;
    let policy = RateLimitPolicy::VIEW_TRACKING;
    state
        .rate_limiter
        .enforce(&policy.key_for(&user_id), &policy)
        .await?;

    state
        .discovery
        .track_interaction(Interaction {
            user_id,
            itinerary_id,
            kind,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "itineraries_tests.rs"]
mod tests;
