//! Coin balance, history and spending endpoints.
//!
//! ```text
//! GET  /api/v1/coins
//! GET  /api/v1/coins/transactions?limit=20&offset=0&type=earn
//! POST /api/v1/coins/spend {"amount":5,"action":"itinerary_boost"}
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CoinAction, CoinBalance, CoinReference, CoinTransaction, CoinValidationError, Error,
    RateLimitPolicy, SpendRequest, TransactionKind, TransactionPage, TransactionQuery, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, missing_field_error, require,
};

const AMOUNT: FieldName = FieldName::new("amount");
const ACTION: FieldName = FieldName::new("action");
const REFERENCE_TYPE: FieldName = FieldName::new("referenceType");
const REFERENCE_ID: FieldName = FieldName::new("referenceId");
const KIND: FieldName = FieldName::new("type");

/// Balance summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
}

impl From<CoinBalance> for BalanceResponse {
    fn from(value: CoinBalance) -> Self {
        Self {
            balance: value.balance,
            lifetime_earned: value.lifetime_earned,
            lifetime_spent: value.lifetime_spent,
        }
    }
}

/// One ledger row as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub amount: i64,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl From<CoinTransaction> for TransactionResponse {
    fn from(value: CoinTransaction) -> Self {
        let (reference_type, reference_id) = value
            .reference
            .map(|reference| {
                (
                    Some(reference.reference_type().to_owned()),
                    Some(reference.reference_id().to_owned()),
                )
            })
            .unwrap_or_default();
        Self {
            id: value.id.to_string(),
            amount: value.amount,
            action: value.action.as_str().to_owned(),
            reference_type,
            reference_id,
            metadata: value.metadata,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Page of ledger history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPageResponse {
    pub transactions: Vec<TransactionResponse>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl From<TransactionPage> for TransactionPageResponse {
    fn from(value: TransactionPage) -> Self {
        Self {
            transactions: value.transactions.into_iter().map(Into::into).collect(),
            total: value.total,
            limit: value.limit,
            offset: value.offset,
        }
    }
}

/// History filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionsParams {
    /// Page size, default 20, capped at 50.
    pub limit: Option<u32>,
    /// Rows to skip.
    pub offset: Option<u32>,
    /// `earn` or `spend`.
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub kind: Option<String>,
}

fn parse_transactions_query(params: TransactionsParams) -> Result<TransactionQuery, Error> {
    let kind = params
        .kind
        .as_deref()
        .map(|raw| TransactionKind::from_str(raw).map_err(|err| invalid_value_error(KIND, raw, err)))
        .transpose()?;
    Ok(TransactionQuery::new(params.limit, params.offset, kind))
}

/// Debit request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpendCoinsRequest {
    pub amount: Option<i64>,
    pub action: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

fn spend_validation_error(err: CoinValidationError, payload: &SpendCoinsRequest) -> Error {
    match err {
        CoinValidationError::NonPositiveAmount => invalid_value_error(
            AMOUNT,
            &payload.amount.unwrap_or_default().to_string(),
            err,
        ),
        CoinValidationError::InvalidAction => {
            invalid_value_error(ACTION, payload.action.as_deref().unwrap_or_default(), err)
        }
        CoinValidationError::EmptyReference => invalid_value_error(
            REFERENCE_ID,
            payload.reference_id.as_deref().unwrap_or_default(),
            err,
        ),
        CoinValidationError::UnknownKind => Error::invalid_request(err.to_string()),
    }
}

fn parse_spend_request(
    user_id: UserId,
    payload: SpendCoinsRequest,
) -> Result<SpendRequest, Error> {
    let amount = require(payload.amount, AMOUNT)?;
    let action = require(payload.action.as_deref(), ACTION)?;
    let action = CoinAction::new(action).map_err(|err| spend_validation_error(err, &payload))?;
    let reference = match (payload.reference_type.as_deref(), payload.reference_id.as_deref()) {
        (None, None) => None,
        (Some(kind), Some(id)) => Some(
            CoinReference::new(kind, id).map_err(|err| spend_validation_error(err, &payload))?,
        ),
        (Some(_), None) => return Err(missing_field_error(REFERENCE_ID)),
        (None, Some(_)) => return Err(missing_field_error(REFERENCE_TYPE)),
    };
    SpendRequest::new(user_id, amount, action, reference, json!({}))
        .map_err(|err| spend_validation_error(err, &payload))
}

/// Current balance of the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/coins",
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["coins"],
    operation_id = "getCoinBalance"
)]
#[get("/coins")]
pub async fn get_balance(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<BalanceResponse>> {
    let user_id = session.require_user_id()?;
    let balance = state.coins_query.balance(&user_id).await?;
    Ok(web::Json(balance.into()))
}

/// Ledger history of the signed-in user, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/coins/transactions",
    params(TransactionsParams),
    responses(
        (status = 200, description = "Transaction page", body = TransactionPageResponse),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["coins"],
    operation_id = "listCoinTransactions"
)]
#[get("/coins/transactions")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<TransactionsParams>,
) -> ApiResult<web::Json<TransactionPageResponse>> {
    let user_id = session.require_user_id()?;
    let query = parse_transactions_query(params.into_inner())?;
    let page = state.coins_query.transactions(&user_id, query).await?;
    Ok(web::Json(page.into()))
}

/// Spend coins from the signed-in user's balance.
#[utoipa::path(
    post,
    path = "/api/v1/coins/spend",
    request_body = SpendCoinsRequest,
    responses(
        (status = 201, description = "Debit recorded", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Insufficient balance", body = Error),
        (status = 429, description = "Too many requests", body = Error),
        (status = 503, description = "Rate limiter unavailable", body = Error)
    ),
    tags = ["coins"],
    operation_id = "spendCoins"
)]
#[post("/coins/spend")]
pub async fn spend_coins(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SpendCoinsRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let policy = RateLimitPolicy::CREATOR_API;
    let key = policy.key_for(&user_id);
    let request = parse_spend_request(user_id, payload.into_inner())?;
    state.rate_limiter.enforce(&key, &policy).await?;

    let transaction = state.coins.spend(request).await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(transaction)))
}

#[cfg(test)]
#[path = "coins_tests.rs"]
mod tests;
