use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tipjar_sdk::{
    Address, Amount, ConsistencyReport, GlobalStats, LedgerSnapshot, MatchBasis,
    RecipientStats, RegistryEntry, Resolution, Role, TipEvent, TipJar, TipRequest,
    TopRecipient, WithdrawalReceipt,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub type AppState = Arc<TipJar>;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub external_ref: String,
    pub payout_address: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub external_ref: String,
    /// Skip the fuzzy fallback.
    #[serde(default)]
    pub exact: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceTipRequest {
    pub external_ref: String,
    pub sender: String,
    pub amount: Amount,
    #[serde(default)]
    pub external_tx_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub recipient: Address,
    pub balance: Amount,
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(jar): State<AppState>) -> Json<serde_json::Value> {
    let config = jar.config();
    Json(json!({
        "name": "tipjar-server",
        "version": env!("CARGO_PKG_VERSION"),
        "asset": config.asset,
        "ref_prefixes": config.ref_prefixes,
        "fuzzy_resolution": config.fuzzy_resolution,
        "strict_addresses": config.strict_addresses,
    }))
}

pub async fn register_recipient(
    State(jar): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegistryEntry>), ApiError> {
    let entry = jar.register_recipient(&request.external_ref, &request.payout_address)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_recipients(State(jar): State<AppState>) -> ApiResult<Vec<RegistryEntry>> {
    Ok(Json(jar.recipients()?))
}

pub async fn resolve_recipient(
    State(jar): State<AppState>,
    ApiQuery(query): ApiQuery<ResolveQuery>,
) -> ApiResult<Resolution> {
    if query.exact {
        let payout_address = jar.resolve_recipient_exact(&query.external_ref)?;
        return Ok(Json(Resolution {
            external_ref: query.external_ref,
            payout_address,
            basis: MatchBasis::Exact,
        }));
    }
    Ok(Json(jar.resolve_recipient(&query.external_ref)?))
}

pub async fn submit_tip(
    State(jar): State<AppState>,
    ApiJson(request): ApiJson<TipRequest>,
) -> Result<(StatusCode, Json<TipEvent>), ApiError> {
    let event = jar.submit_tip(request)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn tip_by_reference(
    State(jar): State<AppState>,
    ApiJson(request): ApiJson<ReferenceTipRequest>,
) -> Result<(StatusCode, Json<TipEvent>), ApiError> {
    let event = jar.tip_by_reference(
        &request.external_ref,
        &request.sender,
        request.amount,
        request.external_tx_id.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn balance(
    State(jar): State<AppState>,
    ApiPath(address): ApiPath<String>,
) -> ApiResult<BalanceResponse> {
    let balance = jar.get_balance(&address)?;
    let recipient = Address::parse(address).map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(Json(BalanceResponse { recipient, balance }))
}

pub async fn stats(
    State(jar): State<AppState>,
    ApiPath(address): ApiPath<String>,
) -> ApiResult<RecipientStats> {
    Ok(Json(jar.get_stats(&address)?))
}

pub async fn transactions(
    State(jar): State<AppState>,
    ApiPath(address): ApiPath<String>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Vec<TipEvent>> {
    let role = match query.role.as_deref() {
        None => Role::Recipient,
        Some(raw) => raw.parse::<Role>().map_err(ApiError::bad_request)?,
    };
    Ok(Json(jar.transactions_for(&address, role)?))
}

pub async fn withdraw(
    State(jar): State<AppState>,
    ApiPath(address): ApiPath<String>,
    ApiJson(request): ApiJson<WithdrawRequest>,
) -> ApiResult<WithdrawalReceipt> {
    Ok(Json(jar.withdraw(&address, request.amount)?))
}

pub async fn global_stats(State(jar): State<AppState>) -> ApiResult<GlobalStats> {
    Ok(Json(jar.get_global_stats()?))
}

pub async fn top_recipients(
    State(jar): State<AppState>,
    ApiQuery(query): ApiQuery<TopQuery>,
) -> ApiResult<Vec<TopRecipient>> {
    Ok(Json(jar.get_top_recipients(query.limit)?))
}

pub async fn export(State(jar): State<AppState>) -> ApiResult<LedgerSnapshot> {
    Ok(Json(jar.export()?))
}

pub async fn verify(State(jar): State<AppState>) -> ApiResult<ConsistencyReport> {
    Ok(Json(jar.verify()?))
}
