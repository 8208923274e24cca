//! Deposit, withdrawal, and transaction lifecycle routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use meridian_core::processing::StatusView;
use meridian_core::transaction::{Channel, DepositSource, Transaction};
use meridian_shared::types::{AccountId, Currency, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions/deposit", post(create_deposit))
        .route("/transactions/withdrawal", post(create_withdrawal))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/transactions/{transaction_id}/confirm", post(confirm))
        .route("/transactions/{transaction_id}/cancel", post(cancel))
        .route("/transactions/{transaction_id}/reverse", post(reverse))
}

/// Request body for a deposit.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// Account to credit.
    pub account_id: AccountId,
    /// Amount to deposit.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
    /// How the funds arrived.
    pub source: DepositSource,
    /// Channel the request came through.
    #[serde(default = "default_channel")]
    pub channel: Channel,
    /// Free-text description.
    pub description: Option<String>,
}

/// Request body for a withdrawal.
#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    /// Account to debit.
    pub account_id: AccountId,
    /// Amount to withdraw.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
    /// Channel the request came through.
    #[serde(default = "default_channel")]
    pub channel: Channel,
    /// Free-text description.
    pub description: Option<String>,
}

const fn default_channel() -> Channel {
    Channel::Online
}

/// Response for a created or transitioned transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: TransactionId,
    /// Human-facing reference.
    pub reference: String,
    /// Kind of movement.
    pub transaction_type: String,
    /// Current status.
    pub status: String,
    /// Principal amount.
    pub amount: String,
    /// Fee charged.
    pub fee: String,
    /// Principal plus fee.
    pub total_amount: String,
    /// Business-day completion estimate.
    pub expected_completion_date: Option<String>,
    /// Why the transaction failed, when it did.
    pub failure_reason: Option<String>,
    /// Settlement network reference, once assigned.
    pub external_reference: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        Self {
            id: txn.id,
            reference: txn.reference.clone(),
            transaction_type: txn.transaction_type.to_string(),
            status: txn.status.to_string(),
            amount: txn.amount.amount.to_string(),
            fee: txn.fee.amount.to_string(),
            total_amount: txn.total_amount.amount.to_string(),
            expected_completion_date: txn.expected_completion_date.map(|d| d.to_string()),
            failure_reason: txn.failure_reason.clone(),
            external_reference: txn.external_reference.clone(),
            created_at: txn.created_at.to_rfc3339(),
        }
    }
}

/// POST `/transactions/deposit` - Create a deposit.
async fn create_deposit(
    State(state): State<AppState>,
    Json(body): Json<DepositRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let amount = meridian_shared::types::Money::new(body.amount, body.currency);
    let txn = state.service.create_deposit(
        body.account_id,
        amount,
        body.source,
        body.channel,
        body.description,
    )?;
    Ok((StatusCode::CREATED, Json(txn.into())))
}

/// POST `/transactions/withdrawal` - Create a withdrawal.
async fn create_withdrawal(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let amount = meridian_shared::types::Money::new(body.amount, body.currency);
    let txn = state.service.create_withdrawal(
        body.account_id,
        amount,
        body.channel,
        body.description,
    )?;
    Ok((StatusCode::CREATED, Json(txn.into())))
}

/// GET `/transactions/{transaction_id}` - Status with balance snapshots.
async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<StatusView>, ApiError> {
    let view = state.service.get_status(transaction_id)?;
    Ok(Json(view))
}

/// POST `/transactions/{transaction_id}/confirm` - Force confirmation.
async fn confirm(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<TransactionResponse>, ApiError> {
    state.service.confirm(transaction_id)?;
    let txn = state.service.transaction_by_id(transaction_id)?;
    Ok(Json(txn.into()))
}

/// POST `/transactions/{transaction_id}/cancel` - Cancel while pending.
async fn cancel(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<TransactionResponse>, ApiError> {
    state.service.cancel(transaction_id)?;
    let txn = state.service.transaction_by_id(transaction_id)?;
    Ok(Json(txn.into()))
}

/// POST `/transactions/{transaction_id}/reverse` - Reverse a completed
/// transaction with a new reversal transaction.
async fn reverse(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let reversal = state.service.reverse(transaction_id)?;
    Ok((StatusCode::CREATED, Json(reversal.into())))
}
