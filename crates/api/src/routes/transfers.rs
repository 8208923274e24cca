//! Transfer creation, fee quoting, and destination validation routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use meridian_core::transaction::Channel;
use meridian_core::transfer::{Destination, TransferRequest};
use meridian_shared::types::{AccountId, Currency, TransferRequestId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::transactions::TransactionResponse;

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(create_transfer))
        .route("/transfers/quote", post(quote_fee))
        .route("/transfers/validate-destination", post(validate_destination))
}

/// Destination metadata as submitted by the client.
#[derive(Debug, Deserialize)]
pub struct DestinationRequest {
    /// Destination account number.
    pub account_number: String,
    /// Beneficiary name.
    pub beneficiary_name: String,
    /// Beneficiary postal address.
    pub beneficiary_address: Option<String>,
    /// Beneficiary bank name.
    pub bank_name: Option<String>,
    /// 9-digit ABA routing number.
    pub routing_number: Option<String>,
    /// 8/11-character BIC.
    pub swift_bic: Option<String>,
    /// IBAN.
    pub iban: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,
}

impl From<DestinationRequest> for Destination {
    fn from(body: DestinationRequest) -> Self {
        Self {
            account_number: body.account_number,
            beneficiary_name: body.beneficiary_name,
            beneficiary_address: body.beneficiary_address,
            bank_name: body.bank_name,
            routing_number: body.routing_number,
            swift_bic: body.swift_bic,
            iban: body.iban,
            country: body.country,
        }
    }
}

/// Request body for creating a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// Source account.
    pub from_account_id: AccountId,
    /// Where the money goes.
    pub destination: DestinationRequest,
    /// Amount to transfer.
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

/// Response for a created transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Transfer request ID.
    pub id: TransferRequestId,
    /// Settlement path.
    pub transfer_type: String,
    /// Fee charged.
    pub fee: String,
    /// Whether compliance flagged the transfer for review.
    pub requires_enhanced_due_diligence: bool,
    /// The driving transaction.
    pub transaction: TransactionResponse,
}

/// Request body for a fee quote or destination validation.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    /// Where the money would go.
    pub destination: DestinationRequest,
    /// Amount to quote.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
}

/// Response for a fee quote.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    /// Settlement path the destination classifies to.
    pub transfer_type: String,
    /// Fee that would be charged.
    pub fee: String,
}

/// Response for destination validation.
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    /// Whether the destination is routable.
    pub valid: bool,
    /// Settlement path the destination classifies to.
    pub transfer_type: String,
}

/// POST `/transfers` - Create a transfer.
async fn create_transfer(
    State(state): State<AppState>,
    Json(body): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    let amount = meridian_shared::types::Money::new(body.amount, body.currency);
    let (txn, transfer): (_, TransferRequest) = state.service.create_transfer(
        body.from_account_id,
        body.destination.into(),
        amount,
        body.channel,
        body.description,
    )?;
    let response = TransferResponse {
        id: transfer.id,
        transfer_type: transfer.transfer_type.to_string(),
        fee: transfer.fee.amount.to_string(),
        requires_enhanced_due_diligence: transfer.requires_enhanced_due_diligence(),
        transaction: txn.into(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST `/transfers/quote` - Quote the fee for a destination.
async fn quote_fee(
    State(state): State<AppState>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let amount = meridian_shared::types::Money::new(body.amount, body.currency);
    let (transfer_type, fee) = state.service.quote_fee(&body.destination.into(), amount)?;
    Ok(Json(QuoteResponse {
        transfer_type: transfer_type.to_string(),
        fee: fee.amount.to_string(),
    }))
}

/// POST `/transfers/validate-destination` - Check a destination
/// without creating anything.
async fn validate_destination(
    State(state): State<AppState>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let transfer_type = state.service.validate_destination(&body.destination.into())?;
    Ok(Json(ValidationResponse {
        valid: true,
        transfer_type: transfer_type.to_string(),
    }))
}
