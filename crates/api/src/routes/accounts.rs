//! Account opening and lookup routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use meridian_core::account::Account;
use meridian_shared::types::{AccountId, Currency, CustomerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(open_account))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/by-number/{number}", get(get_account_by_number))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    /// Owning customer; generated when absent.
    pub owner_id: Option<Uuid>,
    /// Display name for the account.
    pub account_name: String,
    /// Account currency.
    pub currency: Currency,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: AccountId,
    /// Owning customer ID.
    pub owner_id: CustomerId,
    /// Account number.
    pub account_number: String,
    /// Display name.
    pub account_name: String,
    /// Currency code.
    pub currency: Currency,
    /// Lifecycle status.
    pub status: String,
    /// Settled balance.
    pub balance: String,
    /// Funds held against pending transfers.
    pub hold_balance: String,
    /// Balance minus holds.
    pub available_balance: String,
    /// Overdraft allowance.
    pub overdraft_limit: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            owner_id: account.owner,
            account_number: account.account_number.clone(),
            account_name: account.account_name.clone(),
            currency: account.currency,
            status: account.status.to_string(),
            balance: account.balance().amount.to_string(),
            hold_balance: account.hold_balance().amount.to_string(),
            available_balance: account.available_balance().amount.to_string(),
            overdraft_limit: account.overdraft_limit.amount.to_string(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// POST `/accounts` - Open a new account.
async fn open_account(
    State(state): State<AppState>,
    Json(body): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let owner = body.owner_id.map_or_else(CustomerId::new, CustomerId::from_uuid);
    let account = state
        .service
        .open_account(owner, body.account_name, body.currency);
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET `/accounts/{account_id}` - Look up an account.
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.service.account(account_id)?;
    Ok(Json(account.into()))
}

/// GET `/accounts/by-number/{number}` - Look up an account by number.
async fn get_account_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.service.account_by_number(&number)?;
    Ok(Json(account.into()))
}
