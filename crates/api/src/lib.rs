//! HTTP API layer over the banking service.
//!
//! Thin Axum routes: request parsing, service calls, JSON responses.
//! No business logic lives here.

pub mod error;
pub mod routes;

use axum::Router;
use meridian_core::processing::BankService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The banking service.
    pub service: Arc<BankService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use http_body_util::BodyExt;
    use meridian_core::processing::SystemClock;
    use meridian_core::settlement::{MockAchGateway, MockSwiftGateway, OutcomePolicy};
    use meridian_shared::config::BankConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_app() -> Router {
        // Zero confirmation delay so request-driven transactions run to
        // completion inside the request.
        let config = BankConfig {
            confirmation_delay_hours: 0,
            ..BankConfig::default()
        };
        let service = BankService::new(
            config,
            Arc::new(SystemClock),
            Arc::new(MockAchGateway::with_policy(OutcomePolicy::AlwaysAccept)),
            Arc::new(MockSwiftGateway::with_policy(OutcomePolicy::AlwaysAccept)),
        );
        create_router(AppState {
            service: Arc::new(service),
        })
    }

    async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn open_funded_account(app: &Router, name: &str, amount: &str) -> Value {
        let (status, account) = request(
            app,
            "POST",
            "/api/v1/accounts",
            Some(json!({"account_name": name, "currency": "USD"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = request(
            app,
            "POST",
            "/api/v1/transactions/deposit",
            Some(json!({
                "account_id": account["id"],
                "amount": amount,
                "currency": "USD",
                "source": "cash",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        account
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let (status, body) = request(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_open_account_and_lookup() {
        let app = test_app();
        let (status, account) = request(
            &app,
            "POST",
            "/api/v1/accounts",
            Some(json!({"account_name": "Checking", "currency": "USD"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(account["balance"], "0");

        let uri = format!("/api/v1/accounts/{}", account["id"].as_str().unwrap());
        let (status, fetched) = request(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["account_number"], account["account_number"]);
    }

    #[tokio::test]
    async fn test_unknown_account_returns_not_found() {
        let app = test_app();
        let uri = format!("/api/v1/accounts/{}", uuid::Uuid::now_v7());
        let (status, body) = request(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_deposit_completes_and_withdrawal_over_balance_fails() {
        let app = test_app();
        let account = open_funded_account(&app, "Checking", "100.00").await;

        let uri = format!("/api/v1/accounts/{}", account["id"].as_str().unwrap());
        let (_, fetched) = request(&app, "GET", &uri, None).await;
        assert_eq!(fetched["balance"], "100.00");

        // Overdraw: the transaction is recorded as failed, not rejected.
        let (status, txn) = request(
            &app,
            "POST",
            "/api/v1/transactions/withdrawal",
            Some(json!({
                "account_id": account["id"],
                "amount": "500.00",
                "currency": "USD",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(txn["status"], "failed");
        assert_eq!(txn["failure_reason"], "insufficient_funds");

        let (_, fetched) = request(&app, "GET", &uri, None).await;
        assert_eq!(fetched["balance"], "100.00");
    }

    #[tokio::test]
    async fn test_internal_transfer_between_accounts() {
        let app = test_app();
        let from = open_funded_account(&app, "Source", "1000.00").await;
        let (_, to) = request(
            &app,
            "POST",
            "/api/v1/accounts",
            Some(json!({"account_name": "Destination", "currency": "USD"})),
        )
        .await;

        let (status, transfer) = request(
            &app,
            "POST",
            "/api/v1/transfers",
            Some(json!({
                "from_account_id": from["id"],
                "destination": {
                    "account_number": to["account_number"],
                    "beneficiary_name": "Jordan Reyes",
                },
                "amount": "250.00",
                "currency": "USD",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(transfer["transfer_type"], "internal");
        assert_eq!(transfer["fee"], "0");
        assert_eq!(transfer["transaction"]["status"], "completed");

        let uri = format!("/api/v1/accounts/{}", to["id"].as_str().unwrap());
        let (_, fetched) = request(&app, "GET", &uri, None).await;
        assert_eq!(fetched["balance"], "250.00");
    }

    #[tokio::test]
    async fn test_sanctioned_beneficiary_is_forbidden() {
        let app = test_app();
        let from = open_funded_account(&app, "Source", "1000.00").await;

        let (status, body) = request(
            &app,
            "POST",
            "/api/v1/transfers",
            Some(json!({
                "from_account_id": from["id"],
                "destination": {
                    "account_number": "99900011",
                    "beneficiary_name": "Blocked Person",
                    "routing_number": "021000021",
                },
                "amount": "100.00",
                "currency": "USD",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "compliance_blocked");
        assert_eq!(body["error"]["compliance_reference"], "OFAC_BLOCKED");
    }

    #[tokio::test]
    async fn test_external_destination_without_routing_is_rejected() {
        let app = test_app();
        let from = open_funded_account(&app, "Source", "1000.00").await;

        let (status, body) = request(
            &app,
            "POST",
            "/api/v1/transfers",
            Some(json!({
                "from_account_id": from["id"],
                "destination": {
                    "account_number": "99900011",
                    "beneficiary_name": "Jordan Reyes",
                },
                "amount": "100.00",
                "currency": "USD",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_destination");
    }

    #[tokio::test]
    async fn test_quote_fee_for_ach_destination() {
        let app = test_app();
        let (status, quote) = request(
            &app,
            "POST",
            "/api/v1/transfers/quote",
            Some(json!({
                "destination": {
                    "account_number": "99900011",
                    "beneficiary_name": "Jordan Reyes",
                    "routing_number": "021000021",
                },
                "amount": "100.00",
                "currency": "USD",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["transfer_type"], "domestic_external");
        assert_eq!(quote["fee"], "15.00");
    }

    #[tokio::test]
    async fn test_admin_sweep_with_empty_body() {
        let app = test_app();
        let (status, counts) =
            request(&app, "POST", "/api/v1/admin/process-eligible", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counts["examined"], 0);
    }
}
