//! HTTP server for Tipjar.
//!
//! Exposes the [`TipJar`](tipjar_sdk::TipJar) call interface as a JSON API:
//! one route per operation, errors as `{ "error": kind, "message": text }`.

pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody, ServerError, ServerResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use router::build_router;
pub use server::TipjarServer;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tipjar_sdk::{TipJar, TipJarConfig};
    use tower::util::ServiceExt;

    use super::*;

    const STX_A: &str = "SP2MF04VAGYHGAZWGTEDW5VYCPDWWSY08Z1QFNDSN";
    const FAN: &str = "SM3VDXK3WZZSA84XXFKAFAF15NNZX32CTSG82JFQ4";

    fn app() -> Router {
        build_router(Arc::new(TipJar::new(TipJarConfig::default())))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), "GET", "/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (status, body) = send(&app(), "GET", "/v1/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "tipjar-server");
        assert_eq!(body["asset"], "stacks");
    }

    #[tokio::test]
    async fn register_resolve_and_duplicate() {
        let app = app();
        let registration = json!({
            "external_ref": "https://soundcloud.com/dj-a",
            "payout_address": STX_A,
        });

        let (status, body) = send(&app, "POST", "/v1/recipients", Some(registration.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["payout_address"], STX_A);

        let (status, body) = send(&app, "POST", "/v1/recipients", Some(registration)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_registration");

        let (status, body) = send(
            &app,
            "GET",
            "/v1/resolve?external_ref=https://soundcloud.com/dj-a/track",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["basis"], "fuzzy");

        let (status, body) = send(
            &app,
            "GET",
            "/v1/resolve?external_ref=https://soundcloud.com/dj-a/track&exact=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_registered");

        let (_, body) = send(&app, "GET", "/v1/recipients", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_payout_address_is_bad_request() {
        let (status, body) = send(
            &app(),
            "POST",
            "/v1/recipients",
            Some(json!({ "external_ref": "https://x.com/a", "payout_address": "0x12" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_address");
    }

    #[tokio::test]
    async fn tip_balance_and_withdraw_flow() {
        let app = app();
        for (sender, amount) in [("fan-1", 500), ("fan-2", 1500)] {
            let (status, _) = send(
                &app,
                "POST",
                "/v1/tips",
                Some(json!({ "recipient": STX_A, "sender": sender, "amount": amount })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = send(&app, "GET", &format!("/v1/accounts/{STX_A}/balance"), None).await;
        assert_eq!(body["balance"], 2000);

        let (_, body) = send(&app, "GET", &format!("/v1/accounts/{STX_A}/stats"), None).await;
        assert_eq!(body["tip_count"], 2);
        assert_eq!(body["unique_senders"], 2);

        let withdrawals = format!("/v1/accounts/{STX_A}/withdrawals");
        let (status, body) = send(&app, "POST", &withdrawals, Some(json!({ "amount": 2500 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "insufficient_balance");

        let (status, body) = send(&app, "POST", &withdrawals, Some(json!({ "amount": 2000 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remaining_balance"], 0);

        let (_, body) = send(&app, "GET", "/v1/stats", None).await;
        assert_eq!(body["transaction_count"], 2);
        assert_eq!(body["pool_balance"], 0);

        let (_, body) = send(&app, "GET", "/v1/verify", None).await;
        assert_eq!(body["violations"], json!([]));
    }

    #[tokio::test]
    async fn zero_amount_is_bad_request() {
        let (status, body) = send(
            &app(),
            "POST",
            "/v1/tips",
            Some(json!({ "recipient": STX_A, "sender": FAN, "amount": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_amount");
    }

    #[tokio::test]
    async fn fractional_amount_is_a_json_bad_request() {
        let (status, body) = send(
            &app(),
            "POST",
            "/v1/tips",
            Some(json!({ "recipient": STX_A, "sender": FAN, "amount": 1.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn malformed_bodies_and_queries_keep_the_error_shape() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/v1/recipients",
            Some(json!({ "external_ref": "https://soundcloud.com/dj-a" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        let (status, body) = send(&app, "GET", "/v1/top?limit=ten", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        let (status, body) = send(&app, "GET", "/v1/resolve", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        // Insufficient balance stays distinguishable from bad input.
        let (status, body) = send(
            &app,
            "POST",
            &format!("/v1/accounts/{STX_A}/withdrawals"),
            Some(json!({ "amount": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "insufficient_balance");
    }

    #[tokio::test]
    async fn tip_by_reference_route() {
        let app = app();
        send(
            &app,
            "POST",
            "/v1/recipients",
            Some(json!({ "external_ref": "https://soundcloud.com/dj-a", "payout_address": STX_A })),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            "/v1/tips/by-reference",
            Some(json!({
                "external_ref": "https://soundcloud.com/dj-a",
                "sender": FAN,
                "amount": 42,
                "external_tx_id": "0xbeef",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["recipient"], STX_A);
        assert_eq!(body["id"], "0xbeef");

        let (status, body) = send(
            &app,
            "POST",
            "/v1/tips/by-reference",
            Some(json!({
                "external_ref": "https://soundcloud.com/dj-a",
                "sender": FAN,
                "amount": 42,
                "external_tx_id": "0xbeef",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_transaction");
    }

    #[tokio::test]
    async fn history_top_and_export() {
        let app = app();
        for (recipient, amount) in [(STX_A, 10), ("dj-b", 30), (STX_A, 5)] {
            send(
                &app,
                "POST",
                "/v1/tips",
                Some(json!({ "recipient": recipient, "sender": FAN, "amount": amount })),
            )
            .await;
        }

        let (_, body) = send(
            &app,
            "GET",
            &format!("/v1/accounts/{FAN}/transactions?role=sender"),
            None,
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            "GET",
            &format!("/v1/accounts/{FAN}/transactions?role=dj"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        let (_, body) = send(&app, "GET", "/v1/top?limit=1", None).await;
        let top = body.as_array().unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0]["recipient"], "dj-b");

        let (status, body) = send(&app, "GET", "/v1/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"].as_array().unwrap().len(), 3);
        assert_eq!(body["entries"][0]["kind"], "tip");
    }
}
