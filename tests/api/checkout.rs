//! Tests for POST /api/checkout/providers/zpay

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use url::Url;
use zpay_checkout::jwt::SESSION_COOKIE;

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn query_map(url: &Url) -> Vec<(String, String)> {
    url.query_pairs().into_owned().collect()
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> &'a str {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or_else(|| panic!("missing {}", key))
}

#[tokio::test]
async fn test_checkout_without_session_is_unauthorized() {
    let app = TestApp::new();
    let (status, json) = app
        .send_json(checkout_request(None, &json!({"name": "Pro", "money": 29})))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");
    assert_eq!(app.count_orders(), 0);
}

#[tokio::test]
async fn test_checkout_with_foreign_token_is_unauthorized() {
    let app = TestApp::new();
    let token = mint_token_with("a-different-project-secret", "user-1");
    let (status, _) = app
        .send(checkout_request(Some(&token), &json!({"name": "Pro", "money": 29})))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_without_session_verifier_is_configuration_error() {
    let app = TestApp::without_auth();
    let token = mint_token("user-1");
    let (status, json) = app
        .send_json(checkout_request(Some(&token), &json!({"name": "Pro", "money": 29})))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Session verification is not configured");
}

#[tokio::test]
async fn test_checkout_missing_name_or_money() {
    let app = TestApp::new();
    let token = mint_token("user-1");

    for body in [json!({"money": 29}), json!({"name": "Pro"}), json!({"name": "", "money": 1})] {
        let (status, json) = app.send_json(checkout_request(Some(&token), &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json["details"], "Missing product name or money.");
    }
    assert_eq!(app.count_orders(), 0);
}

#[tokio::test]
async fn test_checkout_rejects_non_positive_amount() {
    let app = TestApp::new();
    let token = mint_token("user-1");
    let (status, json) = app
        .send_json(checkout_request(Some(&token), &json!({"name": "Pro", "money": "-5"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"], "Amount must be a positive number");
}

#[tokio::test]
async fn test_checkout_rejects_amount_too_large_for_cents() {
    let app = TestApp::new();
    let token = mint_token("user-1");
    let (status, json) = app
        .send_json(checkout_request(
            Some(&token),
            &json!({"name": "Pro", "money": "79228162514264337593543950335"}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"], "Amount must be a positive number");
    assert_eq!(app.count_orders(), 0);
}

#[tokio::test]
async fn test_checkout_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let token = mint_token("user-1");
    let request = Request::builder()
        .method("POST")
        .uri(CHECKOUT_PATH)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from("{not json"))
        .unwrap();

    let (status, json) = app.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Bad request");
}

#[tokio::test]
async fn test_checkout_without_gateway_config_does_not_leak_key() {
    let gateway = GatewayConfig::new(
        Some(TEST_PID.to_string()),
        Some("very-secret-merchant-key".to_string()),
        None,
    );
    let app = TestApp::with_gateway(gateway);
    let token = mint_token("user-1");

    let (status, body) = app
        .send(checkout_request(Some(&token), &json!({"name": "Pro", "money": 29})))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Payment gateway configuration is missing"));
    assert!(!body.contains("very-secret"));
    assert_eq!(app.count_orders(), 0, "no order without a usable gateway");
}

#[tokio::test]
async fn test_checkout_creates_pending_order_and_signed_url() {
    let app = TestApp::new();
    let token = mint_token("user-1");

    let (status, json) = app
        .send_json(checkout_request(
            Some(&token),
            &json!({"name": "Pro Plan", "money": 29, "param": {"plan": "pro"}}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "body: {}", json);

    let out_trade_no = json["outTradeNo"].as_str().unwrap();
    assert!(out_trade_no.starts_with("zpay_"));

    let url = Url::parse(json["paymentUrl"].as_str().unwrap()).unwrap();
    assert!(url.as_str().starts_with(TEST_SUBMIT_URL));

    let pairs = query_map(&url);
    assert_eq!(param(&pairs, "pid"), TEST_PID);
    assert_eq!(param(&pairs, "out_trade_no"), out_trade_no);
    assert_eq!(param(&pairs, "name"), "Pro Plan");
    assert_eq!(param(&pairs, "money"), "29.00");
    assert_eq!(param(&pairs, "type"), "alipay");
    assert_eq!(param(&pairs, "notify_url"), format!("{}{}", TEST_APP_URL, WEBHOOK_PATH));
    assert_eq!(param(&pairs, "return_url"), format!("{}/dashboard", TEST_APP_URL));
    assert_eq!(param(&pairs, "sign_type"), "MD5");
    assert_eq!(pairs.last().unwrap().0, "sign");

    let sign = param(&pairs, "sign");
    assert!(signature::verify(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        TEST_KEY,
        sign
    ));

    let order = app.get_order(out_trade_no);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, "user-1");
    assert_eq!(order.name, "Pro Plan");
    assert_eq!(order.money.to_string(), "29.00");
    assert_eq!(order.param, json!({"plan": "pro"}));
    assert!(order.trade_no.is_none());
}

#[tokio::test]
async fn test_checkout_wxpay_and_string_amount() {
    let app = TestApp::new();
    let token = mint_token("user-2");

    let (status, json) = app
        .send_json(checkout_request(
            Some(&token),
            &json!({"name": "Team", "money": "99.5", "type": "wxpay"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let url = Url::parse(json["paymentUrl"].as_str().unwrap()).unwrap();
    let pairs = query_map(&url);
    assert_eq!(param(&pairs, "type"), "wxpay");
    assert_eq!(param(&pairs, "money"), "99.50");

    let order = app.get_order(json["outTradeNo"].as_str().unwrap());
    assert_eq!(order.payment_type, PaymentType::Wxpay);
}

#[tokio::test]
async fn test_checkout_accepts_session_cookie() {
    let app = TestApp::new();
    let token = mint_token("cookie-user");
    let request = Request::builder()
        .method("POST")
        .uri(CHECKOUT_PATH)
        .header("content-type", "application/json")
        .header("cookie", format!("theme=dark; {}={}", SESSION_COOKIE, token))
        .body(Body::from(r#"{"name":"Pro","money":1}"#))
        .unwrap();

    let (status, json) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    let order = app.get_order(json["outTradeNo"].as_str().unwrap());
    assert_eq!(order.user_id, "cookie-user");
}

#[tokio::test]
async fn test_checkout_then_gateway_notification_settles_order() {
    let app = TestApp::new();
    let token = mint_token("user-1");

    let (_, json) = app
        .send_json(checkout_request(Some(&token), &json!({"name": "Pro", "money": 0.01})))
        .await;
    let out_trade_no = json["outTradeNo"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(webhook_request(&success_notification(&out_trade_no, "0.01", "2024010122001")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");

    let order = app.get_order(&out_trade_no);
    assert_eq!(order.status, OrderStatus::Success);
    assert_eq!(order.trade_no.as_deref(), Some("2024010122001"));
}
