//! Storefront routes that answer without the database.

use axum::http::StatusCode;

use iranmarket_integration_tests::{body_text, get, storefront_app};

#[tokio::test]
async fn test_health_is_ok() {
    let response = get(storefront_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let response = get(storefront_app(), "/health").await;
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_account_requires_login() {
    let response = get(storefront_app(), "/account/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"],
        "/auth/login/?next=%2Faccount%2F"
    );
}

#[tokio::test]
async fn test_order_history_requires_login() {
    let response = get(storefront_app(), "/account/orders/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"],
        "/auth/login/?next=%2Faccount%2Forders%2F"
    );
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let response = get(storefront_app(), "/no-such-page/at-all/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
