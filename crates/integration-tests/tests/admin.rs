//! Admin routes that answer without the database.

use axum::http::StatusCode;

use iranmarket_integration_tests::{admin_app, body_text, get};

#[tokio::test]
async fn test_health_is_ok() {
    let response = get(admin_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = get(admin_app(), "/login").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-frame-options"], "DENY");

    let body = body_text(response).await;
    assert!(body.contains(r#"<form action="/login" method="post">"#));
    assert!(body.contains("مدیریت فروشگاه ایران مارکت"));
}

#[tokio::test]
async fn test_dashboard_redirects_anonymous_to_login() {
    let response = get(admin_app(), "/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/login");
}

#[tokio::test]
async fn test_staff_pages_redirect_anonymous_to_login() {
    for path in ["/orders", "/products", "/coupons", "/cities", "/settings"] {
        let response = get(admin_app(), path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.headers()["location"], "/login", "{path}");
    }
}
