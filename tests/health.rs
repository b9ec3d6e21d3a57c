mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use storefront_api::routes::{create_router, health::health_check};
use tower::ServiceExt;

use common::{bearer, customer, lazy_state};

async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let app = create_router(lazy_state());
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[tokio::test]
async fn health_route_sets_request_id() {
    let (status, headers, body) = send(
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_falls_back_to_not_found() {
    let (status, _, body) = send(Request::get("/nope").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nope");
}

#[tokio::test]
async fn orders_require_a_principal() {
    let (status, _, body) = send(Request::get("/api/orders").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["code"], "unauthorized");
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let (status, _, body) = send(
        Request::get("/api/customers/me")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["code"], "unauthorized");
}

#[tokio::test]
async fn anonymous_catalog_writes_are_unauthorized() {
    let (status, _, _) = send(
        Request::post("/api/collections")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"a"}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_cannot_manage_catalog() {
    let user = customer();
    let (status, _, body) = send(
        Request::post("/api/collections")
            .header(header::AUTHORIZATION, bearer(&user))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Shoes"}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["code"], "forbidden");

    let (status, _, _) = send(
        Request::delete("/api/products/1")
            .header(header::AUTHORIZATION, bearer(&user))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn customers_cannot_reach_staff_routes() {
    let user = customer();
    let requests = [
        Request::get("/api/admin/inventory/low-stock"),
        Request::get("/api/customers"),
        Request::delete("/api/orders/1"),
        Request::delete("/api/products/1/reviews/1"),
        Request::delete("/api/tags/1"),
    ];

    for builder in requests {
        let (status, _, _) = send(
            builder
                .header(header::AUTHORIZATION, bearer(&user))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn invalid_cart_id_is_a_client_error() {
    let (status, _, _) = send(Request::get("/api/carts/not-a-uuid").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
