use super::*;
use axum::{body, body::Body, http::Request};
use serde_json::json;
use shared::domain::ShortId;
use tower::ServiceExt;

const BASE_URL: &str = "https://bouquets.example";

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let state = AppState {
        api: ApiContext::new(Arc::new(storage.clone()), BASE_URL),
    };
    (build_router(Arc::new(state), 16 * 1024), storage)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn create_request(payload: serde_json::Value) -> Request<Body> {
    Request::post("/bouquets")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn catalog_route_lists_flowers() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(Request::get("/flowers").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let flowers: Vec<FlowerSummary> = read_json(response).await;
    assert_eq!(flowers.len(), 12);
}

#[tokio::test]
async fn create_then_fetch_bouquet() {
    let (app, _storage) = test_app().await;
    let response = app
        .clone()
        .oneshot(create_request(json!({
            "mode": "color",
            "flowers": [{ "id": 12, "count": 3 }, { "id": 9, "count": 3 }],
            "letter": { "sender": "Ana", "recipient": "Ben", "message": "hi" },
            "greenery": 1,
            "flower_order": [5, 4, 3, 2, 1, 0],
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let created: CreateBouquetResponse = read_json(response).await;
    assert!(created.share.url.starts_with(BASE_URL));

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/bouquets/{}", created.short_id))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let view: BouquetView = read_json(response).await;
    assert_eq!(view.short_id, created.short_id);
    assert_eq!(view.bouquet.total_flowers(), 6);
    assert_eq!(view.instances.first().map(|i| i.order), Some(0));
    assert_eq!(view.instances[0].flower_id.0, 9);

    let response = app
        .oneshot(
            Request::get(format!("/bouquets/{}/share", created.short_id))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let links: ShareLinks = read_json(response).await;
    assert_eq!(links, created.share);
}

#[tokio::test]
async fn unknown_bouquet_is_404() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(
            Request::get("/bouquets/zzzzzzzz")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn legacy_record_without_flowers_is_422() {
    let (app, storage) = test_app().await;
    let short_id = ShortId::parse("legacy99").expect("id");
    storage
        .import_raw_record(&short_id, &json!({ "mode": "color" }))
        .await
        .expect("import");

    let response = app
        .oneshot(
            Request::get("/bouquets/legacy99")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn legacy_stringified_letter_is_decoded() {
    let (app, storage) = test_app().await;
    let short_id = ShortId::parse("legacy42").expect("id");
    storage
        .import_raw_record(
            &short_id,
            &json!({
                "mode": "color",
                "flowers": [{ "id": 1, "count": 6 }],
                "letter": "{\"sender\":\"A\",\"recipient\":\"B\",\"message\":\"C\"}",
                "flowerOrder": [5, 4, 3, 2, 1, 0],
            }),
        )
        .await
        .expect("import");

    let response = app
        .oneshot(
            Request::get("/bouquets/legacy42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let view: BouquetView = read_json(response).await;
    assert_eq!(view.bouquet.letter.recipient, "B");
    assert_eq!(view.bouquet.flower_order, vec![5, 4, 3, 2, 1, 0]);
}

#[tokio::test]
async fn invalid_create_payload_is_400() {
    let (app, _storage) = test_app().await;
    let response = app
        .oneshot(create_request(json!({ "mode": "color", "flowers": [] })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn overflowing_flower_counts_are_400() {
    let (app, storage) = test_app().await;
    let response = app
        .oneshot(create_request(json!({
            "mode": "color",
            "flowers": [{ "id": 1, "count": 4_294_967_295u64 }, { "id": 2, "count": 1 }],
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(storage.count_bouquets().await.expect("count"), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (app, _storage) = test_app().await;
    let message = "x".repeat(32 * 1024);
    let response = app
        .oneshot(create_request(json!({
            "mode": "color",
            "flowers": [{ "id": 1, "count": 6 }],
            "letter": { "message": message },
        })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn error_codes_map_to_statuses() {
    assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(
        status_for(ErrorCode::InvalidData),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(status_for(ErrorCode::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(
        status_for(ErrorCode::Internal),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
