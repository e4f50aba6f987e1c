use super::*;
use anyhow::Result as AnyResult;
use axum::{
    extract::{Path, State},
    http::StatusCode as AxumStatus,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{FlowerId, Letter, ShortId},
    share::share_links,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

const BASE_URL: &str = "https://bouquets.example";

#[derive(Clone, Default)]
struct StubState {
    created: Arc<Mutex<Vec<CreateBouquetRequest>>>,
    fail_writes: Arc<Mutex<u32>>,
}

async fn handle_create(
    State(state): State<StubState>,
    Json(req): Json<CreateBouquetRequest>,
) -> std::result::Result<Json<CreateBouquetResponse>, (AxumStatus, Json<ApiError>)> {
    {
        let mut failures = state.fail_writes.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err((
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("failed to create bouquet: disk full")),
            ));
        }
    }
    let short_id = ShortId::parse("stub0001").expect("id");
    let share = share_links(BASE_URL, &short_id, &req.letter).expect("links");
    state.created.lock().await.push(req);
    Ok(Json(CreateBouquetResponse { short_id, share }))
}

async fn handle_view(
    Path(short_id): Path<String>,
) -> std::result::Result<Json<serde_json::Value>, (AxumStatus, Json<ApiError>)> {
    match short_id.as_str() {
        "broken01" => Err((
            AxumStatus::UNPROCESSABLE_ENTITY,
            Json(ApiError::invalid_data("record has no flowers field")),
        )),
        _ => Err((
            AxumStatus::NOT_FOUND,
            Json(ApiError::not_found("bouquet not found")),
        )),
    }
}

async fn handle_plain_failure() -> (AxumStatus, &'static str) {
    (AxumStatus::BAD_GATEWAY, "upstream unavailable")
}

async fn spawn_stub_server(state: StubState) -> AnyResult<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/bouquets", post(handle_create))
        .route("/bouquets/:short_id", get(handle_view))
        .route("/flowers", get(handle_plain_failure))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn ready_wizard() -> Wizard {
    let mut wizard = Wizard::default();
    for id in [12, 12, 12, 9, 9, 9] {
        wizard.add_flower(FlowerId(id)).expect("add");
    }
    wizard.next().expect("customize");
    wizard.shuffle_seeded(5).expect("shuffle");
    wizard.next().expect("card");
    wizard
        .set_letter(Letter {
            sender: "Ana".into(),
            recipient: "Ben".into(),
            message: "hi".into(),
        })
        .expect("letter");
    wizard.next().expect("share");
    wizard
}

#[tokio::test]
async fn publish_posts_draft_and_returns_share_links() {
    let state = StubState::default();
    let server_url = spawn_stub_server(state.clone()).await.expect("server");
    let client = BouquetClient::new(format!("{server_url}/"));
    assert_eq!(client.server_url(), server_url);

    let wizard = ready_wizard();
    let created = wizard.publish(&client).await.expect("publish");
    assert_eq!(created.short_id.as_str(), "stub0001");
    assert!(created.share.title.contains("Ana"));

    let posted = state.created.lock().await;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].flowers.len(), 2);
    assert_eq!(posted[0].flower_order.len(), 6);
}

#[tokio::test]
async fn failed_publish_can_be_retried_manually() {
    let state = StubState::default();
    *state.fail_writes.lock().await = 1;
    let server_url = spawn_stub_server(state.clone()).await.expect("server");
    let client = BouquetClient::new(server_url);
    let wizard = ready_wizard();

    let err = wizard.publish(&client).await.expect_err("first attempt fails");
    let wizard::PublishError::Client(err) = err else {
        panic!("expected client error");
    };
    assert_eq!(err.code(), ErrorCode::Internal);
    assert!(state.created.lock().await.is_empty());

    wizard.publish(&client).await.expect("second attempt");
    assert_eq!(state.created.lock().await.len(), 1);
}

#[tokio::test]
async fn fetch_maps_not_found_and_invalid_data() {
    let server_url = spawn_stub_server(StubState::default())
        .await
        .expect("server");
    let client = BouquetClient::new(server_url);

    let err = client.fetch_bouquet("missing1").await.expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.code().headline(), "Bouquet not found");

    let err = client.fetch_bouquet("broken01").await.expect_err("broken");
    assert_eq!(err.code(), ErrorCode::InvalidData);
    assert!(matches!(
        err,
        ClientError::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            ..
        }
    ));
}

#[tokio::test]
async fn non_json_error_body_is_classified_by_status() {
    let server_url = spawn_stub_server(StubState::default())
        .await
        .expect("server");
    let client = BouquetClient::new(server_url);

    let err = client.catalog().await.expect_err("bad gateway");
    let ClientError::Api { status, error } = err else {
        panic!("expected api error");
    };
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error.code, ErrorCode::Internal);
    assert_eq!(error.message, "upstream unavailable");
}

#[tokio::test]
async fn publish_before_share_step_is_refused_locally() {
    let client = BouquetClient::new("http://127.0.0.1:9");
    let wizard = Wizard::default();
    let err = wizard.publish(&client).await.expect_err("wrong step");
    assert!(matches!(
        err,
        wizard::PublishError::Wizard(WizardError::WrongStep { .. })
    ));
}
