use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{
    bouquet_share_links, catalog, create_bouquet, health, view_bouquet, ApiContext,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{BouquetView, CreateBouquetRequest, CreateBouquetResponse, FlowerSummary},
    share::ShareLinks,
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url, validate_public_base_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let public_base_url = validate_public_base_url(&settings.public_base_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext::new(Arc::new(storage), public_base_url),
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/flowers", get(http_catalog))
        .route("/bouquets", post(http_create_bouquet))
        .route("/bouquets/:short_id", get(http_view_bouquet))
        .route("/bouquets/:short_id/share", get(http_share_links))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidData => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    health(&state.api).await.map_err(|err| {
        error!(error = %err.message, "health check failed");
        (StatusCode::SERVICE_UNAVAILABLE, Json(err))
    })?;
    Ok("ok")
}

async fn http_catalog() -> Json<Vec<FlowerSummary>> {
    Json(catalog())
}

async fn http_create_bouquet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBouquetRequest>,
) -> ApiResult<CreateBouquetResponse> {
    let created = create_bouquet(&state.api, req).await.map_err(reject)?;
    Ok(Json(created))
}

async fn http_view_bouquet(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> ApiResult<BouquetView> {
    let view = view_bouquet(&state.api, &short_id).await.map_err(reject)?;
    Ok(Json(view))
}

async fn http_share_links(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> ApiResult<ShareLinks> {
    let links = bouquet_share_links(&state.api, &short_id)
        .await
        .map_err(reject)?;
    Ok(Json(links))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
