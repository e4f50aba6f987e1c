use std::sync::Arc;

use chrono::Utc;
use shared::{
    arrangement::arrange,
    catalog,
    domain::{Bouquet, ShortId, DEFAULT_MODE},
    error::ApiError,
    protocol::{BouquetView, CreateBouquetRequest, CreateBouquetResponse, FlowerSummary},
    record::{normalize, Recovery},
    selection::Selection,
    share::{share_links, ShareLinks},
};
use storage::BouquetStore;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn BouquetStore>,
    pub public_base_url: String,
}

impl ApiContext {
    pub fn new(store: Arc<dyn BouquetStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into(),
        }
    }
}

pub fn catalog() -> Vec<FlowerSummary> {
    catalog::flowers().iter().map(FlowerSummary::from).collect()
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.store.health_check().await.map_err(internal)
}

/// Persists a finished draft under a fresh short id. A storage failure is
/// reported once; the caller decides whether to submit again.
pub async fn create_bouquet(
    ctx: &ApiContext,
    request: CreateBouquetRequest,
) -> Result<CreateBouquetResponse, ApiError> {
    let bouquet = validate_request(request)?;
    let short_id = ShortId::generate();

    ctx.store
        .insert_bouquet(&short_id, &bouquet)
        .await
        .map_err(|err| {
            error!(%short_id, error = %err, "failed to persist bouquet");
            ApiError::internal(format!("failed to create bouquet: {err}"))
        })?;

    let share = links(ctx, &short_id, &bouquet)?;
    info!(%short_id, flowers = bouquet.total_flowers(), mode = %bouquet.mode, "bouquet created");
    Ok(CreateBouquetResponse { short_id, share })
}

pub async fn view_bouquet(ctx: &ApiContext, short_id: &str) -> Result<BouquetView, ApiError> {
    let short_id = ShortId::parse(short_id)?;
    let raw = ctx
        .store
        .find_bouquet_record(&short_id)
        .await
        .map_err(|err| {
            error!(%short_id, error = %err, "failed to read bouquet");
            ApiError::not_found("bouquet not found")
        })?
        .ok_or_else(|| ApiError::not_found("bouquet not found"))?;

    let normalized = normalize(&raw).map_err(|invalid| {
        warn!(%short_id, reason = %invalid, "stored bouquet is invalid");
        ApiError::from(invalid)
    })?;
    for recovery in &normalized.recoveries {
        if matches!(
            recovery,
            Recovery::DuplicateMerged { .. } | Recovery::UnknownFlowerDropped { .. }
        ) {
            warn!(%short_id, ?recovery, "repaired stored flower entries");
        }
    }

    let letter_recovered = normalized.letter_recovered();
    let bouquet = normalized.bouquet;
    let instances = arrange(&bouquet.flowers, &bouquet.flower_order);
    let share = links(ctx, &short_id, &bouquet)?;
    Ok(BouquetView {
        short_id,
        bouquet,
        instances,
        letter_recovered,
        share,
    })
}

pub async fn bouquet_share_links(ctx: &ApiContext, short_id: &str) -> Result<ShareLinks, ApiError> {
    Ok(view_bouquet(ctx, short_id).await?.share)
}

fn links(ctx: &ApiContext, short_id: &ShortId, bouquet: &Bouquet) -> Result<ShareLinks, ApiError> {
    share_links(&ctx.public_base_url, short_id, &bouquet.letter)
        .map_err(|e| ApiError::internal(format!("failed to build share links: {e}")))
}

fn validate_request(request: CreateBouquetRequest) -> Result<Bouquet, ApiError> {
    if request.flowers.is_empty() {
        return Err(ApiError::validation("bouquet must contain at least one flower"));
    }

    if let Some(unknown) = request.flowers.iter().find(|f| !catalog::contains(f.id)) {
        return Err(ApiError::validation(format!("unknown flower id {}", unknown.id)));
    }
    // Anything the picker could not have produced is refused here.
    let selection = Selection::try_from(request.flowers)
        .map_err(|invalid| ApiError::validation(invalid.to_string()))?;

    let total = selection.total() as usize;
    if !request.flower_order.is_empty() && !is_permutation(&request.flower_order, total) {
        return Err(ApiError::validation(
            "flower order must be a permutation of every flower instance",
        ));
    }

    let mode = match request.mode.trim() {
        "" => DEFAULT_MODE.to_string(),
        mode => mode.to_string(),
    };

    Ok(Bouquet {
        mode,
        flowers: selection.into_entries(),
        letter: request.letter,
        greenery: request.greenery,
        created_at: Some(request.timestamp.unwrap_or_else(Utc::now)),
        flower_order: request.flower_order,
    })
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    order
        .iter()
        .all(|&index| index < len && !std::mem::replace(&mut seen[index], true))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
