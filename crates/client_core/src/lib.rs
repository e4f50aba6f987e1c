use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{BouquetView, CreateBouquetRequest, CreateBouquetResponse, FlowerSummary},
    share::ShareLinks,
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod wizard;

pub use wizard::{Wizard, WizardError, WizardStep};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server rejected request ({status}): {}", .error.message)]
    Api { status: StatusCode, error: ApiError },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Error class for the static message shown to the user. Transport
    /// failures read as internal errors.
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Api { error, .. } => error.code,
            ClientError::Transport(_) => ErrorCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Clone)]
pub struct BouquetClient {
    http: Client,
    server_url: String,
}

impl BouquetClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn catalog(&self) -> Result<Vec<FlowerSummary>> {
        let res = self
            .http
            .get(format!("{}/flowers", self.server_url))
            .send()
            .await?;
        decode(res).await
    }

    /// Single write, no retry. Callers may submit again after a failure.
    pub async fn create_bouquet(
        &self,
        request: &CreateBouquetRequest,
    ) -> Result<CreateBouquetResponse> {
        let res = self
            .http
            .post(format!("{}/bouquets", self.server_url))
            .json(request)
            .send()
            .await?;
        let created: CreateBouquetResponse = decode(res).await?;
        debug!(short_id = %created.short_id, "bouquet published");
        Ok(created)
    }

    pub async fn fetch_bouquet(&self, short_id: &str) -> Result<BouquetView> {
        let res = self
            .http
            .get(format!("{}/bouquets/{short_id}", self.server_url))
            .send()
            .await?;
        decode(res).await
    }

    pub async fn share_links(&self, short_id: &str) -> Result<ShareLinks> {
        let res = self
            .http
            .get(format!("{}/bouquets/{short_id}/share", self.server_url))
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }

    let body = res.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
        let code = match status {
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::InvalidData,
            s if s.is_client_error() => ErrorCode::Validation,
            _ => ErrorCode::Internal,
        };
        ApiError::new(code, body.clone())
    });
    warn!(%status, code = ?error.code, message = %error.message, "request rejected");
    Err(ClientError::Api { status, error })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
