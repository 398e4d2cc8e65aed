use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;

/// Classified password-reset failures, each with its own localized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetFailure {
    ExpiredCode,
    InvalidCode,
    Other,
}

impl ResetFailure {
    pub fn message(&self) -> &'static str {
        match self {
            ResetFailure::ExpiredCode => "Enlace expirado",
            ResetFailure::InvalidCode => "Enlace inválido",
            ResetFailure::Other => "Error cambiando contraseña",
        }
    }
}

/// External identity provider boundary.
///
/// Verification never errors towards the caller: any failure reads as "no
/// user". Reset confirmation reports a classified failure so the router can
/// localize it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    /// Verifies an opaque identity token and returns the stable user id.
    async fn verify_token(&self, id_token: &str) -> Option<String>;

    /// Applies a new password against a one-time reset code.
    async fn confirm_password_reset(
        &self,
        oob_code: &str,
        new_password: &str,
    ) -> Result<(), ResetFailure>;
}

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Identity-toolkit REST client (Firebase-style provider).
#[derive(Clone)]
pub struct FirebaseAuth {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl FirebaseAuth {
    pub fn new(api_key: String, api_url: String) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.api_url, action, self.api_key)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

/// Maps the provider's error code text onto a reset failure kind.
fn classify_reset_error(message: &str) -> ResetFailure {
    let message = message.to_lowercase();
    if message.contains("expired") {
        ResetFailure::ExpiredCode
    } else if message.contains("invalid") {
        ResetFailure::InvalidCode
    } else {
        ResetFailure::Other
    }
}

#[async_trait::async_trait]
impl AuthGateway for FirebaseAuth {
    async fn verify_token(&self, id_token: &str) -> Option<String> {
        let result = async {
            let response = self
                .http_client
                .post(self.endpoint("lookup"))
                .json(&json!({ "idToken": id_token }))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("provider answered {}: {}", status, body);
            }

            let lookup = response.json::<LookupResponse>().await?;
            lookup
                .users
                .into_iter()
                .next()
                .map(|user| user.local_id)
                .ok_or_else(|| anyhow::anyhow!("no user for token"))
        }
        .await;

        match result {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                tracing::warn!(error = %e, "token verification failed");
                None
            }
        }
    }

    async fn confirm_password_reset(
        &self,
        oob_code: &str,
        new_password: &str,
    ) -> Result<(), ResetFailure> {
        let response = self
            .http_client
            .post(self.endpoint("resetPassword"))
            .json(&json!({ "oobCode": oob_code, "newPassword": new_password }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "password reset request failed");
                ResetFailure::Other
            })?;

        if response.status().is_success() {
            tracing::info!("password reset confirmed");
            return Ok(());
        }

        let failure = match response.json::<ProviderError>().await {
            Ok(body) => {
                tracing::warn!(code = %body.error.message, "password reset rejected");
                classify_reset_error(&body.error.message)
            }
            Err(e) => {
                tracing::warn!(error = %e, "unreadable password reset error");
                ResetFailure::Other
            }
        };

        Err(failure)
    }
}
