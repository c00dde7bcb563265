//! Client for the authentication/authorization service.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use payments_types::{AuthorityService, CallerIdentity, PermissionCheck, UpstreamError, UserId};

const SERVICE: &str = "auth-service";

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    #[serde(default)]
    valid: bool,
    user_id: Option<UserId>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    permissions: Vec<String>,
}

/// `AuthorityService` backed by the auth service's REST API.
pub struct HttpAuthorityService {
    base_url: String,
    http: Client,
}

impl HttpAuthorityService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: super::trim_base_url(base_url.into()),
            http: super::build_client(timeout)?,
        })
    }

    fn transport(err: reqwest::Error) -> UpstreamError {
        UpstreamError::Transport {
            service: SERVICE,
            message: err.to_string(),
        }
    }

    fn decode(err: reqwest::Error) -> UpstreamError {
        UpstreamError::Decode {
            service: SERVICE,
            message: err.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AuthorityService for HttpAuthorityService {
    async fn validate(&self, bearer_token: &str) -> Result<Option<CallerIdentity>, UpstreamError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/auth/validate", self.base_url))
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach {}: {}", SERVICE, e);
                Self::transport(e)
            })?;

        if resp.status() != StatusCode::OK {
            tracing::debug!(status = resp.status().as_u16(), "token rejected");
            return Ok(None);
        }

        let body: ValidationResponse = resp.json().await.map_err(Self::decode)?;
        if !body.valid {
            return Ok(None);
        }

        let user_id = body.user_id.ok_or_else(|| UpstreamError::Decode {
            service: SERVICE,
            message: "valid token without user_id".into(),
        })?;

        Ok(Some(CallerIdentity {
            user_id,
            email: body.email,
            role: body.role,
            permissions: body.permissions,
        }))
    }

    async fn check_permission(
        &self,
        bearer_token: &str,
        resource: &str,
        action: &str,
    ) -> Result<PermissionCheck, UpstreamError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/auth/check-permission", self.base_url))
            .query(&[("resource", resource), ("action", action)])
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = resp.status();
        if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), "permission check refused");
            return Err(UpstreamError::Denied {
                service: SERVICE,
                status: status.as_u16(),
            });
        }
        if status != StatusCode::OK {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        resp.json().await.map_err(Self::decode)
    }
}
