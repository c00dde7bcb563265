//! Client for the user directory service.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use payments_types::{UpstreamError, UserDirectory, UserId, UserProfile};

const SERVICE: &str = "user-service";

/// `UserDirectory` backed by the user service's REST API.
pub struct HttpUserDirectory {
    base_url: String,
    http: Client,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            base_url: super::trim_base_url(base_url.into()),
            http: super::build_client(timeout)?,
        })
    }
}

#[async_trait::async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_user(&self, user_id: UserId) -> Result<UserProfile, UpstreamError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/users/{}", self.base_url, user_id))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach {}: {}", SERVICE, e);
                UpstreamError::Transport {
                    service: SERVICE,
                    message: e.to_string(),
                }
            })?;

        match resp.status() {
            StatusCode::OK => resp.json().await.map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                message: e.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(UpstreamError::UserNotFound),
            status => Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            }),
        }
    }
}
