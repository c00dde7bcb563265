//! Authentication/authorization service port.

use crate::domain::{CallerIdentity, PermissionCheck};
use crate::error::UpstreamError;

/// Remote service that resolves bearer credentials.
#[async_trait::async_trait]
pub trait AuthorityService: Send + Sync {
    /// Resolves a bearer token to the caller's identity and permissions.
    ///
    /// Returns `Ok(None)` when the service answers but reports the token invalid.
    async fn validate(&self, bearer_token: &str) -> Result<Option<CallerIdentity>, UpstreamError>;

    /// Asks the service whether the token grants `action` on `resource`.
    async fn check_permission(
        &self,
        bearer_token: &str,
        resource: &str,
        action: &str,
    ) -> Result<PermissionCheck, UpstreamError>;
}
