//! User directory port.

use crate::domain::{UserId, UserProfile};
use crate::error::UpstreamError;

/// Source of user profiles and account activity.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `UpstreamError::UserNotFound` for unknown users.
    async fn get_user(&self, user_id: UserId) -> Result<UserProfile, UpstreamError>;
}
