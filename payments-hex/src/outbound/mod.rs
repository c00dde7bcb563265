//! HTTP Outbound Adapters
//!
//! reqwest clients for the authority service, the user directory and the
//! payment gateway.

mod auth_client;
mod midtrans;
pub mod signature;
mod user_client;

use std::time::Duration;

pub use auth_client::HttpAuthorityService;
pub use midtrans::{MidtransEnvironment, MidtransGateway};
pub use user_client::HttpUserDirectory;

/// Timeout applied to every outbound call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn trim_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
