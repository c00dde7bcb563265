//! Gateway notification signatures.
//!
//! The gateway signs every notification with
//! `hex(sha512(order_id + status_code + gross_amount + server_key))`.

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Computes the lowercase hex signature the gateway attaches to a notification.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of a provided signature against the expected one.
pub fn verify_notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
    provided: &str,
) -> bool {
    let expected = notification_signature(order_id, status_code, gross_amount, server_key);
    expected
        .as_bytes()
        .ct_eq(provided.to_ascii_lowercase().as_bytes())
        .into()
}
