//! HMAC-SHA256 request signing shared by webhooks and marketplace calls.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{SyncError, SyncResult};

type HmacSha256 = Hmac<Sha256>;

/// Raw HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256(key: &str, message: &str) -> SyncResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| SyncError::InvalidConfig(format!("signing key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Lowercase hex digest.
pub fn hmac_sha256_hex(key: &str, message: &str) -> SyncResult<String> {
    hmac_sha256(key, message).map(hex::encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_digest() {
        assert_eq!(
            hmac_sha256_hex("hook-secret", "1700000000.{\"a\":1}").unwrap(),
            "2ca9484d0c409cd2998fd115eb688d50af3c4591f30a5124d6262b43877ed809"
        );
    }

    #[test]
    fn test_empty_key_is_accepted() {
        assert_eq!(hmac_sha256("", "x").unwrap().len(), 32);
    }
}
