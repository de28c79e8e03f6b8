//! String encodings shared by the address encoders.

pub mod bech32;

pub use bech32::{Bech32Error, Variant};

use crate::error::{ArkgenError, Result};

/// Base58Check with a double-SHA256 checksum.
pub fn base58check_encode(data: &[u8]) -> String {
    bitcoin::base58::encode_check(data)
}

pub fn base58check_decode(s: &str) -> Result<Vec<u8>> {
    bitcoin::base58::decode_check(s)
        .map_err(|e| ArkgenError::address(format!("base58check: {}", e)))
}

/// Parses hex, tolerating surrounding whitespace and a `0x` prefix.
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58check_roundtrip_and_corruption() {
        let payload = [0x00u8; 21];
        let encoded = base58check_encode(&payload);
        assert_eq!(encoded, "1111111111111111111114oLvT2");
        assert_eq!(base58check_decode(&encoded).unwrap(), payload);

        let corrupted = encoded.replace("4oLvT2", "4oLvT3");
        assert!(base58check_decode(&corrupted).is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex(" 0xdeadBEEF ").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            parse_hex("abc"),
            Err(ArkgenError::InvalidHexEncoding(_))
        ));
    }
}
