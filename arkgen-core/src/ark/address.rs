use crate::encoding::bech32::{self, Bech32Error, Variant};
use crate::error::{ArkgenError, Result};
use bitcoin::secp256k1::XOnlyPublicKey;
use std::fmt;
use std::str::FromStr;

pub const MAINNET_HRP: &str = "ark";
pub const TESTNET_HRP: &str = "tark";

/// The only address version servers currently issue.
pub const VERSION: u8 = 0;

/// version (1) + server key (32) + VTXO key (32)
pub const PAYLOAD_LENGTH: usize = 65;

/// Ark HRP for a network name as reported by a server (`mainnet`) or used
/// locally (`bitcoin`).
pub fn ark_hrp(network: &str) -> &'static str {
    match network.trim().to_ascii_lowercase().as_str() {
        "bitcoin" | "mainnet" | "main" | "btc" => MAINNET_HRP,
        _ => TESTNET_HRP,
    }
}

/// Off-chain address: the server's signing key plus the VTXO taproot
/// output key, Bech32m encoded without the segwit length cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArkAddress {
    hrp: String,
    server: XOnlyPublicKey,
    vtxo_key: XOnlyPublicKey,
}

impl ArkAddress {
    pub fn new(hrp: &str, server: XOnlyPublicKey, vtxo_key: XOnlyPublicKey) -> Result<Self> {
        let hrp = hrp.trim().to_ascii_lowercase();
        bech32::check_hrp(&hrp)?;
        Ok(Self {
            hrp,
            server,
            vtxo_key,
        })
    }

    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn version(&self) -> u8 {
        VERSION
    }

    pub fn server(&self) -> &XOnlyPublicKey {
        &self.server
    }

    pub fn vtxo_key(&self) -> &XOnlyPublicKey {
        &self.vtxo_key
    }

    pub fn is_mainnet(&self) -> bool {
        self.hrp == MAINNET_HRP
    }

    pub fn encode(&self) -> Result<String> {
        let mut payload = Vec::with_capacity(PAYLOAD_LENGTH);
        payload.push(VERSION);
        payload.extend_from_slice(&self.server.serialize());
        payload.extend_from_slice(&self.vtxo_key.serialize());
        Ok(bech32::encode_payload(
            &self.hrp,
            &payload,
            Variant::Bech32m,
            None,
        )?)
    }

    pub fn decode(s: &str) -> Result<Self> {
        let (hrp, payload) = bech32::decode_payload(s.trim(), Variant::Bech32m, None)?;
        if hrp != MAINNET_HRP && hrp != TESTNET_HRP {
            return Err(Bech32Error::UnknownHrp(hrp).into());
        }
        if payload.len() != PAYLOAD_LENGTH {
            return Err(ArkgenError::address(format!(
                "expected {} payload bytes, got {}",
                PAYLOAD_LENGTH,
                payload.len()
            )));
        }
        if payload[0] != VERSION {
            return Err(ArkgenError::address(format!(
                "unsupported version {}",
                payload[0]
            )));
        }

        let server = XOnlyPublicKey::from_slice(&payload[1..33])
            .map_err(|_| ArkgenError::address("server key is not a valid x-only key"))?;
        let vtxo_key = XOnlyPublicKey::from_slice(&payload[33..65])
            .map_err(|_| ArkgenError::address("VTXO key is not a valid x-only key"))?;

        Ok(Self {
            hrp,
            server,
            vtxo_key,
        })
    }
}

impl fmt::Display for ArkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for ArkAddress {
    type Err = ArkgenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
