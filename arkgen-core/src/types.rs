use crate::address::ScriptType;
use crate::ark::CsvTimelock;
use crate::encoding::Variant;
use serde::{Deserialize, Serialize};

/// Result of Ark address generation. Keys are lowercase hex, x-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArkAddress {
    pub address: String,
    pub vtxo_key: String,
    pub server_pub_key: String,
    /// Taproot output key of the VTXO script; same bytes as `vtxo_key`.
    pub tweaked_public_key: String,
    /// Present when the delay came from the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_delay: Option<u64>,
    pub timelock: CsvTimelock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedArkAddress {
    pub server_pub_key: String,
    pub vtxo_taproot_key: String,
    pub hrp: String,
    pub version: u8,
}

/// One derived on-chain address. `privkey` is WIF, absent for public-only
/// sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub path: String,
    pub address: String,
    pub pubkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privkey: Option<String>,
    pub script_type: ScriptType,
}

/// BIP32 extended keys around one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_xprv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_xpub: Option<String>,
    pub account_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_xprv: Option<String>,
    pub account_xpub: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSegwitAddress {
    pub network: String,
    pub hrp: String,
    pub witness_version: u8,
    /// Hex witness program.
    pub program: String,
    pub variant: Variant,
    /// `None` for programs we never derive, such as P2WSH.
    pub script_type: Option<ScriptType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweakResult {
    pub internal_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    pub output_key: String,
    pub parity: u8,
    pub address: String,
}

/// A freshly generated private key in the encodings users paste around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKey {
    pub private_key: String,
    pub wif: String,
    pub public_key: String,
    pub x_only_public_key: String,
}
