use crate::encoding::bech32::Bech32Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArkgenError>;

/// Coarse classification of every [`ArkgenError`], for callers that only
/// care about which side of the boundary failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed caller input: hex, lengths, mnemonics, paths, config.
    InputValidation,
    /// Curve arithmetic produced something unusable.
    CryptographicFailure,
    /// The server info fetch failed or returned garbage.
    NetworkFailure,
    /// Checksum or structural failure while decoding an address.
    EncodingFailure,
}

#[derive(Error, Debug)]
pub enum ArkgenError {
    #[error("Bech32 error: {0}")]
    Bech32(#[from] Bech32Error),

    #[error("Invalid hex encoding: {0}")]
    InvalidHexEncoding(String),

    #[error("Invalid public key length: expected 32 or 33 bytes, got {0}")]
    InvalidPubkeyLength(usize),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid seed length: {0} bytes (expected 16 to 64)")]
    InvalidSeedLength(usize),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Child index {0} is out of range")]
    InvalidChildIndex(u32),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid extended key: {0}")]
    InvalidExtendedKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid timelock: {0}")]
    InvalidTimelock(String),

    #[error("Unknown network: {name}")]
    UnknownNetwork { name: String },

    #[error("Requested network {requested} but the Ark server runs on {server}")]
    NetworkMismatch { requested: String, server: String },

    #[error("Script type {script_type} is not supported on {network}")]
    UnsupportedScriptType {
        script_type: String,
        network: String,
    },

    #[error("Hardened derivation (index {0}) requires a private key")]
    HardenedDerivationRequiresPrivateKey(u32),

    #[error("Invalid scalar: zero or not below the curve order")]
    InvalidScalar,

    #[error("Point is not on the curve")]
    PointNotOnCurve,

    #[error("Point addition resulted in the point at infinity")]
    PointAtInfinity,

    #[error("Invalid taproot tweak")]
    InvalidTweak,

    #[error("Invalid master key derived from seed")]
    InvalidMasterKey,

    #[error("Server info fetch failed: {0}")]
    ServerFetchFailed(String),

    #[error("Invalid server response: {0}")]
    InvalidServerResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArkgenError {
    pub fn hex(msg: impl Into<String>) -> Self {
        Self::InvalidHexEncoding(msg.into())
    }

    pub fn path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn private_key(msg: impl Into<String>) -> Self {
        Self::InvalidPrivateKey(msg.into())
    }

    pub fn address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn server_fetch(msg: impl Into<String>) -> Self {
        Self::ServerFetchFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn unknown_network(name: impl Into<String>) -> Self {
        Self::UnknownNetwork { name: name.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Bech32(_) | Self::InvalidAddress(_) => ErrorKind::EncodingFailure,

            Self::InvalidScalar
            | Self::PointNotOnCurve
            | Self::PointAtInfinity
            | Self::InvalidTweak
            | Self::InvalidMasterKey
            | Self::Internal(_) => ErrorKind::CryptographicFailure,

            Self::ServerFetchFailed(_) | Self::InvalidServerResponse(_) => {
                ErrorKind::NetworkFailure
            }

            Self::InvalidHexEncoding(_)
            | Self::InvalidPubkeyLength(_)
            | Self::InvalidMnemonic(_)
            | Self::InvalidSeedLength(_)
            | Self::InvalidPath(_)
            | Self::InvalidChildIndex(_)
            | Self::InvalidPrivateKey(_)
            | Self::InvalidExtendedKey(_)
            | Self::InvalidTimelock(_)
            | Self::UnknownNetwork { .. }
            | Self::NetworkMismatch { .. }
            | Self::UnsupportedScriptType { .. }
            | Self::HardenedDerivationRequiresPrivateKey(_)
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::Io(_) => ErrorKind::InputValidation,
        }
    }
}

impl From<hex::FromHexError> for ArkgenError {
    fn from(err: hex::FromHexError) -> Self {
        ArkgenError::InvalidHexEncoding(err.to_string())
    }
}

impl From<bip39::Error> for ArkgenError {
    fn from(err: bip39::Error) -> Self {
        ArkgenError::InvalidMnemonic(err.to_string())
    }
}

impl From<reqwest::Error> for ArkgenError {
    fn from(err: reqwest::Error) -> Self {
        ArkgenError::ServerFetchFailed(err.to_string())
    }
}
