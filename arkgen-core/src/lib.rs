//! arkgen - Core library for HD key derivation and Ark address generation
//!
//! Derives BIP32 keys from mnemonics, seeds or raw private keys, encodes
//! them as legacy, segwit and Taproot addresses, and builds Ark VTXO
//! addresses from a user key and the parameters of an Ark server.

pub mod address;
pub mod ark;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod hd;
pub mod types;

pub use address::{NetworkParams, NetworkTable, ScriptType};
pub use ark::{ArkAddress, CsvTimelock, ServerInfo, ServerInfoProvider};
pub use crypto::Curve;
pub use error::{ArkgenError, ErrorKind, Result};
pub use generator::{AddressGenerator, GeneratorConfig, KeySource};
pub use types::{
    AccountKeys, DecodedArkAddress, DecodedSegwitAddress, DerivedAddress, GeneratedArkAddress,
    GeneratedKey, TweakResult,
};
