//! BIP340/341 tagged hashes and key tweaking.

use super::{lift_x, secret_key_from_slice, Curve};
use crate::error::{ArkgenError, Result};
use bitcoin::consensus::encode::{serialize, VarInt};
use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1::{Parity, Scalar, SecretKey};

/// Tapscript leaf version.
pub const TAPSCRIPT_LEAF_VERSION: u8 = 0xc0;

/// BIP341 NUMS point `H`. Nobody knows its discrete log, so an output
/// using it as internal key can only be spent through the script tree.
pub const UNSPENDABLE_KEY: [u8; 32] = [
    0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
    0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweakedKey {
    pub output_key: [u8; 32],
    pub parity: Parity,
}

impl TweakedKey {
    pub fn is_odd(&self) -> bool {
        self.parity == Parity::Odd
    }
}

/// `SHA256(SHA256(tag) || SHA256(tag) || data)`
pub fn tagged_hash(tag: &str, data: &[u8]) -> [u8; 32] {
    let tag_hash = sha256::Hash::hash(tag.as_bytes());
    let mut engine = sha256::Hash::engine();
    engine.input(tag_hash.as_ref());
    engine.input(tag_hash.as_ref());
    engine.input(data);
    sha256::Hash::from_engine(engine).to_byte_array()
}

pub fn tap_tweak_hash(internal_key: &[u8; 32], merkle_root: Option<&[u8; 32]>) -> [u8; 32] {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(internal_key);
    if let Some(root) = merkle_root {
        data.extend_from_slice(root);
    }
    tagged_hash("TapTweak", &data)
}

pub fn tap_leaf_hash(script: &[u8], leaf_version: u8) -> [u8; 32] {
    let mut data = Vec::with_capacity(script.len() + 4);
    data.push(leaf_version);
    data.extend(serialize(&VarInt(script.len() as u64)));
    data.extend_from_slice(script);
    tagged_hash("TapLeaf", &data)
}

/// Children are hashed in lexicographic order, so argument order does not
/// matter.
pub fn tap_branch_hash(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(lo);
    data[32..].copy_from_slice(hi);
    tagged_hash("TapBranch", &data)
}

fn tweak_scalar(internal_key: &[u8; 32], merkle_root: Option<&[u8; 32]>) -> Result<Scalar> {
    Scalar::from_be_bytes(tap_tweak_hash(internal_key, merkle_root))
        .map_err(|_| ArkgenError::InvalidTweak)
}

/// `Q = lift_x(P) + t·G`. An empty merkle root gives the BIP86 key-path
/// only output.
pub fn tweak_public_key(
    curve: &Curve,
    internal_key: &[u8; 32],
    merkle_root: Option<&[u8; 32]>,
) -> Result<TweakedKey> {
    let p = lift_x(internal_key)?;
    let t = tweak_scalar(internal_key, merkle_root)?;
    let q = p
        .add_exp_tweak(curve.secp(), &t)
        .map_err(|_| ArkgenError::InvalidTweak)?;
    let (output, parity) = q.x_only_public_key();

    tracing::debug!(
        internal = %hex::encode(internal_key),
        output = %output,
        "Computed taproot output key"
    );

    Ok(TweakedKey {
        output_key: output.serialize(),
        parity,
    })
}

/// Private key matching [`tweak_public_key`]: negate when `P` has odd y,
/// then add `t`.
pub fn tweak_private_key(
    curve: &Curve,
    private_key: &[u8],
    merkle_root: Option<&[u8; 32]>,
) -> Result<SecretKey> {
    let sk = secret_key_from_slice(private_key)?;
    let (internal, parity) = sk.x_only_public_key(curve.secp());
    let sk = match parity {
        Parity::Odd => sk.negate(),
        Parity::Even => sk,
    };
    let t = tweak_scalar(&internal.serialize(), merkle_root)?;
    sk.add_tweak(&t).map_err(|_| ArkgenError::InvalidTweak)
}
