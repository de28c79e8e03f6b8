//! BIP32 hierarchical deterministic keys.

pub mod mnemonic;
pub mod path;

pub use mnemonic::{generate_mnemonic, parse_mnemonic, seed_from_mnemonic};
pub use path::{ChildNumber, DerivationPath, HARDENED_OFFSET};

use crate::address::network::NetworkParams;
use crate::crypto::Curve;
use crate::encoding::{base58check_decode, base58check_encode};
use crate::error::{ArkgenError, Result};
use bitcoin::hashes::hmac::{Hmac, HmacEngine};
use bitcoin::hashes::{hash160, sha512, Hash, HashEngine};
use bitcoin::secp256k1::{PublicKey, Scalar, SecretKey};

const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";
const SERIALIZED_LENGTH: usize = 78;

pub const MIN_SEED_LENGTH: usize = 16;
pub const MAX_SEED_LENGTH: usize = 64;

/// A BIP32 node. Without a private key it can only derive non-hardened
/// public children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    private_key: Option<SecretKey>,
    public_key: PublicKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    let mut engine = HmacEngine::<sha512::Hash>::new(key);
    for part in parts {
        engine.input(part);
    }
    Hmac::<sha512::Hash>::from_engine(engine).to_byte_array()
}

fn split(i: [u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut il = [0u8; 32];
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ir)
}

/// The index tried after `raw` when `raw` yields an invalid key. Stays in
/// the same hardened or non-hardened range.
pub(crate) fn next_index(raw: u32) -> Result<u32> {
    let next = raw
        .checked_add(1)
        .ok_or(ArkgenError::InvalidChildIndex(raw))?;
    if (next & HARDENED_OFFSET) != (raw & HARDENED_OFFSET) {
        return Err(ArkgenError::InvalidChildIndex(raw));
    }
    Ok(next)
}

impl ExtendedKey {
    pub fn master_from_seed(curve: &Curve, seed: &[u8]) -> Result<Self> {
        if !(MIN_SEED_LENGTH..=MAX_SEED_LENGTH).contains(&seed.len()) {
            return Err(ArkgenError::InvalidSeedLength(seed.len()));
        }

        let (il, ir) = split(hmac_sha512(MASTER_HMAC_KEY, &[seed]));
        let private_key = SecretKey::from_slice(&il).map_err(|_| ArkgenError::InvalidMasterKey)?;

        Ok(Self {
            public_key: PublicKey::from_secret_key(curve.secp(), &private_key),
            private_key: Some(private_key),
            chain_code: ir,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: ChildNumber::from_raw(0),
        })
    }

    pub fn private_key(&self) -> Option<&SecretKey> {
        self.private_key.as_ref()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    pub fn is_private(&self) -> bool {
        self.private_key.is_some()
    }

    /// HASH160 of the compressed public key.
    pub fn identifier(&self) -> [u8; 20] {
        hash160::Hash::hash(&self.public_key.serialize()).to_byte_array()
    }

    pub fn fingerprint(&self) -> [u8; 4] {
        let id = self.identifier();
        [id[0], id[1], id[2], id[3]]
    }

    /// Drops the private key.
    pub fn neuter(&self) -> Self {
        Self {
            private_key: None,
            ..self.clone()
        }
    }

    /// CKDpriv / CKDpub. If the requested index yields an invalid key the
    /// next index is used instead (BIP32 "proceed with the next value"),
    /// so the returned key's child number may differ from `child`.
    pub fn derive_child(&self, curve: &Curve, child: ChildNumber) -> Result<Self> {
        if child.is_hardened() && self.private_key.is_none() {
            return Err(ArkgenError::HardenedDerivationRequiresPrivateKey(
                child.index(),
            ));
        }
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| ArkgenError::path("maximum depth of 255 exceeded"))?;

        let mut raw = child.raw();
        loop {
            if let Some(key) = self.try_derive(curve, raw, depth)? {
                return Ok(key);
            }
            let next = next_index(raw)?;
            tracing::warn!(
                index = raw,
                next,
                "Child key at index is invalid, using the next index"
            );
            raw = next;
        }
    }

    fn try_derive(&self, curve: &Curve, raw: u32, depth: u8) -> Result<Option<Self>> {
        let index_bytes = raw.to_be_bytes();
        let i = match (&self.private_key, raw & HARDENED_OFFSET != 0) {
            (Some(sk), true) => hmac_sha512(
                &self.chain_code,
                &[&[0u8][..], &sk.secret_bytes()[..], &index_bytes[..]],
            ),
            (None, true) => {
                return Err(ArkgenError::HardenedDerivationRequiresPrivateKey(
                    raw & !HARDENED_OFFSET,
                ))
            }
            (_, false) => hmac_sha512(
                &self.chain_code,
                &[&self.public_key.serialize()[..], &index_bytes[..]],
            ),
        };
        let (il, ir) = split(i);

        // IL >= n
        let Ok(tweak) = Scalar::from_be_bytes(il) else {
            return Ok(None);
        };

        let (private_key, public_key) = match &self.private_key {
            Some(sk) => match sk.add_tweak(&tweak) {
                Ok(child) => (Some(child), PublicKey::from_secret_key(curve.secp(), &child)),
                Err(_) => return Ok(None),
            },
            None => match self.public_key.add_exp_tweak(curve.secp(), &tweak) {
                Ok(child) => (None, child),
                Err(_) => return Ok(None),
            },
        };

        Ok(Some(Self {
            private_key,
            public_key,
            chain_code: ir,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_number: ChildNumber::from_raw(raw),
        }))
    }

    pub fn derive_path(&self, curve: &Curve, path: &DerivationPath) -> Result<Self> {
        let key = path
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(curve, *child))?;
        tracing::debug!(path = %path, depth = key.depth, "Derived extended key");
        Ok(key)
    }

    /// `xprv…`/`xpub…` (or the network's equivalent) Base58Check string.
    pub fn to_base58(&self, network: &NetworkParams) -> String {
        let mut data = Vec::with_capacity(SERIALIZED_LENGTH);
        match &self.private_key {
            Some(_) => data.extend_from_slice(&network.xprv_version.to_be_bytes()),
            None => data.extend_from_slice(&network.xpub_version.to_be_bytes()),
        }
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.raw().to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        match &self.private_key {
            Some(sk) => {
                data.push(0);
                data.extend_from_slice(&sk.secret_bytes());
            }
            None => data.extend_from_slice(&self.public_key.serialize()),
        }
        base58check_encode(&data)
    }

    pub fn from_base58(curve: &Curve, s: &str, network: &NetworkParams) -> Result<Self> {
        let data = base58check_decode(s.trim())
            .map_err(|e| ArkgenError::InvalidExtendedKey(e.to_string()))?;
        if data.len() != SERIALIZED_LENGTH {
            return Err(ArkgenError::InvalidExtendedKey(format!(
                "expected {} bytes, got {}",
                SERIALIZED_LENGTH,
                data.len()
            )));
        }

        let version = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let is_private = if version == network.xprv_version {
            true
        } else if version == network.xpub_version {
            false
        } else {
            return Err(ArkgenError::InvalidExtendedKey(format!(
                "version {:08x} does not belong to {}",
                version, network.name
            )));
        };

        let depth = data[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let child_number =
            ChildNumber::from_raw(u32::from_be_bytes([data[9], data[10], data[11], data[12]]));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        if depth == 0 && (parent_fingerprint != [0; 4] || child_number.raw() != 0) {
            return Err(ArkgenError::InvalidExtendedKey(
                "master key with non-zero parent fingerprint or index".to_string(),
            ));
        }

        let key_data = &data[45..78];
        let (private_key, public_key) = if is_private {
            if key_data[0] != 0 {
                return Err(ArkgenError::InvalidExtendedKey(
                    "private key data must start with 0x00".to_string(),
                ));
            }
            let sk = SecretKey::from_slice(&key_data[1..])
                .map_err(|_| ArkgenError::InvalidExtendedKey("invalid private key".to_string()))?;
            (Some(sk), PublicKey::from_secret_key(curve.secp(), &sk))
        } else {
            let pk = PublicKey::from_slice(key_data)
                .map_err(|_| ArkgenError::InvalidExtendedKey("invalid public key".to_string()))?;
            (None, pk)
        };

        Ok(Self {
            private_key,
            public_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::network::NetworkTable;
    use bitcoin::bip32::{DerivationPath as BtcPath, Xpriv, Xpub};
    use std::str::FromStr;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn bitcoin_params() -> NetworkParams {
        NetworkTable::default().get("bitcoin").unwrap().clone()
    }

    #[test]
    fn test_bip86_private_key() {
        let curve = Curve::new();
        let seed = seed_from_mnemonic(ABANDON, "").unwrap();
        let master = ExtendedKey::master_from_seed(&curve, &seed).unwrap();
        let path: DerivationPath = "m/86'/0'/0'/0/0".parse().unwrap();
        let child = master.derive_path(&curve, &path).unwrap();

        assert_eq!(
            hex::encode(child.private_key().unwrap().secret_bytes()),
            "41f41d69260df4cf277826a9b65a3717e4eeddbeedf637f212ca096576479361"
        );
        assert_eq!(child.depth(), 5);
    }

    #[test]
    fn test_matches_bitcoin_bip32() {
        let curve = Curve::new();
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let params = bitcoin_params();

        let ours = ExtendedKey::master_from_seed(&curve, &seed).unwrap();
        let theirs = Xpriv::new_master(bitcoin::Network::Bitcoin, &seed).unwrap();
        assert_eq!(ours.to_base58(&params), theirs.to_string());

        for path in ["m/0'", "m/0'/1", "m/0'/1/2'/2", "m/0'/1/2'/2/1000000000"] {
            let ours = ours
                .derive_path(&curve, &path.parse().unwrap())
                .unwrap();
            let theirs = theirs
                .derive_priv(curve.secp(), &BtcPath::from_str(path).unwrap())
                .unwrap();
            assert_eq!(ours.to_base58(&params), theirs.to_string(), "{}", path);

            let their_pub = Xpub::from_priv(curve.secp(), &theirs);
            assert_eq!(ours.neuter().to_base58(&params), their_pub.to_string());
            assert_eq!(hex::encode(ours.fingerprint()), their_pub.fingerprint().to_string());
        }
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let curve = Curve::new();
        let seed = seed_from_mnemonic(ABANDON, "").unwrap();
        let account = ExtendedKey::master_from_seed(&curve, &seed)
            .unwrap()
            .derive_path(&curve, &"m/84'/0'/0'".parse().unwrap())
            .unwrap();

        let tail: DerivationPath = "m/0/7".parse().unwrap();
        let from_private = account.derive_path(&curve, &tail).unwrap();
        let from_public = account.neuter().derive_path(&curve, &tail).unwrap();

        assert!(from_public.private_key().is_none());
        assert_eq!(from_public.public_key(), from_private.public_key());
        assert_eq!(from_public.chain_code(), from_private.chain_code());
    }

    #[test]
    fn test_hardened_requires_private_key() {
        let curve = Curve::new();
        let seed = [7u8; 32];
        let public = ExtendedKey::master_from_seed(&curve, &seed)
            .unwrap()
            .neuter();
        let result = public.derive_child(&curve, ChildNumber::hardened(44).unwrap());
        assert!(matches!(
            result,
            Err(ArkgenError::HardenedDerivationRequiresPrivateKey(44))
        ));
    }

    #[test]
    fn test_seed_length_bounds() {
        let curve = Curve::new();
        assert!(matches!(
            ExtendedKey::master_from_seed(&curve, &[0u8; 15]),
            Err(ArkgenError::InvalidSeedLength(15))
        ));
        assert!(matches!(
            ExtendedKey::master_from_seed(&curve, &[0u8; 65]),
            Err(ArkgenError::InvalidSeedLength(65))
        ));
        assert!(ExtendedKey::master_from_seed(&curve, &[0u8; 16]).is_ok());
        assert!(ExtendedKey::master_from_seed(&curve, &[0u8; 64]).is_ok());
    }

    #[test]
    fn test_next_index_stays_in_range() {
        assert_eq!(next_index(5).unwrap(), 6);
        assert_eq!(next_index(HARDENED_OFFSET).unwrap(), HARDENED_OFFSET + 1);
        assert!(matches!(
            next_index(HARDENED_OFFSET - 1),
            Err(ArkgenError::InvalidChildIndex(_))
        ));
        assert!(matches!(
            next_index(u32::MAX),
            Err(ArkgenError::InvalidChildIndex(_))
        ));
    }

    #[test]
    fn test_base58_roundtrip_and_network_check() {
        let curve = Curve::new();
        let table = NetworkTable::default();
        let testnet = table.get("testnet").unwrap();
        let key = ExtendedKey::master_from_seed(&curve, &[1u8; 32])
            .unwrap()
            .derive_path(&curve, &"m/1'/2".parse().unwrap())
            .unwrap();

        let tprv = key.to_base58(testnet);
        assert!(tprv.starts_with("tprv"));
        assert_eq!(ExtendedKey::from_base58(&curve, &tprv, testnet).unwrap(), key);

        let tpub = key.neuter().to_base58(testnet);
        assert!(tpub.starts_with("tpub"));
        assert_eq!(
            ExtendedKey::from_base58(&curve, &tpub, testnet).unwrap(),
            key.neuter()
        );

        assert!(matches!(
            ExtendedKey::from_base58(&curve, &tprv, &bitcoin_params()),
            Err(ArkgenError::InvalidExtendedKey(_))
        ));
    }
}
