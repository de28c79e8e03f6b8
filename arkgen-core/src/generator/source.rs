use crate::address::{NetworkTable, Wif};
use crate::crypto::{secret_key_from_slice, Curve};
use crate::encoding::bech32::{self, Bech32Error, Variant};
use crate::encoding::{base58check_decode, parse_hex};
use crate::error::{ArkgenError, Result};
use crate::hd::{parse_mnemonic, DerivationPath, ExtendedKey, MAX_SEED_LENGTH, MIN_SEED_LENGTH};
use bitcoin::secp256k1::{PublicKey, SecretKey};

const NSEC_HRP: &str = "nsec";
const EXTENDED_KEY_LENGTH: usize = 78;

/// Where keys come from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    Mnemonic { words: String, passphrase: String },
    Seed(Vec<u8>),
    /// A serialized BIP32 node (`xprv`, `xpub`, `tprv`, ...). Explicit
    /// paths are relative to it.
    Extended(ExtendedKey),
    /// A bare key has no chain code, so only the master path applies.
    PrivateKey(SecretKey),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Mnemonic { .. } => f.write_str("KeySource::Mnemonic(..)"),
            KeySource::Seed(seed) => write!(f, "KeySource::Seed({} bytes)", seed.len()),
            KeySource::Extended(key) => write!(
                f,
                "KeySource::Extended(depth {}, {})",
                key.depth(),
                if key.is_private() { "private" } else { "public" }
            ),
            KeySource::PrivateKey(_) => f.write_str("KeySource::PrivateKey(..)"),
        }
    }
}

/// A key reached by [`KeySource::derive`]. Public-only sources yield no
/// secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedKey {
    pub public_key: PublicKey,
    pub private_key: Option<SecretKey>,
}

/// Decodes a NIP-19 `nsec1…` private key.
pub fn decode_nsec(s: &str) -> Result<SecretKey> {
    let (hrp, payload) = bech32::decode_payload(s.trim(), Variant::Bech32, None)?;
    if hrp != NSEC_HRP {
        return Err(Bech32Error::UnknownHrp(hrp).into());
    }
    secret_key_from_slice(&payload)
}

pub fn encode_nsec(key: &SecretKey) -> Result<String> {
    Ok(bech32::encode_payload(
        NSEC_HRP,
        &key.secret_bytes(),
        Variant::Bech32,
        None,
    )?)
}

impl KeySource {
    pub fn mnemonic(words: &str, passphrase: &str) -> Result<Self> {
        let mnemonic = parse_mnemonic(words)?;
        Ok(KeySource::Mnemonic {
            words: mnemonic.to_string(),
            passphrase: passphrase.to_string(),
        })
    }

    pub fn seed_hex(s: &str) -> Result<Self> {
        let seed = parse_hex(s)?;
        if !(MIN_SEED_LENGTH..=MAX_SEED_LENGTH).contains(&seed.len()) {
            return Err(ArkgenError::InvalidSeedLength(seed.len()));
        }
        Ok(KeySource::Seed(seed))
    }

    /// WIF, `nsec1…` or 64 hex characters.
    pub fn private_key(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.to_ascii_lowercase().starts_with("nsec1") {
            return Ok(KeySource::PrivateKey(decode_nsec(s)?));
        }
        if let Ok(wif) = Wif::decode(s) {
            return Ok(KeySource::PrivateKey(wif.private_key));
        }
        let bytes = parse_hex(s)
            .map_err(|_| ArkgenError::private_key("expected WIF, nsec or 64 hex characters"))?;
        Ok(KeySource::PrivateKey(secret_key_from_slice(&bytes)?))
    }

    /// Parses an extended key against every network in `networks`.
    pub fn extended_key(curve: &Curve, s: &str, networks: &NetworkTable) -> Result<Self> {
        let mut last_err = None;
        for params in networks.iter() {
            match ExtendedKey::from_base58(curve, s, params) {
                Ok(key) => return Ok(KeySource::Extended(key)),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .unwrap_or_else(|| ArkgenError::InvalidExtendedKey("no networks known".to_string())))
    }

    /// Guesses the kind of `input`:
    /// words → mnemonic, `nsec1` → NIP-19, 78-byte Base58Check → extended
    /// key of a built-in network, valid WIF → WIF, 32 hex bytes → private
    /// key, other hex of 16..=64 bytes → seed.
    pub fn detect(input: &str, passphrase: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ArkgenError::private_key("empty key source"));
        }
        if input.split_whitespace().count() > 1 {
            return Self::mnemonic(input, passphrase);
        }
        if input.to_ascii_lowercase().starts_with("nsec1") {
            return Ok(KeySource::PrivateKey(decode_nsec(input)?));
        }
        if base58check_decode(input).is_ok_and(|data| data.len() == EXTENDED_KEY_LENGTH) {
            return Self::extended_key(&Curve::new(), input, &NetworkTable::default());
        }
        if let Ok(wif) = Wif::decode(input) {
            return Ok(KeySource::PrivateKey(wif.private_key));
        }

        let bytes = parse_hex(input)?;
        if bytes.len() == 32 {
            return Ok(KeySource::PrivateKey(secret_key_from_slice(&bytes)?));
        }
        if !(MIN_SEED_LENGTH..=MAX_SEED_LENGTH).contains(&bytes.len()) {
            return Err(ArkgenError::InvalidSeedLength(bytes.len()));
        }
        Ok(KeySource::Seed(bytes))
    }

    pub fn master_key(&self, curve: &Curve) -> Result<Option<ExtendedKey>> {
        match self {
            KeySource::Mnemonic { words, passphrase } => {
                let seed = crate::hd::seed_from_mnemonic(words, passphrase)?;
                Ok(Some(ExtendedKey::master_from_seed(curve, &seed)?))
            }
            KeySource::Seed(seed) => Ok(Some(ExtendedKey::master_from_seed(curve, seed)?)),
            KeySource::Extended(key) => Ok(Some(key.clone())),
            KeySource::PrivateKey(_) => Ok(None),
        }
    }

    /// Key at `path`. Hardened steps need a private source.
    pub fn derive(&self, curve: &Curve, path: &DerivationPath) -> Result<DerivedKey> {
        match self {
            KeySource::PrivateKey(sk) => {
                if !path.is_master() {
                    return Err(ArkgenError::path(format!(
                        "a bare private key cannot be derived along {}; use m",
                        path
                    )));
                }
                Ok(DerivedKey {
                    public_key: PublicKey::from_secret_key(curve.secp(), sk),
                    private_key: Some(*sk),
                })
            }
            _ => {
                let master = self
                    .master_key(curve)?
                    .ok_or_else(|| ArkgenError::internal("seed source without master key"))?;
                let child = master.derive_path(curve, path)?;
                Ok(DerivedKey {
                    public_key: *child.public_key(),
                    private_key: child.private_key().copied(),
                })
            }
        }
    }
}
