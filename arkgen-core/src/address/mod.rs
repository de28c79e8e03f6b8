//! On-chain address encoders and WIF private keys.

pub mod network;

pub use network::{NetworkParams, NetworkTable};

use crate::crypto::taproot::tweak_public_key;
use crate::crypto::{secret_key_from_slice, Curve};
use crate::encoding::bech32::WitnessProgram;
use crate::encoding::{base58check_decode, base58check_encode, bech32, Bech32Error, Variant};
use crate::error::{ArkgenError, Result};
use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    #[serde(rename = "p2pkh")]
    P2pkh,
    #[serde(rename = "p2sh-p2wpkh")]
    P2shP2wpkh,
    #[serde(rename = "p2wpkh")]
    P2wpkh,
    #[serde(rename = "p2tr")]
    P2tr,
}

impl ScriptType {
    pub const ALL: [ScriptType; 4] = [
        ScriptType::P2pkh,
        ScriptType::P2shP2wpkh,
        ScriptType::P2wpkh,
        ScriptType::P2tr,
    ];

    /// BIP44 / 49 / 84 / 86.
    pub fn purpose(&self) -> u32 {
        match self {
            ScriptType::P2pkh => 44,
            ScriptType::P2shP2wpkh => 49,
            ScriptType::P2wpkh => 84,
            ScriptType::P2tr => 86,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2shP2wpkh => "p2sh-p2wpkh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::P2tr => "p2tr",
        }
    }

    /// The type a native witness program encodes, if it is one we derive.
    pub fn from_witness(version: u8, program_len: usize) -> Option<Self> {
        match (version, program_len) {
            (0, 20) => Some(ScriptType::P2wpkh),
            (1, 32) => Some(ScriptType::P2tr),
            _ => None,
        }
    }

    fn needs_segwit(&self) -> bool {
        !matches!(self, ScriptType::P2pkh)
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptType {
    type Err = ArkgenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p2pkh" | "legacy" | "bip44" => Ok(ScriptType::P2pkh),
            "p2sh-p2wpkh" | "p2wpkh-p2sh" | "nested" | "bip49" => Ok(ScriptType::P2shP2wpkh),
            "p2wpkh" | "segwit" | "bip84" => Ok(ScriptType::P2wpkh),
            "p2tr" | "taproot" | "bip86" => Ok(ScriptType::P2tr),
            other => Err(ArkgenError::config(format!("unknown script type: {}", other))),
        }
    }
}

/// Encodes on-chain addresses for one network.
#[derive(Debug, Clone)]
pub struct AddressEncoder<'a> {
    curve: &'a Curve,
    params: &'a NetworkParams,
}

impl<'a> AddressEncoder<'a> {
    pub fn new(curve: &'a Curve, params: &'a NetworkParams) -> Self {
        Self { curve, params }
    }

    pub fn params(&self) -> &NetworkParams {
        self.params
    }

    pub fn encode(&self, script_type: ScriptType, public_key: &PublicKey) -> Result<String> {
        // nested segwit is only meaningful where native segwit exists
        if script_type.needs_segwit() {
            self.hrp(script_type)?;
        }

        match script_type {
            ScriptType::P2pkh => Ok(self.p2pkh(public_key)),
            ScriptType::P2shP2wpkh => Ok(self.p2sh_p2wpkh(public_key)),
            ScriptType::P2wpkh => self.p2wpkh(public_key),
            ScriptType::P2tr => self.p2tr(public_key),
        }
    }

    /// Decodes a native segwit address of this network. Any other HRP is
    /// rejected, even when the checksum is valid.
    pub fn decode(&self, address: &str) -> Result<WitnessProgram> {
        let expected = self.params.segwit_hrp().ok_or_else(|| {
            ArkgenError::UnsupportedScriptType {
                script_type: "segwit".to_string(),
                network: self.params.name.clone(),
            }
        })?;
        let program = bech32::decode_segwit(address.trim())?;
        if program.hrp != expected {
            return Err(Bech32Error::UnknownHrp(program.hrp).into());
        }
        Ok(program)
    }

    fn hrp(&self, script_type: ScriptType) -> Result<&str> {
        self.params
            .segwit_hrp()
            .ok_or_else(|| ArkgenError::UnsupportedScriptType {
                script_type: script_type.to_string(),
                network: self.params.name.clone(),
            })
    }

    fn p2pkh(&self, public_key: &PublicKey) -> String {
        let mut data = Vec::with_capacity(21);
        data.push(self.params.p2pkh_prefix);
        data.extend_from_slice(&pubkey_hash(public_key));
        base58check_encode(&data)
    }

    fn p2sh_p2wpkh(&self, public_key: &PublicKey) -> String {
        let mut redeem = Vec::with_capacity(22);
        redeem.extend_from_slice(&[0x00, 0x14]);
        redeem.extend_from_slice(&pubkey_hash(public_key));

        let mut data = Vec::with_capacity(21);
        data.push(self.params.p2sh_prefix);
        data.extend_from_slice(&hash160::Hash::hash(&redeem).to_byte_array());
        base58check_encode(&data)
    }

    fn p2wpkh(&self, public_key: &PublicKey) -> Result<String> {
        let hrp = self.hrp(ScriptType::P2wpkh)?;
        Ok(bech32::encode(hrp, 0, &pubkey_hash(public_key), Variant::Bech32)?)
    }

    /// BIP86 key-path only output.
    fn p2tr(&self, public_key: &PublicKey) -> Result<String> {
        let (internal, _) = public_key.x_only_public_key();
        let tweaked = tweak_public_key(self.curve, &internal.serialize(), None)?;
        self.p2tr_from_output_key(&tweaked.output_key)
    }

    /// Taproot address for an already tweaked output key.
    pub fn p2tr_from_output_key(&self, output_key: &[u8; 32]) -> Result<String> {
        let hrp = self.hrp(ScriptType::P2tr)?;
        Ok(bech32::encode(hrp, 1, output_key, Variant::Bech32m)?)
    }
}

fn pubkey_hash(public_key: &PublicKey) -> [u8; 20] {
    hash160::Hash::hash(&public_key.serialize()).to_byte_array()
}

/// A decoded Wallet Import Format key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wif {
    pub private_key: SecretKey,
    pub prefix: u8,
    pub compressed: bool,
}

impl Wif {
    pub fn encode(private_key: &SecretKey, params: &NetworkParams, compressed: bool) -> String {
        let mut data = Vec::with_capacity(34);
        data.push(params.wif_prefix);
        data.extend_from_slice(&private_key.secret_bytes());
        if compressed {
            data.push(0x01);
        }
        base58check_encode(&data)
    }

    pub fn decode(s: &str) -> Result<Self> {
        let data = base58check_decode(s.trim())
            .map_err(|_| ArkgenError::private_key("invalid WIF checksum"))?;
        let compressed = match data.len() {
            33 => false,
            34 if data[33] == 0x01 => true,
            34 => return Err(ArkgenError::private_key("invalid WIF compression flag")),
            n => {
                return Err(ArkgenError::private_key(format!(
                    "invalid WIF length {}",
                    n
                )))
            }
        };
        Ok(Self {
            private_key: secret_key_from_slice(&data[1..33])?,
            prefix: data[0],
            compressed,
        })
    }

    /// The first table entry whose WIF prefix matches.
    pub fn network<'t>(&self, table: &'t NetworkTable) -> Option<&'t NetworkParams> {
        table.iter().find(|p| p.wif_prefix == self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{Address, CompressedPublicKey, Network};

    const BIP84_PUBKEY: &str = "0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c";

    fn pk(s: &str) -> PublicKey {
        PublicKey::from_slice(&hex::decode(s).unwrap()).unwrap()
    }

    #[test]
    fn test_p2wpkh_vector() {
        let curve = Curve::new();
        let params = NetworkParams::bitcoin();
        let encoder = AddressEncoder::new(&curve, &params);
        assert_eq!(
            encoder.encode(ScriptType::P2wpkh, &pk(BIP84_PUBKEY)).unwrap(),
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
        );
    }

    #[test]
    fn test_p2tr_vector() {
        let curve = Curve::new();
        let params = NetworkParams::bitcoin();
        let encoder = AddressEncoder::new(&curve, &params);
        let internal = pk("02cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115");
        assert_eq!(
            encoder.encode(ScriptType::P2tr, &internal).unwrap(),
            "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr"
        );
    }

    #[test]
    fn test_matches_bitcoin_addresses() {
        let curve = Curve::new();
        let key = pk(BIP84_PUBKEY);
        let compressed = CompressedPublicKey(key);

        for (params, network) in [
            (NetworkParams::bitcoin(), Network::Bitcoin),
            (NetworkParams::testnet(), Network::Testnet),
            (NetworkParams::regtest(), Network::Regtest),
        ] {
            let encoder = AddressEncoder::new(&curve, &params);
            assert_eq!(
                encoder.encode(ScriptType::P2pkh, &key).unwrap(),
                Address::p2pkh(compressed, network).to_string()
            );
            assert_eq!(
                encoder.encode(ScriptType::P2shP2wpkh, &key).unwrap(),
                Address::p2shwpkh(&compressed, network).to_string()
            );
            assert_eq!(
                encoder.encode(ScriptType::P2wpkh, &key).unwrap(),
                Address::p2wpkh(&compressed, network).to_string()
            );
            let (internal, _) = key.x_only_public_key();
            assert_eq!(
                encoder.encode(ScriptType::P2tr, &key).unwrap(),
                Address::p2tr(curve.secp(), internal, None, network).to_string()
            );
        }
    }

    #[test]
    fn test_litecoin_prefixes() {
        let curve = Curve::new();
        let params = NetworkParams::litecoin();
        let encoder = AddressEncoder::new(&curve, &params);
        let key = pk(BIP84_PUBKEY);
        assert!(encoder.encode(ScriptType::P2pkh, &key).unwrap().starts_with('L'));
        assert!(encoder.encode(ScriptType::P2shP2wpkh, &key).unwrap().starts_with('M'));
        assert!(encoder.encode(ScriptType::P2wpkh, &key).unwrap().starts_with("ltc1q"));
        assert!(encoder.encode(ScriptType::P2tr, &key).unwrap().starts_with("ltc1p"));
    }

    #[test]
    fn test_decode_checks_network_hrp() {
        let curve = Curve::new();
        let params = NetworkParams::bitcoin();
        let encoder = AddressEncoder::new(&curve, &params);

        let p2wpkh = encoder.decode("bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu").unwrap();
        assert_eq!(p2wpkh.version, 0);
        assert_eq!(p2wpkh.program, pubkey_hash(&pk(BIP84_PUBKEY)).to_vec());
        assert_eq!(
            ScriptType::from_witness(p2wpkh.version, p2wpkh.program.len()),
            Some(ScriptType::P2wpkh)
        );

        let internal = pk("02cc8a4bc64d897bddc5fbc2f670f7a8ba0b386779106cf1223c6fc5d7cd6fc115");
        let (x_only, _) = internal.x_only_public_key();
        let tweaked = tweak_public_key(&curve, &x_only.serialize(), None).unwrap();
        let p2tr = encoder
            .decode("BC1P5CYXNUXMEUWUVKWFEM96LQZSZD02N6XDCJRS20CAC6YQJJWUDPXQKEDRCR")
            .unwrap();
        assert_eq!(p2tr.program, tweaked.output_key.to_vec());
        assert_eq!(
            ScriptType::from_witness(p2tr.version, p2tr.program.len()),
            Some(ScriptType::P2tr)
        );

        // valid checksums, foreign prefixes
        let testnet = NetworkParams::testnet();
        let tb = AddressEncoder::new(&curve, &testnet)
            .encode(ScriptType::P2wpkh, &pk(BIP84_PUBKEY))
            .unwrap();
        for foreign in [tb.as_str(), "zz1qqurswpc8qurswpc8qurswpc8qurswpc8ck99k3"] {
            assert!(matches!(
                encoder.decode(foreign),
                Err(ArkgenError::Bech32(Bech32Error::UnknownHrp(_)))
            ));
        }
        assert!(AddressEncoder::new(&curve, &testnet).decode(&tb).is_ok());
    }

    #[test]
    fn test_segwit_requires_hrp() {
        let curve = Curve::new();
        let params = NetworkParams {
            name: "legacy-only".to_string(),
            bech32_hrp: None,
            ..NetworkParams::bitcoin()
        };
        let encoder = AddressEncoder::new(&curve, &params);
        let key = pk(BIP84_PUBKEY);
        assert!(encoder.encode(ScriptType::P2pkh, &key).is_ok());
        for script_type in [ScriptType::P2wpkh, ScriptType::P2tr, ScriptType::P2shP2wpkh] {
            assert!(matches!(
                encoder.encode(script_type, &key),
                Err(ArkgenError::UnsupportedScriptType { .. })
            ));
        }
        assert!(matches!(
            encoder.decode("bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"),
            Err(ArkgenError::UnsupportedScriptType { .. })
        ));
    }

    #[test]
    fn test_script_type_names() {
        for script_type in ScriptType::ALL {
            assert_eq!(script_type.to_string().parse::<ScriptType>().unwrap(), script_type);
        }
        assert_eq!("taproot".parse::<ScriptType>().unwrap(), ScriptType::P2tr);
        assert_eq!(ScriptType::P2shP2wpkh.purpose(), 49);
        assert!("p2wsh".parse::<ScriptType>().is_err());
        assert_eq!(
            serde_json::to_string(&ScriptType::P2shP2wpkh).unwrap(),
            "\"p2sh-p2wpkh\""
        );
    }

    #[test]
    fn test_wif() {
        let sk = secret_key_from_slice(
            &hex::decode("41f41d69260df4cf277826a9b65a3717e4eeddbeedf637f212ca096576479361")
                .unwrap(),
        )
        .unwrap();
        let wif = Wif::encode(&sk, &NetworkParams::bitcoin(), true);
        assert_eq!(wif, "KyRv5iFPHG7iB5E4CqvMzH3WFJVhbfYK4VY7XAedd9Ys69mEsPLQ");

        let decoded = Wif::decode(&wif).unwrap();
        assert_eq!(decoded.private_key, sk);
        assert!(decoded.compressed);
        assert_eq!(decoded.prefix, 0x80);
        assert_eq!(
            decoded.network(&NetworkTable::default()).unwrap().name,
            "bitcoin"
        );

        let uncompressed = Wif::encode(&sk, &NetworkParams::bitcoin(), false);
        assert!(uncompressed.starts_with('5'));
        assert!(!Wif::decode(&uncompressed).unwrap().compressed);

        assert!(matches!(
            Wif::decode("KyRv5iFPHG7iB5E4CqvMzH3WFJVhbfYK4VY7XAedd9Ys69mEsPLR"),
            Err(ArkgenError::InvalidPrivateKey(_))
        ));
    }
}
