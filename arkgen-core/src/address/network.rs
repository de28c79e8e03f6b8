use crate::error::{ArkgenError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-chain encoding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub name: String,
    /// `None` for chains without segwit.
    #[serde(default)]
    pub bech32_hrp: Option<String>,
    pub p2pkh_prefix: u8,
    pub p2sh_prefix: u8,
    pub wif_prefix: u8,
    pub xprv_version: u32,
    pub xpub_version: u32,
    pub coin_type: u32,
    /// HRP of Ark addresses, `None` where Ark is not deployed.
    #[serde(default)]
    pub ark_hrp: Option<String>,
}

impl NetworkParams {
    pub fn bitcoin() -> Self {
        Self {
            name: "bitcoin".to_string(),
            bech32_hrp: Some("bc".to_string()),
            p2pkh_prefix: 0x00,
            p2sh_prefix: 0x05,
            wif_prefix: 0x80,
            xprv_version: 0x0488ade4,
            xpub_version: 0x0488b21e,
            coin_type: 0,
            ark_hrp: Some("ark".to_string()),
        }
    }

    fn bitcoin_test(name: &str, hrp: &str) -> Self {
        Self {
            name: name.to_string(),
            bech32_hrp: Some(hrp.to_string()),
            p2pkh_prefix: 0x6f,
            p2sh_prefix: 0xc4,
            wif_prefix: 0xef,
            xprv_version: 0x04358394,
            xpub_version: 0x043587cf,
            coin_type: 1,
            ark_hrp: Some("tark".to_string()),
        }
    }

    pub fn testnet() -> Self {
        Self::bitcoin_test("testnet", "tb")
    }

    pub fn signet() -> Self {
        Self::bitcoin_test("signet", "tb")
    }

    pub fn regtest() -> Self {
        Self::bitcoin_test("regtest", "bcrt")
    }

    /// Signet fork with 30 second blocks that the public Ark servers run on.
    pub fn mutinynet() -> Self {
        Self::bitcoin_test("mutinynet", "tb")
    }

    pub fn litecoin() -> Self {
        Self {
            name: "litecoin".to_string(),
            bech32_hrp: Some("ltc".to_string()),
            p2pkh_prefix: 0x30,
            p2sh_prefix: 0x32,
            wif_prefix: 0xb0,
            xprv_version: 0x019d9cfe,
            xpub_version: 0x019da462,
            coin_type: 2,
            ark_hrp: None,
        }
    }

    pub fn litecoin_testnet() -> Self {
        Self {
            name: "litecoin-testnet".to_string(),
            bech32_hrp: Some("tltc".to_string()),
            p2pkh_prefix: 0x6f,
            p2sh_prefix: 0x3a,
            wif_prefix: 0xef,
            xprv_version: 0x04358394,
            xpub_version: 0x043587cf,
            coin_type: 1,
            ark_hrp: None,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        self.coin_type != 1
    }

    pub fn segwit_hrp(&self) -> Option<&str> {
        self.bech32_hrp.as_deref()
    }
}

/// Lookup of [`NetworkParams`] by name. Starts with the built-in chains;
/// configuration may add more or override them.
#[derive(Debug, Clone)]
pub struct NetworkTable {
    networks: HashMap<String, NetworkParams>,
}

impl Default for NetworkTable {
    fn default() -> Self {
        let networks = [
            NetworkParams::bitcoin(),
            NetworkParams::testnet(),
            NetworkParams::signet(),
            NetworkParams::regtest(),
            NetworkParams::mutinynet(),
            NetworkParams::litecoin(),
            NetworkParams::litecoin_testnet(),
        ]
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect();
        Self { networks }
    }
}

fn canonical_name(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    match name.as_str() {
        "mainnet" | "btc" | "main" => "bitcoin".to_string(),
        "testnet3" | "test" => "testnet".to_string(),
        "ltc" => "litecoin".to_string(),
        "ltct" | "ltctest" | "litecoin_testnet" => "litecoin-testnet".to_string(),
        _ => name,
    }
}

impl NetworkTable {
    pub fn with_custom(custom: impl IntoIterator<Item = NetworkParams>) -> Self {
        let mut table = Self::default();
        for params in custom {
            table.insert(params);
        }
        table
    }

    pub fn insert(&mut self, params: NetworkParams) {
        let key = canonical_name(&params.name);
        tracing::debug!(network = %key, "Registered network parameters");
        self.networks.insert(key, params);
    }

    pub fn get(&self, name: &str) -> Result<&NetworkParams> {
        self.networks
            .get(&canonical_name(name))
            .ok_or_else(|| ArkgenError::unknown_network(name))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkParams> + '_ {
        self.names()
            .into_iter()
            .filter_map(move |name| self.networks.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        let table = NetworkTable::default();
        assert_eq!(table.get("mainnet").unwrap().name, "bitcoin");
        assert_eq!(table.get("BTC").unwrap().name, "bitcoin");
        assert_eq!(table.get("ltc").unwrap().name, "litecoin");
        assert!(matches!(
            table.get("dogecoin"),
            Err(ArkgenError::UnknownNetwork { .. })
        ));
    }

    #[test]
    fn test_ark_hrps() {
        let table = NetworkTable::default();
        for name in table.names() {
            let params = table.get(name).unwrap();
            match params.ark_hrp.as_deref() {
                Some("ark") => assert!(params.is_mainnet()),
                Some("tark") => assert!(!params.is_mainnet()),
                Some(other) => panic!("unexpected ark hrp {}", other),
                None => assert!(params.name.starts_with("litecoin")),
            }
        }
    }

    #[test]
    fn test_litecoin_testnet() {
        let table = NetworkTable::default();
        let params = table.get("LTCt").unwrap();
        assert_eq!(params.name, "litecoin-testnet");
        assert_eq!(params.segwit_hrp(), Some("tltc"));
        assert!(!params.is_mainnet());
        assert_eq!(params.ark_hrp, None);
        assert!(table.names().contains(&"litecoin-testnet"));
    }

    #[test]
    fn test_custom_network_from_json() {
        let json = r#"{
            "name": "dogecoin",
            "p2pkh_prefix": 30,
            "p2sh_prefix": 22,
            "wif_prefix": 158,
            "xprv_version": 49988504,
            "xpub_version": 49990397,
            "coin_type": 3
        }"#;
        let params: NetworkParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.bech32_hrp, None);

        let table = NetworkTable::with_custom([params]);
        assert_eq!(table.get("Dogecoin").unwrap().coin_type, 3);
        assert!(table.get("bitcoin").is_ok());
    }
}
