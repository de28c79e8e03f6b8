//! Entry points: Ark address generation and HD address derivation.

pub mod config;
pub mod source;

pub use config::GeneratorConfig;
pub use source::{decode_nsec, encode_nsec, DerivedKey, KeySource};

use crate::address::{AddressEncoder, NetworkParams, NetworkTable, ScriptType, Wif};
use crate::ark::{
    self, ArkAddress, CsvTimelock, RestServerInfoProvider, ServerInfo, ServerInfoCache,
    ServerInfoProvider,
};
use crate::crypto::taproot::tweak_public_key;
use crate::crypto::{parse_x_only_hex, Curve};
use crate::encoding::{parse_hex, Variant};
use crate::error::{ArkgenError, Result};
use crate::hd::{ChildNumber, DerivationPath, ExtendedKey};
use crate::types::{
    AccountKeys, DecodedArkAddress, DecodedSegwitAddress, DerivedAddress, GeneratedArkAddress,
    GeneratedKey, TweakResult,
};
use bitcoin::secp256k1::{PublicKey, XOnlyPublicKey};

/// Upper bound for one `derive_addresses` call.
pub const MAX_BATCH: u32 = 1000;

/// Depth of `m/purpose'/coin'/account'`.
const ACCOUNT_DEPTH: u8 = 3;

pub struct AddressGenerator<P = ServerInfoCache<RestServerInfoProvider>> {
    curve: Curve,
    networks: NetworkTable,
    provider: P,
    config: GeneratorConfig,
}

impl AddressGenerator {
    /// Generator backed by the REST provider with per-URL caching.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let provider = RestServerInfoProvider::new(config.request_timeout)?;
        Self::with_provider(config, ServerInfoCache::new(provider))
    }
}

impl<P: ServerInfoProvider> AddressGenerator<P> {
    pub fn with_provider(config: GeneratorConfig, provider: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            curve: Curve::new(),
            networks: config.network_table(),
            provider,
            config,
        })
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn networks(&self) -> &NetworkTable {
        &self.networks
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn network(&self, name: &str) -> Result<&NetworkParams> {
        self.networks.get(name)
    }

    fn ark_hrp(&self, network: &str) -> Result<&str> {
        let params = self.networks.get(network)?;
        params
            .ark_hrp
            .as_deref()
            .ok_or_else(|| ArkgenError::UnsupportedScriptType {
                script_type: "ark".to_string(),
                network: params.name.clone(),
            })
    }

    pub async fn fetch_server_info(&self, server_url: &str) -> Result<ServerInfo> {
        self.provider.fetch_info(server_url).await
    }

    /// Ark address for `user_pubkey_hex` using the signer key and exit
    /// delay advertised by the server at `server_url`.
    pub async fn generate_address(
        &self,
        user_pubkey_hex: &str,
        server_url: &str,
        network: &str,
    ) -> Result<GeneratedArkAddress> {
        // input errors must surface before any request goes out
        let user = parse_x_only_hex(user_pubkey_hex)?;
        let hrp = self.ark_hrp(network)?.to_string();

        let info = self.fetch_server_info(server_url).await?;
        let server = info.signer_x_only()?;
        // the server's network decides the prefix
        if info.ark_hrp() != hrp {
            return Err(ArkgenError::NetworkMismatch {
                requested: network.to_string(),
                server: info.network.clone(),
            });
        }

        let timelock = CsvTimelock::from_exit_delay(info.unilateral_exit_delay)?;
        let mut generated = self.build(user, server, timelock, info.ark_hrp())?;
        generated.exit_delay = Some(info.unilateral_exit_delay);
        Ok(generated)
    }

    /// Ark address from explicit parameters; no network access. With no
    /// `exit_delay` the configured default is used.
    pub fn generate_address_manual(
        &self,
        user_pubkey_hex: &str,
        server_pubkey_hex: &str,
        exit_delay: Option<u64>,
        network: &str,
    ) -> Result<GeneratedArkAddress> {
        let user = parse_x_only_hex(user_pubkey_hex)?;
        let server = parse_x_only_hex(server_pubkey_hex)?;
        let delay = exit_delay
            .or(self.config.default_exit_delay)
            .ok_or_else(|| ArkgenError::InvalidTimelock("no exit delay given".to_string()))?;
        let timelock = CsvTimelock::from_exit_delay(delay)?;
        let hrp = self.ark_hrp(network)?.to_string();
        self.build(user, server, timelock, &hrp)
    }

    fn build(
        &self,
        user: XOnlyPublicKey,
        server: XOnlyPublicKey,
        timelock: CsvTimelock,
        hrp: &str,
    ) -> Result<GeneratedArkAddress> {
        let (address, tweaked) = ark::build_address(&self.curve, user, server, timelock, hrp)?;
        let encoded = address.encode()?;
        tracing::info!(address = %encoded, timelock = %timelock, "Generated Ark address");

        Ok(GeneratedArkAddress {
            address: encoded,
            vtxo_key: hex::encode(address.vtxo_key().serialize()),
            server_pub_key: hex::encode(server.serialize()),
            tweaked_public_key: hex::encode(tweaked.output_key),
            exit_delay: None,
            timelock,
        })
    }

    pub fn decode_address(&self, address: &str) -> Result<DecodedArkAddress> {
        let decoded = ArkAddress::decode(address)?;
        Ok(DecodedArkAddress {
            server_pub_key: hex::encode(decoded.server().serialize()),
            vtxo_taproot_key: hex::encode(decoded.vtxo_key().serialize()),
            hrp: decoded.hrp().to_string(),
            version: decoded.version(),
        })
    }

    /// Decodes a native segwit address of `network`.
    pub fn decode_onchain_address(
        &self,
        address: &str,
        network: &str,
    ) -> Result<DecodedSegwitAddress> {
        let params = self.networks.get(network)?;
        let program = AddressEncoder::new(&self.curve, params).decode(address)?;
        Ok(DecodedSegwitAddress {
            network: params.name.clone(),
            script_type: ScriptType::from_witness(program.version, program.program.len()),
            variant: Variant::for_witness_version(program.version),
            witness_version: program.version,
            program: hex::encode(&program.program),
            hrp: program.hrp,
        })
    }

    /// Explicit paths are relative to the source: `m` is the root of a
    /// mnemonic or seed, or the node an extended key was exported at.
    pub fn derive_address_for_path(
        &self,
        source: &KeySource,
        path: &str,
        network: &str,
        script_type: ScriptType,
    ) -> Result<DerivedAddress> {
        let path: DerivationPath = path.parse()?;
        let params = self.networks.get(network)?;
        let key = source.derive(&self.curve, &path)?;
        self.row(&path, &key, params, script_type)
    }

    fn row(
        &self,
        path: &DerivationPath,
        key: &DerivedKey,
        params: &NetworkParams,
        script_type: ScriptType,
    ) -> Result<DerivedAddress> {
        let pk = key.public_key;
        let address = AddressEncoder::new(&self.curve, params).encode(script_type, &pk)?;

        tracing::debug!(path = %path, address = %address, "Derived address");
        Ok(DerivedAddress {
            path: path.to_string(),
            address,
            pubkey: hex::encode(pk.serialize()),
            privkey: key.private_key.map(|sk| Wif::encode(&sk, params, true)),
            script_type,
        })
    }

    /// The account node `m/purpose'/coin'/account'` of `source` with its
    /// full path. A root source derives it; an extended key exported at
    /// depth 3 is taken to be the account node itself, and `account` is
    /// then ignored in favour of the key's own child number.
    fn account_node(
        &self,
        source: &KeySource,
        params: &NetworkParams,
        script_type: ScriptType,
        account: u32,
    ) -> Result<(DerivationPath, ExtendedKey)> {
        let prefix = DerivationPath::from(vec![
            ChildNumber::hardened(script_type.purpose())?,
            ChildNumber::hardened(params.coin_type)?,
        ]);
        let root = source.master_key(&self.curve)?.ok_or_else(|| {
            ArkgenError::path(format!(
                "a bare private key cannot be derived along {}; use m",
                prefix
            ))
        })?;

        match root.depth() {
            0 => {
                let path = prefix.child(ChildNumber::hardened(account)?);
                let node = root.derive_path(&self.curve, &path)?;
                Ok((path, node))
            }
            ACCOUNT_DEPTH => Ok((prefix.child(root.child_number()), root)),
            depth => Err(ArkgenError::path(format!(
                "extended key at depth {} is neither a root nor an account key",
                depth
            ))),
        }
    }

    /// Rows `start..start+count` of `m/purpose'/coin'/account'/change/i`.
    #[allow(clippy::too_many_arguments)]
    pub fn derive_addresses(
        &self,
        source: &KeySource,
        network: &str,
        script_type: ScriptType,
        account: u32,
        change: u32,
        start: u32,
        count: u32,
    ) -> Result<Vec<DerivedAddress>> {
        if count > MAX_BATCH {
            return Err(ArkgenError::config(format!(
                "at most {} addresses per batch",
                MAX_BATCH
            )));
        }
        let end = start
            .checked_add(count)
            .ok_or(ArkgenError::InvalidChildIndex(start))?;
        let params = self.networks.get(network)?;

        let (account_path, account_key) = self.account_node(source, params, script_type, account)?;

        // the branch node is shared by every row
        let change = ChildNumber::normal(change)?;
        let branch = account_path.child(change);
        let branch_key = account_key.derive_child(&self.curve, change)?;

        (start..end)
            .map(|index| {
                let key = branch_key.derive_child(&self.curve, ChildNumber::normal(index)?)?;
                let derived = DerivedKey {
                    public_key: *key.public_key(),
                    private_key: key.private_key().copied(),
                };
                self.row(&branch.child(key.child_number()), &derived, params, script_type)
            })
            .collect()
    }

    /// Root and account extended keys for `script_type` on `network`, in
    /// the network's `xprv`/`xpub` encoding. The root is only known for
    /// mnemonic, seed or depth-0 extended sources.
    pub fn account_keys(
        &self,
        source: &KeySource,
        network: &str,
        script_type: ScriptType,
        account: u32,
    ) -> Result<AccountKeys> {
        let params = self.networks.get(network)?;
        let (account_path, account_key) = self.account_node(source, params, script_type, account)?;
        let root = source
            .master_key(&self.curve)?
            .filter(|key| key.depth() == 0);

        let private = |key: &ExtendedKey| key.is_private().then(|| key.to_base58(params));
        Ok(AccountKeys {
            root_xprv: root.as_ref().and_then(private),
            root_xpub: root.as_ref().map(|key| key.neuter().to_base58(params)),
            account_path: account_path.to_string(),
            account_xprv: private(&account_key),
            account_xpub: account_key.neuter().to_base58(params),
        })
    }

    /// BIP341 tweak of a raw internal key, with the resulting P2TR address.
    pub fn tweak(
        &self,
        internal_key_hex: &str,
        merkle_root_hex: Option<&str>,
        network: &str,
    ) -> Result<TweakResult> {
        let internal = parse_x_only_hex(internal_key_hex)?.serialize();
        let merkle_root = match merkle_root_hex {
            Some(s) => {
                let bytes = parse_hex(s)?;
                let root: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| {
                        ArkgenError::hex(format!("merkle root must be 32 bytes, got {}", bytes.len()))
                    })?;
                Some(root)
            }
            None => None,
        };

        let tweaked = tweak_public_key(&self.curve, &internal, merkle_root.as_ref())?;
        let params = self.networks.get(network)?;
        let address =
            AddressEncoder::new(&self.curve, params).p2tr_from_output_key(&tweaked.output_key)?;

        Ok(TweakResult {
            internal_key: hex::encode(internal),
            merkle_root: merkle_root.map(hex::encode),
            output_key: hex::encode(tweaked.output_key),
            parity: u8::from(tweaked.is_odd()),
            address,
        })
    }

    pub fn generate_key(&self, network: &str) -> Result<GeneratedKey> {
        let params = self.networks.get(network)?;
        let sk = self.curve.generate_private_key();
        let pk = PublicKey::from_secret_key(self.curve.secp(), &sk);
        let (x_only, _) = pk.x_only_public_key();
        Ok(GeneratedKey {
            private_key: hex::encode(sk.secret_bytes()),
            wif: Wif::encode(&sk, params, true),
            public_key: hex::encode(pk.serialize()),
            x_only_public_key: hex::encode(x_only.serialize()),
        })
    }
}
