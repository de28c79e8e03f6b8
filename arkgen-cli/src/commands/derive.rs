use super::print_json;
use arkgen_core::{
    AccountKeys, AddressGenerator, ArkgenError, DerivedAddress, KeySource, Result, ScriptType,
};
use clap::{ArgGroup, Args};
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Password;
use serde::Serialize;

#[derive(Args)]
#[command(group(ArgGroup::new("source").args(["mnemonic", "seed", "key", "xkey"])))]
#[command(group(ArgGroup::new("layout").args(["path", "account"])))]
pub struct DeriveArgs {
    /// BIP39 mnemonic (prompted for when no source is given)
    #[arg(long)]
    pub mnemonic: Option<String>,

    /// Hex seed of 16 to 64 bytes
    #[arg(long)]
    pub seed: Option<String>,

    /// Private key as WIF, nsec or hex (only valid with --path m)
    #[arg(long)]
    pub key: Option<String>,

    /// Extended key (xprv, xpub, tprv, tpub, ...) at the root or account level
    #[arg(long)]
    pub xkey: Option<String>,

    /// BIP39 passphrase
    #[arg(long, default_value = "")]
    pub passphrase: String,

    /// Address type: p2pkh, p2sh-p2wpkh, p2wpkh or p2tr
    #[arg(short = 't', long, default_value = "p2tr")]
    pub script_type: String,

    /// Explicit derivation path such as m/86'/0'/0'/0/0
    #[arg(short, long)]
    pub path: Option<String>,

    /// Account index
    #[arg(long)]
    pub account: Option<u32>,

    /// Change branch (0 receive, 1 change)
    #[arg(long, default_value = "0")]
    pub change: u32,

    /// First address index
    #[arg(long, default_value = "0")]
    pub start: u32,

    /// Number of addresses
    #[arg(long, default_value = "5")]
    pub count: u32,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl DeriveArgs {
    fn key_source(&self, generator: &AddressGenerator) -> Result<KeySource> {
        if let Some(words) = &self.mnemonic {
            return KeySource::mnemonic(words, &self.passphrase);
        }
        if let Some(seed) = &self.seed {
            return KeySource::seed_hex(seed);
        }
        if let Some(key) = &self.key {
            return KeySource::private_key(key);
        }
        if let Some(xkey) = &self.xkey {
            return KeySource::extended_key(generator.curve(), xkey, generator.networks());
        }

        let words = Password::new()
            .with_prompt("Enter mnemonic")
            .interact()
            .map_err(|e| ArkgenError::internal(format!("prompt failed: {}", e)))?;
        KeySource::mnemonic(&words, &self.passphrase)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeriveOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    extended_keys: Option<AccountKeys>,
    addresses: Vec<DerivedAddress>,
}

pub fn handle_derive_command(
    args: DeriveArgs,
    generator: &AddressGenerator,
    network: &str,
) -> Result<()> {
    let script_type: ScriptType = args.script_type.parse()?;
    let source = args.key_source(generator)?;

    let output = match &args.path {
        Some(path) => DeriveOutput {
            extended_keys: None,
            addresses: vec![generator.derive_address_for_path(&source, path, network, script_type)?],
        },
        None => {
            let account = args.account.unwrap_or(0);
            DeriveOutput {
                extended_keys: Some(generator.account_keys(&source, network, script_type, account)?),
                addresses: generator.derive_addresses(
                    &source,
                    network,
                    script_type,
                    account,
                    args.change,
                    args.start,
                    args.count,
                )?,
            }
        }
    };

    if args.json {
        return print_json(&output);
    }

    if let Some(keys) = &output.extended_keys {
        println!("{}", render_keys(keys));
    }
    println!("{}", render_table(&output.addresses));
    Ok(())
}

fn render_keys(keys: &AccountKeys) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Key", "Value"]);
    if let Some(xprv) = &keys.root_xprv {
        table.add_row(vec!["Root xprv".to_string(), xprv.clone()]);
    }
    if let Some(xpub) = &keys.root_xpub {
        table.add_row(vec!["Root xpub".to_string(), xpub.clone()]);
    }
    if let Some(xprv) = &keys.account_xprv {
        table.add_row(vec![format!("Account xprv ({})", keys.account_path), xprv.clone()]);
    }
    table.add_row(vec![
        format!("Account xpub ({})", keys.account_path),
        keys.account_xpub.clone(),
    ]);
    table
}

fn render_table(rows: &[DerivedAddress]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Path", "Type", "Address", "Public Key", "Private Key (WIF)"]);
    for row in rows {
        table.add_row(vec![
            row.path.clone(),
            row.script_type.to_string(),
            row.address.clone(),
            row.pubkey.clone(),
            row.privkey.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}
