use super::print_json;
use arkgen_core::{AddressGenerator, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};

#[derive(Subcommand)]
pub enum ArkCommands {
    /// Generate an Ark address for a user public key
    Address {
        /// User public key (x-only or compressed hex)
        #[arg(long)]
        pubkey: String,

        /// Ark server to fetch the signer key and exit delay from
        #[arg(long, conflicts_with = "server_pubkey")]
        server_url: Option<String>,

        /// Server signer key, for offline generation
        #[arg(long, requires = "exit_delay")]
        server_pubkey: Option<String>,

        /// Unilateral exit delay (blocks below 512, seconds otherwise)
        #[arg(long)]
        exit_delay: Option<u64>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode an Ark address into its keys
    Decode {
        /// Address to decode
        address: String,
    },

    /// Show what an Ark server advertises
    Info {
        /// Server URL (defaults to the configured server)
        #[arg(long)]
        server_url: Option<String>,
    },
}

pub async fn handle_ark_command(
    cmd: ArkCommands,
    generator: &AddressGenerator,
    network: &str,
) -> Result<()> {
    match cmd {
        ArkCommands::Address {
            pubkey,
            server_url,
            server_pubkey,
            exit_delay,
            json,
        } => {
            let generated = match server_pubkey {
                Some(server) => {
                    generator.generate_address_manual(&pubkey, &server, exit_delay, network)?
                }
                None => {
                    let url = server_url
                        .unwrap_or_else(|| generator.config().ark_server_url.clone());
                    tracing::info!(url = %url, "Fetching server info");
                    generator.generate_address(&pubkey, &url, network).await?
                }
            };

            if json {
                return print_json(&generated);
            }

            println!("Ark address: {}", generated.address);
            println!("  VTXO key: {}", generated.vtxo_key);
            println!("  Server key: {}", generated.server_pub_key);
            println!("  Exit timelock: {}", generated.timelock);
        }

        ArkCommands::Decode { address } => {
            let decoded = generator.decode_address(&address)?;

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Field", "Value"]);
            table.add_row(vec!["HRP".to_string(), decoded.hrp]);
            table.add_row(vec!["Version".to_string(), decoded.version.to_string()]);
            table.add_row(vec!["Server key".to_string(), decoded.server_pub_key]);
            table.add_row(vec!["VTXO taproot key".to_string(), decoded.vtxo_taproot_key]);
            println!("{table}");
        }

        ArkCommands::Info { server_url } => {
            let url = server_url.unwrap_or_else(|| generator.config().ark_server_url.clone());
            let info = generator.fetch_server_info(&url).await?;

            println!("Ark server: {}", url);
            println!("  Network: {}", info.network);
            println!("  Signer key: {}", info.signer_pubkey);
            println!("  Unilateral exit delay: {}", info.unilateral_exit_delay);
        }
    }

    Ok(())
}
