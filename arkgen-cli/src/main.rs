mod commands;
mod config;

use arkgen_core::{AddressGenerator, ArkgenError};
use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arkgen")]
#[command(about = "HD key derivation, Taproot tweaking and Ark address generation")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network name (overrides the config file)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive addresses from a mnemonic, seed or private key
    Derive(commands::DeriveArgs),

    /// Ark address commands
    #[command(subcommand)]
    Ark(commands::ArkCommands),

    /// Generate fresh mnemonics and keys
    #[command(subcommand)]
    Generate(commands::GenerateCommands),

    /// Apply a BIP341 tweak to an internal key
    Tweak(commands::TweakArgs),

    /// Decode a native segwit address
    Decode(commands::DecodeArgs),

    /// Manage the config file
    #[command(subcommand)]
    Config(commands::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "arkgen={},arkgen_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        match e {
            ArkgenError::UnknownNetwork { name } => {
                eprintln!("Error: Unknown network '{}'", name);
                eprintln!(
                    "Known networks: bitcoin, testnet, signet, mutinynet, regtest, litecoin, litecoin-testnet"
                );
            }
            ArkgenError::InvalidMnemonic(msg) => {
                eprintln!("Error: Invalid mnemonic: {}", msg);
                eprintln!("Expected 12, 15, 18, 21 or 24 English BIP39 words");
            }
            ArkgenError::ServerFetchFailed(msg) => {
                eprintln!("Error: Could not reach the Ark server: {}", msg);
                eprintln!("Use --server-pubkey and --exit-delay to generate offline");
            }
            ArkgenError::NetworkMismatch { requested, server } => {
                eprintln!(
                    "Error: Requested {} but the Ark server runs on {}",
                    requested, server
                );
                eprintln!("Pass --network {} or point --server-url at a {} server", server, requested);
            }
            ArkgenError::UnsupportedScriptType {
                script_type,
                network,
            } => {
                eprintln!(
                    "Error: {} addresses are not available on {}",
                    script_type, network
                );
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> arkgen_core::Result<()> {
    let path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    // `config init` may target a file that does not exist yet
    let mut config = match &cli.command {
        Commands::Config(_) if !path.exists() => CliConfig::default(),
        _ => CliConfig::load(cli.config.as_deref())?,
    };
    if let Some(network) = cli.network {
        config.set_network(&network);
    }

    let generator = AddressGenerator::new(config.generator_config())?;
    let network = config.network.clone();

    match cli.command {
        Commands::Derive(args) => commands::handle_derive_command(args, &generator, &network),
        Commands::Ark(cmd) => commands::handle_ark_command(cmd, &generator, &network).await,
        Commands::Generate(cmd) => commands::handle_generate_command(cmd, &generator, &network),
        Commands::Tweak(args) => commands::handle_tweak_command(args, &generator, &network),
        Commands::Decode(args) => commands::handle_decode_command(args, &generator, &network),
        Commands::Config(cmd) => commands::handle_config_command(cmd, &config, &path),
    }
}
