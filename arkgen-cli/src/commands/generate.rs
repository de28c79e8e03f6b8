use super::print_json;
use arkgen_core::hd::generate_mnemonic;
use arkgen_core::{AddressGenerator, Result};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Generate a new BIP39 mnemonic
    Mnemonic {
        /// Number of words (12, 15, 18, 21 or 24)
        #[arg(short, long, default_value = "12")]
        words: usize,
    },

    /// Generate a new private key
    Key {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_generate_command(
    cmd: GenerateCommands,
    generator: &AddressGenerator,
    network: &str,
) -> Result<()> {
    match cmd {
        GenerateCommands::Mnemonic { words } => {
            let mnemonic = generate_mnemonic(words)?;
            println!("{}", mnemonic);
            println!();
            println!("Write these words down and keep them offline.");
        }

        GenerateCommands::Key { json } => {
            let key = generator.generate_key(network)?;
            if json {
                return print_json(&key);
            }

            println!("Private key: {}", key.private_key);
            println!("WIF ({}): {}", network, key.wif);
            println!("Public key: {}", key.public_key);
            println!("X-only public key: {}", key.x_only_public_key);
        }
    }

    Ok(())
}
