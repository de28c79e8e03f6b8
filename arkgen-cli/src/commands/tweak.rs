use super::print_json;
use arkgen_core::{AddressGenerator, Result};
use clap::Args;

#[derive(Args)]
pub struct TweakArgs {
    /// Internal key (x-only or compressed hex)
    pub internal_key: String,

    /// Script tree merkle root; omit for a key-path-only output
    #[arg(long)]
    pub merkle_root: Option<String>,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_tweak_command(
    args: TweakArgs,
    generator: &AddressGenerator,
    network: &str,
) -> Result<()> {
    let result = generator.tweak(&args.internal_key, args.merkle_root.as_deref(), network)?;
    if args.json {
        return print_json(&result);
    }

    println!("Output key: {}", result.output_key);
    println!("Parity: {}", if result.parity == 1 { "odd" } else { "even" });
    println!("Address: {}", result.address);
    Ok(())
}
