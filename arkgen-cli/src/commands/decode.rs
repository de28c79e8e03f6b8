use super::print_json;
use arkgen_core::{AddressGenerator, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};

#[derive(Args)]
pub struct DecodeArgs {
    /// Native segwit address (bc1q…, bc1p…, tb1…)
    pub address: String,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_decode_command(
    args: DecodeArgs,
    generator: &AddressGenerator,
    network: &str,
) -> Result<()> {
    let decoded = generator.decode_onchain_address(&args.address, network)?;
    if args.json {
        return print_json(&decoded);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Network".to_string(), decoded.network]);
    table.add_row(vec!["HRP".to_string(), decoded.hrp]);
    table.add_row(vec![
        "Witness version".to_string(),
        decoded.witness_version.to_string(),
    ]);
    table.add_row(vec!["Encoding".to_string(), decoded.variant.to_string()]);
    table.add_row(vec![
        "Type".to_string(),
        decoded
            .script_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    ]);
    table.add_row(vec!["Program".to_string(), decoded.program]);
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arkgen_core::{ArkgenError, GeneratorConfig};
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: DecodeArgs,
    }

    const P2WPKH: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";

    #[test]
    fn test_decode_command() {
        let generator = AddressGenerator::new(GeneratorConfig::new("bitcoin")).unwrap();
        let cli = TestCli::try_parse_from(["arkgen", P2WPKH, "--json"]).unwrap();
        assert!(cli.args.json);
        handle_decode_command(cli.args, &generator, "bitcoin").unwrap();

        let cli = TestCli::try_parse_from(["arkgen", P2WPKH]).unwrap();
        assert!(matches!(
            handle_decode_command(cli.args, &generator, "testnet"),
            Err(ArkgenError::Bech32(_))
        ));
    }
}
