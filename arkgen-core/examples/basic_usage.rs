use arkgen_core::{AddressGenerator, GeneratorConfig, KeySource, ScriptType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let generator = AddressGenerator::new(GeneratorConfig::new("mutinynet"))?;

    let mnemonic = arkgen_core::hd::generate_mnemonic(12)?;
    println!("Mnemonic: {}", mnemonic);

    let source = KeySource::mnemonic(&mnemonic.to_string(), "")?;
    let rows = generator.derive_addresses(&source, "mutinynet", ScriptType::P2tr, 0, 0, 0, 3)?;

    println!("\nTaproot addresses:");
    for row in &rows {
        println!("{}  {}", row.path, row.address);
    }

    // x-only key of the first row doubles as the Ark user key
    let user = &rows[0].pubkey[2..];
    let ark = generator.generate_address_manual(
        user,
        "fa73c6e4876ffb2dfc961d763cca9abc73d4b88efcb8f5e7ff92dc55e9aa553d",
        Some(512),
        "mutinynet",
    )?;

    println!("\nArk address: {}", ark.address);
    println!("VTXO key: {}", ark.vtxo_key);

    let decoded = generator.decode_address(&ark.address)?;
    println!("Decoded server key: {}", decoded.server_pub_key);

    Ok(())
}
