pub mod ark;
pub mod config;
pub mod decode;
pub mod derive;
pub mod generate;
pub mod tweak;

pub use ark::{handle_ark_command, ArkCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use decode::{handle_decode_command, DecodeArgs};
pub use derive::{handle_derive_command, DeriveArgs};
pub use generate::{handle_generate_command, GenerateCommands};
pub use tweak::{handle_tweak_command, TweakArgs};

use arkgen_core::Result;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
