//! Ark protocol: VTXO scripts, off-chain addresses and server parameters.

pub mod address;
pub mod server;
pub mod vtxo;

pub use address::{ark_hrp, ArkAddress};
pub use server::{RestServerInfoProvider, ServerInfo, ServerInfoCache, ServerInfoProvider};
pub use vtxo::{CsvTimelock, TimelockUnit, VtxoScript};

use crate::crypto::taproot::TweakedKey;
use crate::crypto::Curve;
use crate::error::{ArkgenError, Result};
use bitcoin::secp256k1::XOnlyPublicKey;

/// Builds the default VTXO for `user` under `server` and wraps its output
/// key in an address.
pub fn build_address(
    curve: &Curve,
    user: XOnlyPublicKey,
    server: XOnlyPublicKey,
    exit_delay: CsvTimelock,
    hrp: &str,
) -> Result<(ArkAddress, TweakedKey)> {
    let script = VtxoScript::new(user, server, exit_delay);
    let tweaked = script.output_key(curve)?;
    let vtxo_key = XOnlyPublicKey::from_slice(&tweaked.output_key)
        .map_err(|_| ArkgenError::PointNotOnCurve)?;
    Ok((ArkAddress::new(hrp, server, vtxo_key)?, tweaked))
}
