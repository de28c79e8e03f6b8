//! The default VTXO taproot: a collaborative user+server leaf and a
//! unilateral exit leaf behind a relative timelock.

use crate::crypto::taproot::{
    tap_branch_hash, tap_leaf_hash, tweak_public_key, TweakedKey, TAPSCRIPT_LEAF_VERSION,
    UNSPENDABLE_KEY,
};
use crate::crypto::Curve;
use crate::error::{ArkgenError, Result};
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_CHECKSIGVERIFY, OP_CSV, OP_DROP};
use bitcoin::script::Builder;
use bitcoin::secp256k1::XOnlyPublicKey;
use bitcoin::{ScriptBuf, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit delays below this are block counts, at or above it seconds.
pub const SECONDS_THRESHOLD: u64 = 512;

const MAX_BLOCKS: u64 = 0xffff;
const MAX_SECONDS: u64 = 0xffff * 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelockUnit {
    Blocks,
    Seconds,
}

/// BIP68 relative timelock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CsvTimelock {
    pub value: u64,
    pub unit: TimelockUnit,
}

impl CsvTimelock {
    pub fn blocks(value: u64) -> Result<Self> {
        if value == 0 || value > MAX_BLOCKS {
            return Err(ArkgenError::InvalidTimelock(format!(
                "{} blocks is outside 1..={}",
                value, MAX_BLOCKS
            )));
        }
        Ok(Self {
            value,
            unit: TimelockUnit::Blocks,
        })
    }

    /// BIP68 time locks have 512 second granularity.
    pub fn seconds(value: u64) -> Result<Self> {
        if value == 0 || value > MAX_SECONDS || value % 512 != 0 {
            return Err(ArkgenError::InvalidTimelock(format!(
                "{} seconds must be a positive multiple of 512 up to {}",
                value, MAX_SECONDS
            )));
        }
        Ok(Self {
            value,
            unit: TimelockUnit::Seconds,
        })
    }

    /// Interprets a server-advertised exit delay.
    pub fn from_exit_delay(delay: u64) -> Result<Self> {
        if delay < SECONDS_THRESHOLD {
            Self::blocks(delay)
        } else {
            Self::seconds(delay)
        }
    }

    pub fn sequence(&self) -> Sequence {
        // both constructors bound the value to u16 range
        match self.unit {
            TimelockUnit::Blocks => Sequence::from_height(self.value as u16),
            TimelockUnit::Seconds => Sequence::from_512_second_intervals((self.value / 512) as u16),
        }
    }
}

impl fmt::Display for CsvTimelock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            TimelockUnit::Blocks => write!(f, "{} blocks", self.value),
            TimelockUnit::Seconds => write!(f, "{} seconds", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VtxoScript {
    user: XOnlyPublicKey,
    server: XOnlyPublicKey,
    exit_delay: CsvTimelock,
}

impl VtxoScript {
    pub fn new(user: XOnlyPublicKey, server: XOnlyPublicKey, exit_delay: CsvTimelock) -> Self {
        Self {
            user,
            server,
            exit_delay,
        }
    }

    pub fn user(&self) -> &XOnlyPublicKey {
        &self.user
    }

    pub fn server(&self) -> &XOnlyPublicKey {
        &self.server
    }

    pub fn exit_delay(&self) -> CsvTimelock {
        self.exit_delay
    }

    /// `<user> CHECKSIGVERIFY <server> CHECKSIG`
    pub fn forfeit_script(&self) -> ScriptBuf {
        Builder::new()
            .push_x_only_key(&self.user)
            .push_opcode(OP_CHECKSIGVERIFY)
            .push_x_only_key(&self.server)
            .push_opcode(OP_CHECKSIG)
            .into_script()
    }

    /// `<sequence> CHECKSEQUENCEVERIFY DROP <user> CHECKSIG`
    pub fn exit_script(&self) -> ScriptBuf {
        Builder::new()
            .push_int(i64::from(self.exit_delay.sequence().to_consensus_u32()))
            .push_opcode(OP_CSV)
            .push_opcode(OP_DROP)
            .push_x_only_key(&self.user)
            .push_opcode(OP_CHECKSIG)
            .into_script()
    }

    pub fn merkle_root(&self) -> [u8; 32] {
        let forfeit = tap_leaf_hash(self.forfeit_script().as_bytes(), TAPSCRIPT_LEAF_VERSION);
        let exit = tap_leaf_hash(self.exit_script().as_bytes(), TAPSCRIPT_LEAF_VERSION);
        tap_branch_hash(&forfeit, &exit)
    }

    /// Output key of the VTXO. The internal key is the unspendable NUMS
    /// point, so the output can only be spent through one of the leaves.
    pub fn output_key(&self, curve: &Curve) -> Result<TweakedKey> {
        let root = self.merkle_root();
        let tweaked = tweak_public_key(curve, &UNSPENDABLE_KEY, Some(&root))?;
        tracing::debug!(
            merkle_root = %hex::encode(root),
            vtxo_key = %hex::encode(tweaked.output_key),
            exit_delay = %self.exit_delay,
            "Built VTXO taproot"
        );
        Ok(tweaked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::taproot::TaprootBuilder;

    const USER: &str = "123958369d3740a6cd7da98877bb6d4bdb00199aad81b7915de663bec2c617a2";
    const SERVER: &str = "fa73c6e4876ffb2dfc961d763cca9abc73d4b88efcb8f5e7ff92dc55e9aa553d";

    fn xonly(s: &str) -> XOnlyPublicKey {
        XOnlyPublicKey::from_slice(&hex::decode(s).unwrap()).unwrap()
    }

    fn script(delay: u64) -> VtxoScript {
        VtxoScript::new(
            xonly(USER),
            xonly(SERVER),
            CsvTimelock::from_exit_delay(delay).unwrap(),
        )
    }

    #[test]
    fn test_leaf_scripts() {
        let vtxo = script(172544);
        assert_eq!(
            hex::encode(vtxo.forfeit_script().as_bytes()),
            format!("20{}ad20{}ac", USER, SERVER)
        );
        assert_eq!(
            hex::encode(vtxo.exit_script().as_bytes()),
            format!("03510140b27520{}ac", USER)
        );
    }

    #[test]
    fn test_output_key_vector() {
        let curve = Curve::new();
        let vtxo = script(172544);
        assert_eq!(
            hex::encode(vtxo.merkle_root()),
            "a805bebf4ffcef155943e5b35960ff2a3f36fed27e9a6abe370bd8fd06b69566"
        );
        let key = vtxo.output_key(&curve).unwrap();
        assert_eq!(
            hex::encode(key.output_key),
            "9f34725db0007bd11717b540e77032ae30622a0b681eed2597303e24b2178948"
        );
        assert!(!key.is_odd());
    }

    #[test]
    fn test_block_delay_vector() {
        let curve = Curve::new();
        let vtxo = script(144);
        assert_eq!(vtxo.exit_delay().unit, TimelockUnit::Blocks);
        assert_eq!(
            hex::encode(vtxo.output_key(&curve).unwrap().output_key),
            "5742c40127d84d2e49312dfcbd5797d0391120dbd7aa2451a5f821e7968dfb7b"
        );
    }

    #[test]
    fn test_matches_taproot_builder() {
        let curve = Curve::new();
        for delay in [144, 512, 172544] {
            let vtxo = script(delay);
            let nums = XOnlyPublicKey::from_slice(&UNSPENDABLE_KEY).unwrap();
            let spend_info = TaprootBuilder::new()
                .add_leaf(1, vtxo.exit_script())
                .unwrap()
                .add_leaf(1, vtxo.forfeit_script())
                .unwrap()
                .finalize(curve.secp(), nums)
                .unwrap();

            let ours = vtxo.output_key(&curve).unwrap();
            assert_eq!(ours.output_key, spend_info.output_key().to_inner().serialize());
            assert_eq!(ours.parity, spend_info.output_key_parity());
        }
    }

    #[test]
    fn test_sequence_encoding() {
        assert_eq!(
            CsvTimelock::seconds(172544).unwrap().sequence().to_consensus_u32(),
            0x00400151
        );
        assert_eq!(
            CsvTimelock::blocks(144).unwrap().sequence().to_consensus_u32(),
            144
        );
    }

    #[test]
    fn test_timelock_bounds() {
        assert!(CsvTimelock::blocks(0).is_err());
        assert!(CsvTimelock::blocks(0x10000).is_err());
        assert!(CsvTimelock::seconds(1000).is_err());
        assert!(CsvTimelock::seconds(MAX_SECONDS + 512).is_err());
        assert!(CsvTimelock::seconds(MAX_SECONDS).is_ok());

        assert_eq!(
            CsvTimelock::from_exit_delay(511).unwrap().unit,
            TimelockUnit::Blocks
        );
        assert_eq!(
            CsvTimelock::from_exit_delay(512).unwrap().unit,
            TimelockUnit::Seconds
        );
        assert!(matches!(
            CsvTimelock::from_exit_delay(600),
            Err(ArkgenError::InvalidTimelock(_))
        ));
    }
}
