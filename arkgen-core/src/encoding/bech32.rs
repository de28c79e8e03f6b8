//! Bech32 (BIP173) and Bech32m (BIP350) encoding.
//!
//! Two layers live here. The raw layer ([`encode_raw`], [`decode_raw`])
//! works on 5-bit groups and knows nothing about witness programs. The
//! segwit layer ([`encode`], [`decode`]) adds the witness version symbol,
//! the BIP173/BIP350 program rules and the 90 character cap. Payload
//! formats that carry no witness version (Ark addresses, NIP-19 keys) go
//! through [`encode_payload`] / [`decode_payload`] with a caller-chosen
//! length cap.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATORS: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
const BECH32_CONST: u32 = 1;
const BECH32M_CONST: u32 = 0x2bc830a3;
const CHECKSUM_LENGTH: usize = 6;

/// Maximum total length of a segwit address.
pub const SEGWIT_MAX_LENGTH: usize = 90;

/// Reverse lookup of [`CHARSET`], indexed by ASCII byte. `-1` marks bytes
/// outside the alphabet.
const CHARSET_REV: [i8; 128] = {
    let mut table = [-1i8; 128];
    let mut i = 0;
    while i < CHARSET.len() {
        table[CHARSET[i] as usize] = i as i8;
        i += 1;
    }
    table
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Bech32Error {
    #[error("checksum mismatch")]
    Checksum,

    #[error("invalid character {0:?}")]
    Charset(char),

    #[error("separator missing or misplaced")]
    Format,

    #[error("string mixes upper and lower case")]
    MixedCase,

    #[error("invalid padding in data part")]
    InvalidPadding,

    #[error("invalid length {0}")]
    InvalidLength(usize),

    #[error("invalid human-readable part")]
    InvalidHrp,

    #[error("unexpected human-readable part {0:?}")]
    UnknownHrp(String),

    #[error("invalid witness version {0}")]
    InvalidWitnessVersion(u8),

    #[error("invalid witness program length {0}")]
    InvalidProgramLength(usize),

    #[error("value {0} does not fit in a 5-bit group")]
    InvalidValue(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Bech32,
    Bech32m,
}

impl Variant {
    pub const fn constant(self) -> u32 {
        match self {
            Variant::Bech32 => BECH32_CONST,
            Variant::Bech32m => BECH32M_CONST,
        }
    }

    fn from_constant(c: u32) -> Option<Self> {
        match c {
            BECH32_CONST => Some(Variant::Bech32),
            BECH32M_CONST => Some(Variant::Bech32m),
            _ => None,
        }
    }

    /// BIP350: version 0 programs use Bech32, everything newer Bech32m.
    pub const fn for_witness_version(version: u8) -> Self {
        if version == 0 {
            Variant::Bech32
        } else {
            Variant::Bech32m
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Bech32 => f.write_str("bech32"),
            Variant::Bech32m => f.write_str("bech32m"),
        }
    }
}

/// Result of [`decode_raw`]: lowercase HRP, 5-bit data without checksum,
/// and the variant whose constant matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub hrp: String,
    pub data: Vec<u8>,
    pub variant: Variant,
}

/// A decoded segwit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessProgram {
    pub hrp: String,
    pub version: u8,
    pub program: Vec<u8>,
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for v in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ u32::from(v);
        for (i, g) in GENERATORS.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &[u8]) -> impl Iterator<Item = u8> + '_ {
    hrp.iter()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.iter().map(|b| b & 0x1f))
}

fn create_checksum(hrp: &[u8], data: &[u8], variant: Variant) -> [u8; CHECKSUM_LENGTH] {
    let values = hrp_expand(hrp)
        .chain(data.iter().copied())
        .chain([0u8; CHECKSUM_LENGTH]);
    let m = polymod(values) ^ variant.constant();

    let mut checksum = [0u8; CHECKSUM_LENGTH];
    for (i, c) in checksum.iter_mut().enumerate() {
        *c = ((m >> (5 * (5 - i))) & 0x1f) as u8;
    }
    checksum
}

/// 1 to 83 printable ASCII characters.
pub fn check_hrp(hrp: &str) -> Result<(), Bech32Error> {
    if hrp.is_empty() || hrp.len() > 83 {
        return Err(Bech32Error::InvalidHrp);
    }
    if hrp.bytes().any(|b| !(33..=126).contains(&b)) {
        return Err(Bech32Error::InvalidHrp);
    }
    Ok(())
}

/// Regroups `data` from `from`-bit to `to`-bit values, MSB first.
///
/// With `pad` the trailing partial group is zero-filled; without it a
/// partial group is only accepted if it is shorter than `from` bits and
/// all zero.
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, Bech32Error> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let maxv: u32 = (1 << to) - 1;
    let mut ret = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        if u32::from(value) >> from != 0 {
            return Err(Bech32Error::InvalidValue(value));
        }
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            ret.push(((acc >> bits) & maxv) as u8);
        }
        acc &= (1 << bits) - 1;
    }

    if pad {
        if bits > 0 {
            ret.push(((acc << (to - bits)) & maxv) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & maxv) != 0 {
        return Err(Bech32Error::InvalidPadding);
    }

    Ok(ret)
}

/// Encodes 5-bit `data` under `hrp`. The HRP is lowercased.
pub fn encode_raw(hrp: &str, data: &[u8], variant: Variant) -> Result<String, Bech32Error> {
    check_hrp(hrp)?;
    if let Some(&bad) = data.iter().find(|&&d| d > 31) {
        return Err(Bech32Error::InvalidValue(bad));
    }

    let hrp = hrp.to_ascii_lowercase();
    let checksum = create_checksum(hrp.as_bytes(), data, variant);

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + CHECKSUM_LENGTH);
    out.push_str(&hrp);
    out.push('1');
    for &d in data.iter().chain(checksum.iter()) {
        out.push(CHARSET[d as usize] as char);
    }
    Ok(out)
}

/// Decodes a Bech32 or Bech32m string, reporting which constant matched.
///
/// `max_len` caps the total string length; `None` disables the cap.
pub fn decode_raw(s: &str, max_len: Option<usize>) -> Result<Decoded, Bech32Error> {
    if let Some(max) = max_len {
        if s.len() > max {
            return Err(Bech32Error::InvalidLength(s.len()));
        }
    }

    let has_lower = s.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = s.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(Bech32Error::MixedCase);
    }
    let s = s.to_ascii_lowercase();

    let pos = s.rfind('1').ok_or(Bech32Error::Format)?;
    if pos < 1 || pos + 1 + CHECKSUM_LENGTH > s.len() {
        return Err(Bech32Error::Format);
    }

    let (hrp, rest) = s.split_at(pos);
    check_hrp(hrp)?;

    let mut data = Vec::with_capacity(rest.len() - 1);
    for c in rest[1..].chars() {
        let v = if c.is_ascii() {
            CHARSET_REV[c as usize]
        } else {
            -1
        };
        if v < 0 {
            return Err(Bech32Error::Charset(c));
        }
        data.push(v as u8);
    }

    let residue = polymod(hrp_expand(hrp.as_bytes()).chain(data.iter().copied()));
    let variant = Variant::from_constant(residue).ok_or(Bech32Error::Checksum)?;

    data.truncate(data.len() - CHECKSUM_LENGTH);
    Ok(Decoded {
        hrp: hrp.to_string(),
        data,
        variant,
    })
}

/// Encodes an 8-bit payload that carries no witness version symbol.
pub fn encode_payload(
    hrp: &str,
    payload: &[u8],
    variant: Variant,
    max_len: Option<usize>,
) -> Result<String, Bech32Error> {
    let data = convert_bits(payload, 8, 5, true)?;
    let encoded = encode_raw(hrp, &data, variant)?;
    if let Some(max) = max_len {
        if encoded.len() > max {
            return Err(Bech32Error::InvalidLength(encoded.len()));
        }
    }
    Ok(encoded)
}

/// Decodes an 8-bit payload encoded with [`encode_payload`]. A string
/// whose checksum matches the other variant fails with
/// [`Bech32Error::Checksum`].
pub fn decode_payload(
    s: &str,
    variant: Variant,
    max_len: Option<usize>,
) -> Result<(String, Vec<u8>), Bech32Error> {
    let decoded = decode_raw(s, max_len)?;
    if decoded.variant != variant {
        return Err(Bech32Error::Checksum);
    }
    let payload = convert_bits(&decoded.data, 5, 8, false)?;
    Ok((decoded.hrp, payload))
}

/// Encodes a segwit address: witness version symbol followed by the
/// regrouped program.
pub fn encode(
    hrp: &str,
    witness_version: u8,
    program: &[u8],
    variant: Variant,
) -> Result<String, Bech32Error> {
    check_witness_program(witness_version, program)?;

    let mut data = Vec::with_capacity(1 + program.len() * 8 / 5 + 1);
    data.push(witness_version);
    data.extend(convert_bits(program, 8, 5, true)?);

    let encoded = encode_raw(hrp, &data, variant)?;
    if encoded.len() > SEGWIT_MAX_LENGTH {
        return Err(Bech32Error::InvalidLength(encoded.len()));
    }
    Ok(encoded)
}

/// Decodes a segwit address, requiring the checksum constant of `variant`.
pub fn decode(address: &str, variant: Variant) -> Result<WitnessProgram, Bech32Error> {
    let decoded = decode_raw(address, Some(SEGWIT_MAX_LENGTH))?;
    if decoded.variant != variant {
        return Err(Bech32Error::Checksum);
    }

    let (&version, rest) = decoded
        .data
        .split_first()
        .ok_or(Bech32Error::InvalidProgramLength(0))?;
    let program = convert_bits(rest, 5, 8, false)?;
    check_witness_program(version, &program)?;

    Ok(WitnessProgram {
        hrp: decoded.hrp,
        version,
        program,
    })
}

/// Decodes a segwit address, picking the variant its witness version
/// demands.
pub fn decode_segwit(address: &str) -> Result<WitnessProgram, Bech32Error> {
    let decoded = decode_raw(address, Some(SEGWIT_MAX_LENGTH))?;
    let version = *decoded
        .data
        .first()
        .ok_or(Bech32Error::InvalidProgramLength(0))?;
    if version > 16 {
        return Err(Bech32Error::InvalidWitnessVersion(version));
    }
    decode(address, Variant::for_witness_version(version))
}

fn check_witness_program(version: u8, program: &[u8]) -> Result<(), Bech32Error> {
    if version > 16 {
        return Err(Bech32Error::InvalidWitnessVersion(version));
    }
    if !(2..=40).contains(&program.len()) {
        return Err(Bech32Error::InvalidProgramLength(program.len()));
    }
    if version == 0 && program.len() != 20 && program.len() != 32 {
        return Err(Bech32Error::InvalidProgramLength(program.len()));
    }
    Ok(())
}
