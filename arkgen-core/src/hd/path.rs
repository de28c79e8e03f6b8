use crate::error::{ArkgenError, Result};
use std::fmt;
use std::str::FromStr;

pub const HARDENED_OFFSET: u32 = 1 << 31;

/// One step of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(ArkgenError::InvalidChildIndex(index));
        }
        Ok(Self {
            index,
            hardened: false,
        })
    }

    pub fn hardened(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(ArkgenError::InvalidChildIndex(index));
        }
        Ok(Self {
            index,
            hardened: true,
        })
    }

    /// From the serialized form, where bit 31 marks hardened.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED_OFFSET,
            hardened: raw & HARDENED_OFFSET != 0,
        }
    }

    pub fn raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = ArkgenError;

    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix(&['\'', 'h', 'H'][..]) {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ArkgenError::path(format!("invalid component {:?}", s)));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| ArkgenError::path(format!("index out of range in {:?}", s)))?;
        if index >= HARDENED_OFFSET {
            return Err(ArkgenError::path(format!("index out of range in {:?}", s)));
        }
        Ok(Self { index, hardened })
    }
}

/// A BIP32 derivation path. The empty path is the master key itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    pub fn master() -> Self {
        Self(Vec::new())
    }

    /// `m/purpose'/coin'/account'/change/index`
    pub fn bip44_style(
        purpose: u32,
        coin_type: u32,
        account: u32,
        change: u32,
        index: u32,
    ) -> Result<Self> {
        Ok(Self(vec![
            ChildNumber::hardened(purpose)?,
            ChildNumber::hardened(coin_type)?,
            ChildNumber::hardened(account)?,
            ChildNumber::normal(change)?,
            ChildNumber::normal(index)?,
        ]))
    }

    pub fn child(&self, child: ChildNumber) -> Self {
        let mut steps = self.0.clone();
        steps.push(child);
        Self(steps)
    }

    pub fn is_master(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChildNumber> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a ChildNumber;
    type IntoIter = std::slice::Iter<'a, ChildNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(steps: Vec<ChildNumber>) -> Self {
        Self(steps)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for step in &self.0 {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = ArkgenError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut parts = s.split('/').peekable();

        if matches!(parts.peek(), Some(&"m") | Some(&"M")) {
            parts.next();
        }
        // "" and "m" are both the master path
        if s.is_empty() {
            return Ok(Self::master());
        }

        let steps = parts
            .map(|part| part.parse::<ChildNumber>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers() {
        let a: DerivationPath = "m/86'/0'/0'/0/0".parse().unwrap();
        let b: DerivationPath = "m/86h/0H/0'/0/0".parse().unwrap();
        let c: DerivationPath = "86'/0'/0'/0/0".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.len(), 5);
        assert_eq!(a.to_string(), "m/86'/0'/0'/0/0");
        assert_eq!(a, DerivationPath::bip44_style(86, 0, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_master_path() {
        assert!("m".parse::<DerivationPath>().unwrap().is_master());
        assert!("".parse::<DerivationPath>().unwrap().is_master());
        assert_eq!(DerivationPath::master().to_string(), "m");
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["m/", "m//0", "m/x", "m/0''", "m/-1", "m/2147483648", "m/0/m"] {
            assert!(
                matches!(bad.parse::<DerivationPath>(), Err(ArkgenError::InvalidPath(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_child_number_raw() {
        let h = ChildNumber::hardened(44).unwrap();
        assert_eq!(h.raw(), 0x8000002c);
        assert_eq!(ChildNumber::from_raw(0x8000002c), h);
        assert!(ChildNumber::normal(HARDENED_OFFSET).is_err());
    }
}
