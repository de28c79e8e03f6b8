use crate::error::{ArkgenError, Result};
use bip39::{Language, Mnemonic};

pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Parses an English mnemonic. Case and runs of whitespace are
/// normalized first.
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic> {
    let normalized = words
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Mnemonic::parse_in_normalized(Language::English, &normalized)?)
}

/// BIP39 seed: PBKDF2-HMAC-SHA512, 2048 rounds, salt "mnemonic" + passphrase.
pub fn seed_from_mnemonic(words: &str, passphrase: &str) -> Result<[u8; 64]> {
    let mnemonic = parse_mnemonic(words)?;
    tracing::debug!(words = mnemonic.word_count(), "Derived seed from mnemonic");
    Ok(mnemonic.to_seed(passphrase))
}

pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic> {
    if !VALID_WORD_COUNTS.contains(&word_count) {
        return Err(ArkgenError::InvalidMnemonic(format!(
            "word count must be one of {:?}, got {}",
            VALID_WORD_COUNTS, word_count
        )));
    }
    let mut rng = bip39::rand::thread_rng();
    Mnemonic::generate_in_with(&mut rng, Language::English, word_count)
        .map_err(|e| ArkgenError::internal(format!("Failed to generate mnemonic: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_seed_with_passphrase() {
        let seed = seed_from_mnemonic(ABANDON, "TREZOR").unwrap();
        assert_eq!(
            hex::encode(seed),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn test_whitespace_and_case_normalized() {
        let messy = format!("  {}  ", ABANDON.to_uppercase().replace(' ', " \t\n "));
        assert_eq!(
            seed_from_mnemonic(&messy, "").unwrap(),
            seed_from_mnemonic(ABANDON, "").unwrap()
        );
    }

    #[test]
    fn test_invalid_mnemonics() {
        // bad checksum
        let bad = ABANDON.replace("about", "abandon");
        assert!(matches!(
            seed_from_mnemonic(&bad, ""),
            Err(ArkgenError::InvalidMnemonic(_))
        ));
        // unknown word
        let bad = ABANDON.replace("about", "bitcoinz");
        assert!(matches!(
            seed_from_mnemonic(&bad, ""),
            Err(ArkgenError::InvalidMnemonic(_))
        ));
        assert!(matches!(
            seed_from_mnemonic("abandon about", ""),
            Err(ArkgenError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_generate_mnemonic() {
        for count in VALID_WORD_COUNTS {
            let m = generate_mnemonic(count).unwrap();
            assert_eq!(m.word_count(), count);
            assert!(parse_mnemonic(&m.to_string()).is_ok());
        }
        assert!(generate_mnemonic(13).is_err());
    }
}
