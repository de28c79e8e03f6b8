//! secp256k1 key operations.

pub mod taproot;

use crate::error::{ArkgenError, Result};
use bip39::rand::rngs::OsRng;
use bip39::rand::RngCore;
use bitcoin::secp256k1::{All, Parity, PublicKey, Scalar, Secp256k1, SecretKey, XOnlyPublicKey};

/// Curve context. Build one and hand it to every component that does
/// curve arithmetic.
#[derive(Clone)]
pub struct Curve {
    secp: Secp256k1<All>,
}

impl Default for Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Curve(secp256k1)")
    }
}

impl Curve {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    /// Public key for a 32-byte scalar, 33 bytes compressed or 65 bytes
    /// uncompressed.
    pub fn public_key_from_private(&self, private_key: &[u8], compressed: bool) -> Result<Vec<u8>> {
        let sk = secret_key_from_slice(private_key)?;
        let pk = PublicKey::from_secret_key(&self.secp, &sk);
        Ok(if compressed {
            pk.serialize().to_vec()
        } else {
            pk.serialize_uncompressed().to_vec()
        })
    }

    pub fn scalar_multiply_base(&self, k: &[u8; 32]) -> Result<PublicKey> {
        let sk = secret_key_from_slice(k)?;
        Ok(PublicKey::from_secret_key(&self.secp, &sk))
    }

    /// `P + t·G`.
    pub fn tweak_add(&self, point: &PublicKey, tweak: &[u8; 32]) -> Result<PublicKey> {
        let scalar = Scalar::from_be_bytes(*tweak).map_err(|_| ArkgenError::InvalidScalar)?;
        point
            .add_exp_tweak(&self.secp, &scalar)
            .map_err(|_| ArkgenError::PointAtInfinity)
    }

    /// Fresh private key from the OS RNG.
    pub fn generate_private_key(&self) -> SecretKey {
        let mut rng = OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // reject zero and values >= n
            if let Ok(sk) = SecretKey::from_slice(&bytes) {
                return sk;
            }
        }
    }
}

pub fn secret_key_from_slice(bytes: &[u8]) -> Result<SecretKey> {
    if bytes.len() != 32 {
        return Err(ArkgenError::private_key(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    SecretKey::from_slice(bytes).map_err(|_| ArkgenError::InvalidScalar)
}

/// Strips the prefix byte of a 33 or 65 byte SEC1 encoding. 32 bytes pass
/// through unchanged.
pub fn x_only(point: &[u8]) -> Result<[u8; 32]> {
    let x = match point.len() {
        32 => point,
        33 | 65 => &point[1..33],
        n => return Err(ArkgenError::InvalidPubkeyLength(n)),
    };
    let mut out = [0u8; 32];
    out.copy_from_slice(x);
    Ok(out)
}

/// The even-y point with x-coordinate `x`.
pub fn lift_x(x: &[u8; 32]) -> Result<PublicKey> {
    let xonly = XOnlyPublicKey::from_slice(x).map_err(|_| ArkgenError::PointNotOnCurve)?;
    Ok(PublicKey::from_x_only_public_key(xonly, Parity::Even))
}

pub fn point_add(p: &PublicKey, q: &PublicKey) -> Result<PublicKey> {
    p.combine(q).map_err(|_| ArkgenError::PointAtInfinity)
}

/// Parses a user-supplied public key as x-only. Accepts 64 hex chars, or
/// 66 with a `02`/`03` prefix. Lengths are checked before anything touches
/// the curve.
pub fn parse_x_only_hex(s: &str) -> Result<XOnlyPublicKey> {
    let s = s.trim();
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ArkgenError::hex(format!("not a hex string: {:?}", s)));
    }
    if s.len() % 2 != 0 {
        return Err(ArkgenError::hex("odd number of hex digits"));
    }
    let bytes = hex::decode(s)?;
    let x = match bytes.len() {
        32 => &bytes[..],
        33 if bytes[0] == 0x02 || bytes[0] == 0x03 => &bytes[1..],
        33 => {
            return Err(ArkgenError::hex(format!(
                "unexpected key prefix {:02x}",
                bytes[0]
            )))
        }
        n => return Err(ArkgenError::InvalidPubkeyLength(n)),
    };
    XOnlyPublicKey::from_slice(x).map_err(|_| ArkgenError::PointNotOnCurve)
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn one() -> [u8; 32] {
        let mut k = [0u8; 32];
        k[31] = 1;
        k
    }

    #[test]
    fn test_public_key_from_private() {
        let curve = Curve::new();
        let compressed = curve.public_key_from_private(&one(), true).unwrap();
        assert_eq!(hex::encode(&compressed), format!("02{}", G_X));

        let uncompressed = curve.public_key_from_private(&one(), false).unwrap();
        assert_eq!(uncompressed.len(), 65);
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(hex::encode(&uncompressed[1..33]), G_X);
    }

    #[test]
    fn test_invalid_scalars() {
        let curve = Curve::new();
        assert!(matches!(
            curve.public_key_from_private(&[0u8; 32], true),
            Err(ArkgenError::InvalidScalar)
        ));
        // the group order itself
        let n = hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
            .unwrap();
        assert!(matches!(
            curve.public_key_from_private(&n, true),
            Err(ArkgenError::InvalidScalar)
        ));
        assert!(matches!(
            curve.public_key_from_private(&[1u8; 31], true),
            Err(ArkgenError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_x_only_lengths() {
        let curve = Curve::new();
        let compressed = curve.public_key_from_private(&one(), true).unwrap();
        let uncompressed = curve.public_key_from_private(&one(), false).unwrap();

        let a = x_only(&compressed).unwrap();
        assert_eq!(x_only(&uncompressed).unwrap(), a);
        assert_eq!(x_only(&a).unwrap(), a);
        assert!(matches!(
            x_only(&[0u8; 31]),
            Err(ArkgenError::InvalidPubkeyLength(31))
        ));
    }

    #[test]
    fn test_lift_x() {
        let mut x = [0u8; 32];
        x.copy_from_slice(&hex::decode(G_X).unwrap());
        let p = lift_x(&x).unwrap();
        assert_eq!(p.serialize()[0], 0x02);

        // 5^3 + 7 is not a square mod p
        let mut five = [0u8; 32];
        five[31] = 5;
        assert!(matches!(lift_x(&five), Err(ArkgenError::PointNotOnCurve)));
    }

    #[test]
    fn test_point_add() {
        let curve = Curve::new();
        let g = curve.scalar_multiply_base(&one()).unwrap();
        let mut two = [0u8; 32];
        two[31] = 2;
        let g2 = curve.scalar_multiply_base(&two).unwrap();
        assert_eq!(point_add(&g, &g).unwrap(), g2);
        assert_eq!(curve.tweak_add(&g, &one()).unwrap(), g2);

        let neg_g = g.negate(curve.secp());
        assert!(matches!(
            point_add(&g, &neg_g),
            Err(ArkgenError::PointAtInfinity)
        ));
    }

    #[test]
    fn test_parse_x_only_hex() {
        let server = "fa73c6e4876ffb2dfc961d763cca9abc73d4b88efcb8f5e7ff92dc55e9aa553d";
        let a = parse_x_only_hex(server).unwrap();
        let b = parse_x_only_hex(&format!("03{}", server)).unwrap();
        assert_eq!(a, b);

        assert!(matches!(
            parse_x_only_hex(&server[..62]),
            Err(ArkgenError::InvalidPubkeyLength(31))
        ));
        assert!(matches!(
            parse_x_only_hex(&format!("{}zz", &server[..62])),
            Err(ArkgenError::InvalidHexEncoding(_))
        ));
        assert!(matches!(
            parse_x_only_hex(&format!("04{}", server)),
            Err(ArkgenError::InvalidHexEncoding(_))
        ));
    }

    #[test]
    fn test_generate_private_key() {
        let curve = Curve::new();
        let a = curve.generate_private_key();
        let b = curve.generate_private_key();
        assert_ne!(a, b);
    }
}
