//! EdDSA over E-521 (`x^2 + y^2 = 1 + d*x^2*y^2`, `d = -376014`,
//! `p = 2^521 - 1`).
//!
//! Points are encoded as 66 little-endian bytes of `y` with the parity of
//! `x` in the top bit. Signatures are `R || S` (66 bytes each) and the
//! challenge is `SHAKE256(R || A || M)` read as 132 little-endian bytes.
//! Arithmetic uses projective coordinates with the unified addition law,
//! which is complete on this curve.

use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

use super::SignatureVerifier;
use crate::domain::crypto::DigestBytes;
use crate::infra::error::{VerifyError, VerifyResult};

/// Encoded point size.
pub const ED521_KEY_SIZE: usize = 66;
/// `R || S`.
pub const ED521_SIGNATURE_SIZE: usize = 2 * ED521_KEY_SIZE;
const CHALLENGE_SIZE: usize = 132;
const D_MAGNITUDE: u32 = 376_014;

const BASE_X: [u8; 66] = [
    0x00, 0x75, 0x2c, 0xb4, 0x5c, 0x48, 0x64, 0x8b, 0x18, 0x9d, 0xf9, //
    0x0c, 0xb2, 0x29, 0x6b, 0x28, 0x78, 0xa3, 0xbf, 0xd9, 0xf4, 0x2f, //
    0xc6, 0xc8, 0x18, 0xec, 0x8b, 0xf3, 0xc9, 0xc0, 0xc6, 0x20, 0x39, //
    0x13, 0xf6, 0xec, 0xc5, 0xcc, 0xc7, 0x24, 0x34, 0xb1, 0xae, 0x94, //
    0x9d, 0x56, 0x8f, 0xc9, 0x9c, 0x60, 0x59, 0xd0, 0xfb, 0x13, 0x36, //
    0x48, 0x38, 0xaa, 0x30, 0x2a, 0x94, 0x0a, 0x2f, 0x19, 0xba, 0x6c, //
];
const BASE_Y: u32 = 12;

const ORDER: [u8; 66] = [
    0x00, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, //
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, //
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, //
    0xfd, 0x15, 0xb6, 0xc6, 0x47, 0x46, 0xfc, 0x85, 0xf7, 0x36, 0xb8, //
    0xaf, 0x5e, 0x7e, 0xc5, 0x3f, 0x04, 0xfb, 0xd8, 0xc4, 0x56, 0x9a, //
    0x8f, 0x1f, 0x45, 0x40, 0xea, 0x24, 0x35, 0xf5, 0x18, 0x0d, 0x6b, //
];

struct CurveParams {
    p: BigUint,
    d: BigUint,
    order: BigUint,
    sqrt_exponent: BigUint,
    base: Point,
}

fn curve() -> &'static CurveParams {
    static PARAMS: OnceLock<CurveParams> = OnceLock::new();
    PARAMS.get_or_init(|| {
        let p = (BigUint::one() << 521u32) - BigUint::one();
        let d = &p - BigUint::from(D_MAGNITUDE);
        let sqrt_exponent = (&p + BigUint::one()) >> 2u32;
        CurveParams {
            base: Point {
                x: BigUint::from_bytes_be(&BASE_X),
                y: BigUint::from(BASE_Y),
                z: BigUint::one(),
            },
            order: BigUint::from_bytes_be(&ORDER),
            p,
            d,
            sqrt_exponent,
        }
    })
}

/// Projective point `(X : Y : Z)`, affine `(X/Z, Y/Z)`.
#[derive(Clone, Debug)]
struct Point {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl Point {
    fn identity() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::one(),
            z: BigUint::one(),
        }
    }

    fn add(&self, other: &Point) -> Point {
        let c = curve();
        let p = &c.p;
        let sub = |a: &BigUint, b: &BigUint| ((a + p) - b) % p;

        let a = (&self.z * &other.z) % p;
        let b = (&a * &a) % p;
        let cc = (&self.x * &other.x) % p;
        let dd = (&self.y * &other.y) % p;
        let e = (&c.d * &cc % p) * &dd % p;
        let f = sub(&b, &e);
        let g = (&b + &e) % p;
        let cross = ((&self.x + &self.y) * (&other.x + &other.y)) % p;
        let x3 = (&a * &f % p) * sub(&sub(&cross, &cc), &dd) % p;
        let y3 = (&a * &g % p) * sub(&dd, &cc) % p;
        let z3 = (&f * &g) % p;
        Point {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    fn mul(&self, scalar: &BigUint) -> Point {
        let mut result = Point::identity();
        for i in (0..scalar.bits()).rev() {
            result = result.add(&result);
            if scalar.bit(i) {
                result = result.add(self);
            }
        }
        result
    }

    fn same_as(&self, other: &Point) -> bool {
        let p = &curve().p;
        (&self.x * &other.z) % p == (&other.x * &self.z) % p
            && (&self.y * &other.z) % p == (&other.y * &self.z) % p
    }

    fn encode(&self) -> [u8; ED521_KEY_SIZE] {
        let p = &curve().p;
        let z_inv = self.z.modpow(&(p - BigUint::from(2u32)), p);
        let x = (&self.x * &z_inv) % p;
        let y = (&self.y * &z_inv) % p;

        let mut out = [0u8; ED521_KEY_SIZE];
        let le = y.to_bytes_le();
        out[..le.len()].copy_from_slice(&le);
        if x.bit(0) {
            out[ED521_KEY_SIZE - 1] |= 0x80;
        }
        out
    }

    fn decode(bytes: &[u8]) -> Option<Point> {
        let c = curve();
        let p = &c.p;
        if bytes.len() != ED521_KEY_SIZE {
            return None;
        }
        let sign = bytes[ED521_KEY_SIZE - 1] & 0x80 != 0;
        let mut y_bytes = bytes.to_vec();
        y_bytes[ED521_KEY_SIZE - 1] &= 0x7F;
        let y = BigUint::from_bytes_le(&y_bytes);
        if &y >= p {
            return None;
        }

        // x^2 = (1 - y^2) / (1 - d*y^2)
        let yy = (&y * &y) % p;
        let numerator = ((BigUint::one() + p) - &yy) % p;
        let denominator = ((BigUint::one() + p) - (&c.d * &yy % p)) % p;
        if denominator.is_zero() {
            return None;
        }
        let xx = numerator * denominator.modpow(&(p - BigUint::from(2u32)), p) % p;
        let mut x = xx.modpow(&c.sqrt_exponent, p);
        if (&x * &x) % p != xx {
            return None;
        }
        if x.is_zero() && sign {
            return None;
        }
        if x.bit(0) != sign {
            x = p - x;
        }
        Some(Point {
            x,
            y,
            z: BigUint::one(),
        })
    }
}

fn shake256_scalar(parts: &[&[u8]]) -> BigUint {
    let mut hasher = Shake256::default();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; CHALLENGE_SIZE];
    hasher.finalize_xof().read(&mut output);
    BigUint::from_bytes_le(&output) % &curve().order
}

fn scalar_bytes(scalar: &BigUint) -> [u8; ED521_KEY_SIZE] {
    let mut out = [0u8; ED521_KEY_SIZE];
    let le = scalar.to_bytes_le();
    out[..le.len()].copy_from_slice(&le);
    out
}

pub struct Ed521Verifier;

impl SignatureVerifier for Ed521Verifier {
    fn verify(
        &self,
        digest: &DigestBytes,
        signature: &[u8],
        public_key: &[u8],
    ) -> VerifyResult<bool> {
        let a = Point::decode(public_key).ok_or_else(|| {
            VerifyError::InvalidKeyMaterial(format!(
                "{} byte Ed521 public key does not decode to a curve point",
                public_key.len()
            ))
        })?;

        if signature.len() != ED521_SIGNATURE_SIZE {
            log::debug!(
                "Ed521 signature has {} bytes, expected {ED521_SIGNATURE_SIZE}",
                signature.len()
            );
            return Ok(false);
        }
        let (encoded_r, encoded_s) = signature.split_at(ED521_KEY_SIZE);
        let Some(r) = Point::decode(encoded_r) else {
            return Ok(false);
        };
        let s = BigUint::from_bytes_le(encoded_s);
        if s >= curve().order {
            return Ok(false);
        }

        let k = shake256_scalar(&[encoded_r, &a.encode(), digest.as_slice()]);
        let lhs = curve().base.mul(&s);
        let rhs = r.add(&a.mul(&k));
        Ok(lhs.same_as(&rhs))
    }
}

/// Ed521 signing key, used to produce test vectors and fixtures.
///
/// Nonces are derived deterministically from the secret scalar and the
/// message.
#[derive(Clone)]
pub struct Ed521SigningKey {
    secret: BigUint,
    public: [u8; ED521_KEY_SIZE],
}

impl Ed521SigningKey {
    /// Build a key from a little-endian secret scalar (reduced modulo the
    /// group order; zero is rejected).
    pub fn from_scalar_bytes(bytes: &[u8]) -> VerifyResult<Self> {
        let secret = BigUint::from_bytes_le(bytes) % &curve().order;
        if secret.is_zero() {
            return Err(VerifyError::InvalidKeyMaterial(
                "Ed521 secret scalar is zero".to_string(),
            ));
        }
        let public = curve().base.mul(&secret).encode();
        Ok(Self { secret, public })
    }

    /// Encoded public point.
    #[must_use]
    pub fn public_key(&self) -> [u8; ED521_KEY_SIZE] {
        self.public
    }

    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let order = &curve().order;
        let nonce = shake256_scalar(&[&scalar_bytes(&self.secret), message]);
        let encoded_r = curve().base.mul(&nonce).encode();
        let k = shake256_scalar(&[&encoded_r, &self.public, message]);
        let s = (nonce + k * &self.secret) % order;

        let mut signature = encoded_r.to_vec();
        signature.extend_from_slice(&scalar_bytes(&s));
        signature
    }
}

impl std::fmt::Debug for Ed521SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed521SigningKey(public={})", hex::encode(self.public))
    }
}
