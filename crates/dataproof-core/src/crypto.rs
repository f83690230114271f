//! Signature engine: Ed25519 and P-256 key material with strong types.
//!
//! Signing always operates on the fixed-length hash data built by a
//! cryptosuite, never on raw document bytes.

use ecdsa::signature::{Signer as _, Verifier as _};
use ed25519_dalek::{Signature as DalekSignature, SigningKey, VerifyingKey};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::multibase::{self, Base};

/// Multicodec header for an Ed25519 public key (`0xed` varint).
pub const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Multicodec header for a compressed P-256 public key (`0x1200` varint).
pub const P256_PUB_MULTICODEC: [u8; 2] = [0x80, 0x24];

/// Key algorithms understood by the signature engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// Ed25519 (pure EdDSA).
    Ed25519,
    /// ECDSA over NIST P-256 with SHA-256.
    P256,
}

impl KeyAlgorithm {
    /// Length of the raw public key in bytes.
    pub const fn public_key_len(self) -> usize {
        match self {
            Self::Ed25519 => 32,
            Self::P256 => 33,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519",
            Self::P256 => "P-256",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A public verification key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PublicKey {
    Ed25519([u8; 32]),
    /// SEC1 compressed point.
    P256([u8; 33]),
}

impl PublicKey {
    /// Construct from raw bytes.
    ///
    /// A wrong length is a caller contract violation and is reported as
    /// [`CoreError::InvalidKeyLength`]. Whether the bytes describe a valid
    /// curve point is only checked at verification time.
    pub fn from_bytes(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self> {
        let expected = algorithm.public_key_len();
        if bytes.len() != expected {
            return Err(CoreError::InvalidKeyLength {
                algorithm: algorithm.name(),
                expected,
                actual: bytes.len(),
            });
        }
        Ok(match algorithm {
            KeyAlgorithm::Ed25519 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(bytes);
                Self::Ed25519(arr)
            }
            KeyAlgorithm::P256 => {
                let mut arr = [0u8; 33];
                arr.copy_from_slice(bytes);
                Self::P256(arr)
            }
        })
    }

    /// The key algorithm.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Ed25519(_) => KeyAlgorithm::Ed25519,
            Self::P256(_) => KeyAlgorithm::P256,
        }
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(b) => b,
            Self::P256(b) => b,
        }
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Verify a signature over a message.
    ///
    /// Returns `false` for a bad signature, a malformed signature encoding, or
    /// a key that is not a valid curve point. Never panics.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Ed25519(bytes) => {
                let Ok(verifying_key) = VerifyingKey::from_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = DalekSignature::from_slice(signature) else {
                    return false;
                };
                verifying_key.verify_strict(message, &sig).is_ok()
            }
            Self::P256(bytes) => {
                let Ok(verifying_key) = p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = p256::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                verifying_key.verify(message, &sig).is_ok()
            }
        }
    }

    /// Multicodec-prefixed key bytes (the payload of a Multikey).
    pub fn to_multicodec_bytes(&self) -> Vec<u8> {
        let header = match self {
            Self::Ed25519(_) => ED25519_PUB_MULTICODEC,
            Self::P256(_) => P256_PUB_MULTICODEC,
        };
        let mut out = Vec::with_capacity(2 + self.as_bytes().len());
        out.extend_from_slice(&header);
        out.extend_from_slice(self.as_bytes());
        out
    }

    /// Parse multicodec-prefixed key bytes.
    pub fn from_multicodec_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(CoreError::Decode("multicodec key too short".into()));
        }
        let (header, key) = bytes.split_at(2);
        if header == ED25519_PUB_MULTICODEC {
            Self::from_bytes(KeyAlgorithm::Ed25519, key)
        } else if header == P256_PUB_MULTICODEC {
            Self::from_bytes(KeyAlgorithm::P256, key)
        } else {
            Err(CoreError::UnsupportedMulticodec(hex::encode(header)))
        }
    }

    /// Encode as a Multikey `publicKeyMultibase` value (base58btc).
    pub fn to_multikey(&self) -> String {
        multibase::encode(Base::Base58Btc, self.to_multicodec_bytes())
    }

    /// Parse a Multikey `publicKeyMultibase` value.
    pub fn from_multikey(text: &str) -> Result<Self> {
        let bytes = multibase::decode_expected(Base::Base58Btc, text)?;
        Self::from_multicodec_bytes(&bytes)
    }

    /// The `did:key` verification method reference for this key.
    pub fn to_did_key(&self) -> String {
        let multikey = self.to_multikey();
        format!("did:key:{multikey}#{multikey}")
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Pub({}...)", self.algorithm(), &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A 64-byte signature: Ed25519, or ECDSA P-256 in fixed `r || s` form.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice of exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CoreError::Decode(format!("signature must be 64 bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

#[derive(Clone)]
enum SecretKey {
    Ed25519(SigningKey),
    P256(p256::ecdsa::SigningKey),
}

/// A keypair for signing proofs.
///
/// The secret half never leaves this type: it has no serializer and its
/// `Debug` output shows only the public key.
#[derive(Clone)]
pub struct Keypair {
    secret: SecretKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        let mut rng = rand::rngs::OsRng;
        let secret = match algorithm {
            KeyAlgorithm::Ed25519 => SecretKey::Ed25519(SigningKey::generate(&mut rng)),
            KeyAlgorithm::P256 => SecretKey::P256(p256::ecdsa::SigningKey::random(&mut rng)),
        };
        Self { secret }
    }

    /// Create from a 32-byte seed (Ed25519) or scalar (P-256).
    ///
    /// Fails only for P-256 scalars that are zero or not below the group order.
    pub fn from_seed(algorithm: KeyAlgorithm, seed: &[u8; 32]) -> Result<Self> {
        let secret = match algorithm {
            KeyAlgorithm::Ed25519 => SecretKey::Ed25519(SigningKey::from_bytes(seed)),
            KeyAlgorithm::P256 => SecretKey::P256(
                p256::ecdsa::SigningKey::from_slice(seed)
                    .map_err(|e| CoreError::InvalidPrivateKey(e.to_string()))?,
            ),
        };
        Ok(Self { secret })
    }

    /// The key algorithm.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match &self.secret {
            SecretKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            SecretKey::P256(_) => KeyAlgorithm::P256,
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        match &self.secret {
            SecretKey::Ed25519(sk) => PublicKey::Ed25519(sk.verifying_key().to_bytes()),
            SecretKey::P256(sk) => {
                let point = sk.verifying_key().to_encoded_point(true);
                let mut arr = [0u8; 33];
                arr.copy_from_slice(point.as_bytes());
                PublicKey::P256(arr)
            }
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match &self.secret {
            SecretKey::Ed25519(sk) => Signature(sk.sign(message).to_bytes()),
            SecretKey::P256(sk) => {
                let sig: p256::ecdsa::Signature = sk.sign(message);
                let mut arr = [0u8; 64];
                arr.copy_from_slice(&sig.to_bytes());
                Signature(arr)
            }
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
