//! Multibase codec.
//!
//! A multibase string is a one-character base prefix followed by the encoded
//! bytes. Only the two bases used by proof values and keys are accepted.

use crate::error::{CoreError, Result};

/// Supported multibase encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    /// Prefix `z`, Bitcoin base58 alphabet.
    Base58Btc,
    /// Prefix `u`, RFC 4648 URL-safe base64 without padding.
    Base64UrlNoPad,
}

impl Base {
    /// The prefix character.
    pub const fn prefix(self) -> char {
        match self {
            Self::Base58Btc => 'z',
            Self::Base64UrlNoPad => 'u',
        }
    }

    const fn codec(self) -> ::multibase::Base {
        match self {
            Self::Base58Btc => ::multibase::Base::Base58Btc,
            Self::Base64UrlNoPad => ::multibase::Base::Base64Url,
        }
    }

    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'z' => Some(Self::Base58Btc),
            'u' => Some(Self::Base64UrlNoPad),
            _ => None,
        }
    }
}

/// Encode bytes with the given base, prefix included.
pub fn encode(base: Base, bytes: impl AsRef<[u8]>) -> String {
    ::multibase::encode(base.codec(), bytes)
}

/// Decode a multibase string, returning the base it was encoded with.
pub fn decode(text: &str) -> Result<(Base, Vec<u8>)> {
    let prefix = text
        .chars()
        .next()
        .ok_or_else(|| CoreError::Decode("empty multibase string".into()))?;
    let base = Base::from_prefix(prefix)
        .ok_or_else(|| CoreError::Decode(format!("unsupported multibase prefix '{prefix}'")))?;
    let (_, bytes) = ::multibase::decode(text).map_err(|e| CoreError::Decode(e.to_string()))?;
    Ok((base, bytes))
}

/// Decode, requiring a specific base.
pub fn decode_expected(expected: Base, text: &str) -> Result<Vec<u8>> {
    let (base, bytes) = decode(text)?;
    if base != expected {
        return Err(CoreError::Decode(format!(
            "expected multibase prefix '{}', got '{}'",
            expected.prefix(),
            base.prefix()
        )));
    }
    Ok(bytes)
}
