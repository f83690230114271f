//! Deterministic CBOR encoding for proof values.
//!
//! RFC 8949 core deterministic encoding:
//! - Integers use the smallest valid encoding
//! - Definite lengths only
//! - Map keys sorted by their encoded bytes
//!
//! Proof values only contain integers, byte strings, text strings, arrays and
//! maps. Anything else is rejected rather than encoded loosely.

use ciborium::value::{Integer, Value};

use crate::error::{DisclosureError, Result};

/// Encode a value deterministically.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Decode one CBOR item. Trailing bytes are an error.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    let mut cursor = std::io::Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(&mut cursor).map_err(|e| DisclosureError::Cbor(e.to_string()))?;
    if cursor.position() as usize != bytes.len() {
        return Err(DisclosureError::Cbor("trailing bytes after CBOR item".into()));
    }
    Ok(value)
}

fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(bytes) => {
            encode_uint(buf, 2, bytes.len() as u64);
            buf.extend_from_slice(bytes);
        }
        Value::Text(text) => {
            encode_uint(buf, 3, text.len() as u64);
            buf.extend_from_slice(text.as_bytes());
        }
        Value::Array(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        other => {
            return Err(DisclosureError::Cbor(format!(
                "unsupported value in proof encoding: {other:?}"
            )))
        }
    }
    Ok(())
}

fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // -1 encodes as 0, -2 as 1, ...
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_map(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<()> {
    let mut encoded = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        encoded.push((encode(key)?, value));
    }
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, encoded.len() as u64);
    for (key, value) in encoded {
        buf.extend_from_slice(&key);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Values of the shapes proof envelopes are built from.
    fn proof_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(|n| Value::Integer(n.into())),
            any::<Vec<u8>>().prop_map(Value::Bytes),
            ".*".prop_map(Value::Text),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec((".{0,8}".prop_map(Value::Text), inner), 0..6)
                    .prop_map(Value::Map),
            ]
        })
    }

    #[test]
    fn test_smallest_integer_encoding() {
        assert_eq!(encode(&Value::Integer(0.into())).unwrap(), vec![0x00]);
        assert_eq!(encode(&Value::Integer(23.into())).unwrap(), vec![0x17]);
        assert_eq!(encode(&Value::Integer(24.into())).unwrap(), vec![0x18, 24]);
        assert_eq!(encode(&Value::Integer(500.into())).unwrap(), vec![0x19, 0x01, 0xf4]);
        assert_eq!(encode(&Value::Integer((-1).into())).unwrap(), vec![0x20]);
    }

    #[test]
    fn test_map_keys_sorted() {
        let map = Value::Map(vec![
            (Value::Integer(10.into()), Value::Bytes(vec![1])),
            (Value::Integer(2.into()), Value::Bytes(vec![2])),
        ]);
        assert_eq!(
            encode(&map).unwrap(),
            vec![0xa2, 0x02, 0x41, 0x02, 0x0a, 0x41, 0x01]
        );
    }

    #[test]
    fn test_floats_rejected() {
        assert!(encode(&Value::Float(1.5)).is_err());
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = encode(&Value::Array(vec![Value::Text("a".into())])).unwrap();
        assert!(decode(&bytes).is_ok());
        bytes.push(0x00);
        assert!(decode(&bytes).is_err());
    }

    proptest! {
        #[test]
        fn test_decode_reencodes_identically(value in proof_value()) {
            let bytes = encode(&value).unwrap();
            let decoded = decode(&bytes).unwrap();
            prop_assert_eq!(encode(&decoded).unwrap(), bytes);
        }

        #[test]
        fn test_byte_strings_survive(data in any::<Vec<u8>>()) {
            let bytes = encode(&Value::Bytes(data.clone())).unwrap();
            prop_assert_eq!(decode(&bytes).unwrap(), Value::Bytes(data));
        }
    }
}
