//! Property-based tests: varint laws, generic value round trips, and
//! truncation behavior across generated inputs.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tbin::varint::{self, encoded_len};
use tbin::{decode, encode, from_slice, to_bytes, Error, Struct, Symbol, Value, ValueMap};

fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    match to_bytes(value) {
        Ok(bytes) => match from_slice::<T>(&bytes) {
            Ok(deserialized) => *value == deserialized,
            Err(e) => {
                eprintln!("Deserialize failed: {}", e);
                eprintln!("Bytes were: {}", tbin::format::hex(&bytes));
                false
            }
        },
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            false
        }
    }
}

fn name() -> impl Strategy<Value = String> {
    "[a-z_]{1,8}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i8>().prop_map(Value::Int8),
        any::<i16>().prop_map(Value::Int16),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        (-1.0e6f32..1.0e6).prop_map(Value::Float32),
        (-1.0e12f64..1.0e12).prop_map(Value::Float64),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(Value::Bytes),
        ".{0,40}".prop_map(Value::String),
        (0i64..4_000_000_000_000).prop_map(Value::timestamp_millis),
        name().prop_map(|n| Value::Symbol(Symbol::new(&n))),
        any::<u128>().prop_map(|n| Value::Uuid(uuid::Uuid::from_u128(n))),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec((inner.clone(), inner.clone()), 0..6)
                .prop_map(|pairs| Value::Map(pairs.into_iter().collect::<ValueMap>())),
            prop::collection::vec((name(), inner), 0..6)
                .prop_map(|fields| Value::Struct(fields.into_iter().collect::<Struct>())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_varint_u32(n in any::<u32>()) {
        let mut buf = Vec::new();
        varint::write_u32(&mut buf, n).unwrap();
        prop_assert_eq!(buf.len(), encoded_len(u64::from(n)));
        prop_assert_eq!(varint::read_u32(&mut buf.as_slice()).unwrap(), n);
    }

    #[test]
    fn prop_varint_u64(n in any::<u64>()) {
        let mut buf = Vec::new();
        varint::write_u64(&mut buf, n).unwrap();
        prop_assert_eq!(buf.len(), encoded_len(n));
        prop_assert_eq!(varint::read_u64(&mut buf.as_slice()).unwrap(), n);
    }

    #[test]
    fn prop_zigzag_i32(n in any::<i32>()) {
        let mut buf = Vec::new();
        varint::write_i32(&mut buf, n).unwrap();
        prop_assert_eq!(varint::read_i32(&mut buf.as_slice()).unwrap(), n);
        // Small magnitudes stay small.
        prop_assert!(varint::zigzag32(n) <= n.unsigned_abs().saturating_mul(2));
    }

    #[test]
    fn prop_zigzag_i64(n in any::<i64>()) {
        let mut buf = Vec::new();
        varint::write_i64(&mut buf, n).unwrap();
        prop_assert_eq!(varint::read_i64(&mut buf.as_slice()).unwrap(), n);
    }

    #[test]
    fn prop_value_roundtrip(v in value()) {
        let bytes = encode(&v).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), v);
    }

    #[test]
    fn prop_truncated_value_fails(v in value()) {
        let bytes = encode(&v).unwrap();
        for cut in 1..bytes.len() {
            prop_assert!(matches!(decode(&bytes[..cut]), Err(Error::UnexpectedEndOfStream)));
        }
    }

    #[test]
    fn prop_i32(n in any::<i32>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_u32(n in any::<u32>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_string(s in ".{0,64}") {
        prop_assert!(roundtrip(&s));
    }

    #[test]
    fn prop_vec_i32(v in prop::collection::vec(any::<i32>(), 0..20)) {
        prop_assert!(roundtrip(&v));
    }

    #[test]
    fn prop_option_i32(opt in proptest::option::of(any::<i32>())) {
        prop_assert!(roundtrip(&opt));
    }

    #[test]
    fn prop_tuple_i32_bool(t in (any::<i32>(), any::<bool>())) {
        prop_assert!(roundtrip(&t));
    }
}

#[test]
fn zigzag_boundaries() {
    for n in [i32::MIN, -1, 0, 1, i32::MAX] {
        let mut buf = Vec::new();
        varint::write_i32(&mut buf, n).unwrap();
        assert_eq!(varint::read_i32(&mut buf.as_slice()).unwrap(), n);
    }
    assert_eq!(varint::zigzag32(-1), 1);
    assert_eq!(varint::zigzag32(i32::MIN), u32::MAX);
}
