//! Property-based tests for the binary codec and ordering.
//!
//! Values are generated from a seeded `Lcg` so that proptest only has to shrink
//! the seed.

use proptest::prelude::*;

use avrotype::{Lcg, Type, Value};
use std::cmp::Ordering;
use std::str::FromStr;

// ============================================================================
// Schema Generators
// ============================================================================

const ORDERABLE: &[&str] = &[
    r#""null""#,
    r#""boolean""#,
    r#""int""#,
    r#""long""#,
    r#""float""#,
    r#""double""#,
    r#""bytes""#,
    r#""string""#,
    r#"{"type": "fixed", "name": "F", "size": 4}"#,
    r#"{"type": "enum", "name": "E", "symbols": ["A", "B", "C"]}"#,
    r#"{"type": "array", "items": "long"}"#,
    r#"["null", "string", "double"]"#,
    r#"["int", "long"]"#,
    r#"{"type": "record", "name": "R", "fields": [
        {"name": "a", "type": "int", "order": "descending"},
        {"name": "b", "type": {"type": "array", "items": "string"}},
        {"name": "c", "type": ["null", "bytes"], "order": "ignore"}
    ]}"#,
];

const UNORDERABLE: &[&str] = &[
    r#"{"type": "map", "values": "int"}"#,
    r#"{"type": "record", "name": "M", "fields": [
        {"name": "m", "type": {"type": "map", "values": ["null", "float"]}}
    ]}"#,
];

/// Generate one of the sample schemas that define a sort order.
fn arb_orderable_type() -> impl Strategy<Value = Type> {
    prop::sample::select(ORDERABLE.to_vec()).prop_map(|s| Type::from_str(s).unwrap())
}

/// Generate any of the sample schemas.
fn arb_type() -> impl Strategy<Value = Type> {
    let all: Vec<&str> = ORDERABLE.iter().chain(UNORDERABLE).copied().collect();
    prop::sample::select(all).prop_map(|s| Type::from_str(s).unwrap())
}

fn sign(ord: Ordering) -> i8 {
    match ord {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Encoding then decoding a valid value yields the same value.
    #[test]
    fn prop_round_trip(ty in arb_type(), seed in any::<u64>()) {
        let value = ty.random_with(&mut Lcg::new(seed)).unwrap();
        prop_assert!(ty.is_valid(&value));
        let buf = ty.to_buffer(&value).unwrap();
        prop_assert_eq!(ty.from_buffer(&buf).unwrap(), value);
    }

    /// Comparing values and comparing their encodings agree.
    #[test]
    fn prop_ordering_consistency(ty in arb_orderable_type(), s1 in any::<u64>(), s2 in any::<u64>()) {
        let a = ty.random_with(&mut Lcg::new(s1)).unwrap();
        let b = ty.random_with(&mut Lcg::new(s2)).unwrap();
        let by_value = ty.compare(&a, &b).unwrap();
        let by_bytes = ty
            .compare_buffers(&ty.to_buffer(&a).unwrap(), &ty.to_buffer(&b).unwrap())
            .unwrap();
        prop_assert_eq!(sign(by_value), sign(by_bytes));
        prop_assert_eq!(ty.compare(&a, &a).unwrap(), Ordering::Equal);
    }

    /// Longs survive zig-zag encoding and never take more than ten bytes.
    #[test]
    fn prop_long_round_trip(n in any::<i64>()) {
        let ty = Type::from_str(r#""long""#).unwrap();
        let buf = ty.to_buffer(&Value::Long(n)).unwrap();
        prop_assert!(buf.len() <= avrotype::config::MAX_VARINT_LEN);
        prop_assert_eq!(ty.from_buffer(&buf).unwrap(), Value::Long(n));
    }

    /// Ints written as int can be read as long, float and double.
    #[test]
    fn prop_int_widening(n in any::<i32>()) {
        let writer = Type::from_str(r#""int""#).unwrap();
        let buf = writer.to_buffer(&Value::Int(n)).unwrap();
        let long = Type::from_str(r#""long""#).unwrap().create_resolver(&writer).unwrap();
        prop_assert_eq!(long.from_buffer(&buf).unwrap(), Value::Long(n as i64));
        let double = Type::from_str(r#""double""#).unwrap().create_resolver(&writer).unwrap();
        prop_assert_eq!(double.from_buffer(&buf).unwrap(), Value::Double(n as f64));
    }

    /// Round trips through Avro's JSON encoding preserve values.
    #[test]
    fn prop_json_round_trip(ty in arb_type(), seed in any::<u64>()) {
        let value = ty.random_with(&mut Lcg::new(seed)).unwrap();
        let json = ty.to_json(&value, avrotype::JsonMode::Avro).unwrap();
        prop_assert_eq!(ty.from_json(&json, avrotype::JsonMode::Avro).unwrap(), value);
    }
}
