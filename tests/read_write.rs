mod common;

use avrotype::{AvroErr, JsonMode, Map, Record, Tap, Type, Value};
use std::str::FromStr;

use common::{long_list, sample, MockSchema, Primitive};

const DATUM_COUNT: usize = 1000;

///////////////////////////////////////////////////////////////////////////////
/// Primitive schema tests
///////////////////////////////////////////////////////////////////////////////

static PRIMITIVES: [Primitive; 8] = [
    Primitive::Null,
    Primitive::Boolean,
    Primitive::Int,
    Primitive::Long,
    Primitive::Float,
    Primitive::Double,
    Primitive::Bytes,
    Primitive::String,
];

#[test]
fn read_write_primitive() {
    for primitive in PRIMITIVES.iter() {
        let name = &format!("{}", primitive);
        let schema = MockSchema.prim(name);
        for i in 0..DATUM_COUNT {
            let value = sample(primitive, i);
            let buf = schema.to_buffer(&value).unwrap();
            assert_eq!(schema.from_buffer(&buf).unwrap(), value);
        }
    }
}

#[test]
fn zig_zag_encoding() {
    let int = MockSchema.prim("int");
    let long = MockSchema.prim("long");
    assert_eq!(int.to_buffer(&Value::Int(5)).unwrap(), vec![0x0a]);
    assert_eq!(long.to_buffer(&Value::Long(-3)).unwrap(), vec![0x05]);
    assert_eq!(long.to_buffer(&Value::Long(0)).unwrap(), vec![0x00]);
}

#[test]
fn many_values_share_one_tap() {
    let schema = MockSchema.prim("long");
    let mut buf = vec![0u8; DATUM_COUNT * 10];
    let mut tap = Tap::new(&mut buf[..]);
    for i in 0..DATUM_COUNT {
        schema.write(&Value::Long(i as i64), &mut tap).unwrap();
    }
    assert!(tap.is_valid());
    let end = tap.pos();

    let mut tap = Tap::new(&buf[..end]);
    for i in 0..DATUM_COUNT {
        assert_eq!(schema.read(&mut tap).unwrap(), Value::Long(i as i64));
    }
    assert_eq!(tap.pos(), end);
}

///////////////////////////////////////////////////////////////////////////////
/// Complex schema tests
///////////////////////////////////////////////////////////////////////////////

#[test]
fn read_write_self_referential_record() {
    let schema = MockSchema.record();
    let value = long_list(&[1, 2, 3]);
    let buf = schema.to_buffer(&value).unwrap();
    assert_eq!(buf, vec![0x02, 0x02, 0x04, 0x02, 0x06, 0x00]);
    assert_eq!(schema.from_buffer(&buf).unwrap(), value);
}

#[test]
fn record_accepts_plain_maps() {
    let schema = MockSchema.record_default();
    let mut m = Map::new();
    m.insert("value".into(), Value::Long(9));
    m.insert("next".into(), Value::Null);
    let buf = schema.to_buffer(&Value::Map(m)).unwrap();

    let read = schema.from_buffer(&buf).unwrap();
    let rec = read.as_record().unwrap();
    assert_eq!(rec.name(), "LongList");
    assert_eq!(rec.get("other"), Some(&Value::Long(1)));
}

#[test]
fn enum_read_write() {
    let schema = Type::from_str(
        r##"
        {
            "type": "enum",
            "name": "Foo",
            "symbols": ["A", "B", "C", "D"]
        }
        "##,
    )
    .unwrap();
    let buf = schema.to_buffer(&Value::Enum("B".into())).unwrap();
    assert_eq!(buf, vec![0x02]);
    assert_eq!(schema.from_buffer(&buf).unwrap(), Value::Enum("B".into()));
    // symbols given as strings are accepted too
    assert_eq!(schema.to_buffer(&Value::Str("D".into())).unwrap(), vec![0x06]);
    assert!(schema.to_buffer(&Value::Enum("E".into())).is_err());
}

#[test]
fn array_read_write() {
    let schema = Type::from_str(r##"{"type": "array", "items": "string"}"##).unwrap();
    let value = Value::Array(vec!["a".into(), "bc".into()]);
    let buf = schema.to_buffer(&value).unwrap();
    assert_eq!(buf, vec![0x04, 0x02, b'a', 0x04, b'b', b'c', 0x00]);
    assert_eq!(schema.from_buffer(&buf).unwrap(), value);
}

#[test]
fn array_blocks_with_byte_sizes_are_read_and_skipped() {
    let schema = Type::from_str(r##"{"type": "array", "items": "int"}"##).unwrap();
    // two blocks: -2 items in 2 bytes, then 1 item, then the terminator
    let buf = [0x03, 0x04, 0x02, 0x04, 0x02, 0x06, 0x00];
    assert_eq!(
        schema.from_buffer(&buf).unwrap(),
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    let mut tap = Tap::new(&buf[..]);
    schema.skip(&mut tap).unwrap();
    assert_eq!(tap.pos(), buf.len());
}

#[test]
fn map_read_write() {
    let schema = Type::from_str(r##"{"type": "map", "values": "long"}"##).unwrap();
    let mut m = Map::new();
    m.insert("foo".to_string(), Value::Long(1));
    let value = Value::Map(m);
    let buf = schema.to_buffer(&value).unwrap();
    assert_eq!(buf, vec![0x02, 0x06, b'f', b'o', b'o', 0x02, 0x00]);
    assert_eq!(schema.from_buffer(&buf).unwrap(), value);
}

#[test]
fn union_read_write() {
    let schema = Type::from_str(
        r##"
        ["null", "string", {"type": "map", "values": "long"}]
        "##,
    )
    .unwrap();
    assert!(!schema.is_wrapped_union());
    for value in vec![Value::Null, Value::Str("x".into()), Value::Map(Default::default())] {
        let buf = schema.to_buffer(&value).unwrap();
        assert_eq!(schema.from_buffer(&buf).unwrap(), value);
    }
}

#[test]
fn fixed_read_write() {
    let schema = Type::from_str(r##"{"type": "fixed", "size": 16, "name": "md5"}"##).unwrap();
    let value = Value::Fixed(vec![7; 16]);
    let buf = schema.to_buffer(&value).unwrap();
    assert_eq!(buf.len(), 16);
    assert_eq!(schema.from_buffer(&buf).unwrap(), value);
    assert!(schema.to_buffer(&Value::Fixed(vec![7; 15])).is_err());
}

#[test]
fn bytes_read_write() {
    let schema = Type::from_str(r##"{"type": "bytes"}"##).unwrap();
    let value = Value::Bytes(vec![0xa8, 0x25]);
    let buf = schema.to_buffer(&value).unwrap();
    assert_eq!(buf, vec![0x04, 0xa8, 0x25]);
    assert_eq!(schema.from_buffer(&buf).unwrap(), value);
}

#[test]
#[should_panic(expected = "InvalidValue")]
fn write_invalid_union_data_fails() {
    let schema = Type::from_str(r##"["int", "float"]"##).unwrap();
    schema.to_buffer(&Value::Str("hello".into())).unwrap();
}

///////////////////////////////////////////////////////////////////////////////
/// Decode faults
///////////////////////////////////////////////////////////////////////////////

#[test]
fn truncated_and_trailing_buffers() {
    let schema = MockSchema.prim("string");
    match schema.from_buffer(&[0x0a, b'h']) {
        Err(AvroErr::Truncated) => {}
        other => panic!("unexpected {:?}", other),
    }
    match schema.from_buffer(&[0x02, b'h', 0x00]) {
        Err(AvroErr::TrailingData(1)) => {}
        other => panic!("unexpected {:?}", other),
    }
    // streaming decodes report truncation as `None`
    assert!(schema.decode(&[0x0a, b'h'], 0).unwrap().is_none());
    assert_eq!(
        schema.decode(&[0x00, 0x02, b'h'], 1).unwrap(),
        Some((Value::Str("h".into()), 3))
    );
}

///////////////////////////////////////////////////////////////////////////////
/// JSON encoding
///////////////////////////////////////////////////////////////////////////////

#[test]
fn json_round_trip_of_wrapped_unions() {
    let schema = Type::from_str(r##"["null", "int", "long"]"##).unwrap();
    let value = Value::union("long", 5i64);
    let json = schema.to_json(&value, JsonMode::Avro).unwrap();
    assert_eq!(json, serde_json::json!({"long": 5}));
    assert_eq!(schema.from_json(&json, JsonMode::Avro).unwrap(), value);
}

#[test]
fn records_round_trip_through_json() {
    let schema = MockSchema.record();
    let mut rec = Record::new("LongList");
    rec.insert("value", 4i64).unwrap();
    rec.insert("next", Value::Null).unwrap();
    let value = Value::Record(rec);
    let json = schema.to_json(&value, JsonMode::Avro).unwrap();
    assert_eq!(json, serde_json::json!({"value": 4, "next": null}));
    assert_eq!(schema.from_json(&json, JsonMode::Avro).unwrap(), value);
}
