#![allow(dead_code)]

use avrotype::{Record, Type, Value};
use std::str::FromStr;

#[derive(Debug)]
pub(crate) enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Primitive::*;
        let str_repr = match self {
            Null => "null",
            Boolean => "boolean",
            Int => "int",
            Long => "long",
            Float => "float",
            Double => "double",
            Bytes => "bytes",
            String => "string",
        };
        write!(f, "{}", str_repr)
    }
}

// A sample value of each primitive.
pub(crate) fn sample(primitive: &Primitive, i: usize) -> Value {
    match primitive {
        Primitive::Null => Value::Null,
        Primitive::Boolean => Value::Boolean(i % 2 == 0),
        Primitive::Int => Value::Int(i as i32 - 500),
        Primitive::Long => Value::Long(i as i64 * 1_000_003),
        Primitive::Float => Value::Float(i as f32 / 4.0),
        Primitive::Double => Value::Double(i as f64 * -1.5),
        Primitive::Bytes => Value::Bytes(vec![i as u8; i % 7]),
        Primitive::String => Value::Str(format!("value {}", i)),
    }
}

// Builds a `LongList` chain holding `values`.
pub(crate) fn long_list(values: &[i64]) -> Value {
    values.iter().rev().fold(Value::Null, |next, v| {
        let mut rec = Record::new("LongList");
        rec.insert("value", *v).unwrap();
        rec.insert("next", next).unwrap();
        Value::Record(rec)
    })
}

pub(crate) struct MockSchema;
impl MockSchema {
    // creates a primitive schema
    pub fn prim(self, ty: &str) -> Type {
        let schema_str = format!("{{\"type\": \"{}\"}}", ty);
        Type::from_str(&schema_str).unwrap()
    }

    pub fn record(self) -> Type {
        Type::from_str(
            r#"
        {
            "type": "record",
            "name": "LongList",
            "aliases": ["LinkedLongs"],
            "fields" : [
              {"name": "value", "type": "long"},
              {"name": "next", "type": ["null", "LongList"]}
            ]
        }
        "#,
        )
        .unwrap()
    }

    pub fn record_default(self) -> Type {
        Type::from_str(
            r#"
        {
            "type": "record",
            "name": "LongList",
            "aliases": ["LinkedLongs"],
            "fields" : [
              {"name": "value", "type": "long"},
              {"name": "next", "type": ["null", "LongList"]},
              {"name": "other", "type":"long", "default": 1}
            ]
        }
        "#,
        )
        .unwrap()
    }
}
