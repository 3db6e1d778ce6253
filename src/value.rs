//! The in-memory representation of Avro values.

use crate::error::AvroErr;
use crate::schema::common::validate_name;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

// Convenient type alias for map initialzation.
/// Map values, keyed by string in insertion order.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
/// The [Record](https://avro.apache.org/docs/current/spec.html#schema_record) avro type.
/// Fields are kept in insertion order. Plain [`Value::Map`]s with a matching set of
/// keys are accepted wherever a record is expected.
pub struct Record {
    pub(crate) name: String,
    pub(crate) fields: IndexMap<String, Value>,
}

impl Record {
    /// Creates a new avro record type with the given name.
    pub fn new(name: &str) -> Self {
        Record {
            fields: IndexMap::new(),
            name: name.to_string(),
        }
    }

    pub(crate) fn with_capacity(name: &str, capacity: usize) -> Self {
        Record {
            fields: IndexMap::with_capacity(capacity),
            name: name.to_string(),
        }
    }

    /// Adds a field to the record.
    pub fn insert<T: Into<Value>>(&mut self, field_name: &str, ty: T) -> Result<(), AvroErr> {
        validate_name(field_name)?;
        self.fields.insert(field_name.to_string(), ty.into());
        Ok(())
    }

    /// Fully qualified name of the record type this value was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a field value by name.
    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.fields.get(field_name)
    }

    /// Iterates over fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields set.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Creates a record from a [BTreeMap](https://doc.rust-lang.org/std/collections/struct.BTreeMap.html) by consuming it.
    pub fn from_btree<K: Into<String> + Ord + Display, V: Into<Value>>(
        name: &str,
        btree: BTreeMap<K, V>,
    ) -> Result<Self, AvroErr> {
        let mut record = Record::new(name);
        for (k, v) in btree {
            record.insert(&k.to_string(), v)?;
        }
        Ok(record)
    }
}

/// A fixed-point decimal: `unscaled * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Decimal {
    unscaled: i128,
    scale: u32,
}

impl Decimal {
    /// The decimal `unscaled * 10^-scale`.
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Decimal { unscaled, scale }
    }

    /// The unscaled integer value.
    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    /// Digits after the decimal point.
    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let sign = if self.unscaled < 0 { "-" } else { "" };
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

/// Represents an Avro value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// A null value.
    Null,
    /// A boolean value.
    Boolean(bool),
    /// An i32 integer value.
    Int(i32),
    /// An i64 long value.
    Long(i64),
    /// A f32 float value.
    Float(f32),
    /// A f64 float value.
    Double(f64),
    /// A sequence of u8 bytes.
    Bytes(Vec<u8>),
    /// Rust strings map directly to avro strings
    Str(String),
    /// A Fixed value.
    Fixed(Vec<u8>),
    /// An enumeration symbol.
    Enum(String),
    /// An array of `Value`s
    Array(Vec<Value>),
    /// A Map value. Also accepted as a plain-object record.
    Map(Map),
    /// A Record value.
    Record(Record),
    /// A wrapped union value: the branch name and its payload.
    Union(String, Box<Value>),
    /// `date` logical value: days since the unix epoch.
    Date(i32),
    /// `timestamp-millis` logical value.
    TimestampMillis(i64),
    /// `timestamp-micros` logical value.
    TimestampMicros(i64),
    /// `decimal` logical value.
    Decimal(Decimal),
}

impl Value {
    /// Wraps `value` as the payload of union branch `branch`.
    pub fn union<T: Into<Value>>(branch: &str, value: T) -> Value {
        Value::Union(branch.to_string(), Box::new(value.into()))
    }

    // Compact rendering used in error messages.
    pub(crate) fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

///////////////////////////////////////////////////////////////////////////////
/// From impls for Value
///////////////////////////////////////////////////////////////////////////////

impl From<()> for Value {
    fn from(_v: ()) -> Value {
        Value::Null
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Value {
        Value::Str(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Value {
        Value::Bytes(value)
    }
}

impl<'a> From<&'a [u8]> for Value {
    fn from(value: &'a [u8]) -> Value {
        Value::Bytes(value.to_vec())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Value {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Double(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Value {
        Value::Record(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Value {
        Value::Decimal(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<IndexMap<String, T>> for Value {
    fn from(v: IndexMap<String, T>) -> Value {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[macro_export]
/// Convenient macro to create a avro fixed value
macro_rules! fixed {
    ($vec:expr) => {
        $crate::Value::Fixed($vec)
    };
}

///////////////////////////////////////////////////////////////////////////////
/// Value -> Rust value
///////////////////////////////////////////////////////////////////////////////

impl Value {
    /// Try to retrieve an avro null
    pub fn as_null(&self) -> Result<(), AvroErr> {
        if let Value::Null = self {
            Ok(())
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro boolean
    pub fn as_boolean(&self) -> Result<&bool, AvroErr> {
        if let Value::Boolean(b) = self {
            Ok(b)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro int
    pub fn as_int(&self) -> Result<&i32, AvroErr> {
        if let Value::Int(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro long
    pub fn as_long(&self) -> Result<&i64, AvroErr> {
        if let Value::Long(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro float
    pub fn as_float(&self) -> Result<&f32, AvroErr> {
        if let Value::Float(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro double
    pub fn as_double(&self) -> Result<&f64, AvroErr> {
        if let Value::Double(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro bytes
    pub fn as_bytes(&self) -> Result<&[u8], AvroErr> {
        if let Value::Bytes(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro string
    pub fn as_string(&self) -> Result<&str, AvroErr> {
        if let Value::Str(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro fixed
    pub fn as_fixed(&self) -> Result<&[u8], AvroErr> {
        if let Value::Fixed(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve the variant of the enum as a string
    pub fn as_enum(&self) -> Result<&str, AvroErr> {
        if let Value::Enum(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro array
    pub fn as_array(&self) -> Result<&[Value], AvroErr> {
        if let Value::Array(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro map
    pub fn as_map(&self) -> Result<&Map, AvroErr> {
        if let Value::Map(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve an avro record
    pub fn as_record(&self) -> Result<&Record, AvroErr> {
        if let Value::Record(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve the branch name and payload of a wrapped union value
    pub fn as_union(&self) -> Result<(&str, &Value), AvroErr> {
        if let Value::Union(branch, v) = self {
            Ok((branch, v))
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
    /// Try to retrieve a decimal
    pub fn as_decimal(&self) -> Result<&Decimal, AvroErr> {
        if let Value::Decimal(v) = self {
            Ok(v)
        } else {
            Err(AvroErr::ExpectedVariantNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Decimal, Record, Value};
    use std::collections::BTreeMap;

    #[test]
    fn record_from_btree() {
        let mut rec = BTreeMap::new();
        rec.insert("foo", "bar");
        let r = Record::from_btree("test", rec).unwrap();
        assert_eq!(r.get("foo"), Some(&Value::Str("bar".to_string())));
    }

    #[test]
    fn record_rejects_invalid_field_name() {
        let mut rec = Record::new("test");
        assert!(rec.insert("1abc", 1).is_err());
    }

    #[test]
    fn decimal_display() {
        assert_eq!(Decimal::new(1234, 2).to_string(), "12.34");
        assert_eq!(Decimal::new(-5, 3).to_string(), "-0.005");
        assert_eq!(Decimal::new(42, 0).to_string(), "42");
    }

    #[test]
    fn option_into_value() {
        let v: Value = Some(3i64).into();
        assert_eq!(v, Value::Long(3));
        let v: Value = Option::<i64>::None.into();
        assert_eq!(v, Value::Null);
    }
}
