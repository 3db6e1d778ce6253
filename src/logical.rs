//! Logical types: user-facing value representations layered over a concrete
//! underlying type.
//!
//! A logical type is registered on [`ParseOptions`](crate::ParseOptions) under the
//! value of the schema's `logicalType` attribute. When a schema node carries a
//! registered `logicalType`, its factory is called with the schema attributes and the
//! name of the underlying type. A factory error makes the parser fall back to the
//! plain underlying type unless `assert_logical_types` is set.

use crate::error::{AvroErr, AvroResult};
use crate::value::{Decimal, Value};
use rand::{Rng, RngCore};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Conversions between a logical value and its underlying representation.
pub trait LogicalType: Debug + Send + Sync {
    /// The `logicalType` name this implementation was registered for.
    fn name(&self) -> &str;
    /// Converts a logical value into a value of the underlying type.
    fn to_value(&self, value: &Value) -> AvroResult<Value>;
    /// Converts a value of the underlying type into a logical value.
    fn from_value(&self, value: Value) -> AvroResult<Value>;
    /// Whether `value` is a valid logical value.
    fn is_valid(&self, value: &Value) -> bool {
        self.to_value(value).is_ok()
    }
    /// Draws a random valid logical value. `None` derives one from a random
    /// value of the underlying type instead.
    fn random(&self, _rng: &mut dyn RngCore) -> Option<Value> {
        None
    }
}

/// Builds a logical type from the schema's attributes and the underlying type name.
pub type LogicalTypeFactory =
    Arc<dyn Fn(&Map<String, JsonValue>, &str) -> AvroResult<Arc<dyn LogicalType>> + Send + Sync>;

fn rejected(name: &str, reason: String) -> AvroErr {
    AvroErr::LogicalTypeFailed {
        name: name.to_string(),
        reason,
    }
}

fn mismatch(imp: &dyn LogicalType, value: &Value) -> AvroErr {
    AvroErr::InvalidValue {
        value: value.describe(),
        schema: format!("logical:{}", imp.name()),
    }
}

fn expect_underlying(name: &str, found: &str, expected: &[&str]) -> AvroResult<()> {
    if expected.contains(&found) {
        Ok(())
    } else {
        Err(rejected(
            name,
            format!("cannot be layered on {} (expected {})", found, expected.join(" or ")),
        ))
    }
}

/// `date`: days since the unix epoch, over `int`.
#[derive(Debug, Clone, Copy)]
pub struct DateType;

impl LogicalType for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn to_value(&self, value: &Value) -> AvroResult<Value> {
        match value {
            Value::Date(d) => Ok(Value::Int(*d)),
            other => Err(mismatch(self, other)),
        }
    }

    fn from_value(&self, value: Value) -> AvroResult<Value> {
        match value {
            Value::Int(d) => Ok(Value::Date(d)),
            other => Err(mismatch(self, &other)),
        }
    }

    fn random(&self, rng: &mut dyn RngCore) -> Option<Value> {
        Some(Value::Date(rng.gen()))
    }
}

/// Timestamp precision of [`TimestampType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    /// Milliseconds since the unix epoch.
    Millis,
    /// Microseconds since the unix epoch.
    Micros,
}

/// `timestamp-millis` and `timestamp-micros`, over `long`.
#[derive(Debug, Clone, Copy)]
pub struct TimestampType {
    unit: TimestampUnit,
}

impl TimestampType {
    /// A timestamp with the given unit.
    pub fn new(unit: TimestampUnit) -> Self {
        TimestampType { unit }
    }
}

impl LogicalType for TimestampType {
    fn name(&self) -> &str {
        match self.unit {
            TimestampUnit::Millis => "timestamp-millis",
            TimestampUnit::Micros => "timestamp-micros",
        }
    }

    fn to_value(&self, value: &Value) -> AvroResult<Value> {
        match (self.unit, value) {
            (TimestampUnit::Millis, Value::TimestampMillis(t))
            | (TimestampUnit::Micros, Value::TimestampMicros(t)) => Ok(Value::Long(*t)),
            (_, other) => Err(mismatch(self, other)),
        }
    }

    fn from_value(&self, value: Value) -> AvroResult<Value> {
        match (self.unit, value) {
            (TimestampUnit::Millis, Value::Long(t)) => Ok(Value::TimestampMillis(t)),
            (TimestampUnit::Micros, Value::Long(t)) => Ok(Value::TimestampMicros(t)),
            (_, other) => Err(mismatch(self, &other)),
        }
    }

    fn random(&self, rng: &mut dyn RngCore) -> Option<Value> {
        let t = rng.gen();
        Some(match self.unit {
            TimestampUnit::Millis => Value::TimestampMillis(t),
            TimestampUnit::Micros => Value::TimestampMicros(t),
        })
    }
}

/// `decimal`: an unscaled two's complement big endian integer in `bytes` or `fixed`.
#[derive(Debug, Clone, Copy)]
pub struct DecimalType {
    precision: u32,
    scale: u32,
    size: Option<usize>,
}

impl DecimalType {
    /// Checks that `scale <= precision` and, for `fixed`, that `size` bytes hold `precision` digits.
    pub fn new(precision: u32, scale: u32, size: Option<usize>) -> AvroResult<Self> {
        if precision == 0 {
            return Err(rejected("decimal", "precision must be positive".to_string()));
        }
        if scale > precision {
            return Err(rejected(
                "decimal",
                format!("scale {} exceeds precision {}", scale, precision),
            ));
        }
        if let Some(size) = size {
            let max = max_precision(size);
            if precision > max {
                return Err(rejected(
                    "decimal",
                    format!("fixed of size {} holds at most {} digits", size, max),
                ));
            }
        }
        Ok(DecimalType {
            precision,
            scale,
            size,
        })
    }

    fn from_schema(schema: &Map<String, JsonValue>, underlying: &str) -> AvroResult<Self> {
        expect_underlying("decimal", underlying, &["bytes", "fixed"])?;
        let precision = schema
            .get("precision")
            .and_then(JsonValue::as_u64)
            .ok_or_else(|| rejected("decimal", "missing or invalid precision".to_string()))?;
        let scale = match schema.get("scale") {
            Some(scale) => scale
                .as_u64()
                .ok_or_else(|| rejected("decimal", format!("invalid scale {}", scale)))?,
            None => 0,
        };
        let size = match underlying {
            "fixed" => schema
                .get("size")
                .and_then(JsonValue::as_u64)
                .map(|s| s as usize),
            _ => None,
        };
        DecimalType::new(precision as u32, scale as u32, size)
    }
}

// Digits representable by a signed integer of `size` bytes.
fn max_precision(size: usize) -> u32 {
    if size == 0 {
        return 0;
    }
    ((8 * size - 1) as f64 * 2f64.log10()).floor() as u32
}

// Minimal two's complement big endian encoding.
fn encode_unscaled(unscaled: i128) -> Vec<u8> {
    let bytes = unscaled.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn decode_unscaled(bytes: &[u8]) -> Option<i128> {
    let negative = bytes.first().map_or(false, |b| b & 0x80 != 0);
    let sign = if negative { 0xff } else { 0x00 };
    if bytes.len() > 16 && bytes[..bytes.len() - 16].iter().any(|b| *b != sign) {
        return None;
    }
    let mut v: i128 = if negative { -1 } else { 0 };
    for b in bytes {
        v = (v << 8) | *b as i128;
    }
    Some(v)
}

impl LogicalType for DecimalType {
    fn name(&self) -> &str {
        "decimal"
    }

    fn to_value(&self, value: &Value) -> AvroResult<Value> {
        let d = match value {
            Value::Decimal(d) if d.scale() == self.scale => d,
            other => return Err(mismatch(self, other)),
        };
        let digits = d.unscaled().unsigned_abs().to_string().len() as u32;
        if digits > self.precision {
            return Err(mismatch(self, value));
        }
        let bytes = encode_unscaled(d.unscaled());
        match self.size {
            None => Ok(Value::Bytes(bytes)),
            Some(size) if bytes.len() <= size => {
                let fill = if d.unscaled() < 0 { 0xff } else { 0x00 };
                let mut out = vec![fill; size - bytes.len()];
                out.extend_from_slice(&bytes);
                Ok(Value::Fixed(out))
            }
            Some(_) => Err(mismatch(self, value)),
        }
    }

    fn from_value(&self, value: Value) -> AvroResult<Value> {
        match &value {
            Value::Bytes(b) | Value::Fixed(b) => decode_unscaled(b)
                .map(|unscaled| Value::Decimal(Decimal::new(unscaled, self.scale)))
                .ok_or_else(|| mismatch(self, &value)),
            other => Err(mismatch(self, other)),
        }
    }

    fn random(&self, rng: &mut dyn RngCore) -> Option<Value> {
        // Unscaled values stay below 10^precision.
        let bound = 10i128.checked_pow(self.precision).unwrap_or(i128::MAX);
        let unscaled = rng.gen_range(-(bound - 1)..bound);
        Some(Value::Decimal(Decimal::new(unscaled, self.scale)))
    }
}

/// `uuid`: a string in the canonical 8-4-4-4-12 hex format.
#[derive(Debug, Clone, Copy)]
pub struct UuidType;

fn is_uuid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12].iter())
            .all(|(g, len)| g.len() == *len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

impl LogicalType for UuidType {
    fn name(&self) -> &str {
        "uuid"
    }

    fn to_value(&self, value: &Value) -> AvroResult<Value> {
        match value {
            Value::Str(s) if is_uuid(s) => Ok(value.clone()),
            other => Err(mismatch(self, other)),
        }
    }

    fn from_value(&self, value: Value) -> AvroResult<Value> {
        match value {
            Value::Str(s) if is_uuid(&s) => Ok(Value::Str(s)),
            other => Err(mismatch(self, &other)),
        }
    }

    fn random(&self, rng: &mut dyn RngCore) -> Option<Value> {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        let mut s = String::with_capacity(36);
        for (i, b) in bytes.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                s.push('-');
            }
            s.push_str(&format!("{:02x}", b));
        }
        Some(Value::Str(s))
    }
}

/// Wraps a closure as a [`LogicalTypeFactory`].
pub fn factory<F>(f: F) -> LogicalTypeFactory
where
    F: Fn(&Map<String, JsonValue>, &str) -> AvroResult<Arc<dyn LogicalType>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Factories for the built-in logical types, keyed by `logicalType` name.
pub fn builtin_logical_types() -> HashMap<String, LogicalTypeFactory> {
    let mut types: HashMap<String, LogicalTypeFactory> = HashMap::new();
    types.insert(
        "date".to_string(),
        factory(|_, underlying| {
            expect_underlying("date", underlying, &["int"])?;
            Ok(Arc::new(DateType) as Arc<dyn LogicalType>)
        }),
    );
    types.insert(
        "timestamp-millis".to_string(),
        factory(|_, underlying| {
            expect_underlying("timestamp-millis", underlying, &["long"])?;
            Ok(Arc::new(TimestampType::new(TimestampUnit::Millis)) as Arc<dyn LogicalType>)
        }),
    );
    types.insert(
        "timestamp-micros".to_string(),
        factory(|_, underlying| {
            expect_underlying("timestamp-micros", underlying, &["long"])?;
            Ok(Arc::new(TimestampType::new(TimestampUnit::Micros)) as Arc<dyn LogicalType>)
        }),
    );
    types.insert(
        "decimal".to_string(),
        factory(|schema, underlying| {
            Ok(Arc::new(DecimalType::from_schema(schema, underlying)?) as Arc<dyn LogicalType>)
        }),
    );
    types.insert(
        "uuid".to_string(),
        factory(|_, underlying| {
            expect_underlying("uuid", underlying, &["string"])?;
            Ok(Arc::new(UuidType) as Arc<dyn LogicalType>)
        }),
    );
    types
}

#[cfg(test)]
mod tests {
    use super::{decode_unscaled, encode_unscaled, max_precision, DecimalType, LogicalType};
    use crate::value::{Decimal, Value};
    use crate::{Lcg, ParseOptions, Type};
    use serde_json::json;

    #[test]
    fn unscaled_two_complement() {
        assert_eq!(encode_unscaled(0), vec![0x00]);
        assert_eq!(encode_unscaled(-1), vec![0xff]);
        assert_eq!(encode_unscaled(255), vec![0x00, 0xff]);
        assert_eq!(encode_unscaled(-129), vec![0xff, 0x7f]);
        assert_eq!(decode_unscaled(&[0xff, 0x7f]), Some(-129));
        assert_eq!(decode_unscaled(&[0x00, 0xff]), Some(255));
        assert_eq!(decode_unscaled(&[]), Some(0));
    }

    #[test]
    fn fixed_decimal_is_sign_extended() {
        let dec = DecimalType::new(4, 2, Some(4)).unwrap();
        let encoded = dec.to_value(&Value::Decimal(Decimal::new(-2, 2))).unwrap();
        assert_eq!(encoded, Value::Fixed(vec![0xff, 0xff, 0xff, 0xfe]));
        assert_eq!(
            dec.from_value(encoded).unwrap(),
            Value::Decimal(Decimal::new(-2, 2))
        );
    }

    #[test]
    fn decimal_rejects_excess_digits_and_wrong_scale() {
        let dec = DecimalType::new(3, 1, None).unwrap();
        assert!(!dec.is_valid(&Value::Decimal(Decimal::new(12345, 1))));
        assert!(!dec.is_valid(&Value::Decimal(Decimal::new(12, 2))));
        assert!(dec.is_valid(&Value::Decimal(Decimal::new(-999, 1))));
    }

    #[test]
    fn fixed_precision_limit() {
        assert_eq!(max_precision(1), 2);
        assert_eq!(max_precision(4), 9);
        assert_eq!(max_precision(16), 38);
        assert!(DecimalType::new(10, 0, Some(4)).is_err());
    }

    #[test]
    fn date_round_trip() {
        let opts = ParseOptions::new().with_builtin_logical_types();
        let ty = Type::for_schema_with(&json!({"type": "int", "logicalType": "date"}), &opts)
            .unwrap();
        assert_eq!(ty.type_name(), "logical:date");
        let buf = ty.to_buffer(&Value::Date(18000)).unwrap();
        assert_eq!(ty.from_buffer(&buf).unwrap(), Value::Date(18000));
        assert!(!ty.is_valid(&Value::Int(18000)));
    }

    #[test]
    fn mismatched_underlying_falls_back() {
        let opts = ParseOptions::new().with_builtin_logical_types();
        let ty = Type::for_schema_with(&json!({"type": "string", "logicalType": "date"}), &opts)
            .unwrap();
        assert_eq!(ty.type_name(), "string");

        let strict = opts.assert_logical_types(true);
        assert!(
            Type::for_schema_with(&json!({"type": "string", "logicalType": "date"}), &strict)
                .is_err()
        );
    }

    #[test]
    fn builtin_random_values_are_valid() {
        let opts = ParseOptions::new().with_builtin_logical_types();
        let schemas = vec![
            json!({"type": "int", "logicalType": "date"}),
            json!({"type": "long", "logicalType": "timestamp-millis"}),
            json!({"type": "long", "logicalType": "timestamp-micros"}),
            json!({"type": "bytes", "logicalType": "decimal", "precision": 2, "scale": 0}),
            json!({"type": "bytes", "logicalType": "decimal", "precision": 38, "scale": 4}),
            json!({"type": "fixed", "name": "Money", "size": 4, "logicalType": "decimal", "precision": 9, "scale": 2}),
            json!({"type": "string", "logicalType": "uuid"}),
        ];
        let mut rng = Lcg::new(1);
        for schema in &schemas {
            let ty = Type::for_schema_with(schema, &opts).unwrap();
            assert!(ty.type_name().starts_with("logical:"), "{}", schema);
            for _ in 0..50 {
                let value = ty.random_with(&mut rng).unwrap();
                assert!(ty.is_valid(&value), "{} {:?}", schema, value);
                let buf = ty.to_buffer(&value).unwrap();
                assert_eq!(ty.from_buffer(&buf).unwrap(), value);
            }
        }
    }

    #[test]
    fn uuid_validates_format() {
        let opts = ParseOptions::new().with_builtin_logical_types();
        let ty = Type::for_schema_with(&json!({"type": "string", "logicalType": "uuid"}), &opts)
            .unwrap();
        assert!(ty.is_valid(&Value::Str("123e4567-e89b-12d3-a456-426614174000".into())));
        assert!(!ty.is_valid(&Value::Str("not-a-uuid".into())));
    }
}
