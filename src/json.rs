//! Conversions between [`Value`]s and JSON.
//!
//! Two encodings are supported. [`JsonMode::Default`] is the one used by schema
//! defaults: union values are given as a value of the union's first branch.
//! [`JsonMode::Avro`] is Avro's JSON encoding, where non-null union values are
//! wrapped in a single-key object naming the branch. In both, bytes and fixed
//! values are strings whose code points are the byte values.

use crate::error::{AvroErr, AvroResult};
use crate::schema::{Graph, Type, TypeId, Variant};
use crate::util::{bytes_to_latin1, latin1_to_bytes};
use crate::value::{Map, Record, Value};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

/// How values map to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonMode {
    /// Defaults encoding: unions hold a value of their first branch.
    Default,
    /// Avro's JSON encoding: non-null union values are `{"branch": value}`.
    Avro,
}

fn invalid_json(g: &Graph, id: TypeId, json: &JsonValue) -> AvroErr {
    AvroErr::InvalidJson {
        value: json.to_string(),
        schema: g.describe(id),
    }
}

pub(crate) fn from_json(g: &Graph, id: TypeId, json: &JsonValue, mode: JsonMode) -> AvroResult<Value> {
    let err = || invalid_json(g, id, json);
    let value = match (g.variant(id), json) {
        (Variant::Null, JsonValue::Null) => Value::Null,
        (Variant::Boolean, JsonValue::Bool(b)) => Value::Boolean(*b),
        (Variant::Int, JsonValue::Number(n)) => {
            let n = n.as_i64().ok_or_else(err)?;
            if n < i32::MIN as i64 || n > i32::MAX as i64 {
                return Err(err());
            }
            Value::Int(n as i32)
        }
        (Variant::Long, JsonValue::Number(n)) => Value::Long(n.as_i64().ok_or_else(err)?),
        (Variant::Float, JsonValue::Number(n)) => Value::Float(n.as_f64().ok_or_else(err)? as f32),
        (Variant::Double, JsonValue::Number(n)) => Value::Double(n.as_f64().ok_or_else(err)?),
        (Variant::Bytes, JsonValue::String(s)) => Value::Bytes(latin1_to_bytes(s)?),
        (Variant::Str, JsonValue::String(s)) => Value::Str(s.clone()),
        (Variant::Fixed(f), JsonValue::String(s)) => {
            let bytes = latin1_to_bytes(s)?;
            if bytes.len() != f.size {
                return Err(err());
            }
            Value::Fixed(bytes)
        }
        (Variant::Enum(e), JsonValue::String(s)) if e.indices.contains_key(s) => {
            Value::Enum(s.clone())
        }
        (Variant::Array { items }, JsonValue::Array(vs)) => Value::Array(
            vs.iter()
                .map(|v| from_json(g, *items, v, mode))
                .collect::<AvroResult<_>>()?,
        ),
        (Variant::Map { values }, JsonValue::Object(o)) => {
            let mut map = Map::with_capacity(o.len());
            for (k, v) in o {
                map.insert(k.clone(), from_json(g, *values, v, mode)?);
            }
            Value::Map(map)
        }
        (Variant::Record(r), JsonValue::Object(o)) => {
            let mut rec = Record::with_capacity(&r.fullname(), r.fields.len());
            for f in &r.fields {
                let value = match o.get(&f.name) {
                    Some(v) => from_json(g, f.ty, v, mode)?,
                    None => f.default.clone().ok_or_else(err)?,
                };
                rec.fields.insert(f.name.clone(), value);
            }
            Value::Record(rec)
        }
        (Variant::Union(u), json) => match mode {
            JsonMode::Default => {
                let first = *u.branches.first().ok_or_else(err)?;
                let value = from_json(g, first, json, mode)?;
                u.wrap(0, value)
            }
            JsonMode::Avro => match json {
                JsonValue::Null if u.lookup.contains_key("null") => Value::Null,
                JsonValue::Object(o) if o.len() == 1 => {
                    let (branch, inner) = o.iter().next().ok_or_else(err)?;
                    let idx = *u.lookup.get(branch).ok_or_else(err)?;
                    let value = from_json(g, u.branches[idx], inner, mode)?;
                    u.wrap(idx, value)
                }
                _ => return Err(err()),
            },
        },
        (Variant::Logical(l), json) => {
            let underlying = from_json(g, l.underlying, json, mode)?;
            l.imp.from_value(underlying)?
        }
        _ => return Err(err()),
    };
    Ok(value)
}

fn number(g: &Graph, id: TypeId, value: &Value, n: f64) -> AvroResult<JsonValue> {
    Number::from_f64(n)
        .map(JsonValue::Number)
        .ok_or_else(|| g.invalid(id, value))
}

pub(crate) fn to_json(g: &Graph, id: TypeId, value: &Value, mode: JsonMode) -> AvroResult<JsonValue> {
    let json = match (g.variant(id), value) {
        (Variant::Null, Value::Null) => JsonValue::Null,
        (Variant::Boolean, Value::Boolean(b)) => JsonValue::Bool(*b),
        (Variant::Int, Value::Int(i)) => JsonValue::from(*i),
        (Variant::Long, Value::Int(i)) => JsonValue::from(*i),
        (Variant::Long, Value::Long(l)) => JsonValue::from(*l),
        (Variant::Float, Value::Float(f)) => number(g, id, value, *f as f64)?,
        (Variant::Double, Value::Double(d)) => number(g, id, value, *d)?,
        (Variant::Float, Value::Int(i)) | (Variant::Double, Value::Int(i)) => JsonValue::from(*i),
        (Variant::Float, Value::Long(l)) | (Variant::Double, Value::Long(l)) => JsonValue::from(*l),
        (Variant::Double, Value::Float(f)) => number(g, id, value, *f as f64)?,
        (Variant::Bytes, Value::Bytes(b)) => JsonValue::String(bytes_to_latin1(b)),
        (Variant::Str, Value::Str(s)) => JsonValue::String(s.clone()),
        (Variant::Fixed(f), Value::Fixed(b)) | (Variant::Fixed(f), Value::Bytes(b))
            if b.len() == f.size =>
        {
            JsonValue::String(bytes_to_latin1(b))
        }
        (Variant::Enum(e), Value::Enum(s)) | (Variant::Enum(e), Value::Str(s))
            if e.indices.contains_key(s) =>
        {
            JsonValue::String(s.clone())
        }
        (Variant::Array { items }, Value::Array(vs)) => JsonValue::Array(
            vs.iter()
                .map(|v| to_json(g, *items, v, mode))
                .collect::<AvroResult<_>>()?,
        ),
        (Variant::Map { values }, Value::Map(m)) => {
            let mut obj = JsonMap::new();
            for (k, v) in m {
                obj.insert(k.clone(), to_json(g, *values, v, mode)?);
            }
            JsonValue::Object(obj)
        }
        (Variant::Record(r), Value::Record(_)) | (Variant::Record(r), Value::Map(_)) => {
            let mut obj = JsonMap::new();
            for f in &r.fields {
                let field = match value {
                    Value::Record(rec) => rec.get(&f.name),
                    Value::Map(m) => m.get(&f.name),
                    _ => None,
                };
                let field = field
                    .or_else(|| f.default.as_ref())
                    .ok_or_else(|| g.invalid(id, value))?;
                obj.insert(f.name.clone(), to_json(g, f.ty, field, mode)?);
            }
            JsonValue::Object(obj)
        }
        (Variant::Union(u), v) => {
            let idx = u.branch_index(g, v)?.ok_or_else(|| g.invalid(id, v))?;
            let inner = to_json(g, u.branches[idx], u.payload(v), mode)?;
            match (mode, inner) {
                (JsonMode::Avro, JsonValue::Null) => JsonValue::Null,
                (JsonMode::Avro, inner) => {
                    let mut obj = JsonMap::new();
                    obj.insert(u.names[idx].clone(), inner);
                    JsonValue::Object(obj)
                }
                (JsonMode::Default, inner) => inner,
            }
        }
        (Variant::Logical(l), v) => {
            let underlying = l.imp.to_value(v)?;
            to_json(g, l.underlying, &underlying, mode)?
        }
        (_, v) => return Err(g.invalid(id, v)),
    };
    Ok(json)
}

impl Type {
    /// Builds a value from its JSON representation.
    ///
    /// ```
    /// use avrotype::{JsonMode, Type, Value};
    /// use serde_json::json;
    ///
    /// let ty = Type::for_schema(&json!(["null", "string"])).unwrap();
    /// let v = ty.from_json(&json!({"string": "hi"}), JsonMode::Avro).unwrap();
    /// assert_eq!(v, Value::Str("hi".into()));
    /// ```
    pub fn from_json(&self, json: &JsonValue, mode: JsonMode) -> AvroResult<Value> {
        from_json(&self.graph, self.id, json, mode)
    }

    /// Renders a value as JSON.
    pub fn to_json(&self, value: &Value, mode: JsonMode) -> AvroResult<JsonValue> {
        to_json(&self.graph, self.id, value, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonMode;
    use crate::{Type, Value, WrapUnions, ParseOptions};
    use serde_json::json;

    #[test]
    fn bytes_are_latin1_strings() {
        let ty = Type::for_schema(&json!("bytes")).unwrap();
        let v = ty.from_json(&json!("\u{00ff}a"), JsonMode::Default).unwrap();
        assert_eq!(v, Value::Bytes(vec![0xff, b'a']));
        assert_eq!(ty.to_json(&v, JsonMode::Default).unwrap(), json!("\u{00ff}a"));
    }

    #[test]
    fn wrapped_union_json() {
        let opts = ParseOptions::new().wrap_unions(WrapUnions::Always);
        let ty = Type::for_schema_with(&json!(["null", "int", "string"]), &opts).unwrap();
        let v = ty.from_json(&json!({"int": 4}), JsonMode::Avro).unwrap();
        assert_eq!(v, Value::union("int", 4));
        assert_eq!(ty.to_json(&v, JsonMode::Avro).unwrap(), json!({"int": 4}));
        assert_eq!(ty.to_json(&v, JsonMode::Default).unwrap(), json!(4));
        assert_eq!(ty.from_json(&json!(null), JsonMode::Avro).unwrap(), Value::Null);
        assert!(ty.from_json(&json!({"long": 4}), JsonMode::Avro).is_err());
    }

    #[test]
    fn int_out_of_range_is_rejected() {
        let ty = Type::for_schema(&json!("int")).unwrap();
        assert!(ty.from_json(&json!(1u64 << 40), JsonMode::Default).is_err());
    }

    #[test]
    fn default_mode_uses_first_branch() {
        let ty = Type::for_schema(&json!(["int", "string"])).unwrap();
        assert_eq!(ty.from_json(&json!(3), JsonMode::Default).unwrap(), Value::Int(3));
        assert!(ty.from_json(&json!("x"), JsonMode::Default).is_err());
    }
}
