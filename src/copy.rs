//! Deep copies of values, optionally coercing them to a type's representation.

use crate::error::AvroResult;
use crate::schema::{Graph, Type, TypeId, Variant};
use crate::validate::is_valid;
use crate::value::{Map, Record, Value};

/// Options for [`Type::clone_value_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneOptions {
    /// Accept arrays of integers in `0..=255` where bytes or fixed values are expected.
    pub coerce_buffers: bool,
    /// Wrap bare values of wrapped unions in the first branch they are valid for.
    pub wrap_unions: bool,
    /// Accept wrapped values for unwrapped unions.
    pub unwrap_unions: bool,
    /// Leave out record fields that are missing and have no default.
    pub skip_missing_fields: bool,
}

fn coerce_buffer(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Int(i) if (0..=255).contains(i) => Some(*i as u8),
                Value::Long(l) if (0..=255).contains(l) => Some(*l as u8),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

pub(crate) fn copy(g: &Graph, id: TypeId, value: &Value, opts: &CloneOptions) -> AvroResult<Value> {
    let invalid = || g.invalid(id, value);
    let copied = match (g.variant(id), value) {
        (Variant::Null, Value::Null) => Value::Null,
        (Variant::Boolean, Value::Boolean(b)) => Value::Boolean(*b),
        (Variant::Int, Value::Int(i)) => Value::Int(*i),
        (Variant::Long, Value::Int(i)) => Value::Long(*i as i64),
        (Variant::Long, Value::Long(l)) => Value::Long(*l),
        (Variant::Float, Value::Int(i)) => Value::Float(*i as f32),
        (Variant::Float, Value::Long(l)) => Value::Float(*l as f32),
        (Variant::Float, Value::Float(f)) => Value::Float(*f),
        (Variant::Double, Value::Int(i)) => Value::Double(*i as f64),
        (Variant::Double, Value::Long(l)) => Value::Double(*l as f64),
        (Variant::Double, Value::Float(f)) => Value::Double(*f as f64),
        (Variant::Double, Value::Double(d)) => Value::Double(*d),
        (Variant::Str, Value::Str(s)) => Value::Str(s.clone()),
        (Variant::Bytes, Value::Bytes(b)) => Value::Bytes(b.clone()),
        (Variant::Bytes, v) if opts.coerce_buffers => {
            Value::Bytes(coerce_buffer(v).ok_or_else(invalid)?)
        }
        (Variant::Fixed(f), Value::Fixed(b)) | (Variant::Fixed(f), Value::Bytes(b))
            if b.len() == f.size =>
        {
            Value::Fixed(b.clone())
        }
        (Variant::Fixed(f), v) if opts.coerce_buffers => match coerce_buffer(v) {
            Some(b) if b.len() == f.size => Value::Fixed(b),
            _ => return Err(invalid()),
        },
        (Variant::Enum(e), Value::Enum(s)) | (Variant::Enum(e), Value::Str(s))
            if e.indices.contains_key(s) =>
        {
            Value::Enum(s.clone())
        }
        (Variant::Array { items }, Value::Array(vs)) => Value::Array(
            vs.iter()
                .map(|v| copy(g, *items, v, opts))
                .collect::<AvroResult<_>>()?,
        ),
        (Variant::Map { values }, Value::Map(m)) => {
            let mut map = Map::with_capacity(m.len());
            for (k, v) in m {
                map.insert(k.clone(), copy(g, *values, v, opts)?);
            }
            Value::Map(map)
        }
        (Variant::Record(r), Value::Record(_)) | (Variant::Record(r), Value::Map(_)) => {
            let mut rec = Record::with_capacity(&r.fullname(), r.fields.len());
            for f in &r.fields {
                let field = match value {
                    Value::Record(src) => src.get(&f.name),
                    Value::Map(src) => src.get(&f.name),
                    _ => None,
                };
                match field {
                    Some(v) => {
                        rec.fields.insert(f.name.clone(), copy(g, f.ty, v, opts)?);
                    }
                    None => match &f.default {
                        Some(default) => {
                            rec.fields.insert(f.name.clone(), default.clone());
                        }
                        None if opts.skip_missing_fields => {}
                        None => return Err(invalid()),
                    },
                }
            }
            Value::Record(rec)
        }
        (Variant::Union(u), v) => {
            if u.wrapped {
                match v {
                    Value::Null if u.lookup.contains_key("null") => Value::Null,
                    Value::Union(branch, inner) => {
                        let idx = *u.lookup.get(branch).ok_or_else(invalid)?;
                        u.wrap(idx, copy(g, u.branches[idx], inner, opts)?)
                    }
                    bare if opts.wrap_unions => {
                        let idx = u
                            .branches
                            .iter()
                            .position(|b| is_valid(g, *b, bare))
                            .ok_or_else(invalid)?;
                        u.wrap(idx, copy(g, u.branches[idx], bare, opts)?)
                    }
                    _ => return Err(invalid()),
                }
            } else {
                match v {
                    Value::Union(branch, inner) if opts.unwrap_unions => {
                        let idx = *u.lookup.get(branch).ok_or_else(invalid)?;
                        copy(g, u.branches[idx], inner, opts)?
                    }
                    bare => {
                        let idx = u.branch_index(g, bare)?.ok_or_else(invalid)?;
                        copy(g, u.branches[idx], bare, opts)?
                    }
                }
            }
        }
        (Variant::Logical(l), v) => {
            let underlying = copy(g, l.underlying, &l.imp.to_value(v)?, opts)?;
            l.imp.from_value(underlying)?
        }
        _ => return Err(invalid()),
    };
    Ok(copied)
}

impl Type {
    /// Deep copies `value` through an encode/decode round trip, yielding the
    /// value in this type's canonical representation.
    pub fn clone_value(&self, value: &Value) -> AvroResult<Value> {
        let buf = self.to_buffer(value)?;
        self.from_buffer(&buf)
    }

    /// Deep copies `value` field by field, applying `opts`.
    ///
    /// ```
    /// use avrotype::{CloneOptions, Type, Value};
    /// use std::str::FromStr;
    ///
    /// let ty = Type::from_str(r#""bytes""#).unwrap();
    /// let opts = CloneOptions { coerce_buffers: true, ..Default::default() };
    /// let v = ty.clone_value_with(&Value::Array(vec![Value::Int(1), Value::Int(255)]), &opts);
    /// assert_eq!(v.unwrap(), Value::Bytes(vec![1, 255]));
    /// ```
    pub fn clone_value_with(&self, value: &Value, opts: &CloneOptions) -> AvroResult<Value> {
        copy(&self.graph, self.id, value, opts)
    }
}
