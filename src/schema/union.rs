// Union branch classification: naming, bucketing and value dispatch.

use super::{Graph, PendingKind, TypeId, UnionSchema, Variant};
use crate::error::{AvroErr, AvroResult};
use crate::value::Value;
use std::collections::HashMap;

/// Coarse classes of values an unwrapped union can tell apart without help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Bucket {
    Null,
    Boolean,
    Number,
    String,
    Buffer,
    Array,
    Object,
}

// Bucket of a branch type. `None` means the branch is resolved at runtime.
pub(crate) fn type_bucket(g: &Graph, id: TypeId) -> Option<Bucket> {
    let bucket = match g.variant(id) {
        Variant::Null => Bucket::Null,
        Variant::Boolean => Bucket::Boolean,
        Variant::Int | Variant::Long | Variant::Float | Variant::Double => Bucket::Number,
        Variant::Bytes | Variant::Fixed(_) => Bucket::Buffer,
        Variant::Str | Variant::Enum(_) => Bucket::String,
        Variant::Array { .. } => Bucket::Array,
        Variant::Map { .. } | Variant::Record(_) => Bucket::Object,
        Variant::Pending {
            kind: PendingKind::Record,
            ..
        } => Bucket::Object,
        Variant::Union(_) | Variant::Logical(_) | Variant::Pending { .. } => return None,
    };
    Some(bucket)
}

pub(crate) fn value_bucket(value: &Value) -> Option<Bucket> {
    let bucket = match value {
        Value::Null => Bucket::Null,
        Value::Boolean(_) => Bucket::Boolean,
        Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_) => Bucket::Number,
        Value::Str(_) | Value::Enum(_) => Bucket::String,
        Value::Bytes(_) | Value::Fixed(_) => Bucket::Buffer,
        Value::Array(_) => Bucket::Array,
        Value::Map(_) | Value::Record(_) => Bucket::Object,
        _ => return None,
    };
    Some(bucket)
}

pub(crate) fn branch_name(g: &Graph, id: TypeId) -> String {
    match g.variant(id) {
        Variant::Logical(l) => branch_name(g, l.underlying),
        Variant::Pending { name: Some(n), .. } => n.fullname(),
        Variant::Union(_) => "union".to_string(),
        v => match v.named().and_then(|n| n.name.as_ref()) {
            Some(name) => name.fullname(),
            None => g.type_name(id),
        },
    }
}

// Builds the buckets of an unwrapped union, returning the name of the first
// branch that collides with an earlier one.
pub(crate) fn buckets(
    g: &Graph,
    branches: &[TypeId],
    names: &[String],
) -> Result<(HashMap<Bucket, usize>, Vec<usize>), String> {
    let mut buckets = HashMap::new();
    let mut dynamic = vec![];
    for (idx, branch) in branches.iter().enumerate() {
        match type_bucket(g, *branch) {
            Some(bucket) => {
                if buckets.insert(bucket, idx).is_some() {
                    return Err(names[idx].clone());
                }
            }
            None => dynamic.push(idx),
        }
    }
    Ok((buckets, dynamic))
}

impl UnionSchema {
    // Index of the branch `value` should be written with, `None` if no branch fits.
    pub(crate) fn branch_index(&self, g: &Graph, value: &Value) -> AvroResult<Option<usize>> {
        if self.wrapped {
            return Ok(match value {
                Value::Null => self.lookup.get("null").copied(),
                Value::Union(branch, _) => self.lookup.get(branch.as_str()).copied(),
                _ => None,
            });
        }

        if let Some(idx) = value_bucket(value).and_then(|b| self.buckets.get(&b)) {
            return Ok(Some(*idx));
        }
        let mut found = None;
        for idx in &self.dynamic {
            if crate::validate::is_valid(g, self.branches[*idx], value) {
                if found.is_some() {
                    return Err(AvroErr::AmbiguousConversion);
                }
                found = Some(*idx);
            }
        }
        Ok(found)
    }

    // The value to hand to the selected branch.
    pub(crate) fn payload<'a>(&self, value: &'a Value) -> &'a Value {
        match value {
            Value::Union(_, inner) if self.wrapped => inner,
            other => other,
        }
    }

    // Wraps a branch value read off the wire.
    pub(crate) fn wrap(&self, idx: usize, value: Value) -> Value {
        if self.wrapped && self.names[idx] != "null" {
            Value::Union(self.names[idx].clone(), Box::new(value))
        } else {
            value
        }
    }
}
