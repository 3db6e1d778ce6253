//! Value validation against a type.
//!
//! Validation has a fast path that answers yes or no, and a reporting path that
//! walks the whole value and calls a hook for every invalid node along with the
//! path of field names, map keys and array indices leading to it.

use crate::schema::{Graph, Type, TypeId, Variant};
use crate::value::Value;
use std::sync::Arc;

/// Called for each invalid node with its path, the value and the expected type.
pub type ErrorHook<'h> = &'h mut dyn FnMut(&[String], &Value, &Type);

/// Options for [`Type::is_valid_with`].
#[derive(Default)]
pub struct ValidateOptions<'h> {
    /// Reject record values with keys that are not fields of the record.
    pub no_undeclared_fields: bool,
    /// Called for every invalid node; switches validation to the reporting path.
    pub error_hook: Option<ErrorHook<'h>>,
}

// `Some(validity)` for types without children.
fn leaf_valid(variant: &Variant, value: &Value) -> Option<bool> {
    let valid = match (variant, value) {
        (Variant::Null, Value::Null) => true,
        (Variant::Boolean, Value::Boolean(_)) => true,
        (Variant::Int, Value::Int(_)) => true,
        (Variant::Long, Value::Int(_)) | (Variant::Long, Value::Long(_)) => true,
        (Variant::Float, Value::Int(_))
        | (Variant::Float, Value::Long(_))
        | (Variant::Float, Value::Float(_)) => true,
        (Variant::Double, Value::Int(_))
        | (Variant::Double, Value::Long(_))
        | (Variant::Double, Value::Float(_))
        | (Variant::Double, Value::Double(_)) => true,
        (Variant::Bytes, Value::Bytes(_)) => true,
        (Variant::Str, Value::Str(_)) => true,
        (Variant::Fixed(f), Value::Fixed(b)) | (Variant::Fixed(f), Value::Bytes(b)) => {
            b.len() == f.size
        }
        (Variant::Enum(e), Value::Enum(s)) | (Variant::Enum(e), Value::Str(s)) => {
            e.indices.contains_key(s)
        }
        (Variant::Array { .. }, _)
        | (Variant::Map { .. }, _)
        | (Variant::Record(_), _)
        | (Variant::Union(_), _)
        | (Variant::Logical(_), _) => return None,
        _ => false,
    };
    Some(valid)
}

pub(crate) fn is_valid(g: &Graph, id: TypeId, value: &Value) -> bool {
    check_fast(g, id, value, false)
}

fn check_fast(g: &Graph, id: TypeId, value: &Value, no_undeclared: bool) -> bool {
    let variant = g.variant(id);
    if let Some(valid) = leaf_valid(variant, value) {
        return valid;
    }
    match (variant, value) {
        (Variant::Array { items }, Value::Array(vs)) => {
            vs.iter().all(|v| check_fast(g, *items, v, no_undeclared))
        }
        (Variant::Map { values }, Value::Map(m)) => {
            m.values().all(|v| check_fast(g, *values, v, no_undeclared))
        }
        (Variant::Record(r), Value::Record(rec)) => {
            (!no_undeclared || rec.fields.keys().all(|k| r.lookup.contains_key(k)))
                && r.fields.iter().all(|f| match rec.fields.get(&f.name) {
                    Some(v) => check_fast(g, f.ty, v, no_undeclared),
                    None => f.default.is_some(),
                })
        }
        (Variant::Record(r), Value::Map(m)) => {
            (!no_undeclared || m.keys().all(|k| r.lookup.contains_key(k)))
                && r.fields.iter().all(|f| match m.get(&f.name) {
                    Some(v) => check_fast(g, f.ty, v, no_undeclared),
                    None => f.default.is_some(),
                })
        }
        (Variant::Union(u), v) => match u.branch_index(g, v) {
            Ok(Some(idx)) => check_fast(g, u.branches[idx], u.payload(v), no_undeclared),
            _ => false,
        },
        (Variant::Logical(l), v) => {
            l.imp.is_valid(v)
                && match l.imp.to_value(v) {
                    Ok(under) => check_fast(g, l.underlying, &under, no_undeclared),
                    Err(_) => false,
                }
        }
        _ => false,
    }
}

// Reporting path: visits every invalid node.
struct Checker<'a, 'h> {
    graph: &'a Arc<Graph>,
    no_undeclared_fields: bool,
    hook: ErrorHook<'h>,
    path: Vec<String>,
}

impl<'a, 'h> Checker<'a, 'h> {
    fn report(&mut self, id: TypeId, value: &Value) -> bool {
        let ty = Type::new(Arc::clone(self.graph), id);
        (self.hook)(&self.path, value, &ty);
        false
    }

    fn nested(&mut self, segment: String, id: TypeId, value: &Value) -> bool {
        self.path.push(segment);
        let valid = self.check(id, value);
        self.path.pop();
        valid
    }

    fn check_fields<'v>(
        &mut self,
        id: TypeId,
        value: &Value,
        lookup: impl Fn(&str) -> Option<&'v Value>,
        keys: Vec<&String>,
    ) -> bool {
        let g: &'a Graph = self.graph;
        let r = match g.variant(id) {
            Variant::Record(r) => r,
            _ => return self.report(id, value),
        };
        let mut valid = true;
        if self.no_undeclared_fields && keys.iter().any(|k| !r.lookup.contains_key(*k)) {
            valid = self.report(id, value);
        }
        for f in &r.fields {
            match lookup(&f.name) {
                Some(v) => valid &= self.nested(f.name.clone(), f.ty, v),
                None if f.default.is_some() => {}
                None => {
                    self.path.push(f.name.clone());
                    valid = self.report(f.ty, &Value::Null);
                    self.path.pop();
                }
            }
        }
        valid
    }

    fn check(&mut self, id: TypeId, value: &Value) -> bool {
        let g: &'a Graph = self.graph;
        let variant = g.variant(id);
        if let Some(valid) = leaf_valid(variant, value) {
            return valid || self.report(id, value);
        }
        match (variant, value) {
            (Variant::Array { items }, Value::Array(vs)) => {
                let mut valid = true;
                for (idx, v) in vs.iter().enumerate() {
                    valid &= self.nested(idx.to_string(), *items, v);
                }
                valid
            }
            (Variant::Map { values }, Value::Map(m)) => {
                let mut valid = true;
                for (k, v) in m {
                    valid &= self.nested(k.clone(), *values, v);
                }
                valid
            }
            (Variant::Record(_), Value::Record(rec)) => {
                self.check_fields(id, value, |k| rec.fields.get(k), rec.fields.keys().collect())
            }
            (Variant::Record(_), Value::Map(m)) => {
                self.check_fields(id, value, |k| m.get(k), m.keys().collect())
            }
            (Variant::Union(u), v) => match u.branch_index(g, v) {
                Ok(Some(idx)) if u.wrapped && !matches!(v, Value::Null) => {
                    self.nested(u.names[idx].clone(), u.branches[idx], u.payload(v))
                }
                Ok(Some(idx)) => self.check(u.branches[idx], v),
                _ => self.report(id, v),
            },
            (Variant::Logical(_), v) => {
                check_fast(g, id, v, self.no_undeclared_fields) || self.report(id, v)
            }
            (_, v) => self.report(id, v),
        }
    }
}

impl Type {
    /// Checks whether `value` can be written with this type.
    pub fn is_valid(&self, value: &Value) -> bool {
        is_valid(&self.graph, self.id, value)
    }

    /// Validates `value`, reporting every invalid node to the options' hook.
    ///
    /// ```
    /// use avrotype::{Type, Value, ValidateOptions};
    /// use std::str::FromStr;
    ///
    /// let ty = Type::from_str(r#"{"type": "array", "items": "int"}"#).unwrap();
    /// let mut paths = vec![];
    /// let mut hook = |path: &[String], _: &Value, _: &Type| paths.push(path.join("."));
    /// let valid = ty.is_valid_with(
    ///     &Value::Array(vec![Value::Int(1), Value::Str("x".into())]),
    ///     ValidateOptions { no_undeclared_fields: false, error_hook: Some(&mut hook) },
    /// );
    /// assert!(!valid);
    /// assert_eq!(paths, vec!["1".to_string()]);
    /// ```
    pub fn is_valid_with(&self, value: &Value, opts: ValidateOptions<'_>) -> bool {
        match opts.error_hook {
            None => check_fast(&self.graph, self.id, value, opts.no_undeclared_fields),
            Some(hook) => {
                let mut checker = Checker {
                    graph: &self.graph,
                    no_undeclared_fields: opts.no_undeclared_fields,
                    hook,
                    path: vec![],
                };
                checker.check(self.id, value)
            }
        }
    }
}
