//! Avro sort order, on values and on their encodings.
//!
//! Both agree: comparing two valid values gives the same result as comparing
//! their encodings with the same type.

use crate::error::{AvroErr, AvroResult};
use crate::schema::{Graph, Order, Type, TypeId, Variant};
use crate::tap::Tap;
use crate::util::compare_f64;
use crate::value::Value;
use std::cmp::Ordering;

fn as_long(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i as i64),
        Value::Long(l) => Some(*l),
        _ => None,
    }
}

// Same casts as the float writer.
fn as_float(v: &Value) -> Option<f32> {
    match v {
        Value::Int(i) => Some(*i as f32),
        Value::Long(l) => Some(*l as f32),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn as_double(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Long(l) => Some(*l as f64),
        Value::Float(f) => Some(*f as f64),
        Value::Double(d) => Some(*d),
        _ => None,
    }
}

fn as_buffer(v: &Value) -> Option<&[u8]> {
    match v {
        Value::Bytes(b) | Value::Fixed(b) => Some(b),
        Value::Str(s) => Some(s.as_bytes()),
        _ => None,
    }
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Record(rec) => rec.get(name),
        Value::Map(m) => m.get(name),
        _ => None,
    }
}

pub(crate) fn compare(g: &Graph, id: TypeId, a: &Value, b: &Value) -> AvroResult<Ordering> {
    let invalid = |v: &Value| g.invalid(id, v);
    let ord = match g.variant(id) {
        Variant::Null => match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, other) | (other, _) => return Err(invalid(other)),
        },
        Variant::Boolean => match (a, b) {
            (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
            (Value::Boolean(_), other) | (other, _) => return Err(invalid(other)),
        },
        Variant::Int | Variant::Long => {
            let x = as_long(a).ok_or_else(|| invalid(a))?;
            let y = as_long(b).ok_or_else(|| invalid(b))?;
            x.cmp(&y)
        }
        Variant::Float => {
            let x = as_float(a).ok_or_else(|| invalid(a))?;
            let y = as_float(b).ok_or_else(|| invalid(b))?;
            compare_f64(x as f64, y as f64)
        }
        Variant::Double => {
            let x = as_double(a).ok_or_else(|| invalid(a))?;
            let y = as_double(b).ok_or_else(|| invalid(b))?;
            compare_f64(x, y)
        }
        Variant::Bytes | Variant::Str | Variant::Fixed(_) => {
            let x = as_buffer(a).ok_or_else(|| invalid(a))?;
            let y = as_buffer(b).ok_or_else(|| invalid(b))?;
            x.cmp(y)
        }
        Variant::Enum(e) => {
            let index = |v: &Value| match v {
                Value::Enum(s) | Value::Str(s) => e.indices.get(s).copied(),
                _ => None,
            };
            let x = index(a).ok_or_else(|| invalid(a))?;
            let y = index(b).ok_or_else(|| invalid(b))?;
            x.cmp(&y)
        }
        Variant::Array { items } => match (a, b) {
            (Value::Array(xs), Value::Array(ys)) => {
                for (x, y) in xs.iter().zip(ys) {
                    let ord = compare(g, *items, x, y)?;
                    if ord != Ordering::Equal {
                        return Ok(ord);
                    }
                }
                xs.len().cmp(&ys.len())
            }
            (Value::Array(_), other) | (other, _) => return Err(invalid(other)),
        },
        Variant::Map { .. } => return Err(AvroErr::MapsNotComparable),
        Variant::Record(r) => {
            for f in &r.fields {
                if f.order == Order::Ignore {
                    continue;
                }
                let x = field(a, &f.name)
                    .or_else(|| f.default.as_ref())
                    .ok_or_else(|| invalid(a))?;
                let y = field(b, &f.name)
                    .or_else(|| f.default.as_ref())
                    .ok_or_else(|| invalid(b))?;
                let ord = f.order.apply(compare(g, f.ty, x, y)?);
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ordering::Equal
        }
        Variant::Union(u) => {
            let x = u.branch_index(g, a)?.ok_or_else(|| invalid(a))?;
            let y = u.branch_index(g, b)?.ok_or_else(|| invalid(b))?;
            match x.cmp(&y) {
                Ordering::Equal => compare(g, u.branches[x], u.payload(a), u.payload(b))?,
                ord => ord,
            }
        }
        Variant::Logical(l) => {
            let x = l.imp.to_value(a)?;
            let y = l.imp.to_value(b)?;
            compare(g, l.underlying, &x, &y)?
        }
        Variant::Pending { .. } => return Err(invalid(a)),
    };
    Ok(ord)
}

pub(crate) fn match_taps<B: AsRef<[u8]>, C: AsRef<[u8]>>(
    g: &Graph,
    id: TypeId,
    t1: &mut Tap<B>,
    t2: &mut Tap<C>,
) -> AvroResult<Ordering> {
    let ord = match g.variant(id) {
        Variant::Null => Ordering::Equal,
        Variant::Boolean => t1.match_boolean(t2),
        Variant::Int => t1.match_int(t2),
        Variant::Long | Variant::Enum(_) => t1.match_long(t2),
        Variant::Float => t1.match_float(t2),
        Variant::Double => t1.match_double(t2),
        Variant::Bytes => t1.match_bytes(t2),
        Variant::Str => t1.match_string(t2),
        Variant::Fixed(f) => t1.match_fixed(t2, f.size),
        Variant::Array { items } => {
            let mut n1 = t1.read_block_len();
            let mut n2 = t2.read_block_len();
            while n1 > 0 && n2 > 0 && t1.is_valid() && t2.is_valid() {
                let ord = match_taps(g, *items, t1, t2)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
                n1 -= 1;
                if n1 == 0 {
                    n1 = t1.read_block_len();
                }
                n2 -= 1;
                if n2 == 0 {
                    n2 = t2.read_block_len();
                }
            }
            n1.cmp(&n2)
        }
        Variant::Map { .. } => return Err(AvroErr::MapsNotComparable),
        Variant::Record(r) => {
            for f in &r.fields {
                if f.order == Order::Ignore {
                    crate::reader::skip(g, f.ty, t1)?;
                    crate::reader::skip(g, f.ty, t2)?;
                    continue;
                }
                let ord = f.order.apply(match_taps(g, f.ty, t1, t2)?);
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ordering::Equal
        }
        Variant::Union(u) => {
            let i1 = t1.read_long();
            let i2 = t2.read_long();
            if i1 != i2 {
                return Ok(i1.cmp(&i2));
            }
            match u.branches.get(i1 as usize) {
                Some(branch) if i1 >= 0 => match_taps(g, *branch, t1, t2)?,
                _ if !(t1.is_valid() && t2.is_valid()) => Ordering::Equal,
                _ => return Err(AvroErr::InvalidUnionIndex(i1)),
            }
        }
        Variant::Logical(l) => match_taps(g, l.underlying, t1, t2)?,
        Variant::Pending { .. } => Ordering::Equal,
    };
    Ok(ord)
}

impl Type {
    /// Compares two values according to Avro's sort order.
    pub fn compare(&self, a: &Value, b: &Value) -> AvroResult<Ordering> {
        compare(&self.graph, self.id, a, b)
    }

    /// Compares two encoded values without decoding them.
    ///
    /// ```
    /// use avrotype::Type;
    /// use std::cmp::Ordering;
    /// use std::str::FromStr;
    ///
    /// let ty = Type::from_str(r#""int""#).unwrap();
    /// assert_eq!(ty.compare_buffers(&[0x01], &[0x02]).unwrap(), Ordering::Less);
    /// ```
    pub fn compare_buffers(&self, a: &[u8], b: &[u8]) -> AvroResult<Ordering> {
        let mut t1 = Tap::new(a);
        let mut t2 = Tap::new(b);
        let ord = match_taps(&self.graph, self.id, &mut t1, &mut t2)?;
        t1.check()?;
        t2.check()?;
        Ok(ord)
    }
}
