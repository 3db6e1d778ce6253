//! Binary encoding of values.

use crate::config::{DEFAULT_BUFFER_SIZE, MAX_SCRATCH_SIZE};
use crate::error::{AvroErr, AvroResult};
use crate::schema::{Graph, Type, TypeId, Variant};
use crate::tap::Tap;
use crate::value::Value;
use std::cell::RefCell;

thread_local! {
    // Shared scratch space for `Type::to_buffer`, grown on demand.
    static SCRATCH: RefCell<Vec<u8>> = RefCell::new(vec![0; DEFAULT_BUFFER_SIZE]);
}

pub(crate) fn write<B: AsRef<[u8]> + AsMut<[u8]>>(
    g: &Graph,
    id: TypeId,
    value: &Value,
    tap: &mut Tap<B>,
) -> AvroResult<()> {
    match (g.variant(id), value) {
        (Variant::Null, Value::Null) => {}
        (Variant::Boolean, Value::Boolean(b)) => tap.write_boolean(*b),
        (Variant::Int, Value::Int(i)) => tap.write_int(*i),
        // int is promotable to long, float or double ---
        (Variant::Long, Value::Int(i)) => tap.write_long(*i as i64),
        (Variant::Float, Value::Int(i)) => tap.write_float(*i as f32),
        (Variant::Double, Value::Int(i)) => tap.write_double(*i as f64),
        // ---
        (Variant::Long, Value::Long(l)) => tap.write_long(*l),
        (Variant::Float, Value::Long(l)) => tap.write_float(*l as f32),
        (Variant::Double, Value::Long(l)) => tap.write_double(*l as f64),
        (Variant::Float, Value::Float(f)) => tap.write_float(*f),
        // float is promotable to double ---
        (Variant::Double, Value::Float(f)) => tap.write_double(*f as f64),
        (Variant::Double, Value::Double(d)) => tap.write_double(*d),
        (Variant::Bytes, Value::Bytes(b)) => tap.write_bytes(b),
        (Variant::Str, Value::Str(s)) => tap.write_string(s),
        (Variant::Fixed(f), Value::Fixed(b)) | (Variant::Fixed(f), Value::Bytes(b))
            if b.len() == f.size =>
        {
            tap.write_fixed(b)
        }
        (Variant::Enum(e), Value::Enum(sym)) | (Variant::Enum(e), Value::Str(sym)) => {
            match e.indices.get(sym) {
                Some(idx) => tap.write_long(*idx as i64),
                None => return Err(g.invalid(id, value)),
            }
        }
        (Variant::Array { items }, Value::Array(values)) => {
            if !values.is_empty() {
                tap.write_long(values.len() as i64);
                for v in values {
                    write(g, *items, v, tap)?;
                }
            }
            // marks end of block
            tap.write_long(0);
        }
        (Variant::Map { values }, Value::Map(map)) => {
            if !map.is_empty() {
                tap.write_long(map.len() as i64);
                for (k, v) in map {
                    tap.write_string(k);
                    write(g, *values, v, tap)?;
                }
            }
            tap.write_long(0);
        }
        (Variant::Record(r), Value::Record(rec)) => {
            for f in &r.fields {
                match rec.fields.get(&f.name).or_else(|| f.default.as_ref()) {
                    Some(v) => write(g, f.ty, v, tap)?,
                    None => return Err(g.invalid(id, value)),
                }
            }
        }
        (Variant::Record(r), Value::Map(map)) => {
            for f in &r.fields {
                match map.get(&f.name).or_else(|| f.default.as_ref()) {
                    Some(v) => write(g, f.ty, v, tap)?,
                    None => return Err(g.invalid(id, value)),
                }
            }
        }
        (Variant::Union(u), v) => match u.branch_index(g, v)? {
            Some(idx) => {
                tap.write_long(idx as i64);
                write(g, u.branches[idx], u.payload(v), tap)?;
            }
            None => return Err(g.invalid(id, v)),
        },
        (Variant::Logical(l), v) => {
            let underlying = l.imp.to_value(v).map_err(|_| g.invalid(id, v))?;
            write(g, l.underlying, &underlying, tap)?;
        }
        (_, v) => return Err(g.invalid(id, v)),
    }
    Ok(())
}

// Writes into `buf`, growing it to the exact size required if the first attempt
// runs out of space. Returns the encoded length.
fn write_growing(g: &Graph, id: TypeId, value: &Value, buf: &mut Vec<u8>) -> AvroResult<usize> {
    let mut tap = Tap::new(&mut buf[..]);
    write(g, id, value, &mut tap)?;
    let needed = tap.pos();
    if tap.is_valid() {
        return Ok(needed);
    }
    buf.resize(needed, 0);
    let mut tap = Tap::new(&mut buf[..]);
    write(g, id, value, &mut tap)?;
    tap.check()?;
    Ok(needed)
}

impl Type {
    /// Encodes `value` into a fresh buffer.
    ///
    /// ```
    /// use avrotype::{Type, Value};
    /// use std::str::FromStr;
    ///
    /// let ty = Type::from_str(r#""long""#).unwrap();
    /// assert_eq!(ty.to_buffer(&Value::Long(-3)).unwrap(), vec![0x05]);
    /// ```
    pub fn to_buffer(&self, value: &Value) -> AvroResult<Vec<u8>> {
        SCRATCH.with(|scratch| match scratch.try_borrow_mut() {
            Ok(mut scratch) => {
                let len = write_growing(&self.graph, self.id, value, &mut scratch)?;
                let out = scratch[..len].to_vec();
                if scratch.len() > MAX_SCRATCH_SIZE {
                    scratch.truncate(DEFAULT_BUFFER_SIZE);
                    scratch.shrink_to_fit();
                }
                Ok(out)
            }
            // Re-entered from a logical type conversion.
            Err(_) => {
                let mut buf = vec![0; DEFAULT_BUFFER_SIZE];
                let len = write_growing(&self.graph, self.id, value, &mut buf)?;
                buf.truncate(len);
                Ok(buf)
            }
        })
    }

    /// Encodes `value` using the caller's buffer as scratch space, growing it when
    /// needed. Returns the encoded length; the encoding is `buf[..len]`.
    pub fn to_buffer_with(&self, value: &Value, buf: &mut Vec<u8>) -> AvroResult<usize> {
        if buf.is_empty() {
            buf.resize(DEFAULT_BUFFER_SIZE, 0);
        }
        write_growing(&self.graph, self.id, value, buf)
    }

    /// Writes `value` at the tap's position. Running out of space invalidates the
    /// tap instead of failing.
    pub fn write<B: AsRef<[u8]> + AsMut<[u8]>>(&self, value: &Value, tap: &mut Tap<B>) -> AvroResult<()> {
        write(&self.graph, self.id, value, tap)
    }

    /// Encodes `value` into `buf` starting at `pos`, returning the position after
    /// the encoding. Fails with [`AvroErr::BufferOverflow`] carrying the number of
    /// missing bytes when the value does not fit.
    pub fn encode(&self, value: &Value, buf: &mut [u8], pos: usize) -> AvroResult<usize> {
        let len = buf.len();
        let mut tap = Tap::with_pos(buf, pos);
        write(&self.graph, self.id, value, &mut tap)?;
        if tap.is_valid() {
            Ok(tap.pos())
        } else {
            Err(AvroErr::BufferOverflow {
                needed: tap.pos() - len,
            })
        }
    }
}
