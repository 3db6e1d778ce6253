//! Binary decoding and skipping of values.
//!
//! Reads never fail on truncated input: the tap is left invalid and the caller
//! checks it once the whole value has been read.

use crate::error::{AvroErr, AvroResult};
use crate::schema::{Graph, Type, TypeId, Variant};
use crate::tap::Tap;
use crate::value::{Map, Record, Value};
use std::convert::TryFrom;

pub(crate) fn read<B: AsRef<[u8]>>(g: &Graph, id: TypeId, tap: &mut Tap<B>) -> AvroResult<Value> {
    let value = match g.variant(id) {
        Variant::Null => Value::Null,
        Variant::Boolean => Value::Boolean(tap.read_boolean()),
        Variant::Int => Value::Int(tap.read_int()),
        Variant::Long => Value::Long(tap.read_long()),
        Variant::Float => Value::Float(tap.read_float()),
        Variant::Double => Value::Double(tap.read_double()),
        Variant::Bytes => Value::Bytes(tap.read_bytes()),
        Variant::Str => Value::Str(tap.read_string()?),
        Variant::Fixed(f) => Value::Fixed(tap.read_fixed(f.size)),
        Variant::Enum(e) => {
            let idx = tap.read_long();
            match usize::try_from(idx).ok().and_then(|i| e.symbols.get(i)) {
                Some(symbol) => Value::Enum(symbol.clone()),
                None if !tap.is_valid() => Value::Null,
                None => return Err(AvroErr::InvalidEnumIndex(idx)),
            }
        }
        Variant::Array { items } => {
            let mut values = vec![];
            loop {
                let n = tap.read_block_len();
                if n <= 0 || !tap.is_valid() {
                    break;
                }
                for _ in 0..n {
                    values.push(read(g, *items, tap)?);
                    if !tap.is_valid() {
                        return Ok(Value::Array(values));
                    }
                }
            }
            Value::Array(values)
        }
        Variant::Map { values } => {
            let mut map = Map::new();
            loop {
                let n = tap.read_block_len();
                if n <= 0 || !tap.is_valid() {
                    break;
                }
                for _ in 0..n {
                    let key = tap.read_string()?;
                    let value = read(g, *values, tap)?;
                    if !tap.is_valid() {
                        return Ok(Value::Map(map));
                    }
                    map.insert(key, value);
                }
            }
            Value::Map(map)
        }
        Variant::Record(r) => {
            let mut rec = Record::with_capacity(&r.fullname(), r.fields.len());
            for f in &r.fields {
                rec.fields.insert(f.name.clone(), read(g, f.ty, tap)?);
            }
            Value::Record(rec)
        }
        Variant::Union(u) => {
            let idx = tap.read_long();
            match usize::try_from(idx).ok().filter(|i| *i < u.branches.len()) {
                Some(i) => {
                    let value = read(g, u.branches[i], tap)?;
                    u.wrap(i, value)
                }
                None if !tap.is_valid() => Value::Null,
                None => return Err(AvroErr::InvalidUnionIndex(idx)),
            }
        }
        Variant::Logical(l) => {
            let value = read(g, l.underlying, tap)?;
            if !tap.is_valid() {
                return Ok(value);
            }
            l.imp.from_value(value)?
        }
        Variant::Pending { name, .. } => {
            return Err(AvroErr::UndefinedTypeName(
                name.as_ref().map(|n| n.fullname()).unwrap_or_default(),
            ))
        }
    };
    Ok(value)
}

pub(crate) fn skip<B: AsRef<[u8]>>(g: &Graph, id: TypeId, tap: &mut Tap<B>) -> AvroResult<()> {
    match g.variant(id) {
        Variant::Null => {}
        Variant::Boolean => tap.skip_boolean(),
        Variant::Int => tap.skip_int(),
        Variant::Long => tap.skip_long(),
        Variant::Float => tap.skip_float(),
        Variant::Double => tap.skip_double(),
        Variant::Bytes => tap.skip_bytes(),
        Variant::Str => tap.skip_string(),
        Variant::Fixed(f) => tap.skip_fixed(f.size),
        Variant::Enum(_) => tap.skip_long(),
        Variant::Array { items } => skip_blocks(tap, |tap| skip(g, *items, tap))?,
        Variant::Map { values } => skip_blocks(tap, |tap| {
            tap.skip_string();
            skip(g, *values, tap)
        })?,
        Variant::Record(r) => {
            for f in &r.fields {
                skip(g, f.ty, tap)?;
            }
        }
        Variant::Union(u) => {
            let idx = tap.read_long();
            match usize::try_from(idx).ok().filter(|i| *i < u.branches.len()) {
                Some(i) => skip(g, u.branches[i], tap)?,
                None if !tap.is_valid() => {}
                None => return Err(AvroErr::InvalidUnionIndex(idx)),
            }
        }
        Variant::Logical(l) => skip(g, l.underlying, tap)?,
        Variant::Pending { .. } => return read(g, id, tap).map(|_| ()),
    }
    Ok(())
}

// Blocks with a negative count carry their size in bytes and are jumped over.
fn skip_blocks<B, F>(tap: &mut Tap<B>, mut skip_item: F) -> AvroResult<()>
where
    B: AsRef<[u8]>,
    F: FnMut(&mut Tap<B>) -> AvroResult<()>,
{
    loop {
        let n = tap.read_long();
        if n == 0 || !tap.is_valid() {
            return Ok(());
        }
        if n < 0 {
            let size = tap.read_long();
            if size < 0 {
                return Err(AvroErr::NegativeLength(size));
            }
            tap.skip_fixed(size as usize);
        } else {
            for _ in 0..n {
                skip_item(tap)?;
                if !tap.is_valid() {
                    return Ok(());
                }
            }
        }
    }
}

impl Type {
    /// Decodes a value that must span the whole buffer.
    pub fn from_buffer(&self, buf: &[u8]) -> AvroResult<Value> {
        let mut tap = Tap::new(buf);
        let value = read(&self.graph, self.id, &mut tap)?;
        tap.check()?;
        if tap.pos() < buf.len() {
            return Err(AvroErr::TrailingData(buf.len() - tap.pos()));
        }
        Ok(value)
    }

    /// Decodes a value starting at `pos`. Returns the value and the position after
    /// it, or `None` if the buffer ends before the value does.
    pub fn decode(&self, buf: &[u8], pos: usize) -> AvroResult<Option<(Value, usize)>> {
        let mut tap = Tap::with_pos(buf, pos);
        let value = read(&self.graph, self.id, &mut tap)?;
        if tap.is_valid() {
            Ok(Some((value, tap.pos())))
        } else {
            Ok(None)
        }
    }

    /// Reads one value off `tap`. The tap is left invalid if it ran out of input.
    pub fn read<B: AsRef<[u8]>>(&self, tap: &mut Tap<B>) -> AvroResult<Value> {
        read(&self.graph, self.id, tap)
    }

    /// Advances `tap` past one encoded value.
    pub fn skip<B: AsRef<[u8]>>(&self, tap: &mut Tap<B>) -> AvroResult<()> {
        skip(&self.graph, self.id, tap)
    }
}
