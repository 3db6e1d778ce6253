//! Random value generation, for tests and benchmarks.

use crate::config::{
    RANDOM_BYTES_LEN, RANDOM_COLLECTION_LEN, RANDOM_FLOAT_BOUND, RANDOM_INT_BOUND, RANDOM_KEY_LEN,
};
use crate::error::{AvroErr, AvroResult};
use crate::schema::{Graph, Type, TypeId, Variant};
use crate::value::{Map, Record, Value};
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};

/// A small deterministic 64-bit linear congruential generator.
///
/// ```
/// use avrotype::Lcg;
/// use rand::RngCore;
///
/// let (mut a, mut b) = (Lcg::new(7), Lcg::new(7));
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    // Knuth's MMIX constants.
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    /// A generator starting from `seed`.
    pub fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Lcg::MULTIPLIER)
            .wrapping_add(Lcg::INCREMENT);
        // low bits of an LCG have short periods
        (self.state >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn random_string<R: Rng + ?Sized>(rng: &mut R, bound: usize) -> String {
    let len = rng.gen_range(0..bound);
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

pub(crate) fn random<R: Rng + ?Sized>(g: &Graph, id: TypeId, rng: &mut R) -> AvroResult<Value> {
    let value = match g.variant(id) {
        Variant::Null => Value::Null,
        Variant::Boolean => Value::Boolean(rng.gen()),
        Variant::Int => Value::Int(rng.gen_range(0..RANDOM_INT_BOUND)),
        Variant::Long => Value::Long(rng.gen()),
        Variant::Float => Value::Float(rng.gen::<f32>() * RANDOM_FLOAT_BOUND),
        Variant::Double => Value::Double(rng.gen()),
        Variant::Bytes => {
            let mut bytes = vec![0; rng.gen_range(0..RANDOM_BYTES_LEN)];
            rng.fill_bytes(&mut bytes);
            Value::Bytes(bytes)
        }
        Variant::Str => Value::Str(random_string(rng, RANDOM_BYTES_LEN)),
        Variant::Fixed(f) => {
            let mut bytes = vec![0; f.size];
            rng.fill_bytes(&mut bytes);
            Value::Fixed(bytes)
        }
        Variant::Enum(e) => {
            if e.symbols.is_empty() {
                return Err(AvroErr::InvalidEnumIndex(0));
            }
            Value::Enum(e.symbols[rng.gen_range(0..e.symbols.len())].clone())
        }
        Variant::Array { items } => {
            let len = rng.gen_range(0..RANDOM_COLLECTION_LEN);
            Value::Array(
                (0..len)
                    .map(|_| random(g, *items, rng))
                    .collect::<AvroResult<_>>()?,
            )
        }
        Variant::Map { values } => {
            let len = rng.gen_range(0..RANDOM_COLLECTION_LEN);
            let mut map = Map::with_capacity(len);
            for _ in 0..len {
                let key = random_string(rng, RANDOM_KEY_LEN);
                map.insert(key, random(g, *values, rng)?);
            }
            Value::Map(map)
        }
        Variant::Record(r) => {
            let mut rec = Record::with_capacity(&r.fullname(), r.fields.len());
            for f in &r.fields {
                rec.fields.insert(f.name.clone(), random(g, f.ty, rng)?);
            }
            Value::Record(rec)
        }
        Variant::Union(u) => {
            if u.branches.is_empty() {
                return Err(AvroErr::InvalidUnionIndex(0));
            }
            let idx = rng.gen_range(0..u.branches.len());
            let value = random(g, u.branches[idx], rng)?;
            u.wrap(idx, value)
        }
        Variant::Logical(l) => {
            let drawn = l.imp.random(&mut &mut *rng);
            match drawn {
                Some(value) => value,
                None => {
                    let value = random(g, l.underlying, rng)?;
                    l.imp.from_value(value)?
                }
            }
        }
        Variant::Pending { .. } => return Err(g.invalid(id, &Value::Null)),
    };
    Ok(value)
}

impl Type {
    /// Generates a random valid value, using the thread local generator.
    pub fn random(&self) -> AvroResult<Value> {
        self.random_with(&mut rand::thread_rng())
    }

    /// Generates a random valid value from `rng`.
    pub fn random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> AvroResult<Value> {
        random(&self.graph, self.id, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::Lcg;
    use crate::Type;
    use serde_json::json;

    #[test]
    fn random_values_are_valid() {
        let ty = Type::for_schema(&json!({
            "type": "record",
            "name": "R",
            "fields": [
                {"name": "a", "type": {"type": "array", "items": "string"}},
                {"name": "m", "type": {"type": "map", "values": ["null", "double"]}},
                {"name": "e", "type": {"type": "enum", "name": "E", "symbols": ["X", "Y"]}},
                {"name": "f", "type": {"type": "fixed", "name": "F", "size": 3}},
                {"name": "u", "type": ["int", "long"]}
            ]
        }))
        .unwrap();
        let mut rng = Lcg::new(42);
        for _ in 0..50 {
            let v = ty.random_with(&mut rng).unwrap();
            assert!(ty.is_valid(&v));
            assert_eq!(ty.from_buffer(&ty.to_buffer(&v).unwrap()).unwrap(), v);
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let ty = Type::for_schema(&json!({"type": "array", "items": "long"})).unwrap();
        let a = ty.random_with(&mut Lcg::new(1)).unwrap();
        let b = ty.random_with(&mut Lcg::new(1)).unwrap();
        assert_eq!(a, b);
    }
}
