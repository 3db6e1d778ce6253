//! Schema resolution: reading data written with one type as another.
//!
//! A [`Resolver`] is built once for a (reader, writer) pair and holds a plan per
//! pair of nodes reached while walking both graphs together. Plans are kept in an
//! arena keyed by node ids, so recursive types resolve to cyclic plans.

use crate::error::{AvroErr, AvroResult};
use crate::logical::LogicalType;
use crate::reader;
use crate::schema::common::unqualify;
use crate::schema::{Graph, Named, Type, TypeId, Variant};
use crate::tap::Tap;
use crate::value::{Map, Record, Value};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Arc;
use tracing::{debug, trace};

type PlanId = usize;

/// Writer-to-reader promotions allowed by Avro's resolution rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypePromotion {
    IntToLong,
    IntToFloat,
    IntToDouble,
    LongToFloat,
    LongToDouble,
    FloatToDouble,
    StrToBytes,
    BytesToStr,
}

#[derive(Debug, Clone)]
enum FieldStep {
    // Writer field with no reader counterpart.
    Skip(TypeId),
    // Reader fields (by index) fed from this writer field, with their plans.
    Read(Vec<(usize, PlanId)>),
}

#[derive(Debug, Clone)]
struct RecordPlan {
    name: String,
    field_names: Vec<String>,
    steps: Vec<FieldStep>,
    defaults: Vec<(usize, Value)>,
    // Steps after this one only skip data.
    lazy_index: usize,
}

#[derive(Debug, Clone)]
enum Plan {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    Str,
    Promote(TypePromotion),
    Fixed { size: usize },
    // Reader symbol for each writer index.
    Enum { symbols: Vec<String> },
    Array { items: PlanId },
    Map { values: PlanId },
    Record(RecordPlan),
    WriterUnion { branches: Vec<PlanId> },
    ReaderUnion { inner: PlanId, wrap: Option<String> },
    Logical { inner: PlanId, imp: Arc<dyn LogicalType> },
    // Reserved while a record plan is being built.
    Pending,
}

/// Options for [`Type::create_resolver_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Match named types on their unqualified names.
    pub ignore_namespaces: bool,
}

/// Reads values written with the writer type as values of the reader type.
///
/// ```
/// use avrotype::{Type, Value};
/// use std::str::FromStr;
///
/// let writer = Type::from_str(r#""int""#).unwrap();
/// let reader = Type::from_str(r#""double""#).unwrap();
/// let resolver = reader.create_resolver(&writer).unwrap();
/// let buf = writer.to_buffer(&Value::Int(7)).unwrap();
/// assert_eq!(resolver.from_buffer(&buf).unwrap(), Value::Double(7.0));
/// ```
#[derive(Debug, Clone)]
pub struct Resolver {
    reader: Type,
    writer: Type,
    plans: Arc<Vec<Plan>>,
    root: PlanId,
}

struct ResolverBuilder<'a> {
    reader: &'a Graph,
    writer: &'a Graph,
    opts: ResolverOptions,
    plans: Vec<Plan>,
    cache: HashMap<(TypeId, TypeId), PlanId>,
}

impl<'a> ResolverBuilder<'a> {
    fn push(&mut self, plan: Plan) -> PlanId {
        self.plans.push(plan);
        self.plans.len() - 1
    }

    fn cannot_read(&self, r: TypeId, w: TypeId) -> AvroErr {
        AvroErr::CannotRead {
            reader: self.reader.describe(r),
            writer: self.writer.describe(w),
        }
    }

    fn names_compatible(&self, reader: &Named, writer: &Named) -> bool {
        let (r, w) = match (&reader.name, &writer.name) {
            (Some(r), Some(w)) => (r, w),
            _ => return true,
        };
        let fullname = w.fullname();
        if r.fullname() == fullname || reader.aliases.contains(&fullname) {
            return true;
        }
        self.opts.ignore_namespaces
            && (r.name == w.name || reader.aliases.iter().any(|a| unqualify(a) == w.name))
    }

    fn build(&mut self, r: TypeId, w: TypeId) -> AvroResult<PlanId> {
        if let Some(plan) = self.cache.get(&(r, w)) {
            trace!(reader = r, writer = w, "resolver cache hit");
            return Ok(*plan);
        }
        let reader: &'a Graph = self.reader;
        let writer: &'a Graph = self.writer;

        let plan = match (reader.variant(r), writer.variant(w)) {
            (_, Variant::Union(wu)) => {
                let id = self.push(Plan::Pending);
                self.cache.insert((r, w), id);
                let mut branches = Vec::with_capacity(wu.branches.len());
                for branch in &wu.branches {
                    branches.push(self.build(r, *branch)?);
                }
                self.plans[id] = Plan::WriterUnion { branches };
                return Ok(id);
            }
            (Variant::Logical(l), _) => {
                let inner = self.build(l.underlying, w)?;
                Plan::Logical {
                    inner,
                    imp: Arc::clone(&l.imp),
                }
            }
            (_, Variant::Logical(l)) => {
                let id = self.build(r, l.underlying)?;
                self.cache.insert((r, w), id);
                return Ok(id);
            }
            (Variant::Union(ru), _) => {
                let mut found = None;
                for (idx, branch) in ru.branches.iter().enumerate() {
                    let mark = self.plans.len();
                    match self.build(*branch, w) {
                        Ok(inner) => {
                            found = Some((idx, inner));
                            break;
                        }
                        Err(_) => {
                            self.plans.truncate(mark);
                            self.cache.retain(|_, plan| *plan < mark);
                        }
                    }
                }
                let (idx, inner) = found.ok_or_else(|| self.cannot_read(r, w))?;
                let wrap = if ru.wrapped && ru.names[idx] != "null" {
                    Some(ru.names[idx].clone())
                } else {
                    None
                };
                Plan::ReaderUnion { inner, wrap }
            }
            (Variant::Null, Variant::Null) => Plan::Null,
            (Variant::Boolean, Variant::Boolean) => Plan::Boolean,
            (Variant::Int, Variant::Int) => Plan::Int,
            (Variant::Long, Variant::Long) => Plan::Long,
            (Variant::Float, Variant::Float) => Plan::Float,
            (Variant::Double, Variant::Double) => Plan::Double,
            (Variant::Bytes, Variant::Bytes) => Plan::Bytes,
            (Variant::Str, Variant::Str) => Plan::Str,
            (Variant::Long, Variant::Int) => Plan::Promote(TypePromotion::IntToLong),
            (Variant::Float, Variant::Int) => Plan::Promote(TypePromotion::IntToFloat),
            (Variant::Double, Variant::Int) => Plan::Promote(TypePromotion::IntToDouble),
            (Variant::Float, Variant::Long) => Plan::Promote(TypePromotion::LongToFloat),
            (Variant::Double, Variant::Long) => Plan::Promote(TypePromotion::LongToDouble),
            (Variant::Double, Variant::Float) => Plan::Promote(TypePromotion::FloatToDouble),
            (Variant::Bytes, Variant::Str) => Plan::Promote(TypePromotion::StrToBytes),
            (Variant::Str, Variant::Bytes) => Plan::Promote(TypePromotion::BytesToStr),
            (Variant::Fixed(rf), Variant::Fixed(wf))
                if rf.size == wf.size && self.names_compatible(&rf.named, &wf.named) =>
            {
                Plan::Fixed { size: rf.size }
            }
            (Variant::Enum(re), Variant::Enum(we))
                if self.names_compatible(&re.named, &we.named) =>
            {
                let symbols = we
                    .symbols
                    .iter()
                    .map(|s| {
                        if re.indices.contains_key(s) {
                            Some(s.clone())
                        } else {
                            re.default.clone()
                        }
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| self.cannot_read(r, w))?;
                Plan::Enum { symbols }
            }
            (Variant::Array { items: ri }, Variant::Array { items: wi }) => {
                let items = self.build(*ri, *wi)?;
                Plan::Array { items }
            }
            (Variant::Map { values: rv }, Variant::Map { values: wv }) => {
                let values = self.build(*rv, *wv)?;
                Plan::Map { values }
            }
            (Variant::Record(rr), Variant::Record(wr))
                if self.names_compatible(&rr.named, &wr.named) =>
            {
                let id = self.push(Plan::Pending);
                self.cache.insert((r, w), id);

                let record = rr.fullname();
                let mut targets: Vec<Vec<(usize, PlanId)>> = vec![vec![]; wr.fields.len()];
                let mut defaults = vec![];
                for (ri, rf) in rr.fields.iter().enumerate() {
                    let matches: Vec<usize> = wr
                        .fields
                        .iter()
                        .enumerate()
                        .filter(|(_, wf)| rf.names().any(|n| n == wf.name))
                        .map(|(wi, _)| wi)
                        .collect();
                    match matches.as_slice() {
                        [wi] => {
                            let plan = self.build(rf.ty, wr.fields[*wi].ty)?;
                            targets[*wi].push((ri, plan));
                        }
                        [] => match &rf.default {
                            Some(default) => defaults.push((ri, default.clone())),
                            None => {
                                return Err(AvroErr::NoMatchingField {
                                    record,
                                    field: rf.name.clone(),
                                })
                            }
                        },
                        many => {
                            return Err(AvroErr::AmbiguousAliasing {
                                record,
                                field: rf.name.clone(),
                                matches: many
                                    .iter()
                                    .map(|wi| wr.fields[*wi].name.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", "),
                            })
                        }
                    }
                }

                let steps: Vec<FieldStep> = targets
                    .into_iter()
                    .zip(&wr.fields)
                    .map(|(t, wf)| {
                        if t.is_empty() {
                            FieldStep::Skip(wf.ty)
                        } else {
                            FieldStep::Read(t)
                        }
                    })
                    .collect();
                let lazy_index = steps
                    .iter()
                    .rposition(|s| matches!(s, FieldStep::Read(_)))
                    .map_or(0, |i| i + 1);

                self.plans[id] = Plan::Record(RecordPlan {
                    name: record,
                    field_names: rr.fields.iter().map(|f| f.name.clone()).collect(),
                    steps,
                    defaults,
                    lazy_index,
                });
                return Ok(id);
            }
            _ => return Err(self.cannot_read(r, w)),
        };

        let id = self.push(plan);
        self.cache.insert((r, w), id);
        Ok(id)
    }
}

impl Resolver {
    pub(crate) fn new(reader: &Type, writer: &Type, opts: ResolverOptions) -> AvroResult<Self> {
        let mut builder = ResolverBuilder {
            reader: &reader.graph,
            writer: &writer.graph,
            opts,
            plans: vec![],
            cache: HashMap::new(),
        };
        let root = builder
            .build(reader.id, writer.id)
            .map_err(|e| AvroErr::IncompatibleSchema {
                reader: reader.to_string(),
                writer: writer.to_string(),
                source: Box::new(e),
            })?;
        debug!(plans = builder.plans.len(), "built resolver");
        Ok(Resolver {
            reader: reader.clone(),
            writer: writer.clone(),
            plans: Arc::new(builder.plans),
            root,
        })
    }

    /// The type values are read as.
    pub fn reader(&self) -> &Type {
        &self.reader
    }

    /// The type the data was written with.
    pub fn writer(&self) -> &Type {
        &self.writer
    }

    fn read_plan<B: AsRef<[u8]>>(
        &self,
        id: PlanId,
        tap: &mut Tap<B>,
        lazy: bool,
    ) -> AvroResult<Value> {
        let value = match &self.plans[id] {
            Plan::Null => Value::Null,
            Plan::Boolean => Value::Boolean(tap.read_boolean()),
            Plan::Int => Value::Int(tap.read_int()),
            Plan::Long => Value::Long(tap.read_long()),
            Plan::Float => Value::Float(tap.read_float()),
            Plan::Double => Value::Double(tap.read_double()),
            Plan::Bytes => Value::Bytes(tap.read_bytes()),
            Plan::Str => Value::Str(tap.read_string()?),
            Plan::Promote(promotion) => match promotion {
                TypePromotion::IntToLong => Value::Long(tap.read_int() as i64),
                TypePromotion::IntToFloat => Value::Float(tap.read_int() as f32),
                TypePromotion::IntToDouble => Value::Double(tap.read_int() as f64),
                TypePromotion::LongToFloat => Value::Float(tap.read_long() as f32),
                TypePromotion::LongToDouble => Value::Double(tap.read_long() as f64),
                TypePromotion::FloatToDouble => Value::Double(tap.read_float() as f64),
                TypePromotion::StrToBytes => Value::Bytes(tap.read_bytes()),
                TypePromotion::BytesToStr => Value::Str(tap.read_string()?),
            },
            Plan::Fixed { size } => Value::Fixed(tap.read_fixed(*size)),
            Plan::Enum { symbols } => {
                let idx = tap.read_long();
                match usize::try_from(idx).ok().and_then(|i| symbols.get(i)) {
                    Some(symbol) => Value::Enum(symbol.clone()),
                    None if !tap.is_valid() => Value::Null,
                    None => return Err(AvroErr::InvalidEnumIndex(idx)),
                }
            }
            Plan::Array { items } => {
                let mut values = vec![];
                loop {
                    let n = tap.read_block_len();
                    if n <= 0 || !tap.is_valid() {
                        break;
                    }
                    for _ in 0..n {
                        values.push(self.read_plan(*items, tap, false)?);
                        if !tap.is_valid() {
                            return Ok(Value::Array(values));
                        }
                    }
                }
                Value::Array(values)
            }
            Plan::Map { values } => {
                let mut map = Map::new();
                loop {
                    let n = tap.read_block_len();
                    if n <= 0 || !tap.is_valid() {
                        break;
                    }
                    for _ in 0..n {
                        let key = tap.read_string()?;
                        let value = self.read_plan(*values, tap, false)?;
                        if !tap.is_valid() {
                            return Ok(Value::Map(map));
                        }
                        map.insert(key, value);
                    }
                }
                Value::Map(map)
            }
            Plan::Record(rp) => {
                let mut slots: Vec<Option<Value>> = vec![None; rp.field_names.len()];
                let steps = if lazy {
                    &rp.steps[..rp.lazy_index]
                } else {
                    &rp.steps[..]
                };
                for step in steps {
                    match step {
                        FieldStep::Skip(ty) => reader::skip(&self.writer.graph, *ty, tap)?,
                        FieldStep::Read(targets) => {
                            let start = tap.pos();
                            for (n, (ri, plan)) in targets.iter().enumerate() {
                                if n > 0 {
                                    tap.set_pos(start);
                                }
                                slots[*ri] = Some(self.read_plan(*plan, tap, false)?);
                            }
                        }
                    }
                }
                for (ri, default) in &rp.defaults {
                    slots[*ri] = Some(default.clone());
                }
                let mut rec = Record::with_capacity(&rp.name, slots.len());
                for (name, slot) in rp.field_names.iter().zip(slots) {
                    if let Some(value) = slot {
                        rec.fields.insert(name.clone(), value);
                    }
                }
                Value::Record(rec)
            }
            Plan::WriterUnion { branches } => {
                let idx = tap.read_long();
                match usize::try_from(idx).ok().and_then(|i| branches.get(i)) {
                    Some(branch) => self.read_plan(*branch, tap, false)?,
                    None if !tap.is_valid() => Value::Null,
                    None => return Err(AvroErr::InvalidUnionIndex(idx)),
                }
            }
            Plan::ReaderUnion { inner, wrap } => {
                let value = self.read_plan(*inner, tap, false)?;
                match wrap {
                    Some(branch) => Value::Union(branch.clone(), Box::new(value)),
                    None => value,
                }
            }
            Plan::Logical { inner, imp } => {
                let value = self.read_plan(*inner, tap, false)?;
                if !tap.is_valid() {
                    return Ok(value);
                }
                imp.from_value(value)?
            }
            Plan::Pending => return Err(AvroErr::ResolverMismatch),
        };
        Ok(value)
    }

    /// Reads one writer-encoded value off `tap` as a reader value.
    pub fn read<B: AsRef<[u8]>>(&self, tap: &mut Tap<B>) -> AvroResult<Value> {
        self.read_plan(self.root, tap, false)
    }

    /// Decodes a writer-encoded value that must span the whole buffer.
    pub fn from_buffer(&self, buf: &[u8]) -> AvroResult<Value> {
        let mut tap = Tap::new(buf);
        let value = self.read_plan(self.root, &mut tap, false)?;
        tap.check()?;
        if tap.pos() < buf.len() {
            return Err(AvroErr::TrailingData(buf.len() - tap.pos()));
        }
        Ok(value)
    }

    /// Like [`from_buffer`](Resolver::from_buffer), but stops reading a top level
    /// record after the last writer field the reader uses. Trailing bytes are not
    /// checked.
    pub fn from_buffer_lazy(&self, buf: &[u8]) -> AvroResult<Value> {
        let mut tap = Tap::new(buf);
        let value = self.read_plan(self.root, &mut tap, true)?;
        tap.check()?;
        Ok(value)
    }

    /// Decodes a writer-encoded value at `pos`, returning `None` on truncation.
    pub fn decode(&self, buf: &[u8], pos: usize) -> AvroResult<Option<(Value, usize)>> {
        let mut tap = Tap::with_pos(buf, pos);
        let value = self.read_plan(self.root, &mut tap, false)?;
        if tap.is_valid() {
            Ok(Some((value, tap.pos())))
        } else {
            Ok(None)
        }
    }
}

impl Type {
    /// Builds a resolver reading data written with `writer` as this type.
    pub fn create_resolver(&self, writer: &Type) -> AvroResult<Resolver> {
        Resolver::new(self, writer, ResolverOptions::default())
    }

    /// Like [`Type::create_resolver`], with options.
    pub fn create_resolver_with(&self, writer: &Type, opts: ResolverOptions) -> AvroResult<Resolver> {
        Resolver::new(self, writer, opts)
    }

    /// Decodes `buf`, written with the resolver's writer type, as this type.
    /// With `no_check`, trailing bytes are ignored and top level records stop
    /// reading after the last field used.
    pub fn from_buffer_with(
        &self,
        buf: &[u8],
        resolver: &Resolver,
        no_check: bool,
    ) -> AvroResult<Value> {
        if !Arc::ptr_eq(&resolver.reader.graph, &self.graph) || resolver.reader.id != self.id {
            return Err(AvroErr::ResolverMismatch);
        }
        if no_check {
            resolver.from_buffer_lazy(buf)
        } else {
            resolver.from_buffer(buf)
        }
    }
}
