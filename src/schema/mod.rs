//! Contains routines for parsing and validating an Avro schema.
//! Schemas in avro are written as JSON and can be provided as .avsc files,
//! JSON strings or `serde_json::Value`s.
//!
//! A parsed schema is a graph of [`Variant`] nodes held in an arena. Nodes refer
//! to each other by index, which lets recursive records point back at themselves
//! without reference counting cycles. [`Type`] is a cheap handle: the shared
//! graph plus the index of one node in it.

pub(crate) mod canonical;
pub(crate) mod common;
pub(crate) mod parser;
#[cfg(test)]
mod tests;
pub(crate) mod union;

pub use canonical::{CanonicalSchema, Fingerprint, SchemaOptions};
pub use common::{Field, Name, Order};
pub use parser::{ParseOptions, Registry, TypeHook, WrapUnions};

use crate::error::{AvroErr, AvroResult};
use crate::logical::LogicalType;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use union::Bucket;

pub(crate) type TypeId = usize;

/// Attributes shared by the named types: record, error, enum and fixed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Named {
    pub(crate) name: Option<Name>,
    // fully qualified
    pub(crate) aliases: Vec<String>,
    pub(crate) doc: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct FixedSchema {
    pub(crate) named: Named,
    pub(crate) size: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct EnumSchema {
    pub(crate) named: Named,
    pub(crate) symbols: Vec<String>,
    pub(crate) indices: HashMap<String, usize>,
    pub(crate) default: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordSchema {
    pub(crate) named: Named,
    pub(crate) fields: Vec<Field>,
    pub(crate) lookup: HashMap<String, usize>,
    pub(crate) is_error: bool,
}

impl RecordSchema {
    pub(crate) fn fullname(&self) -> String {
        self.named
            .name
            .as_ref()
            .map(Name::fullname)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct UnionSchema {
    pub(crate) branches: Vec<TypeId>,
    pub(crate) names: Vec<String>,
    pub(crate) lookup: HashMap<String, usize>,
    pub(crate) wrapped: bool,
    // Unwrapped unions only: static buckets, and branches checked at runtime.
    pub(crate) buckets: HashMap<Bucket, usize>,
    pub(crate) dynamic: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct LogicalSchema {
    pub(crate) underlying: TypeId,
    pub(crate) imp: Arc<dyn LogicalType>,
    // `logicalType` and any extra attributes, exported with the schema.
    pub(crate) attrs: JsonMap<String, JsonValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Record,
    Logical,
}

/// The closed set of type behaviors a schema node can have.
#[derive(Debug, Clone)]
pub(crate) enum Variant {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    Str,
    Fixed(FixedSchema),
    Enum(EnumSchema),
    Array { items: TypeId },
    Map { values: TypeId },
    Record(RecordSchema),
    Union(UnionSchema),
    Logical(LogicalSchema),
    // A node registered by name whose definition is still being parsed.
    Pending {
        kind: PendingKind,
        name: Option<Name>,
    },
}

impl Variant {
    pub(crate) fn named(&self) -> Option<&Named> {
        match self {
            Variant::Fixed(f) => Some(&f.named),
            Variant::Enum(e) => Some(&e.named),
            Variant::Record(r) => Some(&r.named),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TypeNode {
    pub(crate) variant: Variant,
    pub(crate) fingerprint: OnceCell<Vec<u8>>,
}

impl TypeNode {
    pub(crate) fn new(variant: Variant) -> Self {
        TypeNode {
            variant,
            fingerprint: OnceCell::new(),
        }
    }
}

/// Arena of type nodes produced by one or more parses through a [`Registry`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Graph {
    pub(crate) nodes: Vec<TypeNode>,
}

impl Graph {
    #[inline(always)]
    pub(crate) fn variant(&self, id: TypeId) -> &Variant {
        &self.nodes[id].variant
    }

    // Follows logical wrappers down to the concrete representation.
    pub(crate) fn concrete(&self, mut id: TypeId) -> TypeId {
        while let Variant::Logical(l) = self.variant(id) {
            id = l.underlying;
        }
        id
    }

    pub(crate) fn type_name(&self, id: TypeId) -> String {
        let name = match self.variant(id) {
            Variant::Null => "null",
            Variant::Boolean => "boolean",
            Variant::Int => "int",
            Variant::Long => "long",
            Variant::Float => "float",
            Variant::Double => "double",
            Variant::Bytes => "bytes",
            Variant::Str => "string",
            Variant::Fixed(_) => "fixed",
            Variant::Enum(_) => "enum",
            Variant::Array { .. } => "array",
            Variant::Map { .. } => "map",
            Variant::Record(r) if r.is_error => "error",
            Variant::Record(_) => "record",
            Variant::Union(u) if u.wrapped => "union:wrapped",
            Variant::Union(_) => "union:unwrapped",
            Variant::Logical(l) => return format!("logical:{}", l.imp.name()),
            Variant::Pending {
                kind: PendingKind::Record,
                ..
            } => "record",
            Variant::Pending { .. } => "logical",
        };
        name.to_string()
    }

    pub(crate) fn fullname(&self, id: TypeId) -> Option<String> {
        match self.variant(id) {
            Variant::Logical(l) => self.fullname(l.underlying),
            Variant::Pending { name, .. } => name.as_ref().map(Name::fullname),
            v => v
                .named()
                .and_then(|n| n.name.as_ref())
                .map(Name::fullname),
        }
    }

    // Display form used in error messages.
    pub(crate) fn describe(&self, id: TypeId) -> String {
        canonical::to_schema(self, id, &SchemaOptions::default()).to_string()
    }

    pub(crate) fn invalid(&self, id: TypeId, value: &crate::Value) -> AvroErr {
        AvroErr::InvalidValue {
            value: value.describe(),
            schema: self.describe(id),
        }
    }
}

/// A node of a parsed type graph. Cloning is cheap: the graph is shared.
///
/// ```
/// use avrotype::{Type, Value};
/// use std::str::FromStr;
///
/// let ty = Type::from_str(r#"{"type": "array", "items": "int"}"#).unwrap();
/// let buf = ty.to_buffer(&Value::Array(vec![Value::Int(1), Value::Int(2)])).unwrap();
/// assert_eq!(buf, vec![0x04, 0x02, 0x04, 0x00]);
/// ```
#[derive(Clone)]
pub struct Type {
    pub(crate) graph: Arc<Graph>,
    pub(crate) id: TypeId,
}

impl Type {
    pub(crate) fn new(graph: Arc<Graph>, id: TypeId) -> Self {
        Type { graph, id }
    }

    // Handle to another node of the same graph.
    pub(crate) fn at(&self, id: TypeId) -> Type {
        Type::new(Arc::clone(&self.graph), id)
    }

    #[inline(always)]
    pub(crate) fn variant(&self) -> &Variant {
        self.graph.variant(self.id)
    }

    /// Parses a schema document with default options.
    pub fn for_schema(schema: &JsonValue) -> AvroResult<Self> {
        Type::for_schema_with(schema, &ParseOptions::default())
    }

    /// Parses a schema document with the given options and a fresh registry.
    pub fn for_schema_with(schema: &JsonValue, opts: &ParseOptions) -> AvroResult<Self> {
        let mut registry = Registry::new();
        registry.parse(schema, opts)
    }

    /// Parses an avro schema from a JSON schema in a file.
    /// Alternatively, one can use the [`FromStr`](https://doc.rust-lang.org/std/str/trait.FromStr.html)
    /// impl to create the Type from a JSON string:
    /// ```
    /// use std::str::FromStr;
    /// use avrotype::Type;
    ///
    /// let ty = Type::from_str(r##""null""##).unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path> + Debug>(path: P) -> AvroResult<Self> {
        let schema_file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(AvroErr::Io)?;
        let value: JsonValue = serde_json::from_reader(schema_file)?;
        Type::for_schema(&value)
    }

    /// The type's tag, e.g. `int`, `record`, `union:wrapped` or `logical:decimal`.
    pub fn type_name(&self) -> String {
        self.graph.type_name(self.id)
    }

    /// Fully qualified name of named types (including logical types over one).
    pub fn name(&self) -> Option<String> {
        self.graph.fullname(self.id)
    }

    /// Aliases of named types; empty for other types.
    pub fn aliases(&self) -> &[String] {
        match self.variant() {
            Variant::Logical(l) => self.graph.variant(l.underlying),
            v => v,
        }
        .named()
        .map(|n| n.aliases.as_slice())
        .unwrap_or(&[])
    }

    /// Documentation string of named types.
    pub fn doc(&self) -> Option<&str> {
        self.variant().named().and_then(|n| n.doc.as_deref())
    }

    /// The name identifying this type as a union member.
    pub fn branch_name(&self) -> String {
        union::branch_name(&self.graph, self.id)
    }

    /// Record fields in encoding order; empty for other types.
    pub fn fields(&self) -> &[Field] {
        match self.graph.variant(self.graph.concrete(self.id)) {
            Variant::Record(r) => &r.fields,
            _ => &[],
        }
    }

    /// Looks up a record field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self.graph.variant(self.graph.concrete(self.id)) {
            Variant::Record(r) => r.lookup.get(name).map(|idx| &r.fields[*idx]),
            _ => None,
        }
    }

    /// Type of the named record field.
    pub fn field_type(&self, name: &str) -> Option<Type> {
        self.field(name).map(|f| self.at(f.ty))
    }

    /// Enum symbols; empty for other types.
    pub fn symbols(&self) -> &[String] {
        match self.graph.variant(self.graph.concrete(self.id)) {
            Variant::Enum(e) => &e.symbols,
            _ => &[],
        }
    }

    /// Size of fixed types.
    pub fn size(&self) -> Option<usize> {
        match self.graph.variant(self.graph.concrete(self.id)) {
            Variant::Fixed(f) => Some(f.size),
            _ => None,
        }
    }

    /// Item type of arrays.
    pub fn items(&self) -> Option<Type> {
        match self.variant() {
            Variant::Array { items } => Some(self.at(*items)),
            _ => None,
        }
    }

    /// Value type of maps.
    pub fn values(&self) -> Option<Type> {
        match self.variant() {
            Variant::Map { values } => Some(self.at(*values)),
            _ => None,
        }
    }

    /// Branches of unions; empty for other types.
    pub fn branches(&self) -> Vec<Type> {
        match self.variant() {
            Variant::Union(u) => u.branches.iter().map(|id| self.at(*id)).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this is a wrapped union.
    pub fn is_wrapped_union(&self) -> bool {
        matches!(self.variant(), Variant::Union(u) if u.wrapped)
    }

    /// The type a logical type is layered on.
    pub fn underlying(&self) -> Option<Type> {
        match self.variant() {
            Variant::Logical(l) => Some(self.at(l.underlying)),
            _ => None,
        }
    }

    /// Logical type implementation, if any.
    pub fn logical_type(&self) -> Option<&Arc<dyn LogicalType>> {
        match self.variant() {
            Variant::Logical(l) => Some(&l.imp),
            _ => None,
        }
    }

    /// Wraps `value` in the union branch it belongs to. Only meaningful on union
    /// types; `null` stays bare.
    pub fn wrap(&self, value: crate::Value) -> AvroResult<crate::Value> {
        let u = match self.variant() {
            Variant::Union(u) => u,
            _ => return Err(self.graph.invalid(self.id, &value)),
        };
        if let crate::Value::Null = value {
            return Ok(value);
        }
        for (idx, branch) in u.branches.iter().enumerate() {
            if self.at(*branch).is_valid(&value) {
                return Ok(crate::Value::Union(u.names[idx].clone(), Box::new(value)));
            }
        }
        Err(self.graph.invalid(self.id, &value))
    }

    // Ordered map of the named types reachable from this node, for introspection.
    pub(crate) fn named_types(&self) -> IndexMap<String, TypeId> {
        let mut out = IndexMap::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            if let Some(name) = self.graph.fullname(id) {
                if out.contains_key(&name) {
                    continue;
                }
                out.insert(name, id);
            }
            match self.graph.variant(id) {
                Variant::Array { items } => stack.push(*items),
                Variant::Map { values } => stack.push(*values),
                Variant::Record(r) => stack.extend(r.fields.iter().rev().map(|f| f.ty)),
                Variant::Union(u) => stack.extend(u.branches.iter().rev()),
                Variant::Logical(l) => stack.push(l.underlying),
                _ => {}
            }
        }
        out
    }

    /// Looks up a named type reachable from this one by its fullname.
    pub fn named_type(&self, fullname: &str) -> Option<Type> {
        self.named_types().get(fullname).map(|id| self.at(*id))
    }
}

impl std::str::FromStr for Type {
    type Err = AvroErr;
    /// Parse an avro schema from a JSON string
    /// One can use Rust's raw string syntax (r##""##) to pass schema.
    fn from_str(schema: &str) -> Result<Self, Self::Err> {
        let schema_json: JsonValue = serde_json::from_str(schema)?;
        Type::for_schema(&schema_json)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_form() == other.canonical_form()
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.graph.describe(self.id))
    }
}

impl Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Type").field(&self.to_string()).finish()
    }
}
