use super::common::{is_primitive, validate_name, Field, Name, Order};
use super::union;
use super::{
    EnumSchema, FixedSchema, Graph, LogicalSchema, Named, PendingKind, RecordSchema, Type,
    TypeId, TypeNode, UnionSchema, Variant,
};
use crate::error::{AvroErr, AvroResult};
use crate::json::{self, JsonMode};
use crate::logical::{builtin_logical_types, LogicalType, LogicalTypeFactory};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use tracing::{debug, trace};

/// A hook called on every schema node before it is parsed. Returning a schema
/// replaces the node.
pub type TypeHook = Arc<dyn Fn(&JsonValue) -> Option<JsonValue> + Send + Sync>;

/// Controls when unions use the wrapped value representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapUnions {
    /// Wrap only unions whose members cannot be told apart by value alone.
    Auto,
    /// Always wrap.
    Always,
    /// Never wrap. Ambiguous unions fail to parse.
    Never,
}

impl Default for WrapUnions {
    fn default() -> Self {
        WrapUnions::Auto
    }
}

/// Options used when building types from schemas.
///
/// ```
/// use avrotype::{ParseOptions, Type, WrapUnions};
///
/// let opts = ParseOptions::new()
///     .wrap_unions(WrapUnions::Always)
///     .with_builtin_logical_types();
/// let ty = Type::for_schema_with(&serde_json::json!(["null", "int"]), &opts).unwrap();
/// assert!(ty.is_wrapped_union());
/// ```
#[derive(Clone, Default)]
pub struct ParseOptions {
    pub(crate) namespace: Option<String>,
    pub(crate) wrap_unions: WrapUnions,
    pub(crate) logical_types: HashMap<String, LogicalTypeFactory>,
    pub(crate) assert_logical_types: bool,
    pub(crate) no_anonymous_types: bool,
    pub(crate) type_hook: Option<TypeHook>,
    pub(crate) custom_long: Option<Arc<dyn LogicalType>>,
}

impl ParseOptions {
    /// Options with every flag off and no logical types.
    pub fn new() -> Self {
        ParseOptions::default()
    }

    /// Namespace used to qualify top level names.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string()).filter(|ns| !ns.is_empty());
        self
    }

    /// How unions are represented.
    pub fn wrap_unions(mut self, wrap: WrapUnions) -> Self {
        self.wrap_unions = wrap;
        self
    }

    /// Registers a logical type implementation for `name`.
    pub fn logical_type(mut self, name: &str, factory: LogicalTypeFactory) -> Self {
        self.logical_types.insert(name.to_string(), factory);
        self
    }

    /// Registers the `date`, `timestamp-millis`, `timestamp-micros`, `decimal` and
    /// `uuid` logical types.
    pub fn with_builtin_logical_types(mut self) -> Self {
        self.logical_types.extend(builtin_logical_types());
        self
    }

    /// Fail instead of falling back to the underlying type when a logical type
    /// rejects its schema.
    pub fn assert_logical_types(mut self, assert: bool) -> Self {
        self.assert_logical_types = assert;
        self
    }

    /// Rejects named types (record, enum, fixed) without a name.
    pub fn no_anonymous_types(mut self, deny: bool) -> Self {
        self.no_anonymous_types = deny;
        self
    }

    /// Lets `hook` replace each schema before it is parsed.
    pub fn type_hook(mut self, hook: TypeHook) -> Self {
        self.type_hook = Some(hook);
        self
    }

    /// Represents every `long` through the given logical implementation.
    pub fn custom_long(mut self, imp: Arc<dyn LogicalType>) -> Self {
        self.custom_long = Some(imp);
        self
    }
}

impl Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut logical: Vec<&String> = self.logical_types.keys().collect();
        logical.sort();
        f.debug_struct("ParseOptions")
            .field("namespace", &self.namespace)
            .field("wrap_unions", &self.wrap_unions)
            .field("logical_types", &logical)
            .field("assert_logical_types", &self.assert_logical_types)
            .field("no_anonymous_types", &self.no_anonymous_types)
            .field("type_hook", &self.type_hook.is_some())
            .field("custom_long", &self.custom_long)
            .finish()
    }
}

/// Wraps a { name -> type } lookup table to aid parsing named references in complex schemas.
/// A registry can be passed to several parses so that later schemas can refer to types
/// defined by earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    graph: Arc<Graph>,
    names: HashMap<String, TypeId>,
    primitives: HashMap<String, TypeId>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Parses `schema`, registering every named type it defines. On failure the
    /// registry is left as it was.
    pub fn parse(&mut self, schema: &JsonValue, opts: &ParseOptions) -> AvroResult<Type> {
        let names = self.names.clone();
        let primitives = self.primitives.clone();
        let len = self.graph.nodes.len();

        let result = {
            let mut cxt = BuildContext::new(self, opts);
            cxt.parse_schema(schema)
                .and_then(|id| cxt.apply_defaults().map(|_| id))
        };

        match result {
            Ok(id) => Ok(Type::new(Arc::clone(&self.graph), id)),
            Err(e) => {
                Arc::make_mut(&mut self.graph).nodes.truncate(len);
                self.names = names;
                self.primitives = primitives;
                Err(e)
            }
        }
    }

    /// Parses a schema from its JSON text.
    pub fn parse_str(&mut self, schema: &str, opts: &ParseOptions) -> AvroResult<Type> {
        let json: JsonValue = serde_json::from_str(schema)?;
        self.parse(&json, opts)
    }

    /// Looks up a registered type by its fullname.
    pub fn get(&self, name: &str) -> Option<Type> {
        self.names
            .get(name)
            .map(|id| Type::new(Arc::clone(&self.graph), *id))
    }

    /// Whether a type is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Fullnames of the registered types.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Number of registered named types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no named type is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// A field default kept aside until the whole graph is built, so that defaults
// may refer to types defined later in the schema.
struct PendingDefault {
    record: TypeId,
    field: usize,
    json: JsonValue,
}

struct Checkpoint {
    nodes: usize,
    names: HashMap<String, TypeId>,
    primitives: HashMap<String, TypeId>,
    namespace: Option<String>,
    defaults: usize,
}

// State threaded through a single parse.
struct BuildContext<'a> {
    graph: &'a mut Graph,
    names: &'a mut HashMap<String, TypeId>,
    primitives: &'a mut HashMap<String, TypeId>,
    opts: &'a ParseOptions,
    namespace: Option<String>,
    // Node reserved for a logical type whose underlying type is being parsed.
    // The first type built while this is set consumes it.
    pending_logical: Option<TypeId>,
    defaults: Vec<PendingDefault>,
}

impl<'a> BuildContext<'a> {
    fn new(registry: &'a mut Registry, opts: &'a ParseOptions) -> Self {
        BuildContext {
            graph: Arc::make_mut(&mut registry.graph),
            names: &mut registry.names,
            primitives: &mut registry.primitives,
            opts,
            namespace: opts.namespace.clone(),
            pending_logical: None,
            defaults: vec![],
        }
    }

    fn push(&mut self, variant: Variant) -> TypeId {
        self.graph.nodes.push(TypeNode::new(variant));
        self.graph.nodes.len() - 1
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.graph.nodes.len(),
            names: self.names.clone(),
            primitives: self.primitives.clone(),
            namespace: self.namespace.clone(),
            defaults: self.defaults.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.graph.nodes.truncate(checkpoint.nodes);
        *self.names = checkpoint.names;
        *self.primitives = checkpoint.primitives;
        self.namespace = checkpoint.namespace;
        self.defaults.truncate(checkpoint.defaults);
    }

    fn parse_schema(&mut self, value: &JsonValue) -> AvroResult<TypeId> {
        if let Some(hook) = &self.opts.type_hook {
            if let Some(replacement) = hook(value) {
                trace!(schema = %value, "schema replaced by type hook");
                return self.parse_node(&replacement);
            }
        }
        self.parse_node(value)
    }

    fn parse_node(&mut self, value: &JsonValue) -> AvroResult<TypeId> {
        match value {
            // Parse a complex schema
            JsonValue::Object(ref schema) => self.parse_object(schema),
            // Parse a primitive schema, could also be a named schema reference
            JsonValue::String(ref schema) => self.parse_reference(schema),
            // Parse a union schema
            JsonValue::Array(ref schema) => self.parse_union(schema),
            _ => Err(AvroErr::UnknownSchema),
        }
    }

    fn parse_reference(&mut self, schema: &str) -> AvroResult<TypeId> {
        if is_primitive(schema) {
            return Ok(self.primitive(schema));
        }
        let qualified = Name::qualify(schema, self.namespace.as_deref())
            .map(|n| n.fullname())
            .unwrap_or_else(|_| schema.to_string());
        self.names
            .get(&qualified)
            .or_else(|| self.names.get(schema))
            .copied()
            .ok_or_else(|| AvroErr::UndefinedTypeName(schema.to_string()))
    }

    // Primitive references share one node per registry.
    fn primitive(&mut self, name: &str) -> TypeId {
        let cacheable = !(name == "long" && self.opts.custom_long.is_some());
        if cacheable {
            if let Some(id) = self.primitives.get(name) {
                return *id;
            }
        }
        let id = self.new_primitive(name, None);
        if cacheable {
            self.primitives.insert(name.to_string(), id);
        }
        id
    }

    fn new_primitive(&mut self, name: &str, reserved: Option<TypeId>) -> TypeId {
        let variant = match name {
            "null" => Variant::Null,
            "boolean" => Variant::Boolean,
            "int" => Variant::Int,
            "long" => Variant::Long,
            "float" => Variant::Float,
            "double" => Variant::Double,
            "bytes" => Variant::Bytes,
            _ => Variant::Str,
        };
        let id = self.push(variant);
        match &self.opts.custom_long {
            Some(imp) if name == "long" && reserved.is_none() => {
                let imp = Arc::clone(imp);
                self.push(Variant::Logical(LogicalSchema {
                    underlying: id,
                    imp,
                    attrs: Map::new(),
                }))
            }
            _ => id,
        }
    }

    fn parse_object(&mut self, schema: &Map<String, JsonValue>) -> AvroResult<TypeId> {
        let opts = self.opts;
        if self.pending_logical.is_none() {
            if let Some(JsonValue::String(logical_name)) = schema.get("logicalType") {
                if let Some(factory) = opts.logical_types.get(logical_name.as_str()) {
                    if let Some(id) = self.parse_logical(logical_name, factory, schema)? {
                        return Ok(id);
                    }
                }
            }
        }
        let reserved = self.pending_logical.take();
        self.parse_concrete(schema, reserved)
    }

    // Returns `None` when the logical type rejected its schema and the plain
    // underlying type should be used instead.
    fn parse_logical(
        &mut self,
        logical_name: &str,
        factory: &LogicalTypeFactory,
        schema: &Map<String, JsonValue>,
    ) -> AvroResult<Option<TypeId>> {
        let checkpoint = self.checkpoint();
        let id = self.push(Variant::Pending {
            kind: PendingKind::Logical,
            name: None,
        });
        self.pending_logical = Some(id);

        let built = self.parse_object(schema).and_then(|underlying| {
            let kind = self.graph.type_name(underlying);
            factory(schema, &kind).map(|imp| (underlying, imp))
        });
        self.pending_logical = None;

        match built {
            Ok((underlying, imp)) => {
                debug!(logical_type = logical_name, "instantiated logical type");
                self.graph.nodes[id] = TypeNode::new(Variant::Logical(LogicalSchema {
                    underlying,
                    imp,
                    attrs: logical_attrs(schema),
                }));
                Ok(Some(id))
            }
            Err(e) if self.opts.assert_logical_types => Err(e),
            Err(e) => {
                debug!(
                    logical_type = logical_name,
                    error = %e,
                    "logical type rejected schema, using underlying type"
                );
                self.restore(checkpoint);
                Ok(None)
            }
        }
    }

    fn parse_concrete(
        &mut self,
        schema: &Map<String, JsonValue>,
        reserved: Option<TypeId>,
    ) -> AvroResult<TypeId> {
        let ty = match schema.get("type") {
            Some(JsonValue::String(s)) => s.as_str(),
            Some(nested @ JsonValue::Object(_)) | Some(nested @ JsonValue::Array(_)) => {
                self.pending_logical = reserved;
                return self.parse_schema(nested);
            }
            Some(other) => return Err(AvroErr::UnknownType(other.to_string())),
            None => {
                return Err(AvroErr::MissingAttribute {
                    ty: "schema",
                    attr: "type",
                })
            }
        };

        match ty {
            "record" => self.parse_record(schema, reserved, false),
            "error" => self.parse_record(schema, reserved, true),
            "enum" => self.parse_enum(schema, reserved),
            "fixed" => self.parse_fixed(schema, reserved),
            "array" => {
                let items = schema.get("items").ok_or(AvroErr::MissingAttribute {
                    ty: "array",
                    attr: "items",
                })?;
                let items = self.parse_schema(items)?;
                Ok(self.push(Variant::Array { items }))
            }
            "map" => {
                let values = schema.get("values").ok_or(AvroErr::MissingAttribute {
                    ty: "map",
                    attr: "values",
                })?;
                let values = self.parse_schema(values)?;
                Ok(self.push(Variant::Map { values }))
            }
            primitive if is_primitive(primitive) => Ok(self.new_primitive(primitive, reserved)),
            reference => self.parse_reference(reference),
        }
    }

    fn register(&mut self, name: &Name, id: TypeId) -> AvroResult<()> {
        if is_primitive(&name.name) {
            return Err(AvroErr::CannotRenamePrimitive(name.name.clone()));
        }
        let fullname = name.fullname();
        if self.names.contains_key(&fullname) {
            return Err(AvroErr::DuplicateSchema(fullname));
        }
        if let Variant::Pending {
            kind: PendingKind::Logical,
            name: slot,
        } = &mut self.graph.nodes[id].variant
        {
            *slot = Some(name.clone());
        }
        trace!(name = %fullname, id, "registered named type");
        self.names.insert(fullname, id);
        Ok(())
    }

    fn parse_named(
        &self,
        schema: &Map<String, JsonValue>,
        kind: &'static str,
    ) -> AvroResult<Named> {
        let name = Name::from_json(schema, self.namespace.as_deref())?;
        if name.is_none() && self.opts.no_anonymous_types {
            return Err(AvroErr::AnonymousType(kind));
        }
        let namespace = name.as_ref().and_then(|n| n.namespace.as_deref());
        let aliases = parse_aliases(schema.get("aliases"), kind)?
            .iter()
            .map(|a| Name::qualify(a, namespace).map(|n| n.fullname()))
            .collect::<AvroResult<Vec<_>>>()?;
        Ok(Named {
            name,
            aliases,
            doc: parse_doc(schema.get("doc")),
        })
    }

    fn parse_record(
        &mut self,
        schema: &Map<String, JsonValue>,
        reserved: Option<TypeId>,
        is_error: bool,
    ) -> AvroResult<TypeId> {
        let kind = if is_error { "error" } else { "record" };
        let named = self.parse_named(schema, kind)?;

        // Insert a placeholder to support recursive schema definitions.
        let id = self.push(Variant::Pending {
            kind: PendingKind::Record,
            name: named.name.clone(),
        });
        if let Some(name) = &named.name {
            self.register(name, reserved.unwrap_or(id))?;
        }

        let fields = match schema.get("fields") {
            Some(JsonValue::Array(fields)) => fields,
            Some(other) => {
                return Err(AvroErr::InvalidAttribute {
                    ty: kind,
                    attr: "fields",
                    found: other.to_string(),
                })
            }
            None => {
                return Err(AvroErr::MissingAttribute {
                    ty: kind,
                    attr: "fields",
                })
            }
        };

        // Most tightly enclosing namespace, which is this namespace
        let enclosing = match &named.name {
            Some(name) => std::mem::replace(&mut self.namespace, name.namespace.clone()),
            None => self.namespace.clone(),
        };
        let parsed = self.parse_fields(id, fields);
        self.namespace = enclosing;
        let (fields, lookup) = parsed?;

        self.graph.nodes[id] = TypeNode::new(Variant::Record(RecordSchema {
            named,
            fields,
            lookup,
            is_error,
        }));
        Ok(id)
    }

    fn parse_fields(
        &mut self,
        record: TypeId,
        fields: &[JsonValue],
    ) -> AvroResult<(Vec<Field>, HashMap<String, usize>)> {
        let mut parsed = Vec::with_capacity(fields.len());
        let mut lookup = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            let o = field.as_object().ok_or_else(|| AvroErr::InvalidAttribute {
                ty: "record",
                attr: "fields",
                found: field.to_string(),
            })?;
            let name = match o.get("name") {
                Some(JsonValue::String(s)) => s,
                Some(other) => return Err(AvroErr::InvalidName(other.to_string())),
                None => {
                    return Err(AvroErr::MissingAttribute {
                        ty: "field",
                        attr: "name",
                    })
                }
            };
            let ty = o.get("type").ok_or(AvroErr::MissingAttribute {
                ty: "field",
                attr: "type",
            })?;
            let ty = self.parse_schema(ty)?;

            let order = match o.get("order") {
                Some(JsonValue::String(s)) => s.parse::<Order>()?,
                Some(other) => return Err(AvroErr::UnknownFieldOrdering(other.to_string())),
                None => Order::default(),
            };
            let aliases = parse_aliases(o.get("aliases"), "field")?;

            if lookup.insert(name.to_string(), idx).is_some() {
                return Err(AvroErr::DuplicateField(name.to_string()));
            }
            if let Some(default) = o.get("default") {
                self.defaults.push(PendingDefault {
                    record,
                    field: idx,
                    json: default.clone(),
                });
            }
            parsed.push(Field::new(name, ty, order, aliases, parse_doc(o.get("doc")))?);
        }
        Ok((parsed, lookup))
    }

    fn parse_enum(
        &mut self,
        schema: &Map<String, JsonValue>,
        reserved: Option<TypeId>,
    ) -> AvroResult<TypeId> {
        let named = self.parse_named(schema, "enum")?;
        let symbols = match schema.get("symbols") {
            Some(JsonValue::Array(symbols)) => symbols,
            Some(other) => {
                return Err(AvroErr::InvalidAttribute {
                    ty: "enum",
                    attr: "symbols",
                    found: other.to_string(),
                })
            }
            None => {
                return Err(AvroErr::MissingAttribute {
                    ty: "enum",
                    attr: "symbols",
                })
            }
        };

        let mut parsed = Vec::with_capacity(symbols.len());
        let mut indices = HashMap::with_capacity(symbols.len());
        for (idx, symbol) in symbols.iter().enumerate() {
            let symbol = symbol.as_str().ok_or_else(|| AvroErr::InvalidAttribute {
                ty: "enum",
                attr: "symbols",
                found: symbol.to_string(),
            })?;
            validate_name(symbol)?;
            if indices.insert(symbol.to_string(), idx).is_some() {
                return Err(AvroErr::DuplicateSymbol(symbol.to_string()));
            }
            parsed.push(symbol.to_string());
        }

        let default = match schema.get("default") {
            Some(JsonValue::String(s)) if indices.contains_key(s) => Some(s.clone()),
            Some(other) => {
                return Err(AvroErr::InvalidAttribute {
                    ty: "enum",
                    attr: "default",
                    found: other.to_string(),
                })
            }
            None => None,
        };

        let name = named.name.clone();
        let id = self.push(Variant::Enum(EnumSchema {
            named,
            symbols: parsed,
            indices,
            default,
        }));
        if let Some(name) = name {
            self.register(&name, reserved.unwrap_or(id))?;
        }
        Ok(id)
    }

    fn parse_fixed(
        &mut self,
        schema: &Map<String, JsonValue>,
        reserved: Option<TypeId>,
    ) -> AvroResult<TypeId> {
        let named = self.parse_named(schema, "fixed")?;
        let size = match schema.get("size") {
            Some(size) => size.as_u64().ok_or_else(|| AvroErr::InvalidAttribute {
                ty: "fixed",
                attr: "size",
                found: size.to_string(),
            })? as usize,
            None => {
                return Err(AvroErr::MissingAttribute {
                    ty: "fixed",
                    attr: "size",
                })
            }
        };

        let name = named.name.clone();
        let id = self.push(Variant::Fixed(FixedSchema { named, size }));
        if let Some(name) = name {
            self.register(&name, reserved.unwrap_or(id))?;
        }
        Ok(id)
    }

    fn parse_union(&mut self, schema: &[JsonValue]) -> AvroResult<TypeId> {
        // Members never inherit a logical reservation; the union node consumes it.
        let _reserved = self.pending_logical.take();

        let mut branches = Vec::with_capacity(schema.len());
        for s in schema {
            branches.push(self.parse_schema(s)?);
        }

        let mut names = Vec::with_capacity(branches.len());
        let mut lookup = HashMap::with_capacity(branches.len());
        for (idx, branch) in branches.iter().enumerate() {
            if let Variant::Union(_) = self.graph.variant(*branch) {
                return Err(AvroErr::NoImmediateUnion);
            }
            let name = union::branch_name(self.graph, *branch);
            if lookup.insert(name.clone(), idx).is_some() {
                return Err(AvroErr::DuplicateBranch(name));
            }
            names.push(name);
        }

        let buckets = union::buckets(self.graph, &branches, &names);
        let wrapped = match self.opts.wrap_unions {
            WrapUnions::Always => true,
            WrapUnions::Never => false,
            WrapUnions::Auto => buckets.is_err(),
        };
        let (buckets, dynamic) = if wrapped {
            (HashMap::new(), vec![])
        } else {
            buckets.map_err(AvroErr::AmbiguousUnion)?
        };

        Ok(self.push(Variant::Union(UnionSchema {
            branches,
            names,
            lookup,
            wrapped,
            buckets,
            dynamic,
        })))
    }

    fn apply_defaults(&mut self) -> AvroResult<()> {
        for pending in std::mem::take(&mut self.defaults) {
            let (name, ty) = match self.graph.variant(pending.record) {
                Variant::Record(r) => {
                    let field = &r.fields[pending.field];
                    (field.name.clone(), field.ty)
                }
                _ => continue,
            };
            let value = json::from_json(self.graph, ty, &pending.json, JsonMode::Default)
                .map_err(|e| AvroErr::InvalidDefaultValue {
                    field: name,
                    source: Box::new(e),
                })?;
            if let Variant::Record(r) = &mut self.graph.nodes[pending.record].variant {
                r.fields[pending.field].default = Some(value);
            }
        }
        Ok(())
    }
}

const RESERVED_ATTRS: [&str; 12] = [
    "type",
    "name",
    "namespace",
    "aliases",
    "doc",
    "fields",
    "symbols",
    "size",
    "items",
    "values",
    "default",
    "order",
];

// Attributes of a logical schema not consumed by its underlying type.
fn logical_attrs(schema: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    schema
        .iter()
        .filter(|(k, _)| !RESERVED_ATTRS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn parse_aliases(aliases: Option<&JsonValue>, ty: &'static str) -> AvroResult<Vec<String>> {
    match aliases {
        Some(JsonValue::Array(aliases)) => aliases
            .iter()
            .map(|a| {
                a.as_str()
                    .map(ToOwned::to_owned)
                    .ok_or_else(|| AvroErr::InvalidAttribute {
                        ty,
                        attr: "aliases",
                        found: a.to_string(),
                    })
            })
            .collect(),
        Some(other) => Err(AvroErr::InvalidAttribute {
            ty,
            attr: "aliases",
            found: other.to_string(),
        }),
        None => Ok(vec![]),
    }
}

fn parse_doc(value: Option<&JsonValue>) -> Option<String> {
    value.and_then(JsonValue::as_str).map(ToOwned::to_owned)
}
