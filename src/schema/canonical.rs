use super::common::{is_primitive, Order};
use super::{Graph, Named, Type, TypeId, Variant};
use crate::json::{self, JsonMode};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashSet;

// wrap overflow of 0xc15d213aa4d7a795
const EMPTY: i64 = -4513414715797952619;

static FP_TABLE: once_cell::sync::Lazy<[i64; 256]> = {
    use once_cell::sync::Lazy;
    Lazy::new(|| {
        let mut fp_table: [i64; 256] = [0; 256];
        for i in 0..256 {
            let mut fp = i;
            for _ in 0..8 {
                fp = (fp as u64 >> 1) as i64 ^ (EMPTY & -(fp & 1));
            }
            fp_table[i as usize] = fp;
        }
        fp_table
    })
};

/// Controls the JSON produced when exporting a type's schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOptions {
    /// Include docs, aliases, field defaults and orders, and logical attributes.
    /// Without it the output is the Parsing Canonical Form.
    pub export_attrs: bool,
    /// Emit named types by name only, never inlining their definition.
    pub no_deref: bool,
}

/// Hash algorithms available for schema fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fingerprint {
    /// MD5, the default.
    Md5,
    /// SHA-256.
    #[cfg(feature = "sha2")]
    Sha256,
    /// The 64-bit Rabin fingerprint, as 8 little endian bytes.
    Rabin,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Fingerprint::Md5
    }
}

/// Represents canonical form of an avro schema. This representation removes irrelevant fields
/// such as docs and aliases in the schema.
/// Fingerprinting methods are available on this instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema(pub(crate) JsonValue);

impl std::fmt::Display for CanonicalSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CanonicalSchema {
    /// The canonical form as JSON.
    pub fn json(&self) -> &JsonValue {
        &self.0
    }

    /// SHA-256 of the canonical form.
    #[cfg(feature = "sha2")]
    pub fn sha256(&self) -> Vec<u8> {
        use shatwo::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.0.to_string());
        let result = hasher.finalize();
        result.to_vec()
    }

    /// MD5 of the canonical form.
    pub fn md5(&self) -> Vec<u8> {
        let v = mdfive::compute(self.0.to_string().as_bytes());
        v.to_vec()
    }

    /// CRC-64-AVRO (Rabin) fingerprint of the canonical form.
    pub fn rabin64(&self) -> i64 {
        let buf = self.0.to_string();
        let buf = buf.as_bytes();
        let mut fp: i64 = EMPTY;

        buf.iter().for_each(|b| {
            let idx = ((fp ^ *b as i64) & 0xff) as usize;
            fp = (fp as u64 >> 8) as i64 ^ FP_TABLE[idx];
        });

        fp
    }

    /// Fingerprint of the canonical form with `algorithm`.
    pub fn fingerprint(&self, algorithm: Fingerprint) -> Vec<u8> {
        match algorithm {
            Fingerprint::Md5 => self.md5(),
            #[cfg(feature = "sha2")]
            Fingerprint::Sha256 => self.sha256(),
            Fingerprint::Rabin => self.rabin64().to_le_bytes().to_vec(),
        }
    }
}

pub(crate) fn to_schema(g: &Graph, id: TypeId, opts: &SchemaOptions) -> JsonValue {
    let mut derefed = HashSet::new();
    project(g, id, opts, &mut derefed)
}

// Named types are inlined at their first occurrence and referenced by fullname after.
fn project(g: &Graph, id: TypeId, opts: &SchemaOptions, derefed: &mut HashSet<String>) -> JsonValue {
    match g.variant(id) {
        Variant::Null => json!("null"),
        Variant::Boolean => json!("boolean"),
        Variant::Int => json!("int"),
        Variant::Long => json!("long"),
        Variant::Float => json!("float"),
        Variant::Double => json!("double"),
        Variant::Bytes => json!("bytes"),
        Variant::Str => json!("string"),
        Variant::Array { items } => json!({
            "type": "array",
            "items": project(g, *items, opts, derefed),
        }),
        Variant::Map { values } => json!({
            "type": "map",
            "values": project(g, *values, opts, derefed),
        }),
        Variant::Union(u) => JsonValue::Array(
            u.branches
                .iter()
                .map(|b| project(g, *b, opts, derefed))
                .collect(),
        ),
        Variant::Fixed(f) => {
            let mut obj = match named_header(&f.named, "fixed", opts, derefed) {
                Ok(obj) => obj,
                Err(reference) => return reference,
            };
            obj.insert("size".to_string(), json!(f.size));
            export_named(&mut obj, &f.named, opts);
            JsonValue::Object(obj)
        }
        Variant::Enum(e) => {
            let mut obj = match named_header(&e.named, "enum", opts, derefed) {
                Ok(obj) => obj,
                Err(reference) => return reference,
            };
            obj.insert("symbols".to_string(), json!(e.symbols));
            if opts.export_attrs {
                if let Some(default) = &e.default {
                    obj.insert("default".to_string(), json!(default));
                }
            }
            export_named(&mut obj, &e.named, opts);
            JsonValue::Object(obj)
        }
        Variant::Record(r) => {
            let kind = if r.is_error { "error" } else { "record" };
            let mut obj = match named_header(&r.named, kind, opts, derefed) {
                Ok(obj) => obj,
                Err(reference) => return reference,
            };
            let fields: Vec<JsonValue> = r
                .fields
                .iter()
                .map(|f| {
                    let mut field = Map::new();
                    field.insert("name".to_string(), json!(f.name));
                    field.insert("type".to_string(), project(g, f.ty, opts, derefed));
                    if opts.export_attrs {
                        if let Some(default) = &f.default {
                            if let Ok(default) = json::to_json(g, f.ty, default, JsonMode::Default) {
                                field.insert("default".to_string(), default);
                            }
                        }
                        if f.order != Order::Ascending {
                            field.insert("order".to_string(), json!(f.order.as_str()));
                        }
                        if !f.aliases.is_empty() {
                            field.insert("aliases".to_string(), json!(f.aliases));
                        }
                        if let Some(doc) = &f.doc {
                            field.insert("doc".to_string(), json!(doc));
                        }
                    }
                    JsonValue::Object(field)
                })
                .collect();
            obj.insert("fields".to_string(), JsonValue::Array(fields));
            export_named(&mut obj, &r.named, opts);
            JsonValue::Object(obj)
        }
        Variant::Logical(l) => {
            let underlying = project(g, l.underlying, opts, derefed);
            if !opts.export_attrs {
                return underlying;
            }
            let mut obj = match underlying {
                JsonValue::Object(obj) => obj,
                JsonValue::String(s) if is_primitive(&s) => {
                    let mut obj = Map::new();
                    obj.insert("type".to_string(), JsonValue::String(s));
                    obj
                }
                reference => return reference,
            };
            for (k, v) in &l.attrs {
                obj.insert(k.clone(), v.clone());
            }
            JsonValue::Object(obj)
        }
        Variant::Pending { name, .. } => json!(name.as_ref().map(|n| n.fullname())),
    }
}

// Starts the object of a named type, or returns the reference to emit instead.
fn named_header(
    named: &Named,
    kind: &str,
    opts: &SchemaOptions,
    derefed: &mut HashSet<String>,
) -> Result<Map<String, JsonValue>, JsonValue> {
    let mut obj = Map::new();
    if let Some(name) = &named.name {
        let fullname = name.fullname();
        if opts.no_deref || !derefed.insert(fullname.clone()) {
            return Err(JsonValue::String(fullname));
        }
        obj.insert("name".to_string(), JsonValue::String(fullname));
    }
    obj.insert("type".to_string(), json!(kind));
    Ok(obj)
}

fn export_named(obj: &mut Map<String, JsonValue>, named: &Named, opts: &SchemaOptions) {
    if !opts.export_attrs {
        return;
    }
    if !named.aliases.is_empty() {
        obj.insert("aliases".to_string(), json!(named.aliases));
    }
    if let Some(doc) = &named.doc {
        obj.insert("doc".to_string(), json!(doc));
    }
}

impl Type {
    /// Exports the type's schema as JSON.
    pub fn to_schema(&self, opts: &SchemaOptions) -> JsonValue {
        to_schema(&self.graph, self.id, opts)
    }

    /// Returns the canonical form of an Avro schema.
    /// Example:
    /// ```rust
    /// use avrotype::Type;
    /// use std::str::FromStr;
    ///
    /// let schema = Type::from_str(r##"
    ///     {
    ///         "type": "record",
    ///         "name": "LongList",
    ///         "aliases": ["LinkedLongs"],
    ///         "fields" : [
    ///             {"name": "value", "type": "long"},
    ///             {"name": "next", "type": ["null", "LongList"]
    ///         }]
    ///     }
    /// "##).unwrap();
    ///
    /// let canonical = schema.canonical_form();
    /// assert_eq!(
    ///     canonical.to_string(),
    ///     r#"{"name":"LongList","type":"record","fields":[{"name":"value","type":"long"},{"name":"next","type":["null","LongList"]}]}"#
    /// );
    /// ```
    pub fn canonical_form(&self) -> CanonicalSchema {
        CanonicalSchema(self.to_schema(&SchemaOptions::default()))
    }

    /// Hash of the canonical form. The MD5 fingerprint is computed once per node.
    pub fn fingerprint(&self, algorithm: Fingerprint) -> Vec<u8> {
        match algorithm {
            Fingerprint::Md5 => self.graph.nodes[self.id]
                .fingerprint
                .get_or_init(|| self.canonical_form().md5())
                .clone(),
            other => self.canonical_form().fingerprint(other),
        }
    }
}
