// This module contains definition of types that are common across a subset of
// avro Schema implementation.

use crate::error::AvroErr;
use crate::value::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

pub(crate) const PRIMITIVES: [&str; 8] = [
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

pub(crate) fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

///////////////////////////////////////////////////////////////////////////////
/// Name implementation for named types: record, fixed, enum
///////////////////////////////////////////////////////////////////////////////

// [A-Za-z_][A-Za-z0-9_]*
pub(crate) fn validate_name(name: &str) -> Result<(), AvroErr> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AvroErr::InvalidName(name.to_string()))
    }
}

// Follows the grammer: <empty> | <name>[(<dot><name>)*]
pub(crate) fn validate_namespace(s: &str) -> Result<(), AvroErr> {
    if s.is_empty() {
        return Ok(());
    }
    for n in s.split('.') {
        validate_name(n).map_err(|_| AvroErr::InvalidNamespace(s.to_string()))?;
    }
    Ok(())
}

/// Represents the `fullname` attribute
/// of a named avro type i.e, Record, Fixed and Enum.
#[derive(Debug, Clone, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
}

impl Name {
    // Creates a new name with validation. This will extract the namespace if a dot is present in `name`.
    pub(crate) fn new(name: &str) -> Result<Self, AvroErr> {
        Name::qualify(name, None)
    }

    // Qualifies `name` with `namespace` unless it already is a fullname. A leading dot
    // marks a fullname in the null namespace.
    pub(crate) fn qualify(name: &str, namespace: Option<&str>) -> Result<Self, AvroErr> {
        let (namespace, name) = if let Some(absolute) = name.strip_prefix('.') {
            (None, absolute)
        } else if let Some(idx) = name.rfind('.') {
            (Some(&name[..idx]), &name[idx + 1..])
        } else {
            (namespace.filter(|ns| !ns.is_empty()), name)
        };

        validate_name(name)?;
        if let Some(ns) = namespace {
            validate_namespace(ns).map_err(|_| {
                AvroErr::InvalidName(format!("{}.{}", ns, name))
            })?;
        }

        // Primitives always live in the null namespace.
        let namespace = if is_primitive(name) {
            None
        } else {
            namespace.map(ToOwned::to_owned)
        };

        Ok(Self {
            name: name.to_string(),
            namespace,
        })
    }

    // Parses the optional name of a named type. If the name has a dot it is a
    // fullname and any namespace provided is ignored; otherwise the `namespace` attribute is
    // used, and failing that the enclosing namespace. An empty namespace attribute resets the
    // namespace to null.
    pub(crate) fn from_json(
        json: &serde_json::map::Map<String, JsonValue>,
        enclosing_namespace: Option<&str>,
    ) -> Result<Option<Self>, AvroErr> {
        let name = match json.get("name") {
            Some(JsonValue::String(s)) => s,
            Some(other) => {
                return Err(AvroErr::InvalidName(other.to_string()));
            }
            None => return Ok(None),
        };

        let namespace = match json.get("namespace") {
            Some(JsonValue::String(s)) => {
                validate_namespace(s)?;
                Some(s.as_str())
            }
            Some(JsonValue::Null) | None => enclosing_namespace,
            Some(other) => return Err(AvroErr::InvalidNamespace(other.to_string())),
        };

        Name::qualify(name, namespace).map(Some)
    }

    /// The unqualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace, `None` for the null namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The name qualified with its namespace.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(n) if !n.is_empty() => format!("{}.{}", n, self.name),
            _ => self.name.to_string(),
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname())
    }
}

impl FromStr for Name {
    type Err = AvroErr;

    fn from_str(s: &str) -> Result<Self, AvroErr> {
        Name::new(s)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.fullname() == other.fullname()
    }
}

// Strips the namespace off a fullname.
pub(crate) fn unqualify(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

///////////////////////////////////////////////////////////////////////////////
/// Ordering for record fields
///////////////////////////////////////////////////////////////////////////////

/// How a record field participates in ordering comparisons.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Smaller values first.
    Ascending,
    /// Larger values first.
    Descending,
    /// Not compared.
    Ignore,
}

impl Order {
    // Applies the field order to a comparison of the field's values.
    #[inline(always)]
    pub(crate) fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Order::Ascending => ord,
            Order::Descending => ord.reverse(),
            Order::Ignore => Ordering::Equal,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "ascending",
            Order::Descending => "descending",
            Order::Ignore => "ignore",
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::Ascending
    }
}

impl FromStr for Order {
    type Err = AvroErr;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(Order::Ascending),
            "descending" => Ok(Order::Descending),
            "ignore" => Ok(Order::Ignore),
            other => Err(AvroErr::UnknownFieldOrdering(other.to_string())),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
/// Record field definition.
///////////////////////////////////////////////////////////////////////////////

/// A record field: one entry of the record's flat field-descriptor array.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) ty: usize,
    pub(crate) default: Option<Value>,
    pub(crate) order: Order,
    pub(crate) aliases: Vec<String>,
    pub(crate) doc: Option<String>,
}

impl Field {
    pub(crate) fn new(
        name: &str,
        ty: usize,
        order: Order,
        aliases: Vec<String>,
        doc: Option<String>,
    ) -> Result<Self, AvroErr> {
        // Field names follow the same rules as type names.
        validate_name(name)?;
        for alias in &aliases {
            validate_name(alias)?;
        }
        Ok(Field {
            name: name.to_string(),
            ty,
            default: None,
            order,
            aliases,
            doc,
        })
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sort order of the field.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Alternate names of the field, used when resolving.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The field's `doc` attribute.
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// A fresh copy of the field's default value, if it declares one.
    pub fn default_value(&self) -> Option<Value> {
        self.default.clone()
    }

    // The field's own name followed by its aliases.
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}
