#![allow(missing_docs)]

use std::fmt::Debug;

pub type AvroResult<T> = Result<T, AvroErr>;

/// Errors returned from avrotype
#[derive(thiserror::Error, Debug)]
pub enum AvroErr {
    // Schema parse errors
    #[error("Failed to parse schema json")]
    JsonParse(#[from] serde_json::Error),
    #[error("Failed to read schema file")]
    Io(#[source] std::io::Error),
    #[error("Expected the avro schema to be as one of json string, object or an array")]
    UnknownSchema,
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("Undefined type name: {0}")]
    UndefinedTypeName(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),
    #[error("Cannot rename primitive type: {0}")]
    CannotRenamePrimitive(String),
    #[error("Duplicate type name: {0}")]
    DuplicateSchema(String),
    #[error("Missing required `{attr}` attribute in {ty} schema")]
    MissingAttribute { ty: &'static str, attr: &'static str },
    #[error("Invalid `{attr}` attribute in {ty} schema: {found}")]
    InvalidAttribute {
        ty: &'static str,
        attr: &'static str,
        found: String,
    },
    #[error("Anonymous {0} types are not allowed")]
    AnonymousType(&'static str),
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
    #[error("Duplicate enum symbol: {0}")]
    DuplicateSymbol(String),
    #[error("Unions must not contain immediate union values")]
    NoImmediateUnion,
    #[error("Duplicate union branch: {0}")]
    DuplicateBranch(String),
    #[error("Ambiguous unwrapped union: {0}")]
    AmbiguousUnion(String),
    #[error("Unknown field ordering value: {0}")]
    UnknownFieldOrdering(String),
    #[error("Invalid default value for field `{field}`")]
    InvalidDefaultValue {
        field: String,
        #[source]
        source: Box<AvroErr>,
    },
    #[error("Logical type `{name}` rejected its schema: {reason}")]
    LogicalTypeFailed { name: String, reason: String },

    // Validation errors
    #[error("Invalid value {value} for schema {schema}")]
    InvalidValue { value: String, schema: String },
    #[error("Ambiguous conversion: value matches more than one logical branch")]
    AmbiguousConversion,
    #[error("Maps cannot be compared")]
    MapsNotComparable,
    #[error("Invalid JSON value {value} for schema {schema}")]
    InvalidJson { value: String, schema: String },

    // Resolution errors
    #[error("Incompatible schemas, cannot read {writer} as {reader}")]
    IncompatibleSchema {
        reader: String,
        writer: String,
        #[source]
        source: Box<AvroErr>,
    },
    #[error("Cannot read {writer} as {reader}")]
    CannotRead { reader: String, writer: String },
    #[error("Ambiguous aliasing for {record}.{field} ({matches})")]
    AmbiguousAliasing {
        record: String,
        field: String,
        matches: String,
    },
    #[error("No matching field for default-less {record}.{field}")]
    NoMatchingField { record: String, field: String },
    #[error("Resolver does not belong to this reader type")]
    ResolverMismatch,

    // Decode errors
    #[error("Truncated buffer")]
    Truncated,
    #[error("Trailing data after decoding ({0} bytes)")]
    TrailingData(usize),
    #[error("Buffer too small, {needed} bytes required")]
    BufferOverflow { needed: usize },
    #[error("Invalid union index: {0}")]
    InvalidUnionIndex(i64),
    #[error("Invalid enum index: {0}")]
    InvalidEnumIndex(i64),
    #[error("Invalid utf-8 in string")]
    InvalidUtf8(#[source] std::str::Utf8Error),
    #[error("Negative length: {0}")]
    NegativeLength(i64),

    // Value errors
    #[error("Expected value not found in variant instance")]
    ExpectedVariantNotFound,
}
