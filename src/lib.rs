//! Avrotype is an Avro type engine: it turns a schema document into a type graph and
//! uses that graph to encode, decode, validate, compare and resolve values as laid out
//! in the [Apache Avro specification](https://avro.apache.org/docs/current/spec.html).
//!
//! ## Using the library
//!
//! Add avrotype to your `Cargo.toml`:
//!```toml
//! [dependencies]
//! avrotype = "0.1.0"
//!```
//! ## Encoding, decoding and reading with a different schema
//!
//!```rust
//! use avrotype::{Record, Type, Value};
//! use std::str::FromStr;
//! use anyhow::Error;
//!
//! fn main() -> Result<(), Error> {
//!     // Parse a schema
//!     let writer = Type::from_str(
//!         r##"{"type": "record", "name": "Point", "fields": [{"name": "x", "type": "int"}]}"##,
//!     )?;
//!
//!     // Build a value and encode it
//!     let mut point = Record::new("Point");
//!     point.insert("x", 7)?;
//!     let buf = writer.to_buffer(&Value::Record(point))?;
//!
//!     // Decode it with the same type
//!     let value = writer.from_buffer(&buf)?;
//!     assert_eq!(value.as_record()?.get("x"), Some(&Value::Int(7)));
//!
//!     // Or read it as an evolved version of the schema
//!     let reader = Type::from_str(
//!         r##"{"type": "record", "name": "Point", "fields": [
//!             {"name": "x", "type": "long"},
//!             {"name": "y", "type": "long", "default": 0}
//!         ]}"##,
//!     )?;
//!     let resolver = reader.create_resolver(&writer)?;
//!     let value = resolver.from_buffer(&buf)?;
//!     assert_eq!(value.as_record()?.get("y"), Some(&Value::Long(0)));
//!
//!     Ok(())
//! }
//!```

#![deny(missing_docs)]
#![recursion_limit = "1024"]
#![deny(unused_must_use)]
#![deny(rust_2018_idioms)]

mod compare;
pub mod config;
mod copy;
mod error;
mod json;
mod logical;
mod random;
mod reader;
mod resolver;
mod schema;
mod tap;
mod util;
mod validate;
mod value;
mod writer;

pub use copy::CloneOptions;
pub use error::{AvroErr, AvroResult};
pub use json::JsonMode;
pub use logical::{
    builtin_logical_types, factory, DateType, DecimalType, LogicalType, LogicalTypeFactory,
    TimestampType, TimestampUnit, UuidType,
};
pub use random::Lcg;
pub use resolver::{Resolver, ResolverOptions};
pub use schema::{
    CanonicalSchema, Field, Fingerprint, Name, Order, ParseOptions, Registry, SchemaOptions,
    Type, TypeHook, WrapUnions,
};
pub use tap::Tap;
pub use validate::{ErrorHook, ValidateOptions};
pub use value::{Decimal, Map, Record, Value};
