//! schemark-core: Schema Markdown compiler core library.
//!
//! Provides the pipeline from Schema Markdown source text to a
//! finalized type-model, and the validator that checks and coerces
//! values against a named type:
//!
//! - [`SchemaParser`] / [`parse_schema()`] -- line-oriented parser with
//!   error recovery and multi-source accumulation
//! - [`check_types()`] -- the finalize pass: base flattening, cycle
//!   detection, reference resolution, attribute legality
//! - [`validate_type()`] -- fail-fast structural validation/coercion
//! - [`types_schema()`] -- the self-describing type-model meta-schema
//!
//! All three stages are synchronous pure functions; a finalized
//! type-model is read-only and can be shared freely across threads.

pub mod check;
pub mod error;
pub mod model;
pub mod parser;
pub mod self_schema;
pub mod validate;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{SchemaError, SchemaErrors, ValidationError};
pub use model::{
    ActionType, ActionUrl, ArrayType, Attributes, BuiltinType, DictType, EnumType, EnumValue,
    StructMember, StructType, Type, TypedefType, Types, UserType,
};
pub use value::Value;

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use check::{check_types, CheckError};
pub use parser::{parse_schema, parse_schema_with_filename, SchemaParser};
pub use self_schema::{types_schema, validate_type_model};
pub use validate::validate_type;
