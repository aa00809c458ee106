use crate::model::Types;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema definition error with optional source position.
///
/// Rendered as `<filename>:<line>: error: <message>` when a position is
/// known, or as the bare message for errors found on a model with no
/// source text (e.g. a deserialized type-model).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaError {
    pub filename: String,
    pub line: u32,
    pub message: String,
}

impl SchemaError {
    pub fn new(filename: &str, line: u32, message: impl Into<String>) -> Self {
        SchemaError {
            filename: filename.to_owned(),
            line,
            message: message.into(),
        }
    }

    /// An error with no source position.
    pub fn bare(message: impl Into<String>) -> Self {
        SchemaError {
            filename: String::new(),
            line: 0,
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}:{}: error: {}", self.filename, self.line, self.message)
        }
    }
}

/// The batch of definition errors raised by "parse or throw" entry points.
///
/// The partially-built type-model is preserved so callers can inspect
/// whatever parsed successfully.
#[derive(Debug, Clone)]
pub struct SchemaErrors {
    pub errors: Vec<SchemaError>,
    pub types: Types,
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for SchemaErrors {}

/// A validation-time error. Validation is fail-fast: the first structural
/// or attribute violation aborts with one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Type/shape mismatch or attribute violation for a value.
    #[error("{}", invalid_value_message(.value, .actual, .member, .expected, .attr))]
    InvalidValue {
        /// JSON repr of the offending value, truncated to 1000 chars.
        value: String,
        /// Runtime type name of the offending value.
        actual: &'static str,
        /// Fully-qualified member path, when inside a struct/array/dict.
        member: Option<String>,
        /// The expected type's name.
        expected: Option<String>,
        /// The failing attribute constraint, e.g. ">= 5".
        attr: Option<String>,
    },

    #[error("Required member '{0}' missing")]
    RequiredMemberMissing(String),

    #[error("Unknown member '{0}'")]
    UnknownMember(String),

    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Maximum validation depth exceeded")]
    DepthExceeded,
}

fn invalid_value_message(
    value: &str,
    actual: &str,
    member: &Option<String>,
    expected: &Option<String>,
    attr: &Option<String>,
) -> String {
    let mut msg = format!("Invalid value {} (type '{}')", value, actual);
    if let Some(member) = member {
        msg.push_str(&format!(" for member '{}'", member));
    }
    if let Some(expected) = expected {
        msg.push_str(&format!(", expected type '{}'", expected));
        if let Some(attr) = attr {
            msg.push_str(&format!(" [{}]", attr));
        }
    }
    msg
}
