//! Type-model data structures.
//!
//! A type-model is a flat mapping of type name to user type definition,
//! produced by the Schema Markdown parser and finalized by the checker.
//! The serde shapes here are a compatibility surface: the JSON rendering
//! uses externally-tagged envelopes (`{"struct": {...}}`, `{"builtin":
//! "int"}`) with optional fields omitted when absent, so type-models can
//! be persisted and exchanged as JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// The full mapping of type name to user type definition.
pub type Types = BTreeMap<String, UserType>;

/// Documentation markdown lines attached to a type, member, or value.
pub type Doc = Vec<String>;

fn is_false(b: &bool) -> bool {
    !*b
}

// ──────────────────────────────────────────────
// Type references
// ──────────────────────────────────────────────

/// A builtin scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinType {
    String,
    Int,
    Float,
    Bool,
    Date,
    Datetime,
    Uuid,
    Object,
}

impl BuiltinType {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::String => "string",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Bool => "bool",
            BuiltinType::Date => "date",
            BuiltinType::Datetime => "datetime",
            BuiltinType::Uuid => "uuid",
            BuiltinType::Object => "object",
        }
    }

    /// The builtin named by a Schema Markdown type keyword, if any.
    pub fn from_keyword(word: &str) -> Option<BuiltinType> {
        match word {
            "string" => Some(BuiltinType::String),
            "int" => Some(BuiltinType::Int),
            "float" => Some(BuiltinType::Float),
            "bool" => Some(BuiltinType::Bool),
            "date" => Some(BuiltinType::Date),
            "datetime" => Some(BuiltinType::Datetime),
            "uuid" => Some(BuiltinType::Uuid),
            "object" => Some(BuiltinType::Object),
            _ => None,
        }
    }
}

/// A type reference. Exactly one variant is populated; the serde
/// rendering is the presence-keyed envelope (`{"builtin": "int"}`,
/// `{"array": {...}}`, `{"dict": {...}}`, `{"user": "Name"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    #[serde(rename = "builtin")]
    Builtin(BuiltinType),
    #[serde(rename = "array")]
    Array(Box<ArrayType>),
    #[serde(rename = "dict")]
    Dict(Box<DictType>),
    #[serde(rename = "user")]
    User(String),
}

impl Type {
    /// The type's display name for diagnostics.
    pub fn text(&self) -> String {
        match self {
            Type::Builtin(b) => b.name().to_owned(),
            Type::Array(_) => "array".to_owned(),
            Type::Dict(_) => "dict".to_owned(),
            Type::User(name) => name.clone(),
        }
    }
}

/// An array type: element type plus optional element-level attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    #[serde(rename = "type")]
    pub type_: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<Attributes>,
}

/// A dict type: value type plus optional value-level attributes, with an
/// optional non-default key type (default key type is string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictType {
    #[serde(rename = "type")]
    pub type_: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<Attributes>,
    #[serde(rename = "keyType", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<Type>,
    #[serde(rename = "keyAttr", skip_serializing_if = "Option::is_none")]
    pub key_attr: Option<Attributes>,
}

// ──────────────────────────────────────────────
// Attribute constraints
// ──────────────────────────────────────────────

/// An attribute-constraint set: numeric comparisons, length comparisons,
/// and the `nullable` marker. A structure of optional fields rather than
/// a presence-keyed bag; absent fields are omitted from the JSON shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(rename = "lenEq", skip_serializing_if = "Option::is_none")]
    pub len_eq: Option<u64>,
    #[serde(rename = "lenLT", skip_serializing_if = "Option::is_none")]
    pub len_lt: Option<u64>,
    #[serde(rename = "lenLTE", skip_serializing_if = "Option::is_none")]
    pub len_lte: Option<u64>,
    #[serde(rename = "lenGT", skip_serializing_if = "Option::is_none")]
    pub len_gt: Option<u64>,
    #[serde(rename = "lenGTE", skip_serializing_if = "Option::is_none")]
    pub len_gte: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
}

/// The constraint family an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Numeric,
    Length,
}

/// Format an attribute operand the way it appeared in source: integral
/// values render without a fractional part.
pub fn attr_number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Attributes {
    /// All populated comparison attributes, in declaration-field order,
    /// as (source text, constraint family) pairs. `nullable` is not a
    /// comparison and is not included.
    pub fn comparisons(&self) -> Vec<(String, AttrKind)> {
        let mut out = Vec::new();
        if let Some(n) = self.eq {
            out.push((format!("== {}", attr_number_text(n)), AttrKind::Numeric));
        }
        if let Some(n) = self.lt {
            out.push((format!("< {}", attr_number_text(n)), AttrKind::Numeric));
        }
        if let Some(n) = self.lte {
            out.push((format!("<= {}", attr_number_text(n)), AttrKind::Numeric));
        }
        if let Some(n) = self.gt {
            out.push((format!("> {}", attr_number_text(n)), AttrKind::Numeric));
        }
        if let Some(n) = self.gte {
            out.push((format!(">= {}", attr_number_text(n)), AttrKind::Numeric));
        }
        if let Some(n) = self.len_eq {
            out.push((format!("len == {}", n), AttrKind::Length));
        }
        if let Some(n) = self.len_lt {
            out.push((format!("len < {}", n), AttrKind::Length));
        }
        if let Some(n) = self.len_lte {
            out.push((format!("len <= {}", n), AttrKind::Length));
        }
        if let Some(n) = self.len_gt {
            out.push((format!("len > {}", n), AttrKind::Length));
        }
        if let Some(n) = self.len_gte {
            out.push((format!("len >= {}", n), AttrKind::Length));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        *self == Attributes::default()
    }
}

// ──────────────────────────────────────────────
// User types
// ──────────────────────────────────────────────

/// A user type definition. Exactly one variant is populated; the serde
/// rendering is the `{"struct": ...}` / `{"enum": ...}` / `{"typedef":
/// ...}` / `{"action": ...}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "struct")]
    Struct(StructType),
    #[serde(rename = "enum")]
    Enum(EnumType),
    #[serde(rename = "typedef")]
    Typedef(TypedefType),
    #[serde(rename = "action")]
    Action(ActionType),
}

impl UserType {
    /// The type's internal name field.
    pub fn name(&self) -> &str {
        match self {
            UserType::Struct(s) => &s.name,
            UserType::Enum(e) => &e.name,
            UserType::Typedef(t) => &t.name,
            UserType::Action(a) => &a.name,
        }
    }
}

/// A struct type: ordered members, optional bases, optional union flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Doc>,
    #[serde(rename = "docGroup", skip_serializing_if = "Option::is_none")]
    pub doc_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<StructMember>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub union: bool,
}

impl StructType {
    pub fn new(name: &str) -> Self {
        StructType {
            name: name.to_owned(),
            doc: None,
            doc_group: None,
            bases: None,
            members: None,
            union: false,
        }
    }
}

/// A struct member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Doc>,
    #[serde(rename = "type")]
    pub type_: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<Attributes>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

/// An enum type: ordered values plus optional bases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Doc>,
    #[serde(rename = "docGroup", skip_serializing_if = "Option::is_none")]
    pub doc_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<EnumValue>>,
}

impl EnumType {
    pub fn new(name: &str) -> Self {
        EnumType {
            name: name.to_owned(),
            doc: None,
            doc_group: None,
            bases: None,
            values: None,
        }
    }
}

/// A single enum value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Doc>,
}

/// A typedef: an alias for another type, with optional attributes applied
/// on top of the aliased type's own constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedefType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Doc>,
    #[serde(rename = "docGroup", skip_serializing_if = "Option::is_none")]
    pub doc_group: Option<String>,
    #[serde(rename = "type")]
    pub type_: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<Attributes>,
}

/// An RPC-style action: up to five named type references plus URL
/// bindings. Actions are dispatch units and are never referenced as a
/// value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Doc>,
    #[serde(rename = "docGroup", skip_serializing_if = "Option::is_none")]
    pub doc_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<ActionUrl>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl ActionType {
    pub fn new(name: &str) -> Self {
        ActionType {
            name: name.to_owned(),
            doc: None,
            doc_group: None,
            urls: None,
            path: None,
            query: None,
            input: None,
            output: None,
            errors: None,
        }
    }
}

/// A URL binding. A missing method or path is a wildcard slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionUrl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ActionUrl {
    /// Diagnostic rendering: wildcard method renders as `*`, a missing
    /// path renders as nothing.
    pub fn text(&self) -> String {
        let method = self.method.as_deref().unwrap_or("*");
        match &self.path {
            Some(path) => format!("{} {}", method, path),
            None => method.to_owned(),
        }
    }
}

// ──────────────────────────────────────────────
// Model queries
// ──────────────────────────────────────────────

/// Chase typedef aliases to the ultimate non-typedef type reference.
///
/// The unwrap is shallow: a typedef whose target is an array or dict
/// yields that compound as-is. Chasing is bounded by the model size so a
/// circular typedef chain terminates (returning the last reference seen).
pub fn effective_type<'a>(types: &'a Types, type_: &'a Type) -> &'a Type {
    let mut t = type_;
    for _ in 0..=types.len() {
        match t {
            Type::User(name) => match types.get(name.as_str()) {
                Some(UserType::Typedef(td)) => t = &td.type_,
                _ => break,
            },
            _ => break,
        }
    }
    t
}

/// Resolve a user type name through typedef-to-user chains to the name of
/// the underlying non-typedef user type (or the last name seen, for
/// chains that end in a builtin/compound or a cycle).
pub fn resolve_user_name<'a>(types: &'a Types, name: &'a str) -> &'a str {
    let mut n = name;
    for _ in 0..=types.len() {
        match types.get(n) {
            Some(UserType::Typedef(td)) => match &td.type_ {
                Type::User(next) => n = next.as_str(),
                _ => break,
            },
            _ => break,
        }
    }
    n
}

/// The struct's members with base members flattened in: base members
/// first, in base-list order, depth-first, then the struct's own
/// declarations. Each base is included at most once.
pub fn struct_members<'a>(types: &'a Types, struct_: &'a StructType) -> Vec<&'a StructMember> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(struct_.name.as_str());
    collect_struct_members(types, struct_, &mut visited, &mut out);
    out
}

fn collect_struct_members<'a>(
    types: &'a Types,
    struct_: &'a StructType,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<&'a StructMember>,
) {
    if let Some(bases) = &struct_.bases {
        for base in bases {
            let resolved = resolve_user_name(types, base);
            if !visited.insert(resolved) {
                continue;
            }
            if let Some(UserType::Struct(base_struct)) = types.get(resolved) {
                collect_struct_members(types, base_struct, visited, out);
            }
        }
    }
    if let Some(members) = &struct_.members {
        out.extend(members.iter());
    }
}

/// The enum's values with base values flattened in, base values first.
pub fn enum_values<'a>(types: &'a Types, enum_: &'a EnumType) -> Vec<&'a EnumValue> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(enum_.name.as_str());
    collect_enum_values(types, enum_, &mut visited, &mut out);
    out
}

fn collect_enum_values<'a>(
    types: &'a Types,
    enum_: &'a EnumType,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<&'a EnumValue>,
) {
    if let Some(bases) = &enum_.bases {
        for base in bases {
            let resolved = resolve_user_name(types, base);
            if !visited.insert(resolved) {
                continue;
            }
            if let Some(UserType::Enum(base_enum)) = types.get(resolved) {
                collect_enum_values(types, base_enum, visited, out);
            }
        }
    }
    if let Some(values) = &enum_.values {
        out.extend(values.iter());
    }
}
