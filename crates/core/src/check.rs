//! Cross-reference / consistency checker — the finalize pass.
//!
//! Walks every user type in sorted-name order and collects all
//! detectable definition problems into one batch: inconsistent names,
//! bad or circular base types, duplicate members and values after base
//! flattening, unresolved type references, actions referenced as value
//! types, illegal attributes, and cross-section duplicate action inputs.
//! Nothing stops at the first error; a schema author gets the full list
//! in one pass.

use crate::model::{
    effective_type, enum_values, resolve_user_name, struct_members, ActionType, AttrKind,
    Attributes, BuiltinType, EnumType, StructType, Type, TypedefType, Types, UserType,
};
use std::collections::{HashMap, HashSet};

/// A finding from the checker, anchored to a type (and optionally a
/// member or value) so callers with position bookkeeping can attach
/// file/line context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    pub type_name: String,
    pub member_name: Option<String>,
    pub message: String,
}

/// Check a whole type-model, returning every finding in a stable order:
/// types in sorted-name order, and within a type, declaration order.
pub fn check_types(types: &Types) -> Vec<CheckError> {
    let mut errors = Vec::new();
    for (key, user_type) in types {
        if user_type.name() != key {
            errors.push(CheckError {
                type_name: key.clone(),
                member_name: None,
                message: format!(
                    "Inconsistent type name '{}' for '{}'",
                    user_type.name(),
                    key
                ),
            });
        }
        match user_type {
            UserType::Struct(s) => check_struct(types, key, s, &mut errors),
            UserType::Enum(e) => check_enum(types, key, e, &mut errors),
            UserType::Typedef(t) => check_typedef(types, key, t, &mut errors),
            UserType::Action(a) => check_action(types, key, a, &mut errors),
        }
    }
    errors
}

fn push(errors: &mut Vec<CheckError>, type_name: &str, member: Option<&str>, message: String) {
    errors.push(CheckError {
        type_name: type_name.to_owned(),
        member_name: member.map(str::to_owned),
        message,
    });
}

fn from_clause(type_name: &str, member: Option<&str>) -> String {
    match member {
        Some(member) => format!("from '{}' member '{}'", type_name, member),
        None => format!("from '{}'", type_name),
    }
}

// ──────────────────────────────────────────────
// Per-kind checks
// ──────────────────────────────────────────────

fn check_struct(types: &Types, key: &str, struct_: &StructType, errors: &mut Vec<CheckError>) {
    if let Some(bases) = &struct_.bases {
        for base in bases {
            if !matches!(
                types.get(resolve_user_name(types, base)),
                Some(UserType::Struct(_))
            ) {
                push(
                    errors,
                    key,
                    None,
                    format!("Invalid struct base type '{}'", base),
                );
            }
        }
    }
    if has_base_cycle(types, key) {
        push(
            errors,
            key,
            None,
            format!("Circular base type detected for type '{}'", key),
        );
    } else {
        let mut seen = HashSet::new();
        for member in struct_members(types, struct_) {
            if !seen.insert(member.name.as_str()) {
                push(
                    errors,
                    key,
                    Some(&member.name),
                    format!("Redefinition of '{}' member '{}'", key, member.name),
                );
            }
        }
    }
    for member in struct_.members.iter().flatten() {
        check_type_refs(types, key, Some(&member.name), &member.type_, errors);
        check_attr_legality(
            types,
            key,
            Some(&member.name),
            &member.type_,
            member.attr.as_ref(),
            errors,
        );
    }
}

fn check_enum(types: &Types, key: &str, enum_: &EnumType, errors: &mut Vec<CheckError>) {
    if let Some(bases) = &enum_.bases {
        for base in bases {
            if !matches!(
                types.get(resolve_user_name(types, base)),
                Some(UserType::Enum(_))
            ) {
                push(
                    errors,
                    key,
                    None,
                    format!("Invalid enum base type '{}'", base),
                );
            }
        }
    }
    if has_base_cycle(types, key) {
        push(
            errors,
            key,
            None,
            format!("Circular base type detected for type '{}'", key),
        );
    } else {
        let mut seen = HashSet::new();
        for value in enum_values(types, enum_) {
            if !seen.insert(value.name.as_str()) {
                push(
                    errors,
                    key,
                    Some(&value.name),
                    format!("Redefinition of '{}' value '{}'", key, value.name),
                );
            }
        }
    }
}

fn check_typedef(types: &Types, key: &str, typedef: &TypedefType, errors: &mut Vec<CheckError>) {
    if typedef_chain_cycles(types, key) {
        push(
            errors,
            key,
            None,
            format!("Circular base type detected for type '{}'", key),
        );
        return;
    }
    check_type_refs(types, key, None, &typedef.type_, errors);
    check_attr_legality(types, key, None, &typedef.type_, typedef.attr.as_ref(), errors);
}

fn check_action(types: &Types, key: &str, action: &ActionType, errors: &mut Vec<CheckError>) {
    let struct_sections: [(&str, &Option<String>); 4] = [
        ("path", &action.path),
        ("query", &action.query),
        ("input", &action.input),
        ("output", &action.output),
    ];
    for (section, slot) in struct_sections {
        if let Some(name) = slot {
            match types.get(resolve_user_name(types, name)) {
                None => push(
                    errors,
                    key,
                    None,
                    format!("Unknown type '{}' {}", name, from_clause(key, None)),
                ),
                Some(UserType::Struct(s)) if !s.union => {}
                Some(_) => push(
                    errors,
                    key,
                    None,
                    format!("Invalid action {} type '{}' from '{}'", section, name, key),
                ),
            }
        }
    }
    if let Some(name) = &action.errors {
        match types.get(resolve_user_name(types, name)) {
            None => push(
                errors,
                key,
                None,
                format!("Unknown type '{}' {}", name, from_clause(key, None)),
            ),
            Some(UserType::Enum(_)) => {}
            Some(_) => push(
                errors,
                key,
                None,
                format!("Invalid action errors type '{}' from '{}'", name, key),
            ),
        }
    }

    // Members contributed by path, query, and input combined must not
    // collide by name; a collision is reported against every
    // contributing section type.
    let mut contributions: Vec<(&str, Vec<&str>)> = Vec::new();
    for slot in [&action.path, &action.query, &action.input] {
        if let Some(name) = slot {
            if let Some(UserType::Struct(s)) = types.get(resolve_user_name(types, name)) {
                let mut names: Vec<&str> = Vec::new();
                for member in struct_members(types, s) {
                    if !names.contains(&member.name.as_str()) {
                        names.push(&member.name);
                    }
                }
                contributions.push((s.name.as_str(), names));
            }
        }
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, names) in &contributions {
        for &name in names {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    for (section_type, names) in &contributions {
        for &name in names {
            if counts.get(name).copied().unwrap_or(0) > 1 {
                push(
                    errors,
                    section_type,
                    Some(name),
                    format!(
                        "Duplicate action input member '{}' from '{}'",
                        name, section_type
                    ),
                );
            }
        }
    }
}

// ──────────────────────────────────────────────
// Reference and attribute checks
// ──────────────────────────────────────────────

fn check_type_refs(
    types: &Types,
    type_name: &str,
    member: Option<&str>,
    t: &Type,
    errors: &mut Vec<CheckError>,
) {
    match t {
        Type::Builtin(_) => {}
        Type::User(name) => match types.get(name) {
            None => push(
                errors,
                type_name,
                member,
                format!("Unknown type '{}' {}", name, from_clause(type_name, member)),
            ),
            Some(UserType::Action(_)) => push(
                errors,
                type_name,
                member,
                format!(
                    "Invalid reference to action '{}' {}",
                    name,
                    from_clause(type_name, member)
                ),
            ),
            Some(_) => {}
        },
        Type::Array(array) => {
            check_type_refs(types, type_name, member, &array.type_, errors);
            check_attr_legality(
                types,
                type_name,
                member,
                &array.type_,
                array.attr.as_ref(),
                errors,
            );
        }
        Type::Dict(dict) => {
            check_type_refs(types, type_name, member, &dict.type_, errors);
            check_attr_legality(
                types,
                type_name,
                member,
                &dict.type_,
                dict.attr.as_ref(),
                errors,
            );
            let string_type = Type::Builtin(BuiltinType::String);
            let key_type = dict.key_type.as_ref().unwrap_or(&string_type);
            if dict.key_type.is_some() {
                check_type_refs(types, type_name, member, key_type, errors);
            }
            check_attr_legality(
                types,
                type_name,
                member,
                key_type,
                dict.key_attr.as_ref(),
                errors,
            );
        }
    }
}

/// Confirm every attribute in the set is legal for the value type's
/// effective type: numeric comparisons for int/float, length comparisons
/// for string/array/dict, `nullable` always.
fn check_attr_legality(
    types: &Types,
    type_name: &str,
    member: Option<&str>,
    value_type: &Type,
    attr: Option<&Attributes>,
    errors: &mut Vec<CheckError>,
) {
    let Some(attr) = attr else {
        return;
    };
    let (numeric_ok, length_ok) = match effective_type(types, value_type) {
        Type::Builtin(BuiltinType::Int) | Type::Builtin(BuiltinType::Float) => (true, false),
        Type::Builtin(BuiltinType::String) => (false, true),
        Type::Array(_) | Type::Dict(_) => (false, true),
        _ => (false, false),
    };
    for (text, kind) in attr.comparisons() {
        let legal = match kind {
            AttrKind::Numeric => numeric_ok,
            AttrKind::Length => length_ok,
        };
        if !legal {
            push(
                errors,
                type_name,
                member,
                format!(
                    "Invalid attribute '{}' {}",
                    text,
                    from_clause(type_name, member)
                ),
            );
        }
    }
}

// ──────────────────────────────────────────────
// Cycle detection
// ──────────────────────────────────────────────

/// Whether the type is on a cycle in the base graph (struct and enum
/// bases, with typedef aliases resolved).
fn has_base_cycle(types: &Types, start: &str) -> bool {
    fn visit(types: &Types, name: &str, target: &str, visited: &mut HashSet<String>) -> bool {
        for base in bases_of(types, name) {
            let resolved = resolve_user_name(types, base);
            if resolved == target {
                return true;
            }
            if visited.insert(resolved.to_owned()) && visit(types, resolved, target, visited) {
                return true;
            }
        }
        false
    }
    visit(types, start, start, &mut HashSet::new())
}

fn bases_of<'a>(types: &'a Types, name: &str) -> &'a [String] {
    match types.get(name) {
        Some(UserType::Struct(s)) => s.bases.as_deref().unwrap_or(&[]),
        Some(UserType::Enum(e)) => e.bases.as_deref().unwrap_or(&[]),
        _ => &[],
    }
}

/// Whether a typedef's alias chain fails to terminate (chasing user
/// references through typedefs revisits a typedef).
fn typedef_chain_cycles(types: &Types, start: &str) -> bool {
    let mut name = start;
    for _ in 0..=types.len() {
        let Some(UserType::Typedef(td)) = types.get(name) else {
            return false;
        };
        let Type::User(next) = &td.type_ else {
            return false;
        };
        if next == start {
            return true;
        }
        name = next.as_str();
    }
    true
}
