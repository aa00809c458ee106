//! Type-model value validation and coercion.
//!
//! Unlike parsing and finalization, validation is fail-fast: the first
//! structural or attribute violation aborts with a single descriptive
//! error. Validation recurses structurally and produces a new value
//! graph — builtin coercions (string to number/bool/date) replace leaf
//! values, and the input is never mutated.

use crate::error::ValidationError;
use crate::model::{
    attr_number_text, enum_values, struct_members, ArrayType, Attributes, BuiltinType, DictType,
    EnumType, StructType, Type, Types, UserType,
};
use crate::value::Value;
use std::collections::{BTreeMap, HashSet};
use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

/// Recursion bound for deeply nested types/values.
pub const MAX_VALIDATION_DEPTH: usize = 100;

const VALUE_REPR_LEN: usize = 1000;
const MEMBER_PATH_LEN: usize = 100;

/// Validate and coerce a value against the named type, returning the
/// transformed value or the first violation encountered.
pub fn validate_type(
    types: &Types,
    type_name: &str,
    value: &Value,
) -> Result<Value, ValidationError> {
    match types.get(type_name) {
        None | Some(UserType::Action(_)) => {
            return Err(ValidationError::UnknownType(type_name.to_owned()))
        }
        Some(_) => {}
    }
    let validator = Validator { types };
    let type_ = Type::User(type_name.to_owned());
    validator.validate_site(&type_, None, value, &mut Vec::new(), 0)
}

struct Validator<'a> {
    types: &'a Types,
}

impl<'a> Validator<'a> {
    /// Validate a value at a site carrying an optional attribute set:
    /// a null value passes straight through when the site is nullable,
    /// otherwise the value is structurally validated and then checked
    /// against the site's attributes.
    fn validate_site(
        &self,
        type_: &Type,
        attr: Option<&Attributes>,
        value: &Value,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ValidationError> {
        if matches!(value, Value::Null) && attr.map_or(false, |a| a.nullable) {
            return Ok(Value::Null);
        }
        let validated = self.validate_type_ref(type_, value, path, depth)?;
        if let Some(attr) = attr {
            self.check_attr(&type_.text(), attr, &validated, path)?;
        }
        Ok(validated)
    }

    fn validate_type_ref(
        &self,
        type_: &Type,
        value: &Value,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ValidationError> {
        if depth > MAX_VALIDATION_DEPTH {
            return Err(ValidationError::DepthExceeded);
        }
        match type_ {
            Type::Builtin(builtin) => self.validate_builtin(*builtin, value, path),
            Type::Array(array) => self.validate_array(array, value, path, depth),
            Type::Dict(dict) => self.validate_dict(dict, value, path, depth),
            Type::User(name) => match self.types.get(name) {
                None | Some(UserType::Action(_)) => {
                    Err(ValidationError::UnknownType(name.clone()))
                }
                Some(UserType::Struct(s)) => self.validate_struct(s, value, path, depth),
                Some(UserType::Enum(e)) => self.validate_enum(e, value, path),
                Some(UserType::Typedef(td)) => {
                    let nullable = td.attr.as_ref().map_or(false, |a| a.nullable);
                    if matches!(value, Value::Null) && nullable {
                        return Ok(Value::Null);
                    }
                    let validated = self.validate_type_ref(&td.type_, value, path, depth + 1)?;
                    if let Some(attr) = &td.attr {
                        self.check_attr(name, attr, &validated, path)?;
                    }
                    Ok(validated)
                }
            },
        }
    }

    // -- Builtins -----------------------------------------------

    fn validate_builtin(
        &self,
        builtin: BuiltinType,
        value: &Value,
        path: &[String],
    ) -> Result<Value, ValidationError> {
        match builtin {
            BuiltinType::String => match value {
                Value::String(s) => Ok(Value::String(s.clone())),
                _ => Err(self.invalid(value, path, "string")),
            },
            BuiltinType::Uuid => match value {
                Value::String(s) if is_uuid(s) => Ok(Value::String(s.clone())),
                _ => Err(self.invalid(value, path, "uuid")),
            },
            BuiltinType::Int => match value {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Float(f) if f.fract() == 0.0 => Ok(Value::Int(*f as i64)),
                Value::String(s) => match s.parse::<f64>() {
                    Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Value::Int(f as i64)),
                    _ => Err(self.invalid(value, path, "int")),
                },
                _ => Err(self.invalid(value, path, "int")),
            },
            BuiltinType::Float => match value {
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::String(s) => match s.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                    _ => Err(self.invalid(value, path, "float")),
                },
                _ => Err(self.invalid(value, path, "float")),
            },
            BuiltinType::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err(self.invalid(value, path, "bool")),
            },
            BuiltinType::Date => match value {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::Datetime(dt) => Ok(Value::Date(dt.date())),
                Value::String(s) => parse_date_string(s)
                    .map(Value::Date)
                    .ok_or_else(|| self.invalid(value, path, "date")),
                _ => Err(self.invalid(value, path, "date")),
            },
            BuiltinType::Datetime => match value {
                Value::Datetime(dt) => Ok(Value::Datetime(*dt)),
                Value::Date(d) => Ok(Value::Datetime(
                    PrimitiveDateTime::new(*d, Time::MIDNIGHT).assume_utc(),
                )),
                Value::String(s) => parse_datetime_string(s)
                    .map(Value::Datetime)
                    .ok_or_else(|| self.invalid(value, path, "datetime")),
                _ => Err(self.invalid(value, path, "datetime")),
            },
            BuiltinType::Object => match value {
                Value::Null => Err(self.invalid(value, path, "object")),
                _ => Ok(value.clone()),
            },
        }
    }

    // -- Compounds ----------------------------------------------

    fn validate_array(
        &self,
        array: &ArrayType,
        value: &Value,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ValidationError> {
        let items = match value {
            // Empty-string shorthand for an empty array (query-string
            // ergonomics).
            Value::String(s) if s.is_empty() => return Ok(Value::Array(Vec::new())),
            Value::Array(items) => items,
            _ => return Err(self.invalid(value, path, "array")),
        };
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            path.push(index.to_string());
            let validated = self.validate_site(&array.type_, array.attr.as_ref(), item, path, depth + 1);
            path.pop();
            out.push(validated?);
        }
        Ok(Value::Array(out))
    }

    fn validate_dict(
        &self,
        dict: &DictType,
        value: &Value,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ValidationError> {
        let map = match value {
            Value::String(s) if s.is_empty() => return Ok(Value::Object(BTreeMap::new())),
            Value::Object(map) => map,
            _ => return Err(self.invalid(value, path, "dict")),
        };
        let string_type = Type::Builtin(BuiltinType::String);
        let key_type = dict.key_type.as_ref().unwrap_or(&string_type);
        let mut out = BTreeMap::new();
        for (key, item) in map {
            path.push(key.clone());
            let key_value = Value::String(key.clone());
            let result = self
                .validate_site(key_type, dict.key_attr.as_ref(), &key_value, path, depth + 1)
                .and_then(|_| {
                    self.validate_site(&dict.type_, dict.attr.as_ref(), item, path, depth + 1)
                });
            path.pop();
            out.insert(key.clone(), result?);
        }
        Ok(Value::Object(out))
    }

    fn validate_enum(
        &self,
        enum_: &EnumType,
        value: &Value,
        path: &[String],
    ) -> Result<Value, ValidationError> {
        if let Value::String(s) = value {
            if enum_values(self.types, enum_).iter().any(|v| v.name == *s) {
                return Ok(Value::String(s.clone()));
            }
        }
        Err(self.invalid(value, path, enum_.name.clone()))
    }

    fn validate_struct(
        &self,
        struct_: &StructType,
        value: &Value,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Value, ValidationError> {
        let empty = BTreeMap::new();
        let map = match value {
            Value::String(s) if s.is_empty() => &empty,
            Value::Object(map) => map,
            _ => return Err(self.invalid(value, path, struct_.name.clone())),
        };
        if struct_.union && map.len() != 1 {
            return Err(self.invalid(value, path, struct_.name.clone()));
        }
        let members = struct_members(self.types, struct_);
        let mut out = BTreeMap::new();
        for member in &members {
            match map.get(&member.name) {
                None => {
                    if struct_.union || member.optional {
                        continue;
                    }
                    return Err(ValidationError::RequiredMemberMissing(member_fqn(
                        path,
                        &member.name,
                    )));
                }
                Some(item) => {
                    path.push(member.name.clone());
                    let validated =
                        self.validate_site(&member.type_, member.attr.as_ref(), item, path, depth + 1);
                    path.pop();
                    out.insert(member.name.clone(), validated?);
                }
            }
        }
        let member_names: HashSet<&str> = members.iter().map(|m| m.name.as_str()).collect();
        for key in map.keys() {
            if !member_names.contains(key.as_str()) {
                let mut fqn = member_fqn(path, key);
                if fqn.chars().count() > MEMBER_PATH_LEN {
                    fqn = fqn.chars().take(MEMBER_PATH_LEN).collect();
                }
                return Err(ValidationError::UnknownMember(fqn));
            }
        }
        Ok(Value::Object(out))
    }

    // -- Attribute checks ---------------------------------------

    fn check_attr(
        &self,
        expected: &str,
        attr: &Attributes,
        value: &Value,
        path: &[String],
    ) -> Result<(), ValidationError> {
        let number = match value {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        };
        let length = match value {
            Value::String(s) => Some(s.chars().count() as u64),
            Value::Array(items) => Some(items.len() as u64),
            Value::Object(map) => Some(map.len() as u64),
            _ => None,
        };
        if let (Some(op), Some(n)) = (attr.eq, number) {
            if n != op {
                return Err(self.attr_violation(value, path, expected, format!("== {}", attr_number_text(op))));
            }
        }
        if let (Some(op), Some(n)) = (attr.lt, number) {
            if !(n < op) {
                return Err(self.attr_violation(value, path, expected, format!("< {}", attr_number_text(op))));
            }
        }
        if let (Some(op), Some(n)) = (attr.lte, number) {
            if !(n <= op) {
                return Err(self.attr_violation(value, path, expected, format!("<= {}", attr_number_text(op))));
            }
        }
        if let (Some(op), Some(n)) = (attr.gt, number) {
            if !(n > op) {
                return Err(self.attr_violation(value, path, expected, format!("> {}", attr_number_text(op))));
            }
        }
        if let (Some(op), Some(n)) = (attr.gte, number) {
            if !(n >= op) {
                return Err(self.attr_violation(value, path, expected, format!(">= {}", attr_number_text(op))));
            }
        }
        if let (Some(op), Some(len)) = (attr.len_eq, length) {
            if len != op {
                return Err(self.attr_violation(value, path, expected, format!("len == {}", op)));
            }
        }
        if let (Some(op), Some(len)) = (attr.len_lt, length) {
            if !(len < op) {
                return Err(self.attr_violation(value, path, expected, format!("len < {}", op)));
            }
        }
        if let (Some(op), Some(len)) = (attr.len_lte, length) {
            if !(len <= op) {
                return Err(self.attr_violation(value, path, expected, format!("len <= {}", op)));
            }
        }
        if let (Some(op), Some(len)) = (attr.len_gt, length) {
            if !(len > op) {
                return Err(self.attr_violation(value, path, expected, format!("len > {}", op)));
            }
        }
        if let (Some(op), Some(len)) = (attr.len_gte, length) {
            if !(len >= op) {
                return Err(self.attr_violation(value, path, expected, format!("len >= {}", op)));
            }
        }
        Ok(())
    }

    // -- Error construction -------------------------------------

    fn invalid(
        &self,
        value: &Value,
        path: &[String],
        expected: impl Into<String>,
    ) -> ValidationError {
        ValidationError::InvalidValue {
            value: value.repr(VALUE_REPR_LEN),
            actual: value.type_name(),
            member: member_path(path),
            expected: Some(expected.into()),
            attr: None,
        }
    }

    fn attr_violation(
        &self,
        value: &Value,
        path: &[String],
        expected: &str,
        attr: String,
    ) -> ValidationError {
        ValidationError::InvalidValue {
            value: value.repr(VALUE_REPR_LEN),
            actual: value.type_name(),
            member: member_path(path),
            expected: Some(expected.to_owned()),
            attr: Some(attr),
        }
    }
}

fn member_path(path: &[String]) -> Option<String> {
    if path.is_empty() {
        None
    } else {
        Some(path.join("."))
    }
}

fn member_fqn(path: &[String], name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", path.join("."), name)
    }
}

// ──────────────────────────────────────────────
// Literal admission
// ──────────────────────────────────────────────

/// Canonical 8-4-4-4-12 hex form with a non-zero version nibble and a
/// variant nibble in [89ab]. Case-insensitive hex.
fn is_uuid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, &c) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if c != b'-' {
                    return false;
                }
            }
            _ => {
                if !c.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    bytes[14] != b'0' && matches!(bytes[19].to_ascii_lowercase(), b'8' | b'9' | b'a' | b'b')
}

fn two_digits(bytes: &[u8], at: usize) -> Option<u8> {
    let hi = *bytes.get(at)?;
    let lo = *bytes.get(at + 1)?;
    if hi.is_ascii_digit() && lo.is_ascii_digit() {
        Some((hi - b'0') * 10 + (lo - b'0'))
    } else {
        None
    }
}

/// Strict `YYYY-MM-DD`.
fn parse_strict_date(s: &str) -> Option<Date> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    if !bytes[0..4].iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month = two_digits(bytes, 5)?;
    let day = two_digits(bytes, 8)?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// Strict `YYYY-MM-DDTHH:MM[:SS[.fff]](Z|+HH:MM|-HH:MM)`.
/// Returns the written local date-time plus its zone offset.
fn parse_strict_datetime(s: &str) -> Option<(PrimitiveDateTime, UtcOffset)> {
    let bytes = s.as_bytes();
    if bytes.len() < 17 || bytes[10] != b'T' {
        return None;
    }
    let date = parse_strict_date(&s[0..10])?;
    let hour = two_digits(bytes, 11)?;
    if bytes[13] != b':' {
        return None;
    }
    let minute = two_digits(bytes, 14)?;
    let mut at = 16;
    let mut second = 0u8;
    if bytes.get(at) == Some(&b':') {
        second = two_digits(bytes, at + 1)?;
        at += 3;
    }
    let mut nanos = 0u32;
    if bytes.get(at) == Some(&b'.') {
        at += 1;
        let start = at;
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        let digits = at - start;
        if digits == 0 || digits > 9 {
            return None;
        }
        let frac: u32 = s[start..at].parse().ok()?;
        nanos = frac * 10u32.pow(9 - digits as u32);
    }
    let offset = match bytes.get(at) {
        Some(&b'Z') => {
            if at + 1 != bytes.len() {
                return None;
            }
            UtcOffset::UTC
        }
        Some(&(sign @ (b'+' | b'-'))) => {
            if at + 6 != bytes.len() || bytes[at + 3] != b':' {
                return None;
            }
            let oh = two_digits(bytes, at + 1)? as i8;
            let om = two_digits(bytes, at + 4)? as i8;
            let (oh, om) = if sign == b'-' { (-oh, -om) } else { (oh, om) };
            UtcOffset::from_hms(oh, om, 0).ok()?
        }
        _ => return None,
    };
    let time = Time::from_hms_nano(hour, minute, second, nanos).ok()?;
    Some((PrimitiveDateTime::new(date, time), offset))
}

/// Admit a date leaf: the strict date-only pattern, or the strict
/// datetime pattern truncated to its written calendar date.
fn parse_date_string(s: &str) -> Option<Date> {
    if let Some(date) = parse_strict_date(s) {
        return Some(date);
    }
    parse_strict_datetime(s).map(|(pdt, _)| pdt.date())
}

/// Admit a datetime leaf: the strict datetime pattern, or the date-only
/// pattern as midnight UTC.
fn parse_datetime_string(s: &str) -> Option<time::OffsetDateTime> {
    if let Some((pdt, offset)) = parse_strict_datetime(s) {
        return Some(pdt.assume_offset(offset));
    }
    parse_strict_date(s).map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT).assume_utc())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
