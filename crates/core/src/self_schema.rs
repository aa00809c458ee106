//! The bootstrapping type-model: a Schema Markdown description of
//! type-models themselves, used to validate user-supplied type-model
//! JSON before it is trusted.

use crate::error::ValidationError;
use crate::model::Types;
use crate::parser::parse_schema;
use crate::validate::validate_type;
use crate::value::Value;
use std::sync::OnceLock;

/// Schema Markdown source of the type-model meta-schema.
const TYPES_SCHEMA_SOURCE: &str = r#"
group "Type Model"

# Map of user type name to user type
typedef UserType{} Types

# A user type
union UserType

    # A struct type
    Struct struct

    # An enum type
    Enum enum

    # A typedef
    Typedef typedef

    # An action
    Action action

# A struct type
struct Struct

    # The struct type name
    string name

    # The documentation markdown text lines
    optional string[] doc

    # The documentation group name
    optional string docGroup

    # The base struct type names
    optional string[len > 0] bases

    # The struct members
    optional StructMember[] members

    # If true, the struct is a union and exactly one member is present
    optional bool union

# A struct member
struct StructMember

    # The member name
    string name

    # The documentation markdown text lines
    optional string[] doc

    # The member type
    Type type

    # The member type attributes
    optional Attributes attr

    # If true, the member is optional
    optional bool optional

# An enum type
struct Enum

    # The enum type name
    string name

    # The documentation markdown text lines
    optional string[] doc

    # The documentation group name
    optional string docGroup

    # The base enum type names
    optional string[len > 0] bases

    # The enum values
    optional EnumValue[] values

# An enum value
struct EnumValue

    # The value name
    string name

    # The documentation markdown text lines
    optional string[] doc

# A typedef
struct Typedef

    # The typedef type name
    string name

    # The documentation markdown text lines
    optional string[] doc

    # The documentation group name
    optional string docGroup

    # The typedef's type
    Type type

    # The typedef's type attributes
    optional Attributes attr

# An action
struct Action

    # The action name
    string name

    # The documentation markdown text lines
    optional string[] doc

    # The documentation group name
    optional string docGroup

    # The action URLs
    optional ActionUrl[] urls

    # The path parameters struct type name
    optional string path

    # The query parameters struct type name
    optional string query

    # The content body struct type name
    optional string input

    # The response body struct type name
    optional string output

    # The custom error response codes enum type name
    optional string errors

# An action URL
struct ActionUrl

    # The HTTP method; a missing method matches any method
    optional string method

    # The URL path; a missing path uses the default path
    optional string path

# A type
union Type

    # A builtin type
    BuiltinType builtin

    # An array type
    Array array

    # A dict type
    Dict dict

    # A user type name
    string user

# A builtin type name
enum BuiltinType
    string
    int
    float
    bool
    date
    datetime
    uuid
    object

# An array type
struct Array

    # The array element type
    Type type

    # The array element type attributes
    optional Attributes attr

# A dict type
struct Dict

    # The dict value type
    Type type

    # The dict value type attributes
    optional Attributes attr

    # The dict key type; the default key type is string
    optional Type keyType

    # The dict key type attributes
    optional Attributes keyAttr

# Type attribute constraints
struct Attributes

    # The value is equal
    optional float eq

    # The value is less than
    optional float lt

    # The value is less than or equal
    optional float lte

    # The value is greater than
    optional float gt

    # The value is greater than or equal
    optional float gte

    # The length is equal
    optional int lenEq

    # The length is less than
    optional int lenLT

    # The length is less than or equal
    optional int lenLTE

    # The length is greater than
    optional int lenGT

    # The length is greater than or equal
    optional int lenGTE

    # If true, the value may be null
    optional bool nullable
"#;

/// The finalized type-model describing type-models, parsed once.
pub fn types_schema() -> &'static Types {
    static SCHEMA: OnceLock<Types> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        parse_schema(TYPES_SCHEMA_SOURCE).expect("embedded type-model schema is valid")
    })
}

/// Validate a user-supplied type-model value against the meta-schema,
/// returning the validated/coerced value.
pub fn validate_type_model(value: &Value) -> Result<Value, ValidationError> {
    validate_type(types_schema(), "Types", value)
}
