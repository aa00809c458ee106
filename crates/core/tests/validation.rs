//! Validator tests: structural validation, builtin coercion, unions,
//! attribute checks, shorthands, and the recursion guard.

use schemark_core::model::{Type, TypedefType, Types, UserType};
use schemark_core::{parse_schema, validate_type, ValidationError, Value};
use serde_json::json;

fn types(source: &str) -> Types {
    parse_schema(source).expect("schema parses")
}

fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn validate(
    source: &str,
    type_name: &str,
    input: serde_json::Value,
) -> Result<Value, ValidationError> {
    validate_type(&types(source), type_name, &value(input))
}

fn expect_message(result: Result<Value, ValidationError>, expected: &str) {
    match result {
        Err(err) => assert_eq!(err.to_string(), expected),
        Ok(v) => panic!("expected error {:?}, got value {:?}", expected, v),
    }
}

const PET: &str = "\
enum Kind
    dog
    cat

struct Pet
    Kind kind
    string name
    int(>= 0) age
    optional bool vaccinated
";

#[test]
fn struct_validation_passes_through() {
    let out = validate(
        PET,
        "Pet",
        json!({"kind": "dog", "name": "Rex", "age": 3}),
    )
    .expect("validates");
    assert_eq!(out, value(json!({"kind": "dog", "name": "Rex", "age": 3})));
}

#[test]
fn string_coercion_to_int_and_bool() {
    let source = "\
struct S
    int a
    bool b
";
    let out = validate(source, "S", json!({"a": "5", "b": "true"})).expect("validates");
    assert_eq!(out, value(json!({"a": 5, "b": true})));
}

#[test]
fn int_rejects_fractional() {
    expect_message(
        validate("struct S\n    int a\n", "S", json!({"a": 1.5})),
        "Invalid value 1.5 (type 'float') for member 'a', expected type 'int'",
    );
}

#[test]
fn bool_coercion_is_case_sensitive() {
    expect_message(
        validate("struct S\n    bool b\n", "S", json!({"b": "True"})),
        "Invalid value \"True\" (type 'string') for member 'b', expected type 'bool'",
    );
}

#[test]
fn float_coerces_int_and_string() {
    let out = validate(
        "struct S\n    float x\n    float y\n",
        "S",
        json!({"x": 2, "y": "2.5"}),
    )
    .expect("validates");
    assert_eq!(out, value(json!({"x": 2.0, "y": 2.5})));
}

#[test]
fn required_member_missing() {
    expect_message(
        validate(PET, "Pet", json!({"kind": "dog", "name": "Rex"})),
        "Required member 'age' missing",
    );
}

#[test]
fn unknown_member_rejected() {
    expect_message(
        validate(
            PET,
            "Pet",
            json!({"kind": "dog", "name": "Rex", "age": 1, "color": "brown"}),
        ),
        "Unknown member 'color'",
    );
}

#[test]
fn enum_values_match_exactly() {
    expect_message(
        validate(PET, "Pet", json!({"kind": "Dog", "name": "Rex", "age": 1})),
        "Invalid value \"Dog\" (type 'string') for member 'kind', expected type 'Kind'",
    );
}

#[test]
fn attribute_violation_message_shape() {
    expect_message(
        validate(PET, "Pet", json!({"kind": "dog", "name": "Rex", "age": -1})),
        "Invalid value -1 (type 'int') for member 'age', expected type 'int' [>= 0]",
    );
}

#[test]
fn nested_member_paths_are_dotted() {
    let source = "\
struct Inner
    int(> 0) a

struct Outer
    Inner[] items
";
    expect_message(
        validate(source, "Outer", json!({"items": [{"a": 1}, {"a": 0}]})),
        "Invalid value 0 (type 'int') for member 'items.1.a', expected type 'int' [> 0]",
    );
}

#[test]
fn union_requires_exactly_one_member() {
    let source = "\
union U
    int a
    string b
";
    assert_eq!(
        validate(source, "U", json!({"a": 5})).expect("validates"),
        value(json!({"a": 5}))
    );
    assert!(validate(source, "U", json!({})).is_err());
    assert!(validate(source, "U", json!({"a": 5, "b": "x"})).is_err());
}

#[test]
fn optional_members_may_be_absent() {
    let source = "\
struct S
    optional int a
    optional int b
";
    assert_eq!(validate(source, "S", json!({})).expect("validates"), value(json!({})));
}

#[test]
fn empty_string_shorthands() {
    let source = "\
struct Empty

struct S
    int[] items
    int{} counts
";
    assert_eq!(
        validate(source, "Empty", json!("")).expect("validates"),
        value(json!({}))
    );
    assert_eq!(
        validate(source, "S", json!({"items": "", "counts": ""})).expect("validates"),
        value(json!({"items": [], "counts": {}}))
    );
}

#[test]
fn nullable_bypasses_type_and_attribute_checks() {
    let source = "\
struct S
    int(nullable, > 0) a
";
    assert_eq!(
        validate(source, "S", json!({"a": null})).expect("validates"),
        value(json!({"a": null}))
    );
    assert!(validate(source, "S", json!({"a": 0})).is_err());
}

#[test]
fn null_rejected_without_nullable() {
    expect_message(
        validate("struct S\n    object o\n", "S", json!({"o": null})),
        "Invalid value null (type 'null') for member 'o', expected type 'object'",
    );
}

#[test]
fn typedef_applies_its_own_attributes() {
    let source = "\
typedef int(> 0) Count

struct S
    Count n
";
    assert!(validate(source, "S", json!({"n": 3})).is_ok());
    expect_message(
        validate(source, "S", json!({"n": 0})),
        "Invalid value 0 (type 'int') for member 'n', expected type 'Count' [> 0]",
    );
}

#[test]
fn dict_keys_validated_against_key_type() {
    let source = "\
enum Kind
    dog
    cat

struct S
    Kind : int{} counts
";
    assert!(validate(source, "S", json!({"counts": {"dog": 1}})).is_ok());
    assert!(validate(source, "S", json!({"counts": {"bird": 1}})).is_err());
}

#[test]
fn uuid_and_date_and_datetime_admission() {
    let source = "\
struct S
    uuid id
    date d
    datetime ts
";
    let out = validate(
        source,
        "S",
        json!({
            "id": "123e4567-e89b-42d3-a456-426614174000",
            "d": "2020-01-15",
            "ts": "2020-01-15T10:30:00+01:00"
        }),
    )
    .expect("validates");
    assert_eq!(
        serde_json::Value::from(&out),
        json!({
            "id": "123e4567-e89b-42d3-a456-426614174000",
            "d": "2020-01-15",
            "ts": "2020-01-15T10:30:00+01:00"
        })
    );
}

#[test]
fn date_truncates_datetime_input_to_calendar_date() {
    let out = validate(
        "struct S\n    date d\n",
        "S",
        json!({"d": "2020-01-15T23:59:00-08:00"}),
    )
    .expect("validates");
    assert_eq!(serde_json::Value::from(&out), json!({"d": "2020-01-15"}));
}

#[test]
fn loose_date_strings_rejected() {
    assert!(validate("struct S\n    date d\n", "S", json!({"d": "2020-1-5"})).is_err());
    assert!(validate(
        "struct S\n    datetime d\n",
        "S",
        json!({"d": "2020-01-05 10:00:00Z"})
    )
    .is_err());
}

#[test]
fn validation_is_idempotent_for_valid_input() {
    let model = types(PET);
    let input = value(json!({"kind": "cat", "name": "Mia", "age": "2"}));
    let once = validate_type(&model, "Pet", &input).expect("validates");
    let twice = validate_type(&model, "Pet", &once).expect("revalidates");
    assert_eq!(once, twice);
}

#[test]
fn unknown_type_name_rejected() {
    assert_eq!(
        validate_type(&types(PET), "Nope", &value(json!({}))),
        Err(ValidationError::UnknownType("Nope".to_owned()))
    );
}

#[test]
fn depth_guard_stops_circular_typedefs() {
    let mut model = Types::new();
    model.insert(
        "Loop".to_owned(),
        UserType::Typedef(TypedefType {
            name: "Loop".to_owned(),
            doc: None,
            doc_group: None,
            type_: Type::User("Loop".to_owned()),
            attr: None,
        }),
    );
    assert_eq!(
        validate_type(&model, "Loop", &value(json!(1))),
        Err(ValidationError::DepthExceeded)
    );
}

#[test]
fn long_values_truncated_in_messages() {
    let big: String = "x".repeat(2000);
    let err = validate("struct S\n    int a\n", "S", json!({ "a": big }))
        .expect_err("non-numeric string");
    let text = err.to_string();
    assert!(text.starts_with("Invalid value \"xxx"));
    assert!(text.len() < 1200, "message not truncated: {} chars", text.len());
}
