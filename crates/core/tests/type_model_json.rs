//! Type-model JSON shape tests: the serde rendering is a compatibility
//! surface, so the envelope keys and optional-field presence are pinned
//! down exactly.

use schemark_core::{parse_schema, validate_type_model, Types, Value};
use serde_json::json;

#[test]
fn struct_envelope_shape() {
    let types = parse_schema(
        "\
# A pet
struct Pet
    string name
    optional int(>= 0) age
",
    )
    .expect("schema parses");
    let rendered = serde_json::to_value(&types).expect("serializes");
    assert_eq!(
        rendered,
        json!({
            "Pet": {
                "struct": {
                    "name": "Pet",
                    "doc": ["A pet"],
                    "members": [
                        {"name": "name", "type": {"builtin": "string"}},
                        {"name": "age", "type": {"builtin": "int"}, "attr": {"gte": 0.0}, "optional": true}
                    ]
                }
            }
        })
    );
}

#[test]
fn compound_type_shapes() {
    let types = parse_schema(
        "\
typedef int(> 0)[len > 0] Counts

struct S
    string : float{} byName
",
    )
    .expect("schema parses");
    let rendered = serde_json::to_value(&types).expect("serializes");
    assert_eq!(
        rendered["Counts"],
        json!({
            "typedef": {
                "name": "Counts",
                "type": {"array": {"type": {"builtin": "int"}, "attr": {"gt": 0.0}}},
                "attr": {"lenGT": 0}
            }
        })
    );
    assert_eq!(
        rendered["S"]["struct"]["members"][0],
        json!({
            "name": "byName",
            "type": {"dict": {"type": {"builtin": "float"}, "keyType": {"builtin": "string"}}}
        })
    );
}

#[test]
fn action_envelope_shape() {
    let types = parse_schema(
        "\
action GetPet
    urls
        GET /pet
    query
        string id
",
    )
    .expect("schema parses");
    let rendered = serde_json::to_value(&types).expect("serializes");
    assert_eq!(
        rendered["GetPet"],
        json!({
            "action": {
                "name": "GetPet",
                "urls": [{"method": "GET", "path": "/pet"}],
                "query": "GetPet_query"
            }
        })
    );
}

#[test]
fn json_round_trip_preserves_model() {
    let types = parse_schema(
        "\
group \"Pets\"

enum Kind
    dog
    cat

struct Pet
    Kind kind
    optional string(len > 0, nullable) nickname

union PetOrCount
    Pet pet
    int count
",
    )
    .expect("schema parses");
    let rendered = serde_json::to_string(&types).expect("serializes");
    let reloaded: Types = serde_json::from_str(&rendered).expect("deserializes");
    assert_eq!(reloaded, types);
}

#[test]
fn serialized_model_validates_against_self_schema() {
    let types = parse_schema(
        "\
struct Pet
    string name
    int(>= 0) age

action GetPet
    urls
        GET
    output
        Pet pet
",
    )
    .expect("schema parses");
    let as_value = Value::from(serde_json::to_value(&types).expect("serializes"));
    validate_type_model(&as_value).expect("model validates against the self-schema");
}
