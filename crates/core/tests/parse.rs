//! Parser conformance tests: line grammar, doc comments, error
//! recovery, redefinition detection, and multi-source accumulation.

use schemark_core::model::{BuiltinType, Type, UserType};
use schemark_core::{parse_schema, SchemaParser};

fn parse_ok(source: &str) -> schemark_core::Types {
    parse_schema(source).expect("schema parses without errors")
}

fn error_strings(parser: &SchemaParser) -> Vec<String> {
    parser.errors().iter().map(|e| e.to_string()).collect()
}

#[test]
fn struct_with_members() {
    let types = parse_ok(
        "\
struct MyStruct
    int a
    optional string b
",
    );
    let Some(UserType::Struct(s)) = types.get("MyStruct") else {
        panic!("expected struct");
    };
    let members = s.members.as_ref().expect("members");
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "a");
    assert_eq!(members[0].type_, Type::Builtin(BuiltinType::Int));
    assert!(!members[0].optional);
    assert_eq!(members[1].name, "b");
    assert!(members[1].optional);
}

#[test]
fn enum_with_quoted_value() {
    let types = parse_ok(
        "\
enum Color
    red
    \"dark green\"
",
    );
    let Some(UserType::Enum(e)) = types.get("Color") else {
        panic!("expected enum");
    };
    let values = e.values.as_ref().expect("values");
    assert_eq!(values[0].name, "red");
    assert_eq!(values[1].name, "dark green");
}

#[test]
fn union_is_struct_with_flag() {
    let types = parse_ok(
        "\
union Shape
    int circle
    string label
",
    );
    let Some(UserType::Struct(s)) = types.get("Shape") else {
        panic!("expected struct");
    };
    assert!(s.union);
}

#[test]
fn typedef_with_attributes() {
    let types = parse_ok("typedef int(> 0) PositiveInt\n");
    let Some(UserType::Typedef(td)) = types.get("PositiveInt") else {
        panic!("expected typedef");
    };
    assert_eq!(td.type_, Type::Builtin(BuiltinType::Int));
    assert_eq!(td.attr.as_ref().expect("attr").gt, Some(0.0));
}

#[test]
fn doc_comments_attach_to_next_declaration() {
    let types = parse_ok(
        "\
# Line one
#
# Line two
#- hidden note
struct Documented
    # Member doc
    int a
",
    );
    let Some(UserType::Struct(s)) = types.get("Documented") else {
        panic!("expected struct");
    };
    assert_eq!(
        s.doc.as_ref().expect("doc"),
        &vec!["Line one".to_owned(), String::new(), "Line two".to_owned()]
    );
    let members = s.members.as_ref().expect("members");
    assert_eq!(members[0].doc.as_ref().expect("member doc"), &vec!["Member doc".to_owned()]);
}

#[test]
fn group_applies_to_following_types() {
    let types = parse_ok(
        "\
group \"Shapes\"

struct Circle
    float radius

group

struct Plain
",
    );
    let Some(UserType::Struct(circle)) = types.get("Circle") else {
        panic!("expected struct");
    };
    assert_eq!(circle.doc_group.as_deref(), Some("Shapes"));
    let Some(UserType::Struct(plain)) = types.get("Plain") else {
        panic!("expected struct");
    };
    assert!(plain.doc_group.is_none());
}

#[test]
fn line_continuation_joins_and_cites_last_line() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
struct Cont
    int(> 0, \\
        <= 10) a
    string(len \\
",
        "test.smd",
    );
    // the first member parses from the joined line
    let Some(UserType::Struct(s)) = parser.types().get("Cont") else {
        panic!("expected struct");
    };
    let members = s.members.as_ref().expect("members");
    let attr = members[0].attr.as_ref().expect("attr");
    assert_eq!(attr.gt, Some(0.0));
    assert_eq!(attr.lte, Some(10.0));
    // the dangling continuation is a syntax error at the last line
    assert_eq!(error_strings(&parser), vec!["test.smd:4: error: Syntax error"]);
}

#[test]
fn syntax_errors_recover_per_line() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
struct Ok1
    int
not a declaration
struct Ok2
",
        "",
    );
    assert_eq!(
        error_strings(&parser),
        vec![":2: error: Syntax error", ":3: error: Syntax error"]
    );
    assert!(parser.types().contains_key("Ok1"));
    assert!(parser.types().contains_key("Ok2"));
}

#[test]
fn type_redefinition_reports_and_last_writer_wins() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
struct Foo
    int a
enum Foo
    A
",
        "",
    );
    assert_eq!(error_strings(&parser), vec![":3: error: Redefinition of type 'Foo'"]);
    assert!(matches!(parser.types().get("Foo"), Some(UserType::Enum(_))));
}

#[test]
fn member_redefinition_keeps_first() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
struct Foo
    int a
    string a
",
        "",
    );
    assert_eq!(
        error_strings(&parser),
        vec![":3: error: Redefinition of 'Foo' member 'a'"]
    );
    let Some(UserType::Struct(s)) = parser.types().get("Foo") else {
        panic!("expected struct");
    };
    let members = s.members.as_ref().expect("members");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].type_, Type::Builtin(BuiltinType::Int));
}

#[test]
fn enum_value_redefinition() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
enum E
    A
    A
",
        "",
    );
    assert_eq!(
        error_strings(&parser),
        vec![":3: error: Redefinition of 'E' value 'A'"]
    );
}

#[test]
fn action_sections_create_synthetic_types() {
    let types = parse_ok(
        "\
action MyAction
    urls
        GET /my
    path
        string id
    errors
        BadId
",
    );
    let Some(UserType::Action(action)) = types.get("MyAction") else {
        panic!("expected action");
    };
    assert_eq!(action.path.as_deref(), Some("MyAction_path"));
    assert_eq!(action.errors.as_deref(), Some("MyAction_errors"));
    let urls = action.urls.as_ref().expect("urls");
    assert_eq!(urls[0].method.as_deref(), Some("GET"));
    assert_eq!(urls[0].path.as_deref(), Some("/my"));
    assert!(matches!(types.get("MyAction_path"), Some(UserType::Struct(_))));
    assert!(matches!(types.get("MyAction_errors"), Some(UserType::Enum(_))));
}

#[test]
fn duplicate_url_cited_at_second_occurrence() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
action MyAction
    urls
        GET /
        GET /
",
        "",
    );
    assert_eq!(error_strings(&parser), vec![":4: error: Duplicate URL: GET /"]);
    let Some(UserType::Action(action)) = parser.types().get("MyAction") else {
        panic!("expected action");
    };
    assert_eq!(action.urls.as_ref().expect("urls").len(), 1);
}

#[test]
fn wildcard_url_slots() {
    let types = parse_ok(
        "\
action A
    urls
        *
        POST
        /fixed
",
    );
    let Some(UserType::Action(action)) = types.get("A") else {
        panic!("expected action");
    };
    let urls = action.urls.as_ref().expect("urls");
    assert_eq!(urls[0].method, None);
    assert_eq!(urls[0].path, None);
    assert_eq!(urls[1].method.as_deref(), Some("POST"));
    assert_eq!(urls[1].path, None);
    assert_eq!(urls[2].method, None);
    assert_eq!(urls[2].path.as_deref(), Some("/fixed"));
}

#[test]
fn section_redefinition_continues_existing_section() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
action A
    input
        int a
    input
        int b
",
        "",
    );
    assert_eq!(
        error_strings(&parser),
        vec![":4: error: Redefinition of action input"]
    );
    let Some(UserType::Struct(s)) = parser.types().get("A_input") else {
        panic!("expected synthetic struct");
    };
    let names: Vec<&str> = s
        .members
        .as_ref()
        .expect("members")
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn urls_redefinition_flagged() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
action A
    urls
        GET /
    urls
        PUT /
",
        "",
    );
    assert_eq!(
        error_strings(&parser),
        vec![":4: error: Redefinition of action urls"]
    );
    assert!(matches!(
        parser.types().get("A"),
        Some(UserType::Action(a)) if a.urls.as_ref().map(|u| u.len()) == Some(2)
    ));
}

#[test]
fn accumulation_across_parse_calls_resolves_forward_references() {
    let mut parser = SchemaParser::new();
    parser.parse(
        "\
struct Pet
    Kind kind
",
        "pets.smd",
    );
    parser.parse(
        "\
enum Kind
    dog
    cat
",
        "kinds.smd",
    );
    parser.finalize();
    assert!(parser.errors().is_empty(), "errors: {:?}", parser.errors());
}

#[test]
fn parse_twice_yields_identical_models() {
    let source = "\
struct S
    int a
    S[] children

typedef S{} SMap
";
    assert_eq!(parse_ok(source), parse_ok(source));
}

#[test]
fn partial_model_preserved_on_error() {
    let err = parse_schema(
        "\
struct Good
    int a

struct Bad
    Missing b
",
    )
    .expect_err("unknown type reference");
    assert!(err.types.contains_key("Good"));
    assert!(err.types.contains_key("Bad"));
    assert_eq!(err.errors.len(), 1);
    assert_eq!(
        err.errors[0].to_string(),
        ":5: error: Unknown type 'Missing' from 'Bad' member 'b'"
    );
}
