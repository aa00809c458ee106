//! Line-oriented Schema Markdown parser.
//!
//! The parser consumes source line by line, classifying each (joined)
//! line against a fixed-priority sequence of matchers: comment/doc,
//! top-level keywords (`group`, `struct`, `union`, `enum`, `typedef`,
//! `action`), action section headers, URL bindings, enum values, and
//! member declarations. Per-line errors are accumulated rather than
//! raised, so parsing always continues and partial models are preserved.
//!
//! Multiple `parse` calls accumulate declarations into one type-model;
//! forward references are tolerated until [`SchemaParser::finalize`]
//! runs the cross-reference checker.

use crate::check::check_types;
use crate::error::{SchemaError, SchemaErrors};
use crate::model::{
    ActionType, ActionUrl, ArrayType, Attributes, BuiltinType, DictType, EnumType, EnumValue,
    StructMember, StructType, Type, TypedefType, Types, UserType,
};
use std::collections::{HashMap, HashSet};
use std::mem;

/// Parse Schema Markdown source into a finalized type-model, or the full
/// batch of definition errors (with the partial model preserved).
pub fn parse_schema(source: &str) -> Result<Types, SchemaErrors> {
    parse_schema_with_filename(source, "")
}

/// Like [`parse_schema`], with a filename label used in diagnostics.
pub fn parse_schema_with_filename(source: &str, filename: &str) -> Result<Types, SchemaErrors> {
    let mut parser = SchemaParser::new();
    parser.parse(source, filename);
    parser.finalize();
    let errors = parser.errors();
    if errors.is_empty() {
        Ok(parser.into_types())
    } else {
        Err(SchemaErrors {
            errors,
            types: parser.into_types(),
        })
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

type Pos = (String, u32);

/// The accumulating Schema Markdown parser.
///
/// Owns the type-model mapping while it is being built. Forward
/// references are not checked per-declaration; `finalize` runs the
/// consistency checker and maps its findings back to source positions.
#[derive(Default)]
pub struct SchemaParser {
    types: Types,
    parse_errors: Vec<SchemaError>,
    check_errors: Vec<SchemaError>,
    type_pos: HashMap<String, Pos>,
    member_pos: HashMap<(String, String), Pos>,
}

/// Where indented lines are currently routed.
enum Container {
    None,
    Struct(String),
    Enum(String),
    Urls,
}

struct ParseState {
    filename: String,
    doc: Vec<String>,
    doc_group: Option<String>,
    action: Option<String>,
    container: Container,
    urls_seen: HashSet<(Option<String>, Option<String>)>,
}

impl ParseState {
    fn new(filename: &str) -> Self {
        ParseState {
            filename: filename.to_owned(),
            doc: Vec::new(),
            doc_group: None,
            action: None,
            container: Container::None,
            urls_seen: HashSet::new(),
        }
    }

    fn take_doc(&mut self) -> Option<Vec<String>> {
        if self.doc.is_empty() {
            None
        } else {
            Some(mem::take(&mut self.doc))
        }
    }
}

impl SchemaParser {
    pub fn new() -> Self {
        SchemaParser::default()
    }

    /// A parser extending a pre-existing type-model. Finalize findings
    /// against the inherited types render without source positions.
    pub fn with_types(types: Types) -> Self {
        SchemaParser {
            types,
            ..SchemaParser::default()
        }
    }

    /// The type-model accumulated so far (raw until `finalize`).
    pub fn types(&self) -> &Types {
        &self.types
    }

    pub fn into_types(self) -> Types {
        self.types
    }

    /// All accumulated errors: parse errors in discovery order, then
    /// finalize errors in the checker's stable traversal order.
    pub fn errors(&self) -> Vec<SchemaError> {
        self.parse_errors
            .iter()
            .chain(self.check_errors.iter())
            .cloned()
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.parse_errors.is_empty() || !self.check_errors.is_empty()
    }

    /// Parse a source string, accumulating declarations into the model.
    pub fn parse(&mut self, source: &str, filename: &str) {
        let mut st = ParseState::new(filename);
        let mut pending = String::new();
        let mut line_no = 0u32;
        for (idx, raw) in source.lines().enumerate() {
            line_no = idx as u32 + 1;
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            if let Some(stripped) = raw.strip_suffix('\\') {
                pending.push_str(stripped);
                continue;
            }
            if pending.is_empty() {
                self.process_line(&mut st, raw, line_no);
            } else {
                pending.push_str(raw);
                let joined = mem::take(&mut pending);
                self.process_line(&mut st, &joined, line_no);
            }
        }
        if !pending.is_empty() {
            self.process_line(&mut st, &pending, line_no);
        }
    }

    /// Parse an ordered sequence of lines as one source.
    pub fn parse_lines<I, S>(&mut self, lines: I, filename: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source: Vec<String> = lines.into_iter().map(|l| l.as_ref().to_owned()).collect();
        self.parse(&source.join("\n"), filename);
    }

    /// Run the cross-reference checker over the accumulated model and
    /// map its findings to source positions. Idempotent: re-running
    /// replaces the previous finalize findings.
    pub fn finalize(&mut self) {
        self.check_errors.clear();
        for e in check_types(&self.types) {
            let pos = e
                .member_name
                .as_ref()
                .and_then(|m| self.member_pos.get(&(e.type_name.clone(), m.clone())))
                .or_else(|| self.type_pos.get(&e.type_name));
            self.check_errors.push(match pos {
                Some((file, line)) => SchemaError::new(file, *line, e.message),
                None => SchemaError::bare(e.message),
            });
        }
    }

    // -- Line dispatch ------------------------------------------

    fn process_line(&mut self, st: &mut ParseState, line: &str, line_no: u32) {
        match match_comment(line) {
            Some(CommentLine::Ignored) => return,
            Some(CommentLine::Doc(text)) => {
                st.doc.push(text);
                return;
            }
            None => {}
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            self.process_body_line(st, line, line_no);
        } else {
            self.process_top_level(st, line, line_no);
        }
    }

    fn process_top_level(&mut self, st: &mut ParseState, line: &str, line_no: u32) {
        let mut scan = Scan::new(line);
        let Some(word) = scan.eat_ident() else {
            self.syntax_error(st, line_no);
            return;
        };
        match word {
            "group" => self.process_group(st, scan, line_no),
            "struct" => self.process_definition(st, scan, line_no, DefKind::Struct),
            "union" => self.process_definition(st, scan, line_no, DefKind::Union),
            "enum" => self.process_definition(st, scan, line_no, DefKind::Enum),
            "typedef" => self.process_typedef(st, scan, line_no),
            "action" => self.process_action(st, scan, line_no),
            _ => self.syntax_error(st, line_no),
        }
    }

    fn process_group(&mut self, st: &mut ParseState, mut scan: Scan, line_no: u32) {
        scan.skip_ws();
        if scan.at_end() {
            st.doc_group = None;
        } else if let Some(group) = scan.eat_quoted() {
            if !scan.at_end() {
                self.syntax_error(st, line_no);
                return;
            }
            st.doc_group = Some(group);
        } else {
            self.syntax_error(st, line_no);
            return;
        }
        st.action = None;
        st.container = Container::None;
    }

    fn process_definition(
        &mut self,
        st: &mut ParseState,
        mut scan: Scan,
        line_no: u32,
        kind: DefKind,
    ) {
        scan.skip_ws();
        let Some(name) = scan.eat_ident() else {
            self.syntax_error(st, line_no);
            return;
        };
        let name = name.to_owned();
        let Some(bases) = parse_opt_bases(&mut scan) else {
            self.syntax_error(st, line_no);
            return;
        };
        if !scan.at_end() {
            self.syntax_error(st, line_no);
            return;
        }
        let doc = st.take_doc();
        let doc_group = st.doc_group.clone();
        let user_type = match kind {
            DefKind::Struct | DefKind::Union => {
                let mut s = StructType::new(&name);
                s.doc = doc;
                s.doc_group = doc_group;
                s.bases = bases;
                s.union = kind == DefKind::Union;
                UserType::Struct(s)
            }
            DefKind::Enum => {
                let mut e = EnumType::new(&name);
                e.doc = doc;
                e.doc_group = doc_group;
                e.bases = bases;
                UserType::Enum(e)
            }
        };
        self.add_type(st, line_no, &name, user_type);
        st.action = None;
        st.container = match kind {
            DefKind::Enum => Container::Enum(name),
            _ => Container::Struct(name),
        };
    }

    fn process_typedef(&mut self, st: &mut ParseState, mut scan: Scan, line_no: u32) {
        let Some((type_, attr)) = parse_type_spec(&mut scan) else {
            self.syntax_error(st, line_no);
            return;
        };
        scan.skip_ws();
        let Some(name) = scan.eat_ident() else {
            self.syntax_error(st, line_no);
            return;
        };
        let name = name.to_owned();
        if !scan.at_end() {
            self.syntax_error(st, line_no);
            return;
        }
        let typedef = TypedefType {
            name: name.clone(),
            doc: st.take_doc(),
            doc_group: st.doc_group.clone(),
            type_,
            attr,
        };
        self.add_type(st, line_no, &name, UserType::Typedef(typedef));
        st.action = None;
        st.container = Container::None;
    }

    fn process_action(&mut self, st: &mut ParseState, mut scan: Scan, line_no: u32) {
        scan.skip_ws();
        let Some(name) = scan.eat_ident() else {
            self.syntax_error(st, line_no);
            return;
        };
        let name = name.to_owned();
        if !scan.at_end() {
            self.syntax_error(st, line_no);
            return;
        }
        let mut action = ActionType::new(&name);
        action.doc = st.take_doc();
        action.doc_group = st.doc_group.clone();
        self.add_type(st, line_no, &name, UserType::Action(action));
        st.action = Some(name);
        st.container = Container::None;
        st.urls_seen.clear();
    }

    fn process_body_line(&mut self, st: &mut ParseState, line: &str, line_no: u32) {
        if st.action.is_some() {
            if let Some((section, bases)) = match_section(line) {
                self.process_section(st, line_no, section, bases);
                return;
            }
        }
        let container = mem::replace(&mut st.container, Container::None);
        match &container {
            Container::Urls => self.process_url(st, line, line_no),
            Container::Enum(name) => self.process_value(st, name, line, line_no),
            Container::Struct(name) => self.process_member(st, name, line, line_no),
            Container::None => self.syntax_error(st, line_no),
        }
        st.container = container;
    }

    fn process_section(
        &mut self,
        st: &mut ParseState,
        line_no: u32,
        section: Section,
        bases: Option<Vec<String>>,
    ) {
        let Some(action_name) = st.action.clone() else {
            self.syntax_error(st, line_no);
            return;
        };
        if section == Section::Urls {
            let redefined = match self.action_mut(&action_name) {
                Some(action) => {
                    if action.urls.is_some() {
                        true
                    } else {
                        action.urls = Some(Vec::new());
                        false
                    }
                }
                None => {
                    self.syntax_error(st, line_no);
                    return;
                }
            };
            if redefined {
                self.error(st, line_no, "Redefinition of action urls");
            }
            st.doc.clear();
            st.container = Container::Urls;
            return;
        }

        let section_type_name = format!("{}_{}", action_name, section.name());
        let already = match self.action_mut(&action_name) {
            Some(action) => {
                let slot = section.slot_mut(action);
                if slot.is_some() {
                    true
                } else {
                    *slot = Some(section_type_name.clone());
                    false
                }
            }
            None => {
                self.syntax_error(st, line_no);
                return;
            }
        };
        if already {
            // Continuation of a re-declared section: keep the existing
            // synthetic type and keep appending to it.
            self.error(
                st,
                line_no,
                format!("Redefinition of action {}", section.name()),
            );
            st.doc.clear();
        } else {
            let doc = st.take_doc();
            let user_type = if section == Section::Errors {
                let mut e = EnumType::new(&section_type_name);
                e.doc = doc;
                e.bases = bases;
                UserType::Enum(e)
            } else {
                let mut s = StructType::new(&section_type_name);
                s.doc = doc;
                s.bases = bases;
                UserType::Struct(s)
            };
            self.add_type(st, line_no, &section_type_name, user_type);
        }
        st.container = if section == Section::Errors {
            Container::Enum(section_type_name)
        } else {
            Container::Struct(section_type_name)
        };
    }

    fn process_url(&mut self, st: &mut ParseState, line: &str, line_no: u32) {
        let Some((method, path)) = match_url(line) else {
            self.syntax_error(st, line_no);
            return;
        };
        let url = ActionUrl { method, path };
        if !st.urls_seen.insert((url.method.clone(), url.path.clone())) {
            self.error(st, line_no, format!("Duplicate URL: {}", url.text()));
            return;
        }
        let Some(action_name) = st.action.clone() else {
            self.syntax_error(st, line_no);
            return;
        };
        if let Some(action) = self.action_mut(&action_name) {
            action.urls.get_or_insert_with(Vec::new).push(url);
        }
    }

    fn process_value(&mut self, st: &mut ParseState, enum_name: &str, line: &str, line_no: u32) {
        let Some(name) = match_value(line) else {
            self.syntax_error(st, line_no);
            return;
        };
        let duplicate = matches!(
            self.types.get(enum_name),
            Some(UserType::Enum(e)) if e.values.as_ref().map_or(false, |vs| vs.iter().any(|v| v.name == name))
        );
        if duplicate {
            self.error(
                st,
                line_no,
                format!("Redefinition of '{}' value '{}'", enum_name, name),
            );
            return;
        }
        let doc = st.take_doc();
        if let Some(UserType::Enum(e)) = self.types.get_mut(enum_name) {
            e.values
                .get_or_insert_with(Vec::new)
                .push(EnumValue { name: name.clone(), doc });
            self.member_pos.insert(
                (enum_name.to_owned(), name),
                (st.filename.clone(), line_no),
            );
        } else {
            self.syntax_error(st, line_no);
        }
    }

    fn process_member(&mut self, st: &mut ParseState, struct_name: &str, line: &str, line_no: u32) {
        let Some((optional, type_, attr, name)) = match_member(line) else {
            self.syntax_error(st, line_no);
            return;
        };
        let duplicate = matches!(
            self.types.get(struct_name),
            Some(UserType::Struct(s)) if s.members.as_ref().map_or(false, |ms| ms.iter().any(|m| m.name == name))
        );
        if duplicate {
            self.error(
                st,
                line_no,
                format!("Redefinition of '{}' member '{}'", struct_name, name),
            );
            return;
        }
        let doc = st.take_doc();
        if let Some(UserType::Struct(s)) = self.types.get_mut(struct_name) {
            s.members.get_or_insert_with(Vec::new).push(StructMember {
                name: name.clone(),
                doc,
                type_,
                attr,
                optional,
            });
            self.member_pos.insert(
                (struct_name.to_owned(), name),
                (st.filename.clone(), line_no),
            );
        } else {
            self.syntax_error(st, line_no);
        }
    }

    // -- Helpers ------------------------------------------------

    fn add_type(&mut self, st: &ParseState, line_no: u32, name: &str, user_type: UserType) {
        if self.types.contains_key(name) {
            self.error(st, line_no, format!("Redefinition of type '{}'", name));
        }
        self.type_pos
            .insert(name.to_owned(), (st.filename.clone(), line_no));
        self.types.insert(name.to_owned(), user_type);
    }

    fn action_mut(&mut self, name: &str) -> Option<&mut ActionType> {
        match self.types.get_mut(name) {
            Some(UserType::Action(a)) => Some(a),
            _ => None,
        }
    }

    fn error(&mut self, st: &ParseState, line_no: u32, message: impl Into<String>) {
        self.parse_errors
            .push(SchemaError::new(&st.filename, line_no, message));
    }

    fn syntax_error(&mut self, st: &ParseState, line_no: u32) {
        self.error(st, line_no, "Syntax error");
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum DefKind {
    Struct,
    Union,
    Enum,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Section {
    Path,
    Query,
    Input,
    Output,
    Errors,
    Urls,
}

impl Section {
    fn from_keyword(word: &str) -> Option<Section> {
        match word {
            "path" => Some(Section::Path),
            "query" => Some(Section::Query),
            "input" => Some(Section::Input),
            "output" => Some(Section::Output),
            "errors" => Some(Section::Errors),
            "urls" => Some(Section::Urls),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Section::Path => "path",
            Section::Query => "query",
            Section::Input => "input",
            Section::Output => "output",
            Section::Errors => "errors",
            Section::Urls => "urls",
        }
    }

    fn slot_mut<'a>(&self, action: &'a mut ActionType) -> &'a mut Option<String> {
        match self {
            Section::Path => &mut action.path,
            Section::Query => &mut action.query,
            Section::Input => &mut action.input,
            Section::Output => &mut action.output,
            Section::Errors => &mut action.errors,
            Section::Urls => unreachable!("urls has no type slot"),
        }
    }
}

// ──────────────────────────────────────────────
// Line matchers
// ──────────────────────────────────────────────

enum CommentLine {
    Ignored,
    Doc(String),
}

/// Blank lines, `#-` hidden comments, and `#` doc comment lines.
fn match_comment(line: &str) -> Option<CommentLine> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    if trimmed.trim_end().is_empty() {
        return Some(CommentLine::Ignored);
    }
    let rest = trimmed.strip_prefix('#')?;
    if rest.starts_with('-') {
        return Some(CommentLine::Ignored);
    }
    let text = rest.strip_prefix(' ').unwrap_or(rest).trim_end();
    Some(CommentLine::Doc(text.to_owned()))
}

/// Action section headers: `urls`, or `path`/`query`/`input`/`output`/
/// `errors` with an optional parenthesized base list.
fn match_section(line: &str) -> Option<(Section, Option<Vec<String>>)> {
    let mut scan = Scan::new(line);
    scan.skip_ws();
    let word = scan.eat_ident()?;
    let section = Section::from_keyword(word)?;
    if section == Section::Urls {
        if scan.at_end() {
            return Some((section, None));
        }
        return None;
    }
    let bases = parse_opt_bases(&mut scan)?;
    if scan.at_end() {
        Some((section, bases))
    } else {
        None
    }
}

/// URL binding lines: `<METHOD> <path>`, `<METHOD>`, `<path>`, `*`, or
/// `* <path>`. Returns (method, path) with `None` for wildcard slots.
fn match_url(line: &str) -> Option<(Option<String>, Option<String>)> {
    let mut scan = Scan::new(line);
    scan.skip_ws();
    let method_slot = if scan.eat_char('*') {
        Some(None)
    } else {
        let save = scan;
        match scan.eat_ident() {
            Some(id) if id.chars().all(|c| c.is_ascii_uppercase()) => Some(Some(id.to_owned())),
            Some(_) => return None,
            None => {
                scan = save;
                None
            }
        }
    };
    scan.skip_ws();
    let path = scan.eat_path().map(str::to_owned);
    if !scan.at_end() {
        return None;
    }
    match method_slot {
        Some(method) => Some((method, path)),
        None => path.map(|p| (None, Some(p))),
    }
}

/// Enum value lines: a bare identifier or a quoted string.
fn match_value(line: &str) -> Option<String> {
    let mut scan = Scan::new(line);
    scan.skip_ws();
    if let Some(quoted) = scan.eat_quoted() {
        if scan.at_end() {
            return Some(quoted);
        }
        return None;
    }
    let id = scan.eat_ident()?;
    if scan.at_end() {
        Some(id.to_owned())
    } else {
        None
    }
}

/// Member declaration lines: `[optional] <type-spec> <name>`.
fn match_member(line: &str) -> Option<(bool, Type, Option<Attributes>, String)> {
    let mut scan = Scan::new(line);
    scan.skip_ws();
    let save = scan;
    if let Some(word) = scan.eat_ident() {
        if word == "optional" {
            if let Some((type_, attr, name)) = finish_member(scan) {
                return Some((true, type_, attr, name));
            }
        }
    }
    finish_member(save).map(|(type_, attr, name)| (false, type_, attr, name))
}

fn finish_member(mut scan: Scan) -> Option<(Type, Option<Attributes>, String)> {
    let (type_, attr) = parse_type_spec(&mut scan)?;
    scan.skip_ws();
    let name = scan.eat_ident()?;
    if !scan.at_end() {
        return None;
    }
    Some((type_, attr, name.to_owned()))
}

/// An optional parenthesized comma-separated base-type list.
/// Returns `None` on malformed input, `Some(None)` when absent.
fn parse_opt_bases(scan: &mut Scan) -> Option<Option<Vec<String>>> {
    scan.skip_ws();
    if !scan.eat_char('(') {
        return Some(None);
    }
    let mut bases = Vec::new();
    loop {
        scan.skip_ws();
        let base = scan.eat_ident()?;
        bases.push(base.to_owned());
        scan.skip_ws();
        if scan.eat_char(',') {
            continue;
        }
        if scan.eat_char(')') {
            break;
        }
        return None;
    }
    Some(Some(bases))
}

// ──────────────────────────────────────────────
// Type-spec grammar
// ──────────────────────────────────────────────

fn keyword_type(word: &str) -> Type {
    match BuiltinType::from_keyword(word) {
        Some(builtin) => Type::Builtin(builtin),
        None => Type::User(word.to_owned()),
    }
}

/// Parse a type-spec: scalar with optional attribute parens, optionally
/// followed by an array `[...]` or dict `{...}` modifier, with dicts
/// optionally prefixed by a key type and `:`.
///
/// Returns the parsed type plus the attribute set applying to the value
/// itself (the bracketed attrs for arrays/dicts, the parenthesized attrs
/// for scalars). Element/value-level attrs are stored inside the
/// compound type.
fn parse_type_spec(scan: &mut Scan) -> Option<(Type, Option<Attributes>)> {
    scan.skip_ws();
    let word = scan.eat_ident()?;
    let base = keyword_type(word);
    scan.skip_ws();
    let base_attr = if scan.eat_char('(') {
        parse_attr_section(scan, ')', false)?
    } else {
        None
    };
    scan.skip_ws();
    if scan.eat_char('[') {
        let array_attr = parse_attr_section(scan, ']', true)?;
        return Some((
            Type::Array(Box::new(ArrayType {
                type_: base,
                attr: base_attr,
            })),
            array_attr,
        ));
    }
    if scan.eat_char('{') {
        let dict_attr = parse_attr_section(scan, '}', true)?;
        return Some((
            Type::Dict(Box::new(DictType {
                type_: base,
                attr: base_attr,
                key_type: None,
                key_attr: None,
            })),
            dict_attr,
        ));
    }
    if scan.eat_char(':') {
        scan.skip_ws();
        let value_word = scan.eat_ident()?;
        let value_type = keyword_type(value_word);
        scan.skip_ws();
        let value_attr = if scan.eat_char('(') {
            parse_attr_section(scan, ')', false)?
        } else {
            None
        };
        scan.skip_ws();
        if !scan.eat_char('{') {
            return None;
        }
        let dict_attr = parse_attr_section(scan, '}', true)?;
        return Some((
            Type::Dict(Box::new(DictType {
                type_: value_type,
                attr: value_attr,
                key_type: Some(base),
                key_attr: base_attr,
            })),
            dict_attr,
        ));
    }
    Some((base, base_attr))
}

#[derive(Clone, Copy)]
enum AttrOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

fn eat_attr_op(scan: &mut Scan) -> Option<AttrOp> {
    if scan.eat_token("<=") {
        Some(AttrOp::Lte)
    } else if scan.eat_token(">=") {
        Some(AttrOp::Gte)
    } else if scan.eat_token("==") {
        Some(AttrOp::Eq)
    } else if scan.eat_char('<') {
        Some(AttrOp::Lt)
    } else if scan.eat_char('>') {
        Some(AttrOp::Gt)
    } else {
        None
    }
}

/// Parse a comma-separated attribute list up to the closing delimiter.
/// Returns `None` on malformed input (including attribute keywords other
/// than the nine comparison forms plus `nullable`), `Some(None)` when
/// the list is empty and emptiness is allowed.
fn parse_attr_section(
    scan: &mut Scan,
    close: char,
    allow_empty: bool,
) -> Option<Option<Attributes>> {
    scan.skip_ws();
    if scan.eat_char(close) {
        return if allow_empty { Some(None) } else { None };
    }
    let mut attrs = Attributes::default();
    loop {
        scan.skip_ws();
        if let Some(op) = eat_attr_op(scan) {
            scan.skip_ws();
            let n = scan.eat_number()?;
            match op {
                AttrOp::Eq => attrs.eq = Some(n),
                AttrOp::Lt => attrs.lt = Some(n),
                AttrOp::Lte => attrs.lte = Some(n),
                AttrOp::Gt => attrs.gt = Some(n),
                AttrOp::Gte => attrs.gte = Some(n),
            }
        } else {
            let word = scan.eat_ident()?;
            match word {
                "nullable" => attrs.nullable = true,
                "len" => {
                    scan.skip_ws();
                    let op = eat_attr_op(scan)?;
                    scan.skip_ws();
                    let n = scan.eat_uint()?;
                    match op {
                        AttrOp::Eq => attrs.len_eq = Some(n),
                        AttrOp::Lt => attrs.len_lt = Some(n),
                        AttrOp::Lte => attrs.len_lte = Some(n),
                        AttrOp::Gt => attrs.len_gt = Some(n),
                        AttrOp::Gte => attrs.len_gte = Some(n),
                    }
                }
                _ => return None,
            }
        }
        scan.skip_ws();
        if scan.eat_char(',') {
            continue;
        }
        if scan.eat_char(close) {
            break;
        }
        return None;
    }
    Some(Some(attrs))
}

// ──────────────────────────────────────────────
// Scanner
// ──────────────────────────────────────────────

/// A lightweight cursor over a single (joined) source line.
#[derive(Clone, Copy)]
struct Scan<'a> {
    rest: &'a str,
}

impl<'a> Scan<'a> {
    fn new(line: &'a str) -> Self {
        Scan { rest: line }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.rest.is_empty()
    }

    fn eat_char(&mut self, c: char) -> bool {
        if let Some(rest) = self.rest.strip_prefix(c) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn eat_token(&mut self, token: &str) -> bool {
        if let Some(rest) = self.rest.strip_prefix(token) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    /// `[A-Za-z][A-Za-z0-9_]*`
    fn eat_ident(&mut self) -> Option<&'a str> {
        let bytes = self.rest.as_bytes();
        if bytes.is_empty() || !bytes[0].is_ascii_alphabetic() {
            return None;
        }
        let mut end = 1;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(ident)
    }

    /// A double-quoted string (no escape processing).
    fn eat_quoted(&mut self) -> Option<String> {
        let inner = self.rest.strip_prefix('"')?;
        let close = inner.find('"')?;
        let text = inner[..close].to_owned();
        self.rest = &inner[close + 1..];
        Some(text)
    }

    /// `-?[0-9]+(\.[0-9]+)?`
    fn eat_number(&mut self) -> Option<f64> {
        let bytes = self.rest.as_bytes();
        let mut end = 0;
        if bytes.first() == Some(&b'-') {
            end = 1;
        }
        let digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }
        if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        let (num, rest) = self.rest.split_at(end);
        let parsed = num.parse().ok()?;
        self.rest = rest;
        Some(parsed)
    }

    /// `[0-9]+`
    fn eat_uint(&mut self) -> Option<u64> {
        let bytes = self.rest.as_bytes();
        let mut end = 0;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == 0 {
            return None;
        }
        let (num, rest) = self.rest.split_at(end);
        let parsed = num.parse().ok()?;
        self.rest = rest;
        Some(parsed)
    }

    /// A URL path token: `/` followed by non-whitespace.
    fn eat_path(&mut self) -> Option<&'a str> {
        if !self.rest.starts_with('/') {
            return None;
        }
        let end = self
            .rest
            .find([' ', '\t'])
            .unwrap_or(self.rest.len());
        let (path, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(path)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
