//! Declarative validation of JSON documents into typed entities.
//!
//! Each entity names its declared fields and its [`Policy`]. Reading an entity
//! never stops at the first problem: every missing, mistyped, or (for exact
//! entities) unexpected field is recorded with its full path, and the caller
//! only gets a value back when the whole document was clean.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::value::{parse_address, parse_bytes, parse_word, IntegerInput, MalformedScalar};

/// How an entity treats fields it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Undeclared fields are validation errors.
    Exact,
    /// Undeclared fields are dropped. Declared fields are still checked.
    Flexible,
}

/// What went wrong at a single field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The buffer was not well-formed JSON.
    Syntax(String),
    Missing,
    Mistyped { expected: &'static str, found: &'static str },
    Malformed(MalformedScalar),
    /// Undeclared field on an exact entity.
    Unexpected,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Syntax(msg) => write!(f, "invalid JSON: {msg}"),
            IssueKind::Missing => f.write_str("required field is missing"),
            IssueKind::Mistyped { expected, found } => write!(f, "expected {expected}, found {found}"),
            IssueKind::Malformed(err) => write!(f, "{err}"),
            IssueKind::Unexpected => f.write_str("field is not allowed here"),
        }
    }
}

/// A single offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path using wire field names, e.g. `behavior.processes[0].calls[2].return`.
    /// Empty for the document root.
    pub path: String,
    pub kind: IssueKind,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

/// A document failed validation. Nothing was constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_issues(.issues))]
pub struct ReportValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ReportValidationError {
    /// Paths of every offending field, in discovery order.
    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.path.as_str()).collect()
    }

    pub fn issue_at(&self, path: &str) -> Option<&IssueKind> {
        self.issues.iter().find(|issue| issue.path == path).map(|issue| &issue.kind)
    }
}

fn render_issues(issues: &[FieldIssue]) -> String {
    let mut out = format!("report failed validation with {} issue(s)", issues.len());
    for issue in issues {
        out.push_str(&format!("\n  {issue}"));
    }
    out
}

/// A validated value plus the paths of undeclared fields that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Audited<T> {
    pub value: T,
    pub ignored_fields: Vec<String>,
}

/// Accumulates issues and dropped fields while walking a document.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<FieldIssue>,
    ignored: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, path: &str, kind: IssueKind) {
        self.issues.push(FieldIssue { path: path.to_string(), kind });
    }

    pub fn mistyped(&mut self, path: &str, expected: &'static str, found: &Value) {
        self.report(path, IssueKind::Mistyped { expected, found: json_kind(found) });
    }

    fn ignore(&mut self, path: String) {
        self.ignored.push(path);
    }

    /// Turn the walk into a result. Any recorded issue wins over a built value.
    pub fn finish<T>(self, value: Option<T>) -> Result<Audited<T>, ReportValidationError> {
        match value {
            Some(value) if self.issues.is_empty() => {
                Ok(Audited { value, ignored_fields: self.ignored })
            }
            _ => Err(ReportValidationError { issues: self.issues }),
        }
    }
}

/// Types that can be read out of a JSON value at a given path.
///
/// Returns `None` after recording at least one issue on the validator.
pub trait FromJson: Sized {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self>;
}

/// A JSON object with a fixed set of declared fields.
pub trait Entity: Sized {
    const NAME: &'static str;
    const POLICY: Policy;
    const FIELDS: &'static [&'static str];

    /// Read every declared field, then assemble. Read all fields before
    /// bailing out so that every problem gets reported.
    fn build(fields: &mut ObjectReader<'_>) -> Option<Self>;
}

impl<T: Entity> FromJson for T {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        let mut reader = ObjectReader::open(v, path, value)?;
        let built = T::build(&mut reader);
        reader.close(T::NAME, T::POLICY, T::FIELDS);
        built
    }
}

/// Field accessor for one JSON object.
pub struct ObjectReader<'a> {
    validator: &'a mut Validator,
    path: &'a str,
    object: &'a Map<String, Value>,
}

impl<'a> ObjectReader<'a> {
    /// Start reading `value` as an object, recording a type issue otherwise.
    pub fn open(validator: &'a mut Validator, path: &'a str, value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self { validator, path, object }),
            other => {
                validator.mistyped(path, "object", other);
                None
            }
        }
    }

    pub fn path(&self) -> &str {
        self.path
    }

    pub fn required<T: FromJson>(&mut self, key: &str) -> Option<T> {
        let path = join_key(self.path, key);
        match self.object.get(key) {
            Some(value) => T::from_json(self.validator, &path, value),
            None => {
                self.validator.report(&path, IssueKind::Missing);
                None
            }
        }
    }

    /// Absent and `null` both read as `Some(None)`.
    pub fn optional<T: FromJson>(&mut self, key: &str) -> Option<Option<T>> {
        match self.object.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(value) => T::from_json(self.validator, &join_key(self.path, key), value).map(Some),
        }
    }

    pub fn defaulted<T: FromJson + Default>(&mut self, key: &str) -> Option<T> {
        self.optional(key).map(Option::unwrap_or_default)
    }

    /// Apply the entity's policy to every key it did not declare.
    pub fn close(self, entity: &'static str, policy: Policy, declared: &[&str]) {
        for key in self.object.keys() {
            if declared.contains(&key.as_str()) {
                continue;
            }
            let path = join_key(self.path, key);
            match policy {
                Policy::Exact => self.validator.report(&path, IssueKind::Unexpected),
                Policy::Flexible => {
                    trace!(entity, field = %path, "dropping undeclared field");
                    self.validator.ignore(path);
                }
            }
        }
    }
}

/// Parse a buffer as JSON and validate it as `T`.
pub fn parse_audited<T: FromJson>(buf: &[u8]) -> Result<Audited<T>, ReportValidationError> {
    let mut validator = Validator::new();
    let document: Value = match serde_json::from_slice(buf) {
        Ok(document) => document,
        Err(err) => {
            validator.report("", IssueKind::Syntax(err.to_string()));
            return validator.finish(None);
        }
    };
    let value = T::from_json(&mut validator, "", &document);
    validator.finish(value)
}

pub fn parse<T: FromJson>(buf: &[u8]) -> Result<T, ReportValidationError> {
    parse_audited(buf).map(|audited| audited.value)
}

pub fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub fn join_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Path segment for a mapping entry whose key is data, not a field name.
pub fn join_entry(parent: &str, key: &str) -> String {
    format!("{parent}[{key:?}]")
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FromJson for String {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(text.clone()),
            other => {
                v.mistyped(path, "string", other);
                None
            }
        }
    }
}

/// Integer-like fields: native numbers, signed decimal strings, or `0x` hex
/// strings.
fn integer_input<'v>(v: &mut Validator, path: &str, value: &'v Value) -> Option<IntegerInput<'v>> {
    match value {
        Value::Number(n) => {
            let native = match (n.as_i64(), n.as_u64()) {
                (Some(n), _) => Some(IntegerInput::from(n)),
                (None, Some(n)) => Some(IntegerInput::from(n)),
                (None, None) => None,
            };
            if native.is_none() {
                v.mistyped(path, "integer", value);
            }
            native
        }
        Value::String(text) => Some(IntegerInput::Text(text.as_str())),
        other => {
            v.mistyped(path, "integer or integer string", other);
            None
        }
    }
}

/// Addresses and sizes. Negative values are malformed.
impl FromJson for u64 {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        let input = integer_input(v, path, value)?;
        parse_address(input).map_err(|err| v.report(path, IssueKind::Malformed(err))).ok()
    }
}

/// Identifiers and return values, which sandboxes report as `-1` when unknown.
impl FromJson for i64 {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        let input = integer_input(v, path, value)?;
        parse_word(input).map_err(|err| v.report(path, IssueKind::Malformed(err))).ok()
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        let Value::Array(items) = value else {
            v.mistyped(path, "array", value);
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        let mut clean = true;
        for (index, item) in items.iter().enumerate() {
            match T::from_json(v, &join_index(path, index), item) {
                Some(parsed) => out.push(parsed),
                None => clean = false,
            }
        }
        clean.then_some(out)
    }
}

impl<T: FromJson> FromJson for BTreeMap<String, T> {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        let Value::Object(entries) = value else {
            v.mistyped(path, "object", value);
            return None;
        };
        let mut out = BTreeMap::new();
        let mut clean = true;
        for (key, item) in entries {
            match T::from_json(v, &join_entry(path, key), item) {
                Some(parsed) => {
                    out.insert(key.clone(), parsed);
                }
                None => clean = false,
            }
        }
        clean.then_some(out)
    }
}

/// A byte buffer carried as a hex digit string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexBytes(pub Vec<u8>);

impl FromJson for HexBytes {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        let Value::String(text) = value else {
            v.mistyped(path, "hex string", value);
            return None;
        };
        match parse_bytes(text.as_str()) {
            Ok(buf) => Some(HexBytes(buf)),
            Err(err) => {
                v.report(path, IssueKind::Malformed(err));
                None
            }
        }
    }
}
