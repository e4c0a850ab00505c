//! Typed view of a sandbox execution report.
//!
//! Only the fields the pipeline consumes are declared. Every entity here is
//! [`Policy::Flexible`]: vendors add fields between releases and that must not
//! break ingestion, while a declared field with the wrong shape still fails.

use std::collections::BTreeMap;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::report::schema::{join_entry, Entity, FromJson, HexBytes, ObjectReader, Policy, Validator};
use crate::value::{parse_address, strip_hex_prefix};

/// Root of a parsed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The submitted sample.
    pub target: Target,
    /// Processing job metadata.
    pub info: Info,
    /// Static analysis results, absent when that stage was skipped.
    #[serde(rename = "static")]
    pub static_: Option<Static>,
    pub strings: Option<Vec<String>>,
    /// Dynamic analysis results.
    pub behavior: Behavior,
}

impl Entity for Report {
    const NAME: &'static str = "report";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["target", "info", "static", "strings", "behavior"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let target = r.required("target");
        let info = r.required("info");
        let static_ = r.optional("static");
        let strings = r.optional("strings");
        let behavior = r.required("behavior");
        Some(Self {
            target: target?,
            info: info?,
            static_: static_?,
            strings: strings?,
            behavior: behavior?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub file: File,
}

impl Entity for Target {
    const NAME: &'static str = "target";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["file"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let file = r.required("file");
        Some(Self { file: file? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub version: String,
}

impl Entity for Info {
    const NAME: &'static str = "info";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["version"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let version = r.required("version");
        Some(Self { version: version? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Static {
    pub pe: Option<Pe>,
}

impl Entity for Static {
    const NAME: &'static str = "static";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["pe"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let pe = r.optional("pe");
        Some(Self { pe: pe? })
    }
}

/// Content identity of a file.
///
/// Hashes are kept exactly as reported (case preserved). Their lengths are
/// implied by the algorithm but not re-checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    /// Format label, e.g. `PE32 executable (GUI) Intel 80386`.
    #[serde(rename = "type")]
    pub file_type: String,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub pe: Option<Pe>,
    pub ep_bytes: Option<Vec<u8>>,
}

impl Entity for File {
    const NAME: &'static str = "file";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["type", "md5", "sha1", "sha256", "pe", "ep_bytes"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let file_type = r.required("type");
        let md5 = r.required("md5");
        let sha1 = r.required("sha1");
        let sha256 = r.required("sha256");
        let pe = r.optional("pe");
        let ep_bytes = r.optional::<HexBytes>("ep_bytes");
        Some(Self {
            file_type: file_type?,
            md5: md5?,
            sha1: sha1?,
            sha256: sha256?,
            pe: pe?,
            ep_bytes: ep_bytes?.map(|b| b.0),
        })
    }
}

/// PE structural facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pe {
    pub imagebase: u64,
    /// Per-DLL import groups in the order the report listed them, whichever
    /// of the two accepted shapes it used.
    pub imports: Vec<ImportedDll>,
    pub exports: Vec<ExportedSymbol>,
    pub sections: Vec<Section>,
    pub ep_bytes: Option<Vec<u8>>,
}

impl Pe {
    pub fn import_group(&self, dll: &str) -> Option<&ImportedDll> {
        self.imports.iter().find(|group| group.dll.eq_ignore_ascii_case(dll))
    }
}

impl Entity for Pe {
    const NAME: &'static str = "pe";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] =
        &["imagebase", "imports", "exports", "sections", "ep_bytes"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let imagebase = r.required("imagebase");
        let imports = r.defaulted::<ImportGroups>("imports");
        let exports = r.defaulted("exports");
        let sections = r.defaulted("sections");
        let ep_bytes = r.optional::<HexBytes>("ep_bytes");
        Some(Self {
            imagebase: imagebase?,
            imports: imports?.0,
            exports: exports?,
            sections: sections?,
            ep_bytes: ep_bytes?.map(|b| b.0),
        })
    }
}

/// `PE.imports` arrives either as a list of groups or as a mapping from DLL
/// base name to group. Both become a list in input order.
#[derive(Debug, Default)]
struct ImportGroups(Vec<ImportedDll>);

impl FromJson for ImportGroups {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        match value {
            Value::Array(_) => Vec::<ImportedDll>::from_json(v, path, value).map(ImportGroups),
            Value::Object(entries) => {
                let mut groups = Vec::with_capacity(entries.len());
                let mut clean = true;
                for (dll, entry) in entries {
                    match read_import_group(v, &join_entry(path, dll), entry, Some(dll)) {
                        Some(group) => groups.push(group),
                        None => clean = false,
                    }
                }
                clean.then_some(ImportGroups(groups))
            }
            other => {
                v.mistyped(path, "array or object", other);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedDll {
    pub dll: String,
    pub imports: Vec<ImportedSymbol>,
}

const IMPORTED_DLL_FIELDS: &[&str] = &["dll", "imports"];

impl FromJson for ImportedDll {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        read_import_group(v, path, value, None)
    }
}

/// In the mapping shape the key names the DLL, so `dll` may be omitted from
/// the group. An explicit `dll` inside the group takes precedence.
fn read_import_group(
    v: &mut Validator,
    path: &str,
    value: &Value,
    key: Option<&str>,
) -> Option<ImportedDll> {
    let mut r = ObjectReader::open(v, path, value)?;
    let dll = match key {
        Some(key) => r.optional::<String>("dll").map(|dll| dll.unwrap_or_else(|| key.to_string())),
        None => r.required("dll"),
    };
    let imports = r.required("imports");
    r.close("imported dll", Policy::Flexible, IMPORTED_DLL_FIELDS);
    Some(ImportedDll { dll: dll?, imports: imports? })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedSymbol {
    pub address: u64,
    /// Absent for imports by ordinal.
    pub name: Option<String>,
}

impl Entity for ImportedSymbol {
    const NAME: &'static str = "imported symbol";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["address", "name"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let address = r.required("address");
        let name = r.optional("name");
        Some(Self { address: address?, name: name? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedSymbol {
    pub address: u64,
    pub name: String,
}

impl Entity for ExportedSymbol {
    const NAME: &'static str = "exported symbol";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["address", "name"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let address = r.required("address");
        let name = r.required("name");
        Some(Self { address: address?, name: name? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub virtual_address: u64,
}

impl Entity for Section {
    const NAME: &'static str = "section";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["name", "virtual_address"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let name = r.required("name");
        let virtual_address = r.required("virtual_address");
        Some(Self { name: name?, virtual_address: virtual_address? })
    }
}

/// Dynamic analysis results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Behavior {
    pub summary: Option<Summary>,
    pub processes: Vec<Process>,
}

impl Behavior {
    pub fn call_count(&self) -> usize {
        self.processes.iter().map(|process| process.calls.len()).sum()
    }

    pub fn process(&self, process_id: i64) -> Option<&Process> {
        self.processes.iter().find(|process| process.process_id == process_id)
    }
}

impl Entity for Behavior {
    const NAME: &'static str = "behavior";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["summary", "processes"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let summary = r.optional("summary");
        let processes = r.required("processes");
        Some(Self { summary: summary?, processes: processes? })
    }
}

/// Deduplicated indicators collected across the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: Vec<String>,
    pub keys: Vec<String>,
    pub executed_commands: Vec<String>,
    pub resolved_apis: Vec<String>,
    pub mutexes: Vec<String>,
    pub created_services: Vec<String>,
    pub started_services: Vec<String>,
}

impl Entity for Summary {
    const NAME: &'static str = "summary";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &[
        "files",
        "keys",
        "executed_commands",
        "resolved_apis",
        "mutexes",
        "created_services",
        "started_services",
    ];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let files = r.required("files");
        let keys = r.required("keys");
        let executed_commands = r.required("executed_commands");
        let resolved_apis = r.required("resolved_apis");
        let mutexes = r.required("mutexes");
        let created_services = r.required("created_services");
        let started_services = r.required("started_services");
        Some(Self {
            files: files?,
            keys: keys?,
            executed_commands: executed_commands?,
            resolved_apis: resolved_apis?,
            mutexes: mutexes?,
            created_services: created_services?,
            started_services: started_services?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    pub process_id: i64,
    pub process_name: String,
    pub parent_id: i64,
    pub threads: Vec<i64>,
    pub environ: BTreeMap<String, String>,
    /// API calls across all threads, in the order the sandbox recorded them.
    pub calls: Vec<Call>,
}

impl Process {
    /// Calls made by one thread, in order.
    pub fn thread_calls(&self, thread_id: i64) -> impl Iterator<Item = &Call> {
        self.calls.iter().filter(move |call| call.thread_id == thread_id)
    }
}

impl Entity for Process {
    const NAME: &'static str = "process";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] =
        &["process_id", "process_name", "parent_id", "threads", "environ", "calls"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let process_id = r.required("process_id");
        let process_name = r.required("process_name");
        let parent_id = r.required("parent_id");
        let threads = r.required("threads");
        let environ = r.required("environ");
        let calls = r.required("calls");
        Some(Self {
            process_id: process_id?,
            process_name: process_name?,
            parent_id: parent_id?,
            threads: threads?,
            environ: environ?,
            calls: calls?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    pub thread_id: i64,
    pub api: String,
    pub arguments: Vec<Argument>,
    /// Register-width return value; see [`crate::value::parse_word`].
    #[serde(rename = "return")]
    pub return_: i64,
    pub pretty_return: Option<String>,
}

impl Call {
    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.iter().find(|arg| arg.name == name).map(|arg| &arg.value)
    }
}

impl Entity for Call {
    const NAME: &'static str = "call";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] =
        &["thread_id", "api", "arguments", "return", "pretty_return"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let thread_id = r.required("thread_id");
        let api = r.required("api");
        let arguments = r.required("arguments");
        let return_ = r.required("return");
        let pretty_return = r.optional("pretty_return");
        Some(Self {
            thread_id: thread_id?,
            api: api?,
            arguments: arguments?,
            return_: return_?,
            pretty_return: pretty_return?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: String,
    pub value: ArgumentValue,
    pub pretty_value: Option<String>,
}

impl Entity for Argument {
    const NAME: &'static str = "argument";
    const POLICY: Policy = Policy::Flexible;
    const FIELDS: &'static [&'static str] = &["name", "value", "pretty_value"];

    fn build(r: &mut ObjectReader<'_>) -> Option<Self> {
        let name = r.required("name");
        let value = r.required("value");
        let pretty_value = r.optional("pretty_value");
        Some(Self { name: name?, value: value?, pretty_value: pretty_value? })
    }
}

/// Value of a call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    /// A `0x`-prefixed hex string.
    Address(u64),
    /// A native JSON integer.
    Integer(i64),
    /// Any other string, verbatim.
    Text(String),
    /// Some sandboxes emit `[]` here. Its meaning is unknown; treat the value
    /// as unavailable.
    Unavailable,
}

impl ArgumentValue {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ArgumentValue::Unavailable)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgumentValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Serializes back into the wire shapes it was read from.
impl Serialize for ArgumentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArgumentValue::Address(address) => serializer.serialize_str(&format!("{address:#x}")),
            ArgumentValue::Integer(n) => serializer.serialize_i64(*n),
            ArgumentValue::Text(text) => serializer.serialize_str(text),
            ArgumentValue::Unavailable => serializer.serialize_seq(Some(0))?.end(),
        }
    }
}

impl FromJson for ArgumentValue {
    fn from_json(v: &mut Validator, path: &str, value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(n) => Some(ArgumentValue::Integer(n)),
                None => match n.as_u64() {
                    Some(n) => Some(ArgumentValue::Address(n)),
                    None => {
                        v.mistyped(path, "integer", value);
                        None
                    }
                },
            },
            Value::String(text) => match strip_hex_prefix(text) {
                Some(_) => match parse_address(text.as_str()) {
                    Ok(address) => Some(ArgumentValue::Address(address)),
                    Err(_) => Some(ArgumentValue::Text(text.clone())),
                },
                None => Some(ArgumentValue::Text(text.clone())),
            },
            Value::Array(items) if items.is_empty() => Some(ArgumentValue::Unavailable),
            other => {
                v.mistyped(path, "integer, string, or empty list", other);
                None
            }
        }
    }
}
