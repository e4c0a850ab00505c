//! Feature values and their interchange codec.
//!
//! [`Feature`] is the internal, closed set of facts the extraction engine
//! produces and the matching engine consumes. [`FeatureRecord`] is its
//! portable wire form. [`freeze`] and [`thaw`] convert between the two and
//! round-trip exactly, description included.
//!
//! Both directions are exhaustive matches over flat enums, so adding a kind
//! without teaching the codec about it is a compile error. There is no
//! "unsupported kind" at runtime.

pub mod record;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::value::{encode_bytes, parse_bytes, MalformedScalar};

pub use record::{FeaturePayload, FeatureRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// The record's tag is not one this codec knows. Expected when reading
    /// archives written by a newer codec; callers may skip such records.
    #[error("unknown feature type {0:?}")]
    UnknownFeatureType(String),

    #[error("feature record has no string `type` discriminator")]
    MissingType,

    #[error("malformed {feature_type} record: {reason}")]
    MalformedRecord { feature_type: FeatureType, reason: String },

    #[error("malformed bytes payload: {0}")]
    MalformedBytes(#[from] MalformedScalar),

    #[error("feature record is not valid JSON: {0}")]
    InvalidJson(String),
}

/// The discriminator set of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    Os,
    Arch,
    Format,
    Match,
    Characteristic,
    Export,
    Import,
    Section,
    FunctionName,
    Substring,
    Regex,
    String,
    Class,
    Namespace,
    BasicBlock,
    Api,
    Property,
    Number,
    Bytes,
    Offset,
    Mnemonic,
    OperandNumber,
    OperandOffset,
}

impl FeatureType {
    pub const ALL: [FeatureType; 23] = [
        FeatureType::Os,
        FeatureType::Arch,
        FeatureType::Format,
        FeatureType::Match,
        FeatureType::Characteristic,
        FeatureType::Export,
        FeatureType::Import,
        FeatureType::Section,
        FeatureType::FunctionName,
        FeatureType::Substring,
        FeatureType::Regex,
        FeatureType::String,
        FeatureType::Class,
        FeatureType::Namespace,
        FeatureType::BasicBlock,
        FeatureType::Api,
        FeatureType::Property,
        FeatureType::Number,
        FeatureType::Bytes,
        FeatureType::Offset,
        FeatureType::Mnemonic,
        FeatureType::OperandNumber,
        FeatureType::OperandOffset,
    ];

    /// The literal `type` tag on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Os => "os",
            FeatureType::Arch => "arch",
            FeatureType::Format => "format",
            FeatureType::Match => "match",
            FeatureType::Characteristic => "characteristic",
            FeatureType::Export => "export",
            FeatureType::Import => "import",
            FeatureType::Section => "section",
            FeatureType::FunctionName => "function name",
            FeatureType::Substring => "substring",
            FeatureType::Regex => "regex",
            FeatureType::String => "string",
            FeatureType::Class => "class",
            FeatureType::Namespace => "namespace",
            FeatureType::BasicBlock => "basic block",
            FeatureType::Api => "api",
            FeatureType::Property => "property",
            FeatureType::Number => "number",
            FeatureType::Bytes => "bytes",
            FeatureType::Offset => "offset",
            FeatureType::Mnemonic => "mnemonic",
            FeatureType::OperandNumber => "operand number",
            FeatureType::OperandOffset => "operand offset",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = FeatureError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        FeatureType::ALL
            .into_iter()
            .find(|feature_type| feature_type.as_str() == tag)
            .ok_or_else(|| FeatureError::UnknownFeatureType(tag.to_string()))
    }
}

/// How an instruction touches a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyAccess {
    Read,
    Write,
}

impl PropertyAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyAccess::Read => "read",
            PropertyAccess::Write => "write",
        }
    }
}

impl FromStr for PropertyAccess {
    type Err = FeatureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(PropertyAccess::Read),
            "write" => Ok(PropertyAccess::Write),
            other => Err(FeatureError::MalformedRecord {
                feature_type: FeatureType::Property,
                reason: format!("unknown access {other:?}; expected \"read\" or \"write\""),
            }),
        }
    }
}

/// The fact a feature asserts.
///
/// `Substring`, `Regex`, and `String` carry the same payload shape; they are
/// distinct variants, so nothing ever has to guess which one a value is.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Os(String),
    Arch(String),
    Format(String),
    /// Name of a rule that matched.
    Match(String),
    Characteristic(String),
    Export(String),
    Import(String),
    Section(String),
    FunctionName(String),
    Substring(String),
    Regex(String),
    String(String),
    Class(String),
    Namespace(String),
    BasicBlock,
    Api(String),
    Property { name: String, access: Option<PropertyAccess> },
    /// Integer or float immediate, kept as the JSON number it was.
    Number(serde_json::Number),
    Bytes(Vec<u8>),
    Offset(i64),
    Mnemonic(String),
    OperandNumber { index: u32, value: i64 },
    OperandOffset { index: u32, value: i64 },
}

/// A feature plus its optional free-text description.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub description: Option<String>,
}

impl Feature {
    pub fn new(kind: FeatureKind) -> Self {
        Self { kind, description: None }
    }

    /// Builder-style helper to attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn feature_type(&self) -> FeatureType {
        match &self.kind {
            FeatureKind::Os(_) => FeatureType::Os,
            FeatureKind::Arch(_) => FeatureType::Arch,
            FeatureKind::Format(_) => FeatureType::Format,
            FeatureKind::Match(_) => FeatureType::Match,
            FeatureKind::Characteristic(_) => FeatureType::Characteristic,
            FeatureKind::Export(_) => FeatureType::Export,
            FeatureKind::Import(_) => FeatureType::Import,
            FeatureKind::Section(_) => FeatureType::Section,
            FeatureKind::FunctionName(_) => FeatureType::FunctionName,
            FeatureKind::Substring(_) => FeatureType::Substring,
            FeatureKind::Regex(_) => FeatureType::Regex,
            FeatureKind::String(_) => FeatureType::String,
            FeatureKind::Class(_) => FeatureType::Class,
            FeatureKind::Namespace(_) => FeatureType::Namespace,
            FeatureKind::BasicBlock => FeatureType::BasicBlock,
            FeatureKind::Api(_) => FeatureType::Api,
            FeatureKind::Property { .. } => FeatureType::Property,
            FeatureKind::Number(_) => FeatureType::Number,
            FeatureKind::Bytes(_) => FeatureType::Bytes,
            FeatureKind::Offset(_) => FeatureType::Offset,
            FeatureKind::Mnemonic(_) => FeatureType::Mnemonic,
            FeatureKind::OperandNumber { .. } => FeatureType::OperandNumber,
            FeatureKind::OperandOffset { .. } => FeatureType::OperandOffset,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.feature_type();
        match &self.kind {
            FeatureKind::Os(s)
            | FeatureKind::Arch(s)
            | FeatureKind::Format(s)
            | FeatureKind::Match(s)
            | FeatureKind::Characteristic(s)
            | FeatureKind::Export(s)
            | FeatureKind::Import(s)
            | FeatureKind::Section(s)
            | FeatureKind::FunctionName(s)
            | FeatureKind::Substring(s)
            | FeatureKind::Regex(s)
            | FeatureKind::String(s)
            | FeatureKind::Class(s)
            | FeatureKind::Namespace(s)
            | FeatureKind::Api(s)
            | FeatureKind::Mnemonic(s) => write!(f, "{tag}({s})")?,
            FeatureKind::BasicBlock => write!(f, "{tag}")?,
            FeatureKind::Property { name, access: Some(access) } => {
                write!(f, "{tag}/{}({name})", access.as_str())?
            }
            FeatureKind::Property { name, access: None } => write!(f, "{tag}({name})")?,
            FeatureKind::Number(n) => write!(f, "{tag}({n})")?,
            FeatureKind::Bytes(buf) => write!(f, "{tag}({})", encode_bytes(buf))?,
            FeatureKind::Offset(n) => write!(f, "{tag}({})", signed_hex(*n))?,
            FeatureKind::OperandNumber { index, value }
            | FeatureKind::OperandOffset { index, value } => {
                write!(f, "{tag}[{index}]({})", signed_hex(*value))?
            }
        }
        if let Some(description) = &self.description {
            write!(f, " = {description}")?;
        }
        Ok(())
    }
}

fn signed_hex(n: i64) -> String {
    if n < 0 {
        format!("-{:#x}", n.unsigned_abs())
    } else {
        format!("{n:#x}")
    }
}

/// Internal feature to wire record. Total: every kind has a wire variant.
pub fn freeze(feature: &Feature) -> FeatureRecord {
    let payload = match &feature.kind {
        FeatureKind::Os(os) => FeaturePayload::Os { os: os.clone() },
        FeatureKind::Arch(arch) => FeaturePayload::Arch { arch: arch.clone() },
        FeatureKind::Format(format) => FeaturePayload::Format { format: format.clone() },
        FeatureKind::Match(rule) => FeaturePayload::Match { rule: rule.clone() },
        FeatureKind::Characteristic(characteristic) => {
            FeaturePayload::Characteristic { characteristic: characteristic.clone() }
        }
        FeatureKind::Export(export) => FeaturePayload::Export { export: export.clone() },
        FeatureKind::Import(import) => FeaturePayload::Import { import: import.clone() },
        FeatureKind::Section(section) => FeaturePayload::Section { section: section.clone() },
        FeatureKind::FunctionName(name) => {
            FeaturePayload::FunctionName { function_name: name.clone() }
        }
        FeatureKind::Substring(substring) => {
            FeaturePayload::Substring { substring: substring.clone() }
        }
        FeatureKind::Regex(regex) => FeaturePayload::Regex { regex: regex.clone() },
        FeatureKind::String(string) => FeaturePayload::String { string: string.clone() },
        FeatureKind::Class(class) => FeaturePayload::Class { class: class.clone() },
        FeatureKind::Namespace(namespace) => {
            FeaturePayload::Namespace { namespace: namespace.clone() }
        }
        FeatureKind::BasicBlock => FeaturePayload::BasicBlock,
        FeatureKind::Api(api) => FeaturePayload::Api { api: api.clone() },
        FeatureKind::Property { name, access } => FeaturePayload::Property {
            access: access.map(|access| access.as_str().to_string()),
            property: name.clone(),
        },
        FeatureKind::Number(number) => FeaturePayload::Number { number: number.clone() },
        FeatureKind::Bytes(buf) => FeaturePayload::Bytes { bytes: encode_bytes(buf) },
        FeatureKind::Offset(offset) => FeaturePayload::Offset { offset: *offset },
        FeatureKind::Mnemonic(mnemonic) => FeaturePayload::Mnemonic { mnemonic: mnemonic.clone() },
        FeatureKind::OperandNumber { index, value } => {
            FeaturePayload::OperandNumber { index: *index, operand_number: *value }
        }
        FeatureKind::OperandOffset { index, value } => {
            FeaturePayload::OperandOffset { index: *index, operand_offset: *value }
        }
    };
    FeatureRecord { payload, description: feature.description.clone() }
}

/// Wire record to internal feature.
///
/// Fails only on payloads that type-check but are not valid for their kind:
/// bad hex in `bytes`, or an unknown property `access`.
pub fn thaw(record: FeatureRecord) -> Result<Feature, FeatureError> {
    let kind = match record.payload {
        FeaturePayload::Os { os } => FeatureKind::Os(os),
        FeaturePayload::Arch { arch } => FeatureKind::Arch(arch),
        FeaturePayload::Format { format } => FeatureKind::Format(format),
        FeaturePayload::Match { rule } => FeatureKind::Match(rule),
        FeaturePayload::Characteristic { characteristic } => {
            FeatureKind::Characteristic(characteristic)
        }
        FeaturePayload::Export { export } => FeatureKind::Export(export),
        FeaturePayload::Import { import } => FeatureKind::Import(import),
        FeaturePayload::Section { section } => FeatureKind::Section(section),
        FeaturePayload::FunctionName { function_name } => FeatureKind::FunctionName(function_name),
        FeaturePayload::Substring { substring } => FeatureKind::Substring(substring),
        FeaturePayload::Regex { regex } => FeatureKind::Regex(regex),
        FeaturePayload::String { string } => FeatureKind::String(string),
        FeaturePayload::Class { class } => FeatureKind::Class(class),
        FeaturePayload::Namespace { namespace } => FeatureKind::Namespace(namespace),
        FeaturePayload::BasicBlock => FeatureKind::BasicBlock,
        FeaturePayload::Api { api } => FeatureKind::Api(api),
        FeaturePayload::Property { access, property } => FeatureKind::Property {
            name: property,
            access: access.as_deref().map(str::parse::<PropertyAccess>).transpose()?,
        },
        FeaturePayload::Number { number } => FeatureKind::Number(number),
        FeaturePayload::Bytes { bytes } => FeatureKind::Bytes(parse_bytes(bytes.as_str())?),
        FeaturePayload::Offset { offset } => FeatureKind::Offset(offset),
        FeaturePayload::Mnemonic { mnemonic } => FeatureKind::Mnemonic(mnemonic),
        FeaturePayload::OperandNumber { index, operand_number } => {
            FeatureKind::OperandNumber { index, value: operand_number }
        }
        FeaturePayload::OperandOffset { index, operand_offset } => {
            FeatureKind::OperandOffset { index, value: operand_offset }
        }
    };
    Ok(Feature { kind, description: record.description })
}

/// Check the discriminator, decode the payload, and thaw, in one step.
pub fn thaw_value(value: Value) -> Result<Feature, FeatureError> {
    thaw(FeatureRecord::from_value(value)?)
}

pub fn thaw_json(text: &str) -> Result<Feature, FeatureError> {
    thaw(FeatureRecord::from_json(text)?)
}
