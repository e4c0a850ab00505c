//! Portable wire form of a feature.
//!
//! A record is a JSON object with a `type` discriminator, payload field(s)
//! named after the type, and an optional `description`. Field names that are
//! not usable as Rust identifiers are renamed here and nowhere else:
//!
//! | wire name          | field            |
//! |--------------------|------------------|
//! | `match`            | `rule`           |
//! | `function name`    | `function_name`  |
//! | `operand number`   | `operand_number` |
//! | `operand offset`   | `operand_offset` |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::features::{FeatureError, FeatureType};

/// One serialized feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub payload: FeaturePayload,
    /// Absent and `null` both mean "no description"; `""` is kept as is.
    pub description: Option<String>,
}

/// Variant-specific part of a record, selected by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeaturePayload {
    #[serde(rename = "os")]
    Os { os: String },
    #[serde(rename = "arch")]
    Arch { arch: String },
    #[serde(rename = "format")]
    Format { format: String },
    #[serde(rename = "match")]
    Match {
        #[serde(rename = "match")]
        rule: String,
    },
    #[serde(rename = "characteristic")]
    Characteristic { characteristic: String },
    #[serde(rename = "export")]
    Export { export: String },
    #[serde(rename = "import")]
    Import { import: String },
    #[serde(rename = "section")]
    Section { section: String },
    #[serde(rename = "function name")]
    FunctionName {
        #[serde(rename = "function name")]
        function_name: String,
    },
    #[serde(rename = "substring")]
    Substring { substring: String },
    #[serde(rename = "regex")]
    Regex { regex: String },
    #[serde(rename = "string")]
    String { string: String },
    #[serde(rename = "class")]
    Class { class: String },
    #[serde(rename = "namespace")]
    Namespace { namespace: String },
    #[serde(rename = "basic block")]
    BasicBlock,
    #[serde(rename = "api")]
    Api { api: String },
    #[serde(rename = "property")]
    Property { access: Option<String>, property: String },
    #[serde(rename = "number")]
    Number { number: serde_json::Number },
    /// Lowercase hex digits.
    #[serde(rename = "bytes")]
    Bytes { bytes: String },
    #[serde(rename = "offset")]
    Offset { offset: i64 },
    #[serde(rename = "mnemonic")]
    Mnemonic { mnemonic: String },
    #[serde(rename = "operand number")]
    OperandNumber {
        index: u32,
        #[serde(rename = "operand number")]
        operand_number: i64,
    },
    #[serde(rename = "operand offset")]
    OperandOffset {
        index: u32,
        #[serde(rename = "operand offset")]
        operand_offset: i64,
    },
}

impl FeaturePayload {
    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeaturePayload::Os { .. } => FeatureType::Os,
            FeaturePayload::Arch { .. } => FeatureType::Arch,
            FeaturePayload::Format { .. } => FeatureType::Format,
            FeaturePayload::Match { .. } => FeatureType::Match,
            FeaturePayload::Characteristic { .. } => FeatureType::Characteristic,
            FeaturePayload::Export { .. } => FeatureType::Export,
            FeaturePayload::Import { .. } => FeatureType::Import,
            FeaturePayload::Section { .. } => FeatureType::Section,
            FeaturePayload::FunctionName { .. } => FeatureType::FunctionName,
            FeaturePayload::Substring { .. } => FeatureType::Substring,
            FeaturePayload::Regex { .. } => FeatureType::Regex,
            FeaturePayload::String { .. } => FeatureType::String,
            FeaturePayload::Class { .. } => FeatureType::Class,
            FeaturePayload::Namespace { .. } => FeatureType::Namespace,
            FeaturePayload::BasicBlock => FeatureType::BasicBlock,
            FeaturePayload::Api { .. } => FeatureType::Api,
            FeaturePayload::Property { .. } => FeatureType::Property,
            FeaturePayload::Number { .. } => FeatureType::Number,
            FeaturePayload::Bytes { .. } => FeatureType::Bytes,
            FeaturePayload::Offset { .. } => FeatureType::Offset,
            FeaturePayload::Mnemonic { .. } => FeatureType::Mnemonic,
            FeaturePayload::OperandNumber { .. } => FeatureType::OperandNumber,
            FeaturePayload::OperandOffset { .. } => FeatureType::OperandOffset,
        }
    }
}

impl FeatureRecord {
    pub fn feature_type(&self) -> FeatureType {
        self.payload.feature_type()
    }

    /// Decode a record from a JSON value.
    ///
    /// The discriminator is checked before the payload, so a tag written by a
    /// newer codec surfaces as [`FeatureError::UnknownFeatureType`] rather
    /// than a generic shape error.
    pub fn from_value(value: Value) -> Result<Self, FeatureError> {
        let feature_type = match value.get("type") {
            Some(Value::String(tag)) => tag.parse::<FeatureType>()?,
            _ => return Err(FeatureError::MissingType),
        };
        serde_json::from_value(value)
            .map_err(|err| FeatureError::MalformedRecord { feature_type, reason: err.to_string() })
    }

    pub fn from_json(text: &str) -> Result<Self, FeatureError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| FeatureError::InvalidJson(err.to_string()))?;
        Self::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
