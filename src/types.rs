// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared type tag of a task input/output or an entrypoint parameter.
///
/// Built-in names are matched case-insensitively; anything else that looks
/// like an identifier is kept as a plugin-defined [`ParamType::Custom`] type,
/// which the engine never type-checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParamType {
    #[default]
    Any,
    String,
    Integer,
    /// Also accepted as `float`.
    Number,
    Boolean,
    Null,
    List,
    Mapping,
    Path,
    Uri,
    Custom(String),
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "any" => Ok(ParamType::Any),
            "string" | "str" => Ok(ParamType::String),
            "integer" | "int" => Ok(ParamType::Integer),
            "number" | "float" => Ok(ParamType::Number),
            "boolean" | "bool" => Ok(ParamType::Boolean),
            "null" => Ok(ParamType::Null),
            "list" => Ok(ParamType::List),
            "mapping" => Ok(ParamType::Mapping),
            "path" => Ok(ParamType::Path),
            "uri" => Ok(ParamType::Uri),
            _ if is_type_name(trimmed) => Ok(ParamType::Custom(trimmed.to_string())),
            _ => Err(format!("invalid parameter type: {trimmed:?}")),
        }
    }
}

impl TryFrom<String> for ParamType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParamType> for String {
    fn from(value: ParamType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Any => "any",
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Null => "null",
            ParamType::List => "list",
            ParamType::Mapping => "mapping",
            ParamType::Path => "path",
            ParamType::Uri => "uri",
            ParamType::Custom(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

impl ParamType {
    /// `true` for types the engine does not know how to check.
    pub fn is_opaque(&self) -> bool {
        matches!(self, ParamType::Any | ParamType::Custom(_))
    }

    /// Whether a TOML literal can be passed where this type is expected.
    pub fn accepts_literal(&self, value: &toml::Value) -> bool {
        use toml::Value;

        if self.is_opaque() {
            return true;
        }
        match (self, value) {
            (ParamType::String | ParamType::Path | ParamType::Uri, Value::String(_)) => true,
            (ParamType::String, Value::Datetime(_)) => true,
            (ParamType::Integer, Value::Integer(_)) => true,
            (ParamType::Number, Value::Integer(_) | Value::Float(_)) => true,
            (ParamType::Boolean, Value::Boolean(_)) => true,
            (ParamType::List, Value::Array(_)) => true,
            (ParamType::Mapping, Value::Table(_)) => true,
            _ => false,
        }
    }

    /// Whether a value declared as `self` may feed an input declared as `target`.
    pub fn feeds(&self, target: &ParamType) -> bool {
        if self.is_opaque() || target.is_opaque() || self == target {
            return true;
        }
        matches!(
            (self, target),
            (ParamType::Integer, ParamType::Number)
                | (
                    ParamType::String | ParamType::Path | ParamType::Uri,
                    ParamType::String | ParamType::Path | ParamType::Uri
                )
        )
    }

    /// Whether a textual default value is a valid value of this type.
    ///
    /// Only scalar numeric and boolean types are checked; everything else is
    /// accepted as-is.
    pub fn parses_default(&self, raw: &str) -> bool {
        let raw = raw.trim();
        match self {
            ParamType::Integer => raw.parse::<i64>().is_ok(),
            ParamType::Number => raw.parse::<f64>().is_ok(),
            ParamType::Boolean => matches!(raw.to_lowercase().as_str(), "true" | "false"),
            _ => true,
        }
    }
}

/// Human-readable type of a TOML literal, as used in diagnostics.
pub fn literal_type_name(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Datetime(_) => "datetime",
        toml::Value::Array(_) => "list",
        toml::Value::Table(_) => "mapping",
    }
}

fn is_type_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
