use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{ParseError, Result};
use crate::format::OutputFormat;

/// One of the six output categories an engine reports per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Success,
    Error,
    Warning,
    Verbose,
    Debug,
    Info,
}

/// How a category's raw envelope field is turned into a [`CategoryValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    /// JSON-decode the field.
    Json,
    /// Plain text; a JSON string literal is unquoted.
    Text,
    /// Plain text, untouched.
    Verbatim,
}

impl Category {
    /// All categories, in envelope order.
    pub const ALL: [Self; 6] = [
        Self::Success,
        Self::Error,
        Self::Warning,
        Self::Verbose,
        Self::Debug,
        Self::Info,
    ];

    /// Envelope field and channel name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Info => "info",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Decoding rule for this category under a requested output format.
    ///
    /// `error`, `warning` and `info` are always JSON; `verbose` and `debug`
    /// are always text; `success` follows the requested format.
    pub fn decoding(self, requested: OutputFormat) -> Decoding {
        match self {
            Self::Success if requested.decodes_json() => Decoding::Json,
            Self::Success => Decoding::Verbatim,
            Self::Error | Self::Warning | Self::Info => Decoding::Json,
            Self::Verbose | Self::Debug => Decoding::Text,
        }
    }

    /// Decode one raw envelope field for this category.
    pub fn decode(self, raw: &Value, requested: OutputFormat) -> Result<CategoryValue> {
        match self.decoding(requested) {
            Decoding::Json => match raw {
                Value::String(text) if text.trim().is_empty() => {
                    Ok(CategoryValue::Decoded(Value::Array(Vec::new())))
                }
                Value::String(text) => serde_json::from_str(text)
                    .map(CategoryValue::Decoded)
                    .map_err(|source| ParseError::InvalidCategory {
                        category: self,
                        source,
                    }),
                other => Ok(CategoryValue::Decoded(other.clone())),
            },
            Decoding::Text => Ok(CategoryValue::Raw(match raw {
                Value::String(text) => unquote(text),
                Value::Null => String::new(),
                other => other.to_string(),
            })),
            Decoding::Verbatim => Ok(CategoryValue::Raw(match raw {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })),
        }
    }
}

fn unquote(text: &str) -> String {
    if text.starts_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(text) {
            return inner;
        }
    }
    text.to_string()
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category `{s}`"))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A decoded category: raw text or a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryValue {
    Raw(String),
    Decoded(Value),
}

impl CategoryValue {
    /// An empty JSON array, the "nothing reported" value.
    pub fn empty() -> Self {
        Self::Decoded(Value::Array(Vec::new()))
    }

    /// True for empty text, `null`, and empty arrays, objects or strings.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(text) => text.is_empty(),
            Self::Decoded(Value::Null) => true,
            Self::Decoded(Value::String(text)) => text.is_empty(),
            Self::Decoded(Value::Array(items)) => items.is_empty(),
            Self::Decoded(Value::Object(map)) => map.is_empty(),
            Self::Decoded(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Raw(text) => Some(text),
            Self::Decoded(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Raw(_) => None,
            Self::Decoded(value) => Some(value),
        }
    }

    /// The value as JSON: decoded values as-is, text as a JSON string.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Raw(text) => Value::String(text.clone()),
            Self::Decoded(value) => value.clone(),
        }
    }
}

impl Serialize for CategoryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Raw(text) => serializer.serialize_str(text),
            Self::Decoded(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fixed_rules_per_category() {
        for format in OutputFormat::ALL {
            assert_eq!(Category::Error.decoding(format), Decoding::Json);
            assert_eq!(Category::Warning.decoding(format), Decoding::Json);
            assert_eq!(Category::Info.decoding(format), Decoding::Json);
            assert_eq!(Category::Verbose.decoding(format), Decoding::Text);
            assert_eq!(Category::Debug.decoding(format), Decoding::Text);
        }
        assert_eq!(Category::Success.decoding(OutputFormat::Json), Decoding::Json);
        assert_eq!(Category::Success.decoding(OutputFormat::Csv), Decoding::Verbatim);
        assert_eq!(Category::Success.decoding(OutputFormat::Raw), Decoding::Verbatim);
    }

    #[test]
    fn json_category_decodes_pre_serialized_string() {
        let value = Category::Error
            .decode(&json!(r#"["Access denied"]"#), OutputFormat::Json)
            .unwrap();
        assert_eq!(value, CategoryValue::Decoded(json!(["Access denied"])));
    }

    #[test]
    fn json_category_accepts_inline_value() {
        let value = Category::Info
            .decode(&json!([{"MessageData": "hi"}]), OutputFormat::Json)
            .unwrap();
        assert_eq!(value, CategoryValue::Decoded(json!([{"MessageData": "hi"}])));
    }

    #[test]
    fn blank_json_category_is_empty_array() {
        let value = Category::Warning.decode(&json!("  "), OutputFormat::Json).unwrap();
        assert_eq!(value, CategoryValue::empty());
        assert!(value.is_empty());
    }

    #[test]
    fn invalid_json_category_is_error() {
        let err = Category::Error
            .decode(&json!("[not json"), OutputFormat::Json)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidCategory {
                category: Category::Error,
                ..
            }
        ));
    }

    #[test]
    fn text_category_unquotes_json_string_literal() {
        let quoted = Category::Verbose.decode(&json!("\"\""), OutputFormat::Json).unwrap();
        assert_eq!(quoted, CategoryValue::Raw(String::new()));
        assert!(quoted.is_empty());

        let plain = Category::Debug
            .decode(&json!("step 1\nstep 2"), OutputFormat::Json)
            .unwrap();
        assert_eq!(plain, CategoryValue::Raw("step 1\nstep 2".to_string()));
    }

    #[test]
    fn text_category_never_json_decodes_arrays() {
        let value = Category::Verbose.decode(&json!("[1,2]"), OutputFormat::Json).unwrap();
        assert_eq!(value, CategoryValue::Raw("[1,2]".to_string()));
    }

    #[test]
    fn success_follows_requested_format() {
        let raw = json!("[1,2]");
        assert_eq!(
            Category::Success.decode(&raw, OutputFormat::Json).unwrap(),
            CategoryValue::Decoded(json!([1, 2]))
        );
        assert_eq!(
            Category::Success.decode(&raw, OutputFormat::Raw).unwrap(),
            CategoryValue::Raw("[1,2]".to_string())
        );
        // Verbatim keeps quotes that text categories would strip.
        assert_eq!(
            Category::Success
                .decode(&json!("\"Name\""), OutputFormat::Csv)
                .unwrap(),
            CategoryValue::Raw("\"Name\"".to_string())
        );
    }

    #[test]
    fn emptiness() {
        assert!(CategoryValue::Raw(String::new()).is_empty());
        assert!(CategoryValue::Decoded(Value::Null).is_empty());
        assert!(CategoryValue::Decoded(json!({})).is_empty());
        assert!(CategoryValue::Decoded(json!("")).is_empty());
        assert!(!CategoryValue::Decoded(json!(0)).is_empty());
        assert!(!CategoryValue::Decoded(json!(false)).is_empty());
        assert!(!CategoryValue::Raw(" ".to_string()).is_empty());
    }

    #[test]
    fn category_names_parse() {
        for category in Category::ALL {
            assert_eq!(category.name().parse::<Category>().unwrap(), category);
        }
        assert_eq!("WARNING".parse::<Category>().unwrap(), Category::Warning);
        assert!("trace".parse::<Category>().is_err());
    }

    #[test]
    fn values_serialize_untagged() {
        let raw = serde_json::to_value(CategoryValue::Raw("text".to_string())).unwrap();
        assert_eq!(raw, json!("text"));
        let decoded = serde_json::to_value(CategoryValue::Decoded(json!([1]))).unwrap();
        assert_eq!(decoded, json!([1]));
    }
}
