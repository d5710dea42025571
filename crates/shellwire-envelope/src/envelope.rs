use serde::Serialize;
use serde_json::{Map, Value};

use crate::category::{Category, CategoryValue, Decoding};
use crate::error::{ParseError, Result};
use crate::format::OutputFormat;

/// The decoded result of one command: all six categories, empty or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub success: CategoryValue,
    pub error: CategoryValue,
    pub warning: CategoryValue,
    pub verbose: CategoryValue,
    pub debug: CategoryValue,
    pub info: CategoryValue,
    /// Output format declared by the engine, if it reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ResultEnvelope {
    /// An envelope with every category empty.
    pub fn empty() -> Self {
        Self {
            success: CategoryValue::empty(),
            error: CategoryValue::empty(),
            warning: CategoryValue::empty(),
            verbose: CategoryValue::Raw(String::new()),
            debug: CategoryValue::Raw(String::new()),
            info: CategoryValue::empty(),
            format: None,
        }
    }

    /// Parse a frame payload of the form `{"result": {...}}`.
    ///
    /// `requested` is the format the command was submitted with; it decides
    /// how `success` is decoded. The declared `format` field is reported back
    /// but does not override it.
    pub fn parse(payload: &[u8], requested: OutputFormat) -> Result<Self> {
        let root: Value = serde_json::from_slice(payload)?;
        let result = root
            .as_object()
            .ok_or(ParseError::UnexpectedType {
                field: "(root)",
                expected: "an object",
            })?
            .get("result")
            .ok_or(ParseError::MissingField("result"))?
            .as_object()
            .ok_or(ParseError::UnexpectedType {
                field: "result",
                expected: "an object",
            })?;

        let format = match result.get("format") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(_) => {
                return Err(ParseError::UnexpectedType {
                    field: "format",
                    expected: "a string",
                })
            }
        };

        Ok(Self {
            success: decode_field(result, Category::Success, requested)?,
            error: decode_field(result, Category::Error, requested)?,
            warning: decode_field(result, Category::Warning, requested)?,
            verbose: decode_field(result, Category::Verbose, requested)?,
            debug: decode_field(result, Category::Debug, requested)?,
            info: decode_field(result, Category::Info, requested)?,
            format,
        })
    }

    /// Value of one category.
    pub fn get(&self, category: Category) -> &CategoryValue {
        match category {
            Category::Success => &self.success,
            Category::Error => &self.error,
            Category::Warning => &self.warning,
            Category::Verbose => &self.verbose,
            Category::Debug => &self.debug,
            Category::Info => &self.info,
        }
    }

    /// All categories in envelope order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryValue)> {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    /// Categories that carry output.
    pub fn non_empty(&self) -> impl Iterator<Item = (Category, &CategoryValue)> {
        self.iter().filter(|(_, value)| !value.is_empty())
    }

    /// Whether the engine reported any error records.
    pub fn has_errors(&self) -> bool {
        !self.error.is_empty()
    }

    /// Render as a frame payload, the inverse of [`ResultEnvelope::parse`].
    ///
    /// JSON categories are pre-serialised to strings and text categories are
    /// written as plain strings, matching what an engine-side encoder prints.
    /// Text that itself starts with a double quote is written as a JSON string
    /// literal so parsing unquotes it back to the original.
    pub fn to_payload(&self, format: OutputFormat) -> String {
        let mut result = Map::new();
        for (category, value) in self.iter() {
            let field = match (category.decoding(format), value) {
                (Decoding::Json, value) => value.to_json().to_string(),
                (Decoding::Text, CategoryValue::Raw(text)) if text.starts_with('"') => {
                    Value::String(text.clone()).to_string()
                }
                (_, CategoryValue::Raw(text)) => text.clone(),
                (_, CategoryValue::Decoded(value)) => value.to_string(),
            };
            result.insert(category.name().to_string(), Value::String(field));
        }
        result.insert(
            "format".to_string(),
            Value::String(
                self.format
                    .clone()
                    .unwrap_or_else(|| format.name().to_string()),
            ),
        );

        let mut root = Map::new();
        root.insert("result".to_string(), Value::Object(result));
        Value::Object(root).to_string()
    }
}

impl Default for ResultEnvelope {
    fn default() -> Self {
        Self::empty()
    }
}

fn decode_field(
    result: &Map<String, Value>,
    category: Category,
    requested: OutputFormat,
) -> Result<CategoryValue> {
    let raw = result
        .get(category.name())
        .ok_or(ParseError::MissingField(category.name()))?;
    category.decode(raw, requested)
}
