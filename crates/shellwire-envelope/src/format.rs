use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// How the engine serialises a command's success output.
///
/// Chosen per call. Only [`OutputFormat::Json`] is JSON-decoded on the way
/// back; every other format is returned as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON text, decoded into a value.
    #[default]
    Json,
    /// Comma-separated values.
    Csv,
    /// An HTML table.
    Html,
    /// The engine's formatted text rendering.
    Text,
    /// No conversion on either side; success is returned verbatim.
    Raw,
}

impl OutputFormat {
    pub const ALL: [Self; 5] = [Self::Json, Self::Csv, Self::Html, Self::Text, Self::Raw];

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Text => "text",
            Self::Raw => "raw",
        }
    }

    /// Whether the success category is JSON-decoded for this format.
    pub fn decodes_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "html" => Ok(Self::Html),
            "text" | "string" => Ok(Self::Text),
            "raw" | "none" => Ok(Self::Raw),
            _ => Err(ParseError::UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for format in OutputFormat::ALL {
            assert_eq!(format.name().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn aliases_and_case() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("none".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert_eq!("string".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    }

    #[test]
    fn unknown_format_rejected() {
        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(name) if name == "yaml"));
    }

    #[test]
    fn only_json_is_decoded() {
        assert!(OutputFormat::Json.decodes_json());
        assert!(OutputFormat::default().decodes_json());
        for format in [OutputFormat::Csv, OutputFormat::Html, OutputFormat::Text, OutputFormat::Raw] {
            assert!(!format.decodes_json());
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&OutputFormat::Csv).unwrap(), "\"csv\"");
        let parsed: OutputFormat = serde_json::from_str("\"html\"").unwrap();
        assert_eq!(parsed, OutputFormat::Html);
    }
}
