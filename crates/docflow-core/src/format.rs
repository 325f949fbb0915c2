//! Format patterns for capability matching.

use serde::{Deserialize, Serialize};

/// A pattern over format tags. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatPattern {
    /// Matches every format.
    Any,
    /// Matches one format.
    Eq(String),
    /// Matches any of these formats.
    OneOf(Vec<String>),
}

impl FormatPattern {
    /// Shorthand for an exact match.
    pub fn eq(format: impl Into<String>) -> Self {
        FormatPattern::Eq(format.into())
    }

    /// Shorthand for a set of formats.
    pub fn one_of<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FormatPattern::OneOf(formats.into_iter().map(Into::into).collect())
    }

    /// Check if a format tag matches this pattern.
    pub fn matches(&self, format: &str) -> bool {
        match self {
            FormatPattern::Any => true,
            FormatPattern::Eq(expected) => expected.eq_ignore_ascii_case(format),
            FormatPattern::OneOf(formats) => formats.iter().any(|f| f.eq_ignore_ascii_case(format)),
        }
    }

    /// The formats named by this pattern (empty for `Any`).
    pub fn formats(&self) -> Vec<&str> {
        match self {
            FormatPattern::Any => Vec::new(),
            FormatPattern::Eq(f) => vec![f.as_str()],
            FormatPattern::OneOf(formats) => formats.iter().map(String::as_str).collect(),
        }
    }
}

impl std::fmt::Display for FormatPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatPattern::Any => f.write_str("*"),
            FormatPattern::Eq(format) => f.write_str(format),
            FormatPattern::OneOf(formats) => f.write_str(&formats.join("|")),
        }
    }
}
