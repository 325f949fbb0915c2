//! The in-memory document artifact.
//!
//! A document is content bytes plus a format tag, a file name and an ordered
//! string metadata map. The size is always derived from the content, so it
//! cannot drift when a step replaces the bytes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format tag used when a file name carries no usable extension.
pub const UNKNOWN_FORMAT: &str = "UNKNOWN";

/// Ordered string metadata. Keys are unique; inserting an existing key
/// replaces its value in place.
pub type Metadata = IndexMap<String, String>;

/// A document flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    content: Vec<u8>,
    format: String,
    name: String,
    #[serde(default)]
    metadata: Metadata,
}

impl Document {
    /// Create a document named `untitled.<format>`.
    pub fn new(content: impl Into<Vec<u8>>, format: impl Into<String>) -> Self {
        let format = format.into();
        let name = format!("untitled.{}", format.to_lowercase());
        Self::named(content, format, name)
    }

    /// Create a document with an explicit file name.
    pub fn named(
        content: impl Into<Vec<u8>>,
        format: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            format: format.into(),
            name: name.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the content. The size follows automatically.
    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Take the content out, leaving the document empty.
    pub fn take_content(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.content)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn set_format(&mut self, format: impl Into<String>) {
        self.format = format.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Content length in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up one metadata value.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Insert a metadata entry (last write wins).
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`Document::add_metadata`].
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_metadata(key, value);
        self
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} bytes)",
            self.name,
            self.format,
            self.content.len()
        )
    }
}

/// Derive a format tag from a file name: the uppercased text after the last
/// `.`, or [`UNKNOWN_FORMAT`] when there is none.
///
/// A leading dot (`.profile`) or a trailing dot (`notes.`) does not count as
/// an extension.
pub fn format_from_name(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => name[idx + 1..].to_uppercase(),
        _ => UNKNOWN_FORMAT.to_string(),
    }
}

/// Replace the extension of `name` with `extension`, or append it when the
/// name has none.
pub fn replace_extension(name: &str, extension: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{}.{}", stem, extension)
}
