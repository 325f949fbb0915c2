//! Serializable processing chains.
//!
//! A chain spec lists processing steps in application order and can be read
//! from JSON, YAML or TOML:
//!
//! ```toml
//! [[steps]]
//! step = "watermark"
//! text = "DRAFT"
//!
//! [[steps]]
//! step = "compression"
//! level = 7
//! ```

use crate::steps::{
    CompressionStep, DEFAULT_COMPRESSION_LEVEL, DEFAULT_ENCRYPTION_KEY, DEFAULT_WATERMARK_TEXT,
    EncryptionStep, ProcessingChain, WatermarkStep,
};
use serde::{Deserialize, Serialize};

/// A processing chain definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChainSpec {
    /// Steps after the base step, first listed runs first.
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// One step in a chain spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepSpec {
    Watermark {
        #[serde(default = "default_watermark_text")]
        text: String,
    },
    Compression {
        #[serde(default = "default_compression_level")]
        level: u8,
    },
    Encryption {
        #[serde(default = "default_encryption_key")]
        key: String,
    },
}

fn default_watermark_text() -> String {
    DEFAULT_WATERMARK_TEXT.to_string()
}

fn default_compression_level() -> u8 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_encryption_key() -> String {
    DEFAULT_ENCRYPTION_KEY.to_string()
}

impl ChainSpec {
    /// Create an empty spec (base step only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a watermark step.
    pub fn watermark(mut self, text: impl Into<String>) -> Self {
        self.steps.push(StepSpec::Watermark { text: text.into() });
        self
    }

    /// Add a compression step.
    pub fn compression(mut self, level: u8) -> Self {
        self.steps.push(StepSpec::Compression { level });
        self
    }

    /// Add an encryption step.
    pub fn encryption(mut self, key: impl Into<String>) -> Self {
        self.steps.push(StepSpec::Encryption { key: key.into() });
        self
    }

    /// Append another spec's steps after this one's.
    pub fn extend(mut self, other: ChainSpec) -> Self {
        self.steps.extend(other.steps);
        self
    }

    /// Check if the spec adds nothing beyond the base step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Build the executable chain.
    pub fn build(&self) -> ProcessingChain {
        self.steps
            .iter()
            .fold(ProcessingChain::new(), |chain, step| match step {
                StepSpec::Watermark { text } => chain.wrap(WatermarkStep::new(text.clone())),
                StepSpec::Compression { level } => chain.wrap(CompressionStep::new(*level)),
                StepSpec::Encryption { key } => chain.wrap(EncryptionStep::new(key)),
            })
    }

    /// Parse a spec from bytes, detecting the format from `path`.
    ///
    /// Defaults to YAML when the path is absent or has no known extension.
    pub fn from_bytes(data: &[u8], path: Option<&str>) -> Result<Self, ChainError> {
        let format = path
            .and_then(detect_format)
            .unwrap_or_else(|| "yaml".to_string());

        Self::from_bytes_format(data, &format)
    }

    /// Parse a spec from bytes with an explicit format.
    pub fn from_bytes_format(data: &[u8], format: &str) -> Result<Self, ChainError> {
        match format {
            "json" => serde_json::from_slice(data).map_err(|e| ChainError::Parse(e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_slice(data).map_err(|e| ChainError::Parse(e.to_string()))
            }
            "toml" => {
                let s = std::str::from_utf8(data)
                    .map_err(|e| ChainError::Parse(format!("Invalid UTF-8: {}", e)))?;
                toml::from_str(s).map_err(|e| ChainError::Parse(e.to_string()))
            }
            _ => Err(ChainError::UnsupportedFormat(format.to_string())),
        }
    }

    /// Serialize the spec.
    pub fn to_bytes(&self, format: &str) -> Result<Vec<u8>, ChainError> {
        match format {
            "json" => {
                serde_json::to_vec_pretty(self).map_err(|e| ChainError::Serialize(e.to_string()))
            }
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map(String::into_bytes)
                .map_err(|e| ChainError::Serialize(e.to_string())),
            "toml" => toml::to_string_pretty(self)
                .map(String::into_bytes)
                .map_err(|e| ChainError::Serialize(e.to_string())),
            _ => Err(ChainError::UnsupportedFormat(format.to_string())),
        }
    }
}

/// Errors related to chain spec parsing.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("failed to parse chain: {0}")]
    Parse(String),

    #[error("failed to serialize chain: {0}")]
    Serialize(String),

    #[error("unsupported chain format: {0}")]
    UnsupportedFormat(String),
}

fn detect_format(path: &str) -> Option<String> {
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "json" => Some("json".into()),
        "yaml" | "yml" => Some("yaml".into()),
        "toml" => Some("toml".into()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_builder_and_build() {
        let spec = ChainSpec::new()
            .watermark("DRAFT")
            .compression(7)
            .encryption("k");

        let chain = spec.build();
        assert_eq!(
            chain.step_names(),
            ["base", "watermark", "compression", "encryption"]
        );
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let toml = r#"
[[steps]]
step = "watermark"

[[steps]]
step = "compression"
level = 3
"#;
        let spec = ChainSpec::from_bytes(toml.as_bytes(), Some("chain.toml")).unwrap();
        assert_eq!(
            spec.steps,
            vec![
                StepSpec::Watermark {
                    text: "CONFIDENTIAL".into()
                },
                StepSpec::Compression { level: 3 },
            ]
        );
    }

    #[test]
    fn test_parse_yaml_default_format() {
        let yaml = "steps:\n  - step: encryption\n  - step: watermark\n    text: SECRET\n";
        let spec = ChainSpec::from_bytes(yaml.as_bytes(), None).unwrap();

        assert_eq!(spec.steps.len(), 2);
        assert_eq!(
            spec.steps[0],
            StepSpec::Encryption {
                key: "DEFAULT_KEY_12345".into()
            }
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let spec = ChainSpec::new().watermark("W").compression(2);
        let bytes = spec.to_bytes("json").unwrap();
        let parsed = ChainSpec::from_bytes(&bytes, Some("x.json")).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_unknown_step_rejected() {
        let json = r#"{"steps": [{"step": "rot13"}]}"#;
        let err = ChainSpec::from_bytes_format(json.as_bytes(), "json").unwrap_err();
        assert!(matches!(err, ChainError::Parse(_)));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            ChainSpec::from_bytes_format(b"", "ini"),
            Err(ChainError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_built_chain_processes() {
        let chain = ChainSpec::new().compression(5).build();
        let out = chain
            .process(Document::new(vec![1u8; 10], "PDF"))
            .unwrap();
        assert_eq!(out.size(), 5);
        assert_eq!(out.meta("base_processing"), Some("completed"));
    }
}
