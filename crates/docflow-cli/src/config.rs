//! Configuration file and presets support.

use docflow::{ChainSpec, DEFAULT_ENCRYPTION_KEY};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default CLI options.
    pub defaults: Defaults,
    /// User-defined processing chains, by name.
    pub presets: IndexMap<String, ChainSpec>,
}

/// Default CLI options.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Enable verbose output by default.
    pub verbose: bool,
    /// Enable quiet output by default.
    pub quiet: bool,
    /// Where batch outputs go when `--output-dir` is not given.
    pub output_dir: Option<PathBuf>,
    /// Target format when `--to` is not given.
    pub format: Option<String>,
}

impl Config {
    /// Load config from the default location (~/.config/docflow/config.toml).
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path().as_deref())
    }

    /// Load config from a specific path.
    ///
    /// A missing file yields defaults; an unreadable or invalid one warns
    /// and yields defaults.
    pub fn load_from_path(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docflow").join("config.toml"))
    }

    /// Get a preset by name. User-defined presets shadow built-in ones.
    pub fn get_preset(&self, name: &str) -> Option<ChainSpec> {
        if let Some(preset) = self.presets.get(name) {
            return Some(preset.clone());
        }

        builtin_preset(name)
    }
}

/// Built-in presets.
fn builtin_preset(name: &str) -> Option<ChainSpec> {
    match name {
        "confidential" => Some(
            ChainSpec::new()
                .watermark("CONFIDENTIAL")
                .compression(7)
                .encryption(DEFAULT_ENCRYPTION_KEY),
        ),
        "draft" => Some(ChainSpec::new().watermark("DRAFT")),
        "compact" => Some(ChainSpec::new().compression(9)),
        "secure" => Some(ChainSpec::new().encryption(DEFAULT_ENCRYPTION_KEY)),
        _ => None,
    }
}

/// Built-in preset names with descriptions.
pub fn list_presets() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "confidential",
            "Watermark CONFIDENTIAL, compression 7, encryption",
        ),
        ("draft", "Watermark DRAFT"),
        ("compact", "Compression 9"),
        ("secure", "Encryption with the default key"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow::StepSpec;

    #[test]
    fn test_builtin_presets_resolve() {
        let config = Config::default();
        for (name, _) in list_presets() {
            assert!(config.get_preset(name).is_some(), "{name}");
        }
        assert!(config.get_preset("nope").is_none());

        let chain = config.get_preset("confidential").unwrap().build();
        assert_eq!(
            chain.step_names(),
            ["base", "watermark", "compression", "encryption"]
        );
    }

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
[defaults]
verbose = true
format = "PDF"
output_dir = "out"

[[presets.stamp.steps]]
step = "watermark"
text = "INTERNAL"

[[presets.draft.steps]]
step = "compression"
level = 2
"#,
        )
        .unwrap();

        assert!(config.defaults.verbose);
        assert!(!config.defaults.quiet);
        assert_eq!(config.defaults.format.as_deref(), Some("PDF"));
        assert_eq!(config.defaults.output_dir, Some(PathBuf::from("out")));

        assert_eq!(
            config.get_preset("stamp").unwrap().steps,
            vec![StepSpec::Watermark {
                text: "INTERNAL".into()
            }]
        );
        // User preset shadows the built-in one
        assert_eq!(
            config.get_preset("draft").unwrap().steps,
            vec![StepSpec::Compression { level: 2 }]
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(Some(dir.path().join("config.toml").as_path()));
        assert!(config.presets.is_empty());
        assert!(config.defaults.format.is_none());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "defaults = [").unwrap();

        let config = Config::load_from_path(Some(path.as_path()));
        assert!(!config.defaults.verbose);
    }
}
