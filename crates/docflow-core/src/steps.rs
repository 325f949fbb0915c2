//! Post-conversion processing steps.
//!
//! A [`ProcessingChain`] starts from the [`BaseStep`] and is grown by
//! wrapping: each wrapper runs after everything it wraps. Building
//! `ProcessingChain::new().wrap(a).wrap(b)` is the decorator stack
//! `b(a(base))` and applies `base`, then `a`, then `b`.
//!
//! The chain is stored flat, in application order.

use crate::document::Document;
use crate::error::ConvertError;
use tracing::debug;

/// Default text for [`WatermarkStep`].
pub const DEFAULT_WATERMARK_TEXT: &str = "CONFIDENTIAL";

/// Default level for [`CompressionStep`].
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

/// Default key for [`EncryptionStep`].
pub const DEFAULT_ENCRYPTION_KEY: &str = "DEFAULT_KEY_12345";

/// A transform applied to a converted document.
pub trait ProcessingStep: Send + Sync {
    /// Step name, used in logs and errors.
    fn name(&self) -> &str;

    /// Apply this step's own effect.
    fn apply(&self, document: &mut Document) -> Result<(), ConvertError>;
}

/// Terminal step every chain starts from.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseStep;

impl ProcessingStep for BaseStep {
    fn name(&self) -> &str {
        "base"
    }

    fn apply(&self, document: &mut Document) -> Result<(), ConvertError> {
        debug!("base processing {}", document.name());
        document.add_metadata("base_processing", "completed");
        Ok(())
    }
}

/// Appends a textual watermark block to the content.
#[derive(Debug, Clone)]
pub struct WatermarkStep {
    text: String,
}

impl WatermarkStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The marker block appended to content.
    pub fn marker(&self) -> String {
        format!("\n[WATERMARK: {}]\n", self.text)
    }
}

impl Default for WatermarkStep {
    fn default() -> Self {
        Self::new(DEFAULT_WATERMARK_TEXT)
    }
}

impl ProcessingStep for WatermarkStep {
    fn name(&self) -> &str {
        "watermark"
    }

    fn apply(&self, document: &mut Document) -> Result<(), ConvertError> {
        debug!("adding watermark '{}'", self.text);
        let mut content = document.take_content();
        content.extend_from_slice(self.marker().as_bytes());
        document.set_content(content);

        document.add_metadata("watermark", "enabled");
        document.add_metadata("watermark_text", self.text.clone());
        Ok(())
    }
}

/// Simulated lossy size reduction.
///
/// Keeps `floor(len * (10 - level) / 10)` bytes, never fewer than one.
/// Higher levels never keep more bytes than lower ones.
#[derive(Debug, Clone, Copy)]
pub struct CompressionStep {
    level: u8,
}

impl CompressionStep {
    /// Create a step; `level` is clamped to `1..=9`.
    pub fn new(level: u8) -> Self {
        Self {
            level: level.clamp(1, 9),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Output length for an input of `len` bytes.
    pub fn compressed_len(&self, len: usize) -> usize {
        (len * (10 - self.level as usize) / 10).max(1)
    }

    /// Shrink `content` to [`CompressionStep::compressed_len`] bytes.
    ///
    /// Empty input yields a single zero byte.
    pub fn compress(&self, content: &[u8]) -> Vec<u8> {
        let new_len = self.compressed_len(content.len());
        let mut out = content[..new_len.min(content.len())].to_vec();
        out.resize(new_len, 0);
        out
    }
}

impl Default for CompressionStep {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl ProcessingStep for CompressionStep {
    fn name(&self) -> &str {
        "compression"
    }

    fn apply(&self, document: &mut Document) -> Result<(), ConvertError> {
        let original_size = document.size();
        let compressed = self.compress(document.content());
        let compressed_size = compressed.len();
        document.set_content(compressed);

        debug!(
            level = self.level,
            "compressed {} -> {} bytes", original_size, compressed_size
        );

        document.add_metadata("compression", "enabled");
        document.add_metadata("compression_level", self.level.to_string());
        document.add_metadata("original_size", original_size.to_string());
        document.add_metadata("compressed_size", compressed_size.to_string());
        Ok(())
    }
}

/// Byte-wise XOR against a repeating key. Not a real cipher.
///
/// Applying the step twice with the same key restores the input. An empty key
/// leaves content unchanged.
#[derive(Debug, Clone)]
pub struct EncryptionStep {
    key: Vec<u8>,
}

impl EncryptionStep {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    pub fn encrypt(&self, content: &[u8]) -> Vec<u8> {
        if self.key.is_empty() {
            return content.to_vec();
        }
        content
            .iter()
            .zip(self.key.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect()
    }

    pub fn decrypt(&self, content: &[u8]) -> Vec<u8> {
        self.encrypt(content)
    }
}

impl Default for EncryptionStep {
    fn default() -> Self {
        Self::new(DEFAULT_ENCRYPTION_KEY)
    }
}

impl ProcessingStep for EncryptionStep {
    fn name(&self) -> &str {
        "encryption"
    }

    fn apply(&self, document: &mut Document) -> Result<(), ConvertError> {
        debug!("encrypting {} bytes", document.size());
        let encrypted = self.encrypt(document.content());
        document.set_content(encrypted);

        document.add_metadata("encryption", "enabled");
        document.add_metadata("encryption_algorithm", "XOR stream (simulated)");
        Ok(())
    }
}

/// An ordered chain of processing steps.
pub struct ProcessingChain {
    steps: Vec<Box<dyn ProcessingStep>>,
}

impl Default for ProcessingChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingChain {
    /// A chain holding only the base step.
    pub fn new() -> Self {
        Self {
            steps: vec![Box::new(BaseStep)],
        }
    }

    /// Wrap the chain in another step; it runs after everything already in it.
    pub fn wrap(mut self, step: impl ProcessingStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Boxed variant of [`ProcessingChain::wrap`].
    pub fn wrap_boxed(mut self, step: Box<dyn ProcessingStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run every step, innermost first.
    pub fn process(&self, mut document: Document) -> Result<Document, ConvertError> {
        for step in &self.steps {
            step.apply(&mut document)?;
        }
        Ok(document)
    }

    /// Step names in application order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Number of steps, base included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: a chain holds at least the base step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for ProcessingChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingChain")
            .field("steps", &self.step_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &[u8]) -> Document {
        Document::named(content.to_vec(), "DOCX", "a.docx")
    }

    #[test]
    fn test_base_step() {
        let out = ProcessingChain::new().process(doc(b"abc")).unwrap();
        assert_eq!(out.content(), b"abc");
        assert_eq!(out.meta("base_processing"), Some("completed"));
    }

    #[test]
    fn test_watermark() {
        let out = ProcessingChain::new()
            .wrap(WatermarkStep::default())
            .process(doc(b"body"))
            .unwrap();

        assert_eq!(out.content(), b"body\n[WATERMARK: CONFIDENTIAL]\n");
        assert_eq!(out.meta("watermark"), Some("enabled"));
        assert_eq!(out.meta("watermark_text"), Some("CONFIDENTIAL"));
    }

    #[test]
    fn test_compression_length() {
        // (input length, level, output length)
        let cases = [
            (0usize, 6u8, 1usize),
            (1, 1, 1),
            (10, 1, 9),
            (10, 9, 1),
            (30, 7, 9),
            (30, 9, 3),
            (97, 3, 67),
            (1000, 6, 400),
            (1000, 9, 100),
        ];

        for (len, level, expected) in cases {
            let content = vec![7u8; len];
            let out = CompressionStep::new(level).compress(&content);
            assert_eq!(out.len(), expected, "len {len} level {level}");
        }
    }

    #[test]
    fn test_compression_is_monotonic() {
        let content = vec![1u8; 513];
        let lens: Vec<_> = (1..=9)
            .map(|l| CompressionStep::new(l).compress(&content).len())
            .collect();
        assert!(lens.windows(2).all(|w| w[1] <= w[0]), "{lens:?}");
    }

    #[test]
    fn test_compression_clamps_level() {
        assert_eq!(CompressionStep::new(0).level(), 1);
        assert_eq!(CompressionStep::new(42).level(), 9);
        assert_eq!(CompressionStep::default().level(), 6);
    }

    #[test]
    fn test_compression_metadata() {
        let out = ProcessingChain::new()
            .wrap(CompressionStep::new(7))
            .process(doc(&[0u8; 30]))
            .unwrap();

        assert_eq!(out.size(), 9);
        assert_eq!(out.meta("compression"), Some("enabled"));
        assert_eq!(out.meta("compression_level"), Some("7"));
        assert_eq!(out.meta("original_size"), Some("30"));
        assert_eq!(out.meta("compressed_size"), Some("9"));
    }

    #[test]
    fn test_encryption_roundtrip() {
        let keys: [&[u8]; 4] = [b"k", b"SecureKey123", b"DEFAULT_KEY_12345", b""];
        let inputs: [&[u8]; 3] = [b"", b"hello world", &[0, 255, 128, 1, 2, 3]];

        for key in keys {
            let step = EncryptionStep::new(key);
            for input in inputs {
                assert_eq!(step.decrypt(&step.encrypt(input)), input);
            }
        }
    }

    #[test]
    fn test_encryption_changes_content() {
        let step = EncryptionStep::default();
        let out = ProcessingChain::new()
            .wrap(step.clone())
            .process(doc(b"plain text"))
            .unwrap();

        assert_ne!(out.content(), b"plain text");
        assert_eq!(step.decrypt(out.content()), b"plain text");
        assert_eq!(out.meta("encryption"), Some("enabled"));
        assert!(out.meta("encryption_algorithm").is_some());
    }

    #[test]
    fn test_wrap_order() {
        // watermark(compression(base)): compression shrinks first, then the
        // marker is appended intact
        let watermark = WatermarkStep::new("W");
        let out = ProcessingChain::new()
            .wrap(CompressionStep::new(5))
            .wrap(watermark.clone())
            .process(doc(&[b'x'; 20]))
            .unwrap();

        let mut expected = vec![b'x'; 10];
        expected.extend_from_slice(watermark.marker().as_bytes());
        assert_eq!(out.content(), expected.as_slice());
    }

    #[test]
    fn test_step_names() {
        let chain = ProcessingChain::new()
            .wrap(WatermarkStep::default())
            .wrap(CompressionStep::default())
            .wrap(EncryptionStep::default());

        assert_eq!(
            chain.step_names(),
            ["base", "watermark", "compression", "encryption"]
        );
        assert_eq!(chain.len(), 4);
    }

    struct FailingStep;

    impl ProcessingStep for FailingStep {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _document: &mut Document) -> Result<(), ConvertError> {
            Err(ConvertError::Step {
                step: "failing".into(),
                message: "boom".into(),
            })
        }
    }

    #[test]
    fn test_failing_step_stops_chain() {
        let result = ProcessingChain::new()
            .wrap(FailingStep)
            .wrap(WatermarkStep::default())
            .process(doc(b"x"));

        assert!(matches!(result, Err(ConvertError::Step { .. })));
    }
}
