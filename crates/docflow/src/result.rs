use docflow_core::Document;
use std::fmt;
use std::time::Duration;

/// Outcome of one orchestrated operation.
///
/// A successful result always carries a document; a failed one never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    document: Option<Document>,
    success: bool,
    message: String,
    elapsed: Duration,
}

impl ConversionResult {
    pub fn succeeded(document: Document, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            document: Some(document),
            success: true,
            message: message.into(),
            elapsed,
        }
    }

    pub fn failed(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            document: None,
            success: false,
            message: message.into(),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Wall-clock time spent on the operation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(
            f,
            "[{}] {} ({}ms)",
            status,
            self.message,
            self.elapsed.as_millis()
        )?;
        if let Some(doc) = &self.document {
            write!(f, ": {}", doc)?;
        }
        Ok(())
    }
}
