//! Routine declarations and the conversion trait.

use crate::document::{Document, replace_extension};
use crate::error::ConvertError;
use crate::format::FormatPattern;
use serde::{Deserialize, Serialize};

/// Declaration of a routine's capability.
///
/// Describes which format pairs a routine accepts and what it produces,
/// without containing the conversion logic itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineDecl {
    /// Unique identifier, e.g. `document.pdf-to-docx`.
    pub id: String,
    /// Human-readable name, recorded as `conversion_strategy` metadata.
    pub name: String,
    /// Input formats accepted.
    pub input: FormatPattern,
    /// Requested output formats this routine answers to.
    pub output: FormatPattern,
    /// Format tag of every document the routine produces.
    pub target: String,
    /// Extension given to produced file names.
    pub extension: String,
}

impl RoutineDecl {
    /// Create a declaration producing `target`, answering only to `target`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        input: FormatPattern,
        target: impl Into<String>,
    ) -> Self {
        let target = target.into();
        Self {
            id: id.into(),
            name: name.into(),
            input,
            output: FormatPattern::eq(target.clone()),
            extension: target.to_lowercase(),
            target,
        }
    }

    /// Answer to a wider set of requested output formats.
    pub fn answers_to(mut self, output: FormatPattern) -> Self {
        self.output = output;
        self
    }

    /// Set the extension for produced file names.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Check whether the routine handles `input -> output`.
    pub fn supports(&self, input: &str, output: &str) -> bool {
        self.input.matches(input) && self.output.matches(output)
    }

    /// Reject inputs this routine cannot turn into its target format.
    pub fn check_input(&self, input: &Document) -> Result<(), ConvertError> {
        if self.supports(input.format(), &self.target) {
            Ok(())
        } else {
            Err(ConvertError::RoutineMismatch {
                routine: self.name.clone(),
                format: input.format().to_string(),
            })
        }
    }

    /// Build the output document for `input` around freshly produced content.
    ///
    /// The name gets this routine's extension and the metadata records the
    /// routine name and the original format.
    pub fn output_document(&self, input: &Document, content: Vec<u8>) -> Document {
        Document::named(
            content,
            self.target.clone(),
            replace_extension(input.name(), &self.extension),
        )
        .with_metadata("conversion_strategy", self.name.clone())
        .with_metadata("original_format", input.format())
    }
}

/// Trait for implementing conversion routines.
///
/// A routine turns one document into another. It must fail with
/// [`ConvertError::RoutineMismatch`] when handed an input it does not accept.
pub trait Routine: Send + Sync {
    /// Get the declaration for this routine.
    fn decl(&self) -> &RoutineDecl;

    /// Convert a document.
    fn convert(&self, input: Document) -> Result<Document, ConvertError>;

    /// Human-readable routine name.
    fn name(&self) -> &str {
        &self.decl().name
    }

    /// Check whether this routine handles `input -> output`.
    fn supports(&self, input: &str, output: &str) -> bool {
        self.decl().supports(input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl() -> RoutineDecl {
        RoutineDecl::new(
            "test.pdf-to-docx",
            "Test PDF to DOCX",
            FormatPattern::eq("PDF"),
            "DOCX",
        )
    }

    #[test]
    fn test_supports_is_case_insensitive() {
        let decl = decl();
        assert!(decl.supports("pdf", "docx"));
        assert!(decl.supports("PDF", "DOCX"));
        assert!(!decl.supports("DOCX", "PDF"));
        assert!(!decl.supports("PDF", "TXT"));
    }

    #[test]
    fn test_answers_to_wider_output() {
        let decl = RoutineDecl::new("test.any-to-docx", "Any", FormatPattern::Any, "DOCX")
            .answers_to(FormatPattern::one_of(["DOCX", "DOC"]));

        assert!(decl.supports("TXT", "doc"));
        assert!(decl.supports("PNG", "DOCX"));
        assert!(!decl.supports("PNG", "PDF"));
        assert_eq!(decl.extension, "docx");
    }

    #[test]
    fn test_check_input() {
        let decl = decl();
        assert!(decl.check_input(&Document::new(Vec::new(), "pdf")).is_ok());

        let err = decl
            .check_input(&Document::new(Vec::new(), "PNG"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::RoutineMismatch { .. }));
    }

    #[test]
    fn test_output_document() {
        let input = Document::named(b"abc".to_vec(), "PDF", "report.pdf");
        let out = decl().output_document(&input, b"converted".to_vec());

        assert_eq!(out.format(), "DOCX");
        assert_eq!(out.name(), "report.docx");
        assert_eq!(out.size(), 9);
        assert_eq!(out.meta("conversion_strategy"), Some("Test PDF to DOCX"));
        assert_eq!(out.meta("original_format"), Some("PDF"));
    }

    #[test]
    fn test_output_document_without_extension() {
        let input = Document::named(Vec::new(), "PDF", "report");
        let out = decl().output_document(&input, Vec::new());
        assert_eq!(out.name(), "report.docx");
    }
}
