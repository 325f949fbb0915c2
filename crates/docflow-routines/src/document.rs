//! Document-format routines.

use docflow_core::{ConvertError, Document, FormatPattern, Routine, RoutineDecl, RoutineSet};
use tracing::info;

/// Placeholder transform shared by the format routines.
pub(crate) fn describe_conversion(from: &str, to: &str, input: &[u8]) -> Vec<u8> {
    format!(
        "Converted from {} to {} (Original size: {} bytes)",
        from,
        to,
        input.len()
    )
    .into_bytes()
}

/// PDF -> DOCX
pub struct PdfToDocx {
    decl: RoutineDecl,
}

impl PdfToDocx {
    pub fn new() -> Self {
        let decl = RoutineDecl::new(
            "document.pdf-to-docx",
            "PDF to DOCX Conversion Strategy",
            FormatPattern::eq("PDF"),
            "DOCX",
        );
        Self { decl }
    }
}

impl Default for PdfToDocx {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for PdfToDocx {
    fn decl(&self) -> &RoutineDecl {
        &self.decl
    }

    fn convert(&self, input: Document) -> Result<Document, ConvertError> {
        self.decl.check_input(&input)?;
        info!("converting {} to DOCX", input.name());

        let content = describe_conversion("PDF", "DOCX", input.content());
        Ok(self.decl.output_document(&input, content))
    }
}

/// DOCX -> TXT
pub struct DocxToTxt {
    decl: RoutineDecl,
}

impl DocxToTxt {
    pub fn new() -> Self {
        let decl = RoutineDecl::new(
            "document.docx-to-txt",
            "DOCX to TXT Conversion Strategy",
            FormatPattern::eq("DOCX"),
            "TXT",
        );
        Self { decl }
    }
}

impl Default for DocxToTxt {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for DocxToTxt {
    fn decl(&self) -> &RoutineDecl {
        &self.decl
    }

    fn convert(&self, input: Document) -> Result<Document, ConvertError> {
        self.decl.check_input(&input)?;
        info!("converting {} to TXT", input.name());

        let content = describe_conversion("DOCX", "TXT", input.content());
        Ok(self.decl.output_document(&input, content))
    }
}

/// The document-format selector: PDF -> DOCX and DOCX -> TXT.
pub fn document_selector() -> RoutineSet {
    RoutineSet::new("Document")
        .with(PdfToDocx::new())
        .with(DocxToTxt::new())
}
