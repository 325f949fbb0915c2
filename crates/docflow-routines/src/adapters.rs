//! Library adapters.
//!
//! Adapters stand in for external conversion libraries. They accept any input
//! format and force the output to one target, which makes them suitable as
//! fallbacks behind the domain selectors.

use docflow_core::{ConvertError, Document, FormatPattern, Routine, RoutineDecl};
use std::sync::Arc;
use tracing::info;

/// Default library label of [`PdfAdapter`].
pub const PDF_LIBRARY: &str = "iText 7.x";

/// Default library label of [`DocxAdapter`].
pub const DOCX_LIBRARY: &str = "Apache POI 5.x";

fn adapter_content(target: &str, library: &str, input: &Document) -> Vec<u8> {
    format!(
        "{} created by {} adapter\nOriginal format: {}\nOriginal size: {} bytes",
        target,
        library,
        input.format(),
        input.size()
    )
    .into_bytes()
}

/// Shared body of both adapters.
fn adapt(decl: &RoutineDecl, library: &str, input: Document) -> Result<Document, ConvertError> {
    decl.check_input(&input)?;
    info!(library, "adapting {} to {}", input.name(), decl.target);

    let content = adapter_content(&decl.target, library, &input);
    Ok(decl
        .output_document(&input, content)
        .with_metadata("library", library))
}

/// Any format -> PDF.
pub struct PdfAdapter {
    decl: RoutineDecl,
    library: String,
}

impl PdfAdapter {
    pub fn new() -> Self {
        let decl = RoutineDecl::new(
            "adapter.pdf",
            "iText Library Adapter",
            FormatPattern::Any,
            "PDF",
        );
        Self {
            decl,
            library: PDF_LIBRARY.to_string(),
        }
    }

    /// Override the library label recorded in output metadata.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    pub fn library(&self) -> &str {
        &self.library
    }
}

impl Default for PdfAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for PdfAdapter {
    fn decl(&self) -> &RoutineDecl {
        &self.decl
    }

    fn convert(&self, input: Document) -> Result<Document, ConvertError> {
        adapt(&self.decl, &self.library, input)
    }
}

/// Any format -> DOCX. Also answers requests for DOC.
pub struct DocxAdapter {
    decl: RoutineDecl,
    library: String,
}

impl DocxAdapter {
    pub fn new() -> Self {
        let decl = RoutineDecl::new(
            "adapter.docx",
            "Apache POI Library Adapter",
            FormatPattern::Any,
            "DOCX",
        )
        .answers_to(FormatPattern::one_of(["DOCX", "DOC"]));
        Self {
            decl,
            library: DOCX_LIBRARY.to_string(),
        }
    }

    /// Override the library label recorded in output metadata.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = library.into();
        self
    }

    pub fn library(&self) -> &str {
        &self.library
    }
}

impl Default for DocxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for DocxAdapter {
    fn decl(&self) -> &RoutineDecl {
        &self.decl
    }

    fn convert(&self, input: Document) -> Result<Document, ConvertError> {
        adapt(&self.decl, &self.library, input)
    }
}

/// The standard fallback list, in selection order: PDF adapter, then DOCX adapter.
pub fn default_fallbacks() -> Vec<Arc<dyn Routine>> {
    vec![Arc::new(PdfAdapter::new()), Arc::new(DocxAdapter::new())]
}
