//! Conversion routines for Docflow
//!
//! Content transforms are placeholders: each routine emits a short description
//! of its input whose size depends only on the input.

mod adapters;
mod document;
mod image;

pub use adapters::{DOCX_LIBRARY, DocxAdapter, PDF_LIBRARY, PdfAdapter, default_fallbacks};
pub use document::{DocxToTxt, PdfToDocx, document_selector};
pub use image::{IMAGE_FORMATS, ImageToPdf, image_selector};

use docflow_core::Selector;

/// The standard selectors, in selection order: document first, then image.
pub fn default_selectors() -> Vec<Box<dyn Selector>> {
    vec![Box::new(document_selector()), Box::new(image_selector())]
}
