//! Image routines.

use crate::document::describe_conversion;
use docflow_core::{ConvertError, Document, FormatPattern, Routine, RoutineDecl, RoutineSet};
use tracing::info;

/// Raster formats accepted by [`ImageToPdf`].
pub const IMAGE_FORMATS: &[&str] = &["PNG", "JPG", "JPEG"];

/// PNG/JPG/JPEG -> PDF
pub struct ImageToPdf {
    decl: RoutineDecl,
}

impl ImageToPdf {
    pub fn new() -> Self {
        let decl = RoutineDecl::new(
            "image.image-to-pdf",
            "Image to PDF Conversion Strategy",
            FormatPattern::one_of(IMAGE_FORMATS.iter().copied()),
            "PDF",
        );
        Self { decl }
    }
}

impl Default for ImageToPdf {
    fn default() -> Self {
        Self::new()
    }
}

impl Routine for ImageToPdf {
    fn decl(&self) -> &RoutineDecl {
        &self.decl
    }

    fn convert(&self, input: Document) -> Result<Document, ConvertError> {
        self.decl.check_input(&input)?;
        info!("converting {} image {} to PDF", input.format(), input.name());

        let content = describe_conversion(input.format(), "PDF", input.content());
        let image_type = input.format().to_string();
        Ok(self
            .decl
            .output_document(&input, content)
            .with_metadata("image_type", image_type))
    }
}

/// The image selector: PNG/JPG/JPEG -> PDF.
pub fn image_selector() -> RoutineSet {
    RoutineSet::new("Image").with(ImageToPdf::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_core::Selector;

    #[test]
    fn test_image_to_pdf() {
        let input = Document::named(vec![9u8; 12], "JPEG", "photo.jpeg");
        let out = ImageToPdf::new().convert(input).unwrap();

        assert_eq!(out.format(), "PDF");
        assert_eq!(out.name(), "photo.pdf");
        assert_eq!(out.content(), b"Converted from JPEG to PDF (Original size: 12 bytes)");
        assert_eq!(out.meta("image_type"), Some("JPEG"));
        assert_eq!(out.meta("original_format"), Some("JPEG"));
    }

    #[test]
    fn test_image_selector() {
        let selector = image_selector();
        for format in ["png", "JPG", "Jpeg"] {
            assert!(selector.supports_conversion(format, "pdf"), "{format}");
        }
        assert!(!selector.supports_conversion("GIF", "PDF"));
        assert!(!selector.supports_conversion("PNG", "DOCX"));
        assert!(selector.create_converter("GIF", "PDF").is_err());
    }

    #[test]
    fn test_non_image_rejected() {
        let input = Document::named(b"x".to_vec(), "PDF", "a.pdf");
        assert!(matches!(
            ImageToPdf::new().convert(input),
            Err(ConvertError::RoutineMismatch { .. })
        ));
    }
}
