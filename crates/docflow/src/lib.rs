//! Docflow: document conversion orchestration
//!
//! The [`Orchestrator`] loads a document, picks a routine for the requested
//! format pair (domain selectors first, then fallback adapters), converts it,
//! optionally runs a processing chain over the result, and reports progress
//! to attached listeners.
//!
//! ```no_run
//! use docflow::{Orchestrator, ProcessingChain, WatermarkStep};
//!
//! let mut orchestrator = Orchestrator::new();
//! let chain = ProcessingChain::new().wrap(WatermarkStep::new("DRAFT"));
//! let result = orchestrator.convert_and_process("report.pdf", "DOCX", &chain);
//! if let Some(document) = result.document() {
//!     orchestrator.save(document, "report.docx").ok();
//! }
//! ```

mod listeners;
mod orchestrator;
mod result;

pub use listeners::LogListener;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use result::ConversionResult;

pub use docflow_core::*;
pub use docflow_routines as routines;
