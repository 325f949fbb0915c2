//! Docflow: document conversion orchestration
//!
//! Docflow picks a conversion routine for a requested format pair, runs it,
//! optionally pushes the result through a chain of processing steps, and
//! reports progress to attached listeners. This crate holds the contracts and
//! data model; concrete routines live in `docflow-routines` and the facade in
//! `docflow`.

mod chain;
mod document;
mod error;
mod format;
mod progress;
mod routine;
mod selector;
mod steps;
mod store;

pub use chain::{ChainError, ChainSpec, StepSpec};
pub use document::{Document, Metadata, UNKNOWN_FORMAT, format_from_name, replace_extension};
pub use error::{ConvertError, ListenerError};
pub use format::FormatPattern;
pub use progress::{ProgressChannel, ProgressEvent, ProgressListener, ProgressSink};
pub use routine::{Routine, RoutineDecl};
pub use selector::{RoutineSet, Selector};
pub use steps::{
    BaseStep, CompressionStep, DEFAULT_COMPRESSION_LEVEL, DEFAULT_ENCRYPTION_KEY,
    DEFAULT_WATERMARK_TEXT, EncryptionStep, ProcessingChain, ProcessingStep, WatermarkStep,
};
pub use store::{DocumentLoader, DocumentWriter, FsStore, MemoryStore};
