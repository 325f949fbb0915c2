//! Error types shared by routines, selectors, steps and collaborators.

use std::path::PathBuf;

/// Errors that can occur while loading, selecting, converting or processing.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A selector was asked for a pair it does not hold.
    #[error("{selector} conversion from {input} to {output} is not supported")]
    Unsupported {
        selector: String,
        input: String,
        output: String,
    },

    /// Neither a selector nor a fallback routine claims the pair.
    #[error("No suitable converter found for {input} -> {output}")]
    NoConverter { input: String, output: String },

    /// The routine exists but rejects this particular input.
    #[error("{routine} does not support input format {format}")]
    RoutineMismatch { routine: String, format: String },

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("processing step '{step}' failed: {message}")]
    Step { step: String, message: String },
}

impl ConvertError {
    /// A conversion failure without an underlying cause.
    pub fn failed(message: impl Into<String>) -> Self {
        ConvertError::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// A conversion failure wrapping its cause.
    pub fn failed_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConvertError::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Map an I/O error for `path`, turning `NotFound` into [`ConvertError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ConvertError::NotFound { path }
        } else {
            ConvertError::Io { path, source }
        }
    }
}

/// A progress listener failed to handle an event.
#[derive(Debug, Clone, thiserror::Error)]
#[error("listener '{listener}' failed: {reason}")]
pub struct ListenerError {
    pub listener: String,
    pub reason: String,
}

impl ListenerError {
    pub fn new(listener: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            listener: listener.into(),
            reason: reason.into(),
        }
    }
}
