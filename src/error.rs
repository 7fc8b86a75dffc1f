use std::path::PathBuf;

use thiserror::Error;

/// Hard failures. Everything else in the pipeline is best-effort: a
/// missing feature or an unresolvable reference skips its dependent step
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Constructing a model element for SBML export failed. This is the
    /// one fail-fast path; partial SBML output is never written.
    #[error("cannot construct model element: {0}")]
    ModelConstruction(String),

    #[error("unsupported figure format: {0}")]
    UnsupportedFigureFormat(String),
}
