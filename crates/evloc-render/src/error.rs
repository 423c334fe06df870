use evloc_core::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode plot image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("bundled plot font is unreadable: {0}")]
    Font(#[from] ab_glyph::InvalidFont),

    /// The document encoder rejected its input, e.g. undecodable plot bytes.
    #[error("failed to encode document: {0}")]
    DocumentEncoding(String),

    #[error("artifact store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a full locate call: either the selection or the rendering.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The caller gave up before the plot was saved; the slot is untouched.
    #[error("locate call cancelled before the plot was saved")]
    Cancelled,
}
