use std::path::PathBuf;

/// Errors raised by the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database rejected an operation.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The persisted document could not be parsed or serialized.
    #[error("corrupt document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors raised by the artifact pipeline.
///
/// Any of these aborts the pipeline only; the rest of the server keeps
/// running without a servable artifact.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input image could not be loaded or an output could not be saved.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// File or process I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The external compression collaborator exited with a failure status.
    #[error("compressing {input} failed with {status}")]
    Compression {
        input: PathBuf,
        status: std::process::ExitStatus,
    },

    /// The blocking edge-detection task was cancelled or panicked.
    #[error("edge detection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
