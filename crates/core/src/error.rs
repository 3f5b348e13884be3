//! Error types for filling PowerPoint templates.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading slide data, filling a deck or saving it.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The tabular input could not be parsed (bad CSV, missing column, bad slide number).
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The template presentation does not exist.
    #[error("Template not found: {0}")]
    MissingTemplate(String),

    /// The directory the output should be written to does not exist.
    #[error("Output directory does not exist: {0}")]
    MissingOutputDir(String),

    /// An image swap was requested for a file that is not on disk.
    #[error("Image file not found: {0}")]
    ImageNotFound(String),

    /// The image file is not in a format a slide can embed.
    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    /// Invalid or corrupted package structure.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        let message = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(io) => Error::IoError(io),
            _ => Error::MalformedInput(message),
        }
    }
}
