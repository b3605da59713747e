//! Error taxonomy for the formatting pipeline.

use std::io;
use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or corrupt document, logo or configuration. Raised before any
    /// mutation takes place.
    #[error("invalid input: {0}")]
    Input(String),

    /// An expected node is absent or malformed, e.g. a section without page
    /// geometry.
    #[error("unexpected document structure: {0}")]
    Structure(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The external renderer could not be started or exited unsuccessfully.
    #[error("render failed: {0}")]
    Render(String),
}

impl Error {
    pub fn structure(msg: impl Into<String>) -> Self {
        Error::Structure(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            other => Error::Input(format!("not a readable docx package: {other}")),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Input(format!("malformed XML: {err}"))
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Input(format!("malformed XML: {err}"))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Input(format!("logo image cannot be decoded: {err}"))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Input(format!("part is not valid UTF-8: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::structure("section 2 has no w:pgSz");
        assert_eq!(
            err.to_string(),
            "unexpected document structure: section 2 has no w:pgSz"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_is_input() {
        let err: Error = zip::result::ZipError::InvalidArchive("bad").into();
        assert!(matches!(err, Error::Input(_)));
    }
}
