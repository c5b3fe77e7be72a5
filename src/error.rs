//! Error types for csv2xml
//!
//! Every condition that would change the shape of a generated document is
//! fatal and aborts the whole request. Row-level problems (short or long
//! rows, unusable file names, characters XML cannot carry) are recovered
//! where they occur and only logged, so they have no variant here.

use thiserror::Error;

/// Result type alias using the csv2xml Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for csv2xml operations
#[derive(Error, Debug)]
pub enum Error {
    /// A header cannot be turned into an XML element name
    #[error("invalid header name '{header}': {reason}")]
    InvalidHeaderName {
        /// Header text as found in the spreadsheet
        header: String,
        /// Why the header was rejected
        reason: String,
    },

    /// A header uses a prefix that has no namespace URI bound to it
    #[error("no namespace bound for prefix '{prefix}' used by header '{header}'")]
    MissingNamespaceBinding {
        /// Unbound prefix
        prefix: String,
        /// Header carrying the prefix
        header: String,
    },

    /// A generated XML artifact could not be re-parsed
    #[error("malformed XML document: {0}")]
    MalformedSourceDocument(String),

    /// The root element name is not a legal XML name
    #[error("invalid root element name '{name}': {reason}")]
    InvalidRootElement {
        /// Root element name as supplied
        name: String,
        /// Why the name was rejected
        reason: String,
    },

    /// The naming column is not one of the headers
    #[error("naming column '{0}' is not a header of the spreadsheet")]
    UnknownNamingColumn(String),

    /// Invalid namespace prefix or URI
    #[error("namespace error: {0}")]
    InvalidNamespace(String),

    /// The source has no header row
    #[error("could not find CSV headers")]
    EmptySource,

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML serialization error
    #[error("XML error: {0}")]
    Xml(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl Error {
    /// Build an `InvalidHeaderName` error
    pub fn header(header: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidHeaderName {
            header: header.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_header_display() {
        let err = Error::header("first name", "contains whitespace");
        let msg = err.to_string();
        assert!(msg.contains("'first name'"));
        assert!(msg.contains("whitespace"));
    }

    #[test]
    fn test_missing_binding_names_prefix() {
        let err = Error::MissingNamespaceBinding {
            prefix: "ead".into(),
            header: "ead:unitdate".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'ead'"));
        assert!(msg.contains("ead:unitdate"));
    }

    #[test]
    fn test_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
