//! Error types for the WSDL projection pipeline.
//!
//! One error enum serves every crate in the workspace, so a caller can
//! match on the failure kind without caring which stage produced it.
//!
//! # Examples
//!
//! ```
//! use wsdl2rest_core::{Error, Result};
//!
//! fn lookup(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(Error::UnresolvedReference {
//!             reference: name.to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = lookup("").unwrap_err();
//! assert!(err.is_unresolved_reference());
//! ```

use thiserror::Error;

/// Main error type for WSDL ingestion, generation and bridging.
///
/// Fatal kinds (`Fetch`, `Parse`) abort a whole run; `UnresolvedReference`
/// degrades only the entity that carried the dangling name; `SoapFault` and
/// `Transport` are scoped to a single remote call.
#[derive(Error, Debug)]
pub enum Error {
    /// WSDL document could not be retrieved.
    ///
    /// Raised for unreachable URLs, non-2xx responses and unreadable
    /// files. There is no retry; the run aborts.
    #[error("failed to fetch WSDL from {source_desc}")]
    Fetch {
        /// File path or URL the fetch was attempted against
        source_desc: String,
        /// Underlying I/O or HTTP error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The top-level WSDL shape is malformed.
    ///
    /// Only structural problems at the document root are fatal; dangling
    /// inner references surface later as `UnresolvedReference`.
    #[error("malformed WSDL document: {message}")]
    Parse {
        /// Description of the structural problem
        message: String,
    },

    /// A named cross-reference does not resolve within the document.
    ///
    /// The entity holding the reference is degraded to a placeholder and
    /// processing continues.
    #[error("unresolved reference: {reference}")]
    UnresolvedReference {
        /// The name that failed to resolve (prefix already stripped)
        reference: String,
    },

    /// The remote service answered with a SOAP fault.
    ///
    /// Business-level failure reported by the responder; propagated
    /// verbatim, never coerced into an empty success.
    #[error("SOAP fault {code}: {reason}")]
    SoapFault {
        /// Fault code (`faultcode` or the SOAP 1.2 `Code/Value`)
        code: String,
        /// Human-readable fault reason
        reason: String,
        /// Optional detail payload
        detail: String,
    },

    /// HTTP transport failure reaching a remote endpoint.
    ///
    /// Surfaced immediately without retry.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
        /// Underlying error, when one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Template registration or rendering failed during emission.
    #[error("template error: {message}")]
    Template {
        /// Description of the template failure
        message: String,
    },

    /// Writing a generated file to disk failed.
    #[error("failed to write {path}")]
    Io {
        /// Destination path of the failed write
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if this is a WSDL fetch error.
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// Returns `true` if this is a parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns `true` if this is an unresolved reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsdl2rest_core::Error;
    ///
    /// let err = Error::UnresolvedReference {
    ///     reference: "AddSoapIn".to_string(),
    /// };
    /// assert!(err.is_unresolved_reference());
    /// ```
    #[must_use]
    pub const fn is_unresolved_reference(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }

    /// Returns `true` if this is a SOAP fault from the remote service.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsdl2rest_core::Error;
    ///
    /// let err = Error::SoapFault {
    ///     code: "soap:Client".to_string(),
    ///     reason: "bad input".to_string(),
    ///     detail: String::new(),
    /// };
    /// assert!(err.is_soap_fault());
    /// ```
    #[must_use]
    pub const fn is_soap_fault(&self) -> bool {
        matches!(self, Self::SoapFault { .. })
    }

    /// Returns `true` if this is an HTTP transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` if this is a template error.
    #[must_use]
    pub const fn is_template(&self) -> bool {
        matches!(self, Self::Template { .. })
    }
}

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_detection() {
        let err = Error::Fetch {
            source_desc: "http://example.com/svc?wsdl".to_string(),
            source: "connection refused".into(),
        };
        assert!(err.is_fetch());
        assert!(!err.is_parse());
    }

    #[test]
    fn test_parse_error_detection() {
        let err = Error::Parse {
            message: "root element is not definitions".to_string(),
        };
        assert!(err.is_parse());
        assert!(!err.is_soap_fault());
    }

    #[test]
    fn test_unresolved_reference_detection() {
        let err = Error::UnresolvedReference {
            reference: "MissingMessage".to_string(),
        };
        assert!(err.is_unresolved_reference());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_soap_fault_display() {
        let err = Error::SoapFault {
            code: "soap:Server".to_string(),
            reason: "Internal error".to_string(),
            detail: "stack".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("soap:Server"));
        assert!(display.contains("Internal error"));
    }

    #[test]
    fn test_transport_without_source() {
        let err = Error::Transport {
            message: "HTTP status 503".to_string(),
            source: None,
        };
        assert!(err.is_transport());
        assert!(format!("{err}").contains("503"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
