//! Failure taxonomy shared by every component.
//!
//! Each component keeps its own error enum; all of them map onto one of the
//! [`ErrorKind`]s below so the conversational layer can branch on a stable,
//! serialisable name.

use serde::{Deserialize, Serialize};

/// Stable classification of a failed tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The remote service was unreachable or answered with a non-success status
    UpstreamUnavailable,
    /// The remote payload did not have the expected feed or JSON shape
    MalformedResponse,
    /// Fetching a document failed
    TransferError,
    /// A page could not be rendered into a document
    RenderError,
    /// A filename was empty after sanitization
    SanitizationError,
    /// The tool call itself was invalid
    InvalidArguments,
    /// No stored document matches the requested name
    NotFound,
    /// A stored document could not be parsed
    ExtractionError,
}

impl ErrorKind {
    /// Name of the kind as it appears in structured results
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::TransferError => "TransferError",
            ErrorKind::RenderError => "RenderError",
            ErrorKind::SanitizationError => "SanitizationError",
            ErrorKind::InvalidArguments => "InvalidArguments",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::ExtractionError => "ExtractionError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_its_name() {
        for kind in [
            ErrorKind::UpstreamUnavailable,
            ErrorKind::MalformedResponse,
            ErrorKind::TransferError,
            ErrorKind::RenderError,
            ErrorKind::SanitizationError,
            ErrorKind::InvalidArguments,
            ErrorKind::NotFound,
            ErrorKind::ExtractionError,
        ] {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value, kind.as_str());
        }
    }
}
