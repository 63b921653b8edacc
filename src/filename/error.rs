//! Error types for the filename codec.

use thiserror::Error;

/// Why a file name did not match its product grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// The name does not carry the product's file extension.
    #[error("{0} extension not found")]
    MissingExtension(&'static str),

    /// The third `_`-separated field is absent or lacks the product token.
    #[error("{0} not found in 3rd part")]
    MissingToken(&'static str),

    /// A field that must be numeric is absent or could not be parsed.
    #[error("{0} is not numeric")]
    NonNumeric(&'static str),
}

/// Errors that can occur while decoding an archive file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    /// No grammar for the product matched the name.
    #[error("invalid {product} filename {name}: {reason}")]
    Malformed {
        /// The offending file name.
        name: String,
        /// Human-readable product label used in the message.
        product: &'static str,
        /// The first grammar rule the name violated.
        reason: MalformedReason,
    },

    /// The manifest declared a product type with no known name grammar.
    #[error("no filename grammar for product type {code} ({name})")]
    UnsupportedProduct {
        /// The file name that was to be decoded.
        name: String,
        /// The numeric archive file type.
        code: u32,
    },

    /// The name has directory parts and cannot be used as a local file name.
    #[error("file name {name} is not a single path component")]
    NotAFileName {
        /// The offending name as listed in the manifest.
        name: String,
    },
}

impl FilenameError {
    /// Creates a malformed-name error.
    pub fn malformed(name: impl Into<String>, product: &'static str, reason: MalformedReason) -> Self {
        Self::Malformed {
            name: name.into(),
            product,
            reason,
        }
    }

    /// Creates an error for a name that is not a bare file name.
    pub fn not_a_file_name(name: impl Into<String>) -> Self {
        Self::NotAFileName { name: name.into() }
    }

    /// Creates an unsupported-product error.
    pub fn unsupported(name: impl Into<String>, code: u32) -> Self {
        Self::UnsupportedProduct {
            name: name.into(),
            code,
        }
    }
}
