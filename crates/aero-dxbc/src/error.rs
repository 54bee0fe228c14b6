use thiserror::Error;

/// Errors produced while decoding or encoding auxiliary shader chunks.
///
/// Every variant carries a human readable context string describing which
/// field or table was being processed when the failure was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DxbcError {
    /// A chunk header was truncated or carried impossible values.
    #[error("malformed header: {context}")]
    MalformedHeader {
        /// Description of the failure.
        context: String,
    },
    /// A part, table or buffer offset points outside of the chunk.
    #[error("out of bounds: {context}")]
    OutOfBounds {
        /// Description of the failure.
        context: String,
    },
    /// Chunk contents were structurally invalid (bad reference, bad string...).
    #[error("invalid chunk: {context}")]
    InvalidChunk {
        /// Description of the failure.
        context: String,
    },
    /// The chunk declares a version this crate does not understand.
    #[error("unsupported version: {context}")]
    UnsupportedVersion {
        /// Description of the failure.
        context: String,
    },
    /// A structured value could not be encoded because it is internally inconsistent.
    #[error("cannot encode: {context}")]
    InvalidData {
        /// Description of the failure.
        context: String,
    },
}

impl DxbcError {
    pub(crate) fn malformed_header(context: impl Into<String>) -> Self {
        Self::MalformedHeader {
            context: context.into(),
        }
    }

    pub(crate) fn out_of_bounds(context: impl Into<String>) -> Self {
        Self::OutOfBounds {
            context: context.into(),
        }
    }

    pub(crate) fn invalid_chunk(context: impl Into<String>) -> Self {
        Self::InvalidChunk {
            context: context.into(),
        }
    }

    pub(crate) fn unsupported_version(context: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            context: context.into(),
        }
    }

    pub(crate) fn invalid_data(context: impl Into<String>) -> Self {
        Self::InvalidData {
            context: context.into(),
        }
    }

    /// Returns the context string without the variant prefix.
    pub fn context(&self) -> &str {
        match self {
            Self::MalformedHeader { context }
            | Self::OutOfBounds { context }
            | Self::InvalidChunk { context }
            | Self::UnsupportedVersion { context }
            | Self::InvalidData { context } => context,
        }
    }
}
