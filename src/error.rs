use thiserror::Error;

/// Errors raised by the decoders and encoders.
///
/// Decoding never fails on an unknown tag (the walk simply stops); the only
/// decode failure is reading past the end of the payload. Encoding is strict
/// and rejects the whole command on the first invalid field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated input at offset {offset}: needed {needed} byte(s), {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("{field} must be {domain}")]
    InvalidArgument { field: String, domain: String },
}

impl CodecError {
    pub fn invalid(field: impl Into<String>, domain: impl Into<String>) -> Self {
        CodecError::InvalidArgument {
            field: field.into(),
            domain: domain.into(),
        }
    }

    /// Field path of an `InvalidArgument`, `None` for decode errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            CodecError::InvalidArgument { field, .. } => Some(field.as_str()),
            CodecError::TruncatedInput { .. } => None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::TruncatedInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
