use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidDescriptor(String),
    InvalidSignature {
        signature: String,
        offset: usize,
        reason: &'static str,
    },
}

impl Error {
    pub(crate) fn signature(signature: &str, offset: usize, reason: &'static str) -> Self {
        Error::InvalidSignature {
            signature: signature.to_string(),
            offset,
            reason,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDescriptor(desc) => write!(f, "invalid descriptor: {desc}"),
            Error::InvalidSignature {
                signature,
                offset,
                reason,
            } => write!(f, "invalid signature {signature:?} at offset {offset}: {reason}"),
        }
    }
}

impl std::error::Error for Error {}
