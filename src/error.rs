use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("could not resolve region: {0}")]
    Resolve(String),

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error body printed by the command line front-end in `--json` mode.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: &'static str,
    pub message: String,
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Format(_) => "FormatError",
            Error::NotFound(_) => "NotFound",
            Error::OutOfRange(_) => "OutOfRange",
            Error::Resolve(_) => "ResolveError",
            Error::Seek(_) => "SeekError",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Io(_) | Error::Internal(_) => "InternalError",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Format(_) => 3,
            Error::NotFound(_) => 4,
            Error::OutOfRange(_) | Error::InvalidInput(_) => 5,
            Error::Resolve(_) => 6,
            Error::Seek(_) => 7,
            Error::Io(_) | Error::Internal(_) => 1,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error: self.kind(),
            message: self.to_string(),
        }
    }
}
