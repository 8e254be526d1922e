use cairo_abi_primitives::cairo::ShortStringError;
use cairo_abi_primitives::PrimitiveError;
use serde::{Deserialize, Serialize};

pub type AbiResult<T, E = AbiError> = Result<T, E>;

/// The fixed set of failure classes an ABI operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidAbi,
    FunctionNotFound,
    EventNotFound,
    InvalidArgs,
    EncodeError,
    DecodeError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAbi => "INVALID_ABI",
            Self::FunctionNotFound => "FUNCTION_NOT_FOUND",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::InvalidArgs => "INVALID_ARGS",
            Self::EncodeError => "ENCODE_ERROR",
            Self::DecodeError => "DECODE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every public ABI operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AbiError {
    pub code: ErrorCode,
    pub message: String,
}

impl AbiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid_abi(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAbi, message)
    }

    pub fn function_not_found(name: &str) -> Self {
        Self::new(ErrorCode::FunctionNotFound, format!("function `{name}` not found in ABI"))
    }

    pub fn event_not_found(name: &str) -> Self {
        Self::new(ErrorCode::EventNotFound, format!("event `{name}` not found in ABI"))
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgs, message)
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EncodeError, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecodeError, message)
    }

    /// Prefixes the message with the path of the value that failed, e.g. `transfer.amount`.
    pub(crate) fn at(mut self, path: &str) -> Self {
        self.message = format!("{path}: {}", self.message);
        self
    }
}

/// Translates primitive failures into the ABI taxonomy, keeping the original message.
pub(crate) trait PrimitiveResultExt<T> {
    fn or_encode(self) -> AbiResult<T>;
    fn or_decode(self) -> AbiResult<T>;
}

impl<T> PrimitiveResultExt<T> for Result<T, PrimitiveError> {
    fn or_encode(self) -> AbiResult<T> {
        self.map_err(|e| AbiError::encode(e.to_string()))
    }

    fn or_decode(self) -> AbiResult<T> {
        self.map_err(|e| AbiError::decode(e.to_string()))
    }
}

impl<T> PrimitiveResultExt<T> for Result<T, ShortStringError> {
    fn or_encode(self) -> AbiResult<T> {
        self.map_err(|e| AbiError::encode(format!("invalid short string: {e}")))
    }

    fn or_decode(self) -> AbiResult<T> {
        self.map_err(|e| AbiError::decode(format!("invalid short string: {e}")))
    }
}
