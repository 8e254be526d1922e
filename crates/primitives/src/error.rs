/// Errors raised while constructing or reading primitive values.
///
/// These sit below the ABI layer; callers higher up translate them into their own error
/// taxonomy while keeping the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitiveError {
    /// The value is well-formed but falls outside the domain of the target type.
    #[error("value out of range: {0}")]
    Range(String),

    /// The input could not be parsed as a value of the target type.
    #[error("invalid format: {0}")]
    Parse(String),

    /// A read ran past the end of a felt sequence.
    #[error("unexpected end of data: needed {needed} felt(s) at offset {offset}, only {len} available")]
    OutOfBounds { offset: usize, needed: usize, len: usize },
}

impl PrimitiveError {
    pub(crate) fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
