/// Convenience result type used across relume.
pub type RelumeResult<T> = Result<T, RelumeError>;

/// Top-level error taxonomy used by the enhancement APIs.
///
/// Parameter clamping is not an error path: out-of-range knobs are silently
/// clamped by [`crate::EnhanceParams`]. Every other failure surfaces as one
/// of these variants with no partial output.
#[derive(thiserror::Error, Debug)]
pub enum RelumeError {
    /// Input bytes or container could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Frame geometry is incompatible with the fixed pipeline.
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(String),

    /// Result could not be serialized to the output format.
    #[error("encode error: {0}")]
    Encode(String),

    /// Output destination or codec plumbing failed at the IO level.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelumeError {
    /// Build a [`RelumeError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`RelumeError::UnsupportedFrame`] value.
    pub fn unsupported_frame(msg: impl Into<String>) -> Self {
        Self::UnsupportedFrame(msg.into())
    }

    /// Build a [`RelumeError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`RelumeError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RelumeError::decode("x")
                .to_string()
                .contains("decode error:")
        );
        assert!(
            RelumeError::unsupported_frame("x")
                .to_string()
                .contains("unsupported frame:")
        );
        assert!(
            RelumeError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(RelumeError::io("x").to_string().contains("io error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RelumeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
