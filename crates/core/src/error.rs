/// Result alias that carries the custom [`FxError`] type.
pub type Result<T> = std::result::Result<T, FxError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    /// Malformed or degenerate audio features and render parameters: empty
    /// profiles, non-positive durations, zero frame rates or canvas sizes.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The requested theme has no effect mapping.
    #[error("unsupported theme `{0}` (expected one of realistic, animated, abstract, cinematic)")]
    UnsupportedTheme(String),
    /// Every raw energy value was identical, so min-max scaling is undefined.
    #[error("energy values are all equal; min-max normalisation is undefined")]
    DegenerateNormalization,
    /// Free-form failure that fits no other variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON input.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl FxError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates an [`FxError::InvalidInput`] from the provided message.
    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_pick_the_matching_variant() {
        assert!(matches!(FxError::invalid("fps"), FxError::InvalidInput(ref m) if m == "fps"));
        assert!(matches!(FxError::msg("png"), FxError::Message(ref m) if m == "png"));
        assert_eq!(FxError::invalid("zero fps").to_string(), "invalid input: zero fps");
    }

    #[test]
    fn io_and_json_errors_convert_with_question_mark() {
        fn parse() -> Result<u32> {
            Ok(serde_json::from_str("nope")?)
        }
        assert!(matches!(parse(), Err(FxError::Json(_))));
    }
}
