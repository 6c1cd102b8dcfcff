/// Convenience result type used across cardcast.
pub type CardcastResult<T> = Result<T, CardcastError>;

/// Top-level error taxonomy used by the library APIs.
#[derive(thiserror::Error, Debug)]
pub enum CardcastError {
    /// Invalid user input, configuration or layout parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while drawing or saving a card image.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while inspecting the output directory.
    #[error("storage error: {0}")]
    Storage(String),

    /// Errors raised by a speech synthesis provider.
    #[error("speech error: {0}")]
    Speech(String),

    /// Errors while probing or muxing media with ffmpeg.
    #[error("encode error: {0}")]
    Encode(String),

    /// Not enough system resources (memory) to start a job.
    #[error("resource error: {0}")]
    Resource(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardcastError {
    /// Build a [`CardcastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CardcastError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CardcastError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`CardcastError::Speech`] value.
    pub fn speech(msg: impl Into<String>) -> Self {
        Self::Speech(msg.into())
    }

    /// Build a [`CardcastError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CardcastError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`CardcastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors caused by the caller's input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
