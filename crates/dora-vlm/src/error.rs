use std::path::PathBuf;

use dora_image_utils::ImageUtilsError;

/// Errors raised while reading the node configuration from the environment.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The variable is set but cannot be parsed.
    #[error("Invalid value for {name}: `{value}` ({reason})")]
    InvalidValue {
        /// Name of the environment variable.
        name: &'static str,
        /// Raw value found in the environment.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Errors raised by the vision-language node.
#[derive(thiserror::Error, Debug)]
pub enum VlmError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An image input could not be normalized.
    #[error(transparent)]
    Image(#[from] ImageUtilsError),

    /// The prompt template failed to compile or render.
    #[error(transparent)]
    Template(#[from] minijinja::Error),

    /// Error while listing the model weights.
    #[error("Failed to read the model weights. {0}")]
    Io(#[from] std::io::Error),

    /// An input payload has an unexpected arrow type.
    #[error("Input `{id}` has an unexpected payload: expected {expected}, got {actual}")]
    InvalidPayload {
        /// Input identifier.
        id: String,
        /// Expected arrow type.
        expected: &'static str,
        /// Received arrow type.
        actual: String,
    },

    /// No frame has been received yet.
    #[error("No frame available for inference")]
    NoFrames,

    /// A text input asked for a frame that has not been received.
    #[error("Unknown frame `{0}`")]
    UnknownFrame(String),

    /// The model path does not exist and downloading is disabled.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The backend cannot load the requested hub model.
    #[error("Unsupported model `{requested}`, only `{supported}` can be downloaded")]
    UnsupportedModel {
        /// Requested hub identifier.
        requested: String,
        /// Identifier supported by the backend.
        supported: &'static str,
    },

    /// Adapter weights were configured but the backend cannot apply them.
    #[error("Adapter weights are not supported by the backend: {0}")]
    AdapterUnsupported(PathBuf),

    /// The model failed while generating.
    #[error("Model inference failed. {0}")]
    Model(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl VlmError {
    /// Whether the node must stop after this error.
    ///
    /// Rejected inputs are reported and skipped, a failing model is not
    /// recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VlmError::Model(_)
                | VlmError::Config(_)
                | VlmError::ModelNotFound(_)
                | VlmError::UnsupportedModel { .. }
                | VlmError::AdapterUnsupported(_)
        )
    }
}
