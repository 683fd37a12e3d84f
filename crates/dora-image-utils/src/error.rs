/// An error type for the image utilities.
#[derive(thiserror::Error, Debug)]
pub enum ImageUtilsError {
    /// The encoding tag is not one of the supported pixel encodings.
    #[error("Unsupported image encoding: {0}")]
    UnsupportedEncoding(String),

    /// The buffer length does not match `width * height * 3`.
    #[error(
        "Invalid buffer length for a {width}x{height} image: expected {expected}, got {actual}"
    )]
    InvalidBufferLength {
        /// Width from the metadata.
        width: usize,
        /// Height from the metadata.
        height: usize,
        /// Expected number of bytes.
        expected: usize,
        /// Received number of bytes.
        actual: usize,
    },

    /// The pixel count of a `width` x `height` image does not fit in memory.
    #[error("Image size {0}x{1} is too large")]
    ImageTooLarge(usize, usize),

    /// The image has no pixels.
    #[error("Image has an empty size ({0}x{1})")]
    EmptyImage(usize, usize),

    /// The resize ratio is not a positive finite number.
    #[error("Invalid resize ratio: {0}")]
    InvalidResizeRatio(f32),

    /// A required metadata entry is missing or has the wrong type.
    #[error("Missing or invalid metadata parameter `{0}`")]
    InvalidMetadata(String),

    /// Error to decode a compressed image.
    #[error("Failed to decode the image. {0}")]
    ImageDecodeError(#[from] image::ImageError),

    /// Error to create or process the kornia image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] kornia_image::ImageError),
}
