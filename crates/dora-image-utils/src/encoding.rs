use std::fmt;
use std::str::FromStr;

use crate::error::ImageUtilsError;

/// Pixel encoding of an image payload.
///
/// Planar encodings carry `width * height * 3` interleaved bytes and need the
/// size from the metadata. Compressed encodings carry a full file in memory and
/// their size is read from the stream itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelEncoding {
    /// Interleaved 8-bit blue, green, red.
    Bgr8,
    /// Interleaved 8-bit red, green, blue.
    Rgb8,
    /// JPEG stream (`jpeg`, `jpg` or `jpe`).
    Jpeg,
    /// Windows bitmap stream.
    Bmp,
    /// WebP stream.
    Webp,
    /// PNG stream.
    Png,
}

impl PixelEncoding {
    /// Whether the payload is a compressed stream rather than raw pixels.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, PixelEncoding::Bgr8 | PixelEncoding::Rgb8)
    }

    /// The codec used to decode a compressed payload.
    pub(crate) fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            PixelEncoding::Bgr8 | PixelEncoding::Rgb8 => None,
            PixelEncoding::Jpeg => Some(image::ImageFormat::Jpeg),
            PixelEncoding::Bmp => Some(image::ImageFormat::Bmp),
            PixelEncoding::Webp => Some(image::ImageFormat::WebP),
            PixelEncoding::Png => Some(image::ImageFormat::Png),
        }
    }
}

impl FromStr for PixelEncoding {
    type Err = ImageUtilsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bgr8" => Ok(PixelEncoding::Bgr8),
            "rgb8" => Ok(PixelEncoding::Rgb8),
            "jpeg" | "jpg" | "jpe" => Ok(PixelEncoding::Jpeg),
            "bmp" => Ok(PixelEncoding::Bmp),
            "webp" => Ok(PixelEncoding::Webp),
            "png" => Ok(PixelEncoding::Png),
            other => Err(ImageUtilsError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PixelEncoding::Bgr8 => "bgr8",
            PixelEncoding::Rgb8 => "rgb8",
            PixelEncoding::Jpeg => "jpeg",
            PixelEncoding::Bmp => "bmp",
            PixelEncoding::Webp => "webp",
            PixelEncoding::Png => "png",
        };
        write!(f, "{name}")
    }
}
