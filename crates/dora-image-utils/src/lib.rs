#![deny(missing_docs)]
//! Image helpers shared by the kornia dora nodes.
//!
//! Incoming camera frames arrive as raw arrow buffers tagged with an
//! `encoding` metadata entry. This crate turns them into a single
//! [`kornia_image::Image`] representation with RGB channel order.

/// Pixel encodings accepted on dora image inputs.
pub mod encoding;

/// Decoding of raw and compressed buffers into RGB images.
pub mod decode;

/// Error types for the image utilities.
pub mod error;

/// Typed accessors for dora metadata parameters.
pub mod metadata;

pub use crate::decode::{decode_image, resize_by_ratio, Rgb8};
pub use crate::encoding::PixelEncoding;
pub use crate::error::ImageUtilsError;
pub use crate::metadata::MetadataExt;
