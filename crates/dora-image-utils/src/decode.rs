use kornia_image::{allocator::CpuAllocator, Image, ImageSize};
use kornia_imgproc::{
    color::bgr_from_rgb, interpolation::InterpolationMode, resize::resize_fast_rgb,
};

use crate::encoding::PixelEncoding;
use crate::error::ImageUtilsError;

/// An 8-bit RGB image living in host memory.
pub type Rgb8 = Image<u8, 3, CpuAllocator>;

/// Decode an image payload into an RGB image.
///
/// # Arguments
///
/// * `data` - The raw payload.
/// * `encoding` - The pixel encoding of the payload.
/// * `size` - The image size. Only used by the planar encodings, compressed
///   streams carry their own size.
///
/// # Returns
///
/// An RGB image with shape (H, W, 3).
///
/// # Errors
///
/// Fails if a planar buffer does not hold exactly `width * height * 3` bytes,
/// if that byte count overflows `usize` or if the compressed stream cannot
/// be decoded.
///
/// # Example
///
/// ```
/// use dora_image_utils::{decode_image, PixelEncoding};
/// use kornia_image::ImageSize;
///
/// let image = decode_image(
///     &[255, 0, 0, 0, 255, 0],
///     PixelEncoding::Rgb8,
///     ImageSize { width: 2, height: 1 },
/// ).unwrap();
///
/// assert_eq!(image.as_slice(), &[255, 0, 0, 0, 255, 0]);
/// ```
pub fn decode_image(
    data: &[u8],
    encoding: PixelEncoding,
    size: ImageSize,
) -> Result<Rgb8, ImageUtilsError> {
    match encoding {
        PixelEncoding::Rgb8 => decode_planar(data, size),
        PixelEncoding::Bgr8 => {
            let bgr = decode_planar(data, size)?;
            let mut rgb = Rgb8::from_size_val(bgr.size(), 0, CpuAllocator)?;
            // swapping the first and last channel is its own inverse
            bgr_from_rgb(&bgr, &mut rgb)?;
            Ok(rgb)
        }
        compressed => {
            let format = compressed
                .image_format()
                .ok_or_else(|| ImageUtilsError::UnsupportedEncoding(compressed.to_string()))?;
            decode_compressed(data, format)
        }
    }
}

fn decode_planar(data: &[u8], size: ImageSize) -> Result<Rgb8, ImageUtilsError> {
    if size.width == 0 || size.height == 0 {
        return Err(ImageUtilsError::EmptyImage(size.width, size.height));
    }

    let expected = size
        .width
        .checked_mul(size.height)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or(ImageUtilsError::ImageTooLarge(size.width, size.height))?;
    if data.len() != expected {
        return Err(ImageUtilsError::InvalidBufferLength {
            width: size.width,
            height: size.height,
            expected,
            actual: data.len(),
        });
    }

    Ok(Rgb8::new(size, data.to_vec(), CpuAllocator)?)
}

fn decode_compressed(data: &[u8], format: image::ImageFormat) -> Result<Rgb8, ImageUtilsError> {
    let decoded = image::load_from_memory_with_format(data, format)?.into_rgb8();

    let size = ImageSize {
        width: decoded.width() as usize,
        height: decoded.height() as usize,
    };

    if size.width == 0 || size.height == 0 {
        return Err(ImageUtilsError::EmptyImage(size.width, size.height));
    }

    Ok(Rgb8::new(size, decoded.into_raw(), CpuAllocator)?)
}

/// Scale an image by `ratio` along both axes.
///
/// A ratio of exactly `1.0` returns a copy without resampling. The output is
/// never smaller than one pixel per side.
pub fn resize_by_ratio(image: &Rgb8, ratio: f32) -> Result<Rgb8, ImageUtilsError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ImageUtilsError::InvalidResizeRatio(ratio));
    }

    if ratio == 1.0 {
        return Ok(image.clone());
    }

    let new_size = ImageSize {
        width: ((image.width() as f32 * ratio) as usize).max(1),
        height: ((image.height() as f32 * ratio) as usize).max(1),
    };

    log::debug!("Resizing image from {} to {}", image.size(), new_size);

    let mut resized = Rgb8::from_size_val(new_size, 0, CpuAllocator)?;
    resize_fast_rgb(image, &mut resized, InterpolationMode::Bilinear)?;

    Ok(resized)
}
