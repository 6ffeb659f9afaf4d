//! # Pre-filtering
//!
//! Image reductions applied to a stereo pair before matching: grayscale conversion, block
//! downsampling and Gaussian smoothing.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::separable_filter_equal;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// 1D binomial kernel, its outer product is the usual 5x5 Gaussian with weights over 256.
const BINOMIAL_5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Unweighted mean of the R, G and B channels. Alpha is ignored.
pub fn average_gray(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb();

    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let px = rgb.get_pixel(x, y);
        let sum = px[0] as u16 + px[1] as u16 + px[2] as u16;
        Luma([(sum / 3) as u8])
    })
}

/// Shrink the image by `factor` in each direction, averaging each `factor x factor` block.
///
/// Trailing rows and columns that don't fill a whole block are dropped. Remember to divide the
/// maximum disparity by the same factor, see `Params::downscaled`.
pub fn downsample(image: &GrayImage, factor: u32) -> Result<GrayImage> {
    if factor == 0 {
        return Err(Error::InvalidParams("downsampling factor must be at least 1".into()));
    }

    let (width, height) = (image.width() / factor, image.height() / factor);
    if width == 0 || height == 0 {
        return Ok(GrayImage::new(width, height));
    }

    let area = factor as u64 * factor as u64;

    Ok(GrayImage::from_fn(width, height, |x, y| {
        let mut sum = 0u64;

        for j in y * factor..(y + 1) * factor {
            for i in x * factor..(x + 1) * factor {
                sum += image.get_pixel(i, j)[0] as u64;
            }
        }

        Luma([(sum / area) as u8])
    }))
}

/// 5x5 Gaussian blur.
///
/// Taps past the image edge read the nearest edge pixel, so borders keep their brightness rather
/// than darkening as they would if those taps were dropped without renormalising the kernel.
pub fn smooth(image: &GrayImage) -> GrayImage {
    separable_filter_equal(image, &BINOMIAL_5)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
