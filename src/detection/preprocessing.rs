use crate::config::{ColorConfig, HsvRange};
use crate::detection::color::HsvImage;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::median_filter;
use imageproc::morphology::{close, open};

const FOREGROUND: Luma<u8> = Luma([255]);

/// Threshold: a pixel is set when it lies in any of the ranges
pub fn in_any_range(hsv: &HsvImage, ranges: &[HsvRange]) -> GrayImage {
    let mut mask = GrayImage::new(hsv.width(), hsv.height());
    for (x, y, pixel) in hsv.enumerate_pixels() {
        if ranges.iter().any(|r| r.contains(pixel.0)) {
            mask.put_pixel(x, y, FOREGROUND);
        }
    }
    mask
}

/// Opening drops speckles, closing fills pinholes, the median pass removes
/// whatever salt-and-pepper noise is left
pub fn clean_mask(mask: &GrayImage, morph_radius: u8, median_radius: u32) -> GrayImage {
    let mut mask = if morph_radius > 0 {
        let opened = open(mask, Norm::LInf, morph_radius);
        close(&opened, Norm::LInf, morph_radius)
    } else {
        mask.clone()
    };
    if median_radius > 0 {
        mask = median_filter(&mask, median_radius, median_radius);
    }
    mask
}

/// Build the cleaned binary mask of the configured colors.
///
/// An all-black result is a valid answer; the contour stage reports it.
pub fn build_mask(hsv: &HsvImage, config: &ColorConfig) -> GrayImage {
    let raw = in_any_range(hsv, &config.ranges);
    clean_mask(&raw, config.morph_radius, config.median_radius)
}

/// Number of foreground pixels
pub fn coverage(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}
