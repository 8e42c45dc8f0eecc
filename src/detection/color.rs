use image::{ImageBuffer, Rgb, RgbImage};

/// Image whose three channels hold H (0-180), S (0-255) and V (0-255)
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Convert one RGB pixel to 8-bit HSV with hue in degrees / 2
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [(h / 2.0).round() as u8, s.round() as u8, max as u8]
}

pub fn to_hsv(image: &RgbImage) -> HsvImage {
    let mut hsv = HsvImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        hsv.put_pixel(x, y, Rgb(rgb_to_hsv(pixel.0)));
    }
    hsv
}
