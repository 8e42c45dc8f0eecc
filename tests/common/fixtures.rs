use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Color constants for tests
pub const BACKGROUND: Rgb<u8> = Rgb([120, 120, 115]);
pub const PIPE_RED: Rgb<u8> = Rgb([200, 35, 30]);
pub const MARKER_GREEN: Rgb<u8> = Rgb([30, 180, 40]);

pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BACKGROUND)
}

pub fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, color);
        }
    }
}

/// Solid rectangle of size `w` x `h` centered at (cx, cy), rotated by `degrees`
pub fn fill_rotated_rect(img: &mut RgbImage, cx: f32, cy: f32, w: f32, h: f32, degrees: f32, color: Rgb<u8>) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let corners = [(-w / 2.0, -h / 2.0), (w / 2.0, -h / 2.0), (w / 2.0, h / 2.0), (-w / 2.0, h / 2.0)];
    let poly: Vec<Point<i32>> = corners
        .iter()
        .map(|(x, y)| {
            Point::new(
                (cx + x * cos - y * sin).round() as i32,
                (cy + x * sin + y * cos).round() as i32,
            )
        })
        .collect();
    draw_polygon_mut(img, &poly, color);
}

/// Exact nearest-neighbour upscale: every pixel becomes a k x k block
pub fn upscale(img: &RgbImage, k: u32) -> RgbImage {
    RgbImage::from_fn(img.width() * k, img.height() * k, |x, y| *img.get_pixel(x / k, y / k))
}

/// A 100x100 red marker and a 40x200 red pipe
pub fn marker_and_pipe() -> RgbImage {
    let mut img = blank(400, 320);
    fill_rect(&mut img, 40, 40, 100, 100, PIPE_RED);
    fill_rect(&mut img, 240, 60, 40, 200, PIPE_RED);
    img
}

/// The marker plus three pipes of different widths, widest first in raster order
pub fn marker_and_three_pipes() -> RgbImage {
    let mut img = blank(700, 420);
    fill_rect(&mut img, 30, 30, 100, 100, PIPE_RED);
    fill_rect(&mut img, 200, 30, 60, 300, PIPE_RED);
    fill_rect(&mut img, 330, 40, 30, 250, PIPE_RED);
    fill_rect(&mut img, 450, 50, 45, 180, PIPE_RED);
    img
}

/// A 60 px marker and a 40x200 pipe tilted by `degrees`
pub fn marker_and_tilted_pipe(degrees: f32) -> RgbImage {
    let mut img = blank(360, 300);
    fill_rect(&mut img, 20, 20, 60, 60, PIPE_RED);
    fill_rotated_rect(&mut img, 220.0, 150.0, 40.0, 200.0, degrees, PIPE_RED);
    img
}

/// A 20 px marker next to a 12x120 pipe
pub fn small_marker_and_pipe() -> RgbImage {
    let mut img = blank(200, 160);
    fill_rect(&mut img, 20, 20, 20, 20, PIPE_RED);
    fill_rect(&mut img, 80, 20, 12, 120, PIPE_RED);
    img
}

/// Green marker, red pipe
pub fn green_marker_and_pipe() -> RgbImage {
    let mut img = blank(400, 320);
    fill_rect(&mut img, 40, 40, 100, 100, MARKER_GREEN);
    fill_rect(&mut img, 240, 60, 40, 200, PIPE_RED);
    img
}

/// Table with large = 400-1500 mm
pub fn wide_large_table() -> pipemeasure::CategoryTable {
    use pipemeasure::{CategoryRange, CategoryTable};
    CategoryTable::new(vec![
        CategoryRange::new("small", 100.0, 250.0),
        CategoryRange::new("medium", 251.0, 399.0),
        CategoryRange::new("large", 400.0, 1500.0),
    ])
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    let rel = ((actual - expected) / expected).abs();
    assert!(
        rel <= tolerance,
        "{what}: {actual} differs from {expected} by {:.2}%",
        rel * 100.0
    );
}
