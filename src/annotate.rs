use crate::models::{Contour, MeasurementResult, RotatedRect};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

pub const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const PIPE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
/// Marker candidates in debug overlays
pub const CANDIDATE_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

/// Trace a closed outline
pub fn draw_contour(canvas: &mut RgbImage, contour: &Contour, color: Rgb<u8>) {
    let points = &contour.points;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        draw_line_segment_mut(canvas, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
    }
}

pub fn draw_rect(canvas: &mut RgbImage, rect: &RotatedRect, color: Rgb<u8>) {
    let corners = rect.corners;
    for i in 0..4 {
        let (ax, ay) = corners[i];
        let (bx, by) = corners[(i + 1) % 4];
        draw_line_segment_mut(canvas, (ax as f32, ay as f32), (bx as f32, by as f32), color);
    }
}

/// Copy of the photo with the marker outlined in green, and each pipe with
/// its fitted rectangle and a centroid dot in yellow. The figures themselves
/// belong in the report. The input is left untouched.
pub fn render(image: &RgbImage, result: &MeasurementResult) -> RgbImage {
    let mut canvas = image.clone();

    draw_contour(&mut canvas, &result.marker, MARKER_COLOR);

    for record in &result.measurements {
        draw_contour(&mut canvas, &record.contour, PIPE_COLOR);
        draw_rect(&mut canvas, &record.contour.min_area_rect(), PIPE_COLOR);
        if let Some((cx, cy)) = record.contour.centroid() {
            draw_filled_circle_mut(&mut canvas, (cx.round() as i32, cy.round() as i32), 3, PIPE_COLOR);
        }
    }

    canvas
}

/// Mask in gray with contours drawn over it, for debug output
pub fn overlay_on_mask(mask: &GrayImage, layers: &[(&[Contour], Rgb<u8>)]) -> RgbImage {
    let mut canvas = RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y)[0] / 2;
        Rgb([v, v, v])
    });
    for (contours, color) in layers {
        for contour in contours.iter() {
            draw_contour(&mut canvas, contour, *color);
        }
    }
    canvas
}
