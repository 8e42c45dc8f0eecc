use crate::models::Contour;

/// Physical size of one pipe silhouette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeSize {
    pub width_mm: f64,
    pub length_m: f64,
    pub shape_complexity: f64,
}

/// The short side of the minimum-area rectangle is the pipe's width, the long
/// side its visible length
pub fn measure_pipe(contour: &Contour, pixels_per_mm: f64) -> PipeSize {
    let (short, long) = contour.min_area_rect().sides();

    PipeSize {
        width_mm: round_to(short / pixels_per_mm, 1),
        length_m: round_to(long / pixels_per_mm / 1000.0, 2),
        shape_complexity: round_to(contour.shape_complexity(), 3),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::point::Point;

    fn outline(w: i32, h: i32) -> Contour {
        let (x1, y1) = (w - 1, h - 1);
        let mut points = Vec::new();
        for x in 0..x1 {
            points.push(Point::new(x, 0));
        }
        for y in 0..y1 {
            points.push(Point::new(x1, y));
        }
        for x in (1..=x1).rev() {
            points.push(Point::new(x, y1));
        }
        for y in (1..=y1).rev() {
            points.push(Point::new(0, y));
        }
        Contour::new(0, points)
    }

    #[test]
    fn width_is_the_short_side() {
        let size = measure_pipe(&outline(200, 40), 0.1);

        assert_eq!(size.width_mm, 400.0);
        assert_eq!(size.length_m, 2.0);
        assert_eq!(size.shape_complexity, 1.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(402.0149, 1), 402.0);
        assert_eq!(round_to(2.0151, 2), 2.02);
    }
}
