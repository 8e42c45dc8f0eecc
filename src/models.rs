use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;
use imageproc::rect::Rect;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Closed boundary of one connected foreground region.
///
/// Points are pixel centers in border-following order, as traced from the mask.
/// A contour never changes after extraction; every geometric property below is
/// computed on demand from `points`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    /// Position in discovery order
    pub index: usize,

    #[serde(serialize_with = "serialize_points")]
    pub points: Vec<Point<i32>>,

    /// Discovery index of the enclosing outer contour, when this region sits
    /// inside a hole of another region
    pub parent: Option<usize>,
}

impl Contour {
    pub fn new(index: usize, points: Vec<Point<i32>>) -> Self {
        Self {
            index,
            points,
            parent: None,
        }
    }

    /// Enclosed polygon area in square pixels
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Closed boundary length in pixels
    pub fn perimeter(&self) -> f64 {
        closed_length(&self.points)
    }

    pub fn convex_hull(&self) -> Vec<Point<i32>> {
        if self.points.is_empty() {
            return Vec::new();
        }
        convex_hull(self.points.as_slice())
    }

    pub fn hull_area(&self) -> f64 {
        polygon_area(&self.convex_hull())
    }

    pub fn hull_perimeter(&self) -> f64 {
        closed_length(&self.convex_hull())
    }

    /// Area divided by convex-hull area; 0.0 when the hull is degenerate
    pub fn solidity(&self) -> f64 {
        let hull_area = self.hull_area();
        if hull_area > 0.0 {
            self.area() / hull_area
        } else {
            0.0
        }
    }

    /// Perimeter divided by convex-hull perimeter (1.0 for a convex outline)
    pub fn shape_complexity(&self) -> f64 {
        let hull_perimeter = self.hull_perimeter();
        if hull_perimeter > 0.0 {
            (self.perimeter() / hull_perimeter).max(1.0)
        } else {
            1.0
        }
    }

    /// Douglas-Peucker reduction with a tolerance of `epsilon_fraction` × perimeter
    pub fn approximate(&self, epsilon_fraction: f64) -> Vec<Point<i32>> {
        let epsilon = epsilon_fraction * self.perimeter();
        if self.points.len() < 3 || epsilon <= 0.0 {
            return self.points.clone();
        }
        approximate_polygon_dp(&self.points, epsilon, true)
    }

    /// Axis-aligned bounding box of the pixels on the boundary
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32))
    }

    /// Bounding box width over height
    pub fn aspect_ratio(&self) -> f64 {
        match self.bounding_box() {
            Some(rect) => rect.width() as f64 / rect.height() as f64,
            None => 0.0,
        }
    }

    /// Area divided by bounding box area
    pub fn extent(&self) -> f64 {
        match self.bounding_box() {
            Some(rect) => self.area() / (rect.width() as f64 * rect.height() as f64),
            None => 0.0,
        }
    }

    /// Length of the outline running along the outer pixel edges of the region
    pub fn outline_length(&self) -> f64 {
        let Some(bbox) = self.bounding_box() else {
            return 0.0;
        };
        // one empty pixel of margin around the box
        let (w, h) = (bbox.width() as usize + 2, bbox.height() as usize + 2);
        let mut boundary = vec![false; w * h];
        for p in &self.points {
            let x = (p.x - bbox.left()) as usize + 1;
            let y = (p.y - bbox.top()) as usize + 1;
            boundary[y * w + x] = true;
        }

        // 4-connected fill cannot slip between diagonal boundary steps
        let mut outside = vec![false; w * h];
        let mut stack = vec![0usize];
        outside[0] = true;
        while let Some(i) = stack.pop() {
            let (x, y) = (i % w, i / w);
            let mut visit = |j: usize| {
                if !outside[j] && !boundary[j] {
                    outside[j] = true;
                    stack.push(j);
                }
            };
            if x > 0 {
                visit(i - 1);
            }
            if x + 1 < w {
                visit(i + 1);
            }
            if y > 0 {
                visit(i - w);
            }
            if y + 1 < h {
                visit(i + w);
            }
        }

        let mut edges = 0usize;
        for i in 0..w * h {
            if !outside[i] {
                edges += [i - 1, i + 1, i - w, i + w]
                    .iter()
                    .filter(|&&j| outside[j])
                    .count();
            }
        }
        edges as f64
    }

    /// Smallest rectangle at any rotation containing the region's pixels.
    ///
    /// Fitted to the hull of the boundary pixel centers, then grown by half a
    /// pixel on every side, so a solid run of n pixels measures n.
    pub fn min_area_rect(&self) -> RotatedRect {
        let hull: Vec<(f64, f64)> = self
            .convex_hull()
            .iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect();
        if hull.is_empty() {
            return RotatedRect::default();
        }
        rotating_calipers(&hull)
    }

    /// Mean of the boundary points, where the annotation dot goes
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        Some((sx / n, sy / n))
    }
}

/// Rectangle given by its four corners in order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RotatedRect {
    pub corners: [(f64, f64); 4],
}

impl RotatedRect {
    /// Lengths of two adjacent sides, shorter first.
    ///
    /// Taken from the sorted corner-pair distances so the corner order does not
    /// matter: four sides come first, the two diagonals last.
    pub fn sides(&self) -> (f64, f64) {
        let c = self.corners;
        let mut d = [
            distance(c[0], c[1]),
            distance(c[0], c[2]),
            distance(c[0], c[3]),
            distance(c[1], c[2]),
            distance(c[1], c[3]),
            distance(c[2], c[3]),
        ];
        d.sort_by(f64::total_cmp);
        ((d[0] + d[1]) / 2.0, (d[2] + d[3]) / 2.0)
    }

    pub fn short_side(&self) -> f64 {
        self.sides().0
    }

    pub fn long_side(&self) -> f64 {
        self.sides().1
    }

    /// `|cos θ| + |sin θ|` of the rectangle's tilt against the pixel grid:
    /// 1.0 when axis-aligned, √2 at 45°
    pub fn grid_factor(&self) -> f64 {
        let (a, b) = (self.corners[0], self.corners[1]);
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = dx.hypot(dy);
        if len > 0.0 {
            (dx.abs() + dy.abs()) / len
        } else {
            1.0
        }
    }
}

/// One measured pipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub contour: Contour,
    /// Cross-sectional width, rounded to 0.1 mm
    pub width_mm: f64,
    /// Visible length, rounded to 0.01 m
    pub length_m: f64,
    pub category: String,
    /// Perimeter over hull perimeter, rounded to 0.001
    pub shape_complexity: f64,
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementResult {
    pub marker: Contour,
    /// Sorted by ascending `width_mm`
    pub measurements: Vec<MeasurementRecord>,
    pub pixels_per_mm: f64,
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Minimum-area enclosing rectangle of a convex hull, one candidate per hull
/// edge direction, padded by half a pixel
fn rotating_calipers(hull: &[(f64, f64)]) -> RotatedRect {
    // the axis-aligned candidate covers hulls collapsed to a point or segment
    let mut axes = vec![(1.0, 0.0)];
    for (i, &a) in hull.iter().enumerate() {
        let b = hull[(i + 1) % hull.len()];
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = dx.hypot(dy);
        if len > 0.0 {
            axes.push((dx / len, dy / len));
        }
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    for (ux, uy) in axes {
        let (vx, vy) = (-uy, ux);
        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in hull {
            let u = x * ux + y * uy;
            let v = x * vx + y * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
        let (min_u, max_u, min_v, max_v) = (min_u - 0.5, max_u + 0.5, min_v - 0.5, max_v + 0.5);

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_none_or(|(smallest, _)| area < *smallest) {
            let corner = |u: f64, v: f64| (u * ux + v * vx, u * uy + v * vy);
            let rect = RotatedRect {
                corners: [
                    corner(min_u, min_v),
                    corner(max_u, min_v),
                    corner(max_u, max_v),
                    corner(min_u, max_v),
                ],
            };
            best = Some((area, rect));
        }
    }
    best.map(|(_, rect)| rect).unwrap_or_default()
}

fn closed_length(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    arc_length(points, true)
}

/// Shoelace area of a closed polygon
pub(crate) fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

fn serialize_points<S: Serializer>(points: &[Point<i32>], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(points.len()))?;
    for p in points {
        seq.serialize_element(&[p.x, p.y])?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_outline(x0: i32, y0: i32, side: i32) -> Vec<Point<i32>> {
        let last = side - 1;
        let mut points = Vec::new();
        for x in 0..last {
            points.push(Point::new(x0 + x, y0));
        }
        for y in 0..last {
            points.push(Point::new(x0 + last, y0 + y));
        }
        for x in (1..=last).rev() {
            points.push(Point::new(x0 + x, y0 + last));
        }
        for y in (1..=last).rev() {
            points.push(Point::new(x0, y0 + y));
        }
        points
    }

    #[test]
    fn square_geometry() {
        let contour = Contour::new(0, square_outline(10, 20, 50));

        assert_eq!(contour.area(), 49.0 * 49.0);
        assert!((contour.perimeter() - 4.0 * 49.0).abs() < 1e-9);
        assert!((contour.solidity() - 1.0).abs() < 1e-9);
        assert!((contour.shape_complexity() - 1.0).abs() < 1e-9);

        let bbox = contour.bounding_box().unwrap();
        assert_eq!((bbox.left(), bbox.top(), bbox.width(), bbox.height()), (10, 20, 50, 50));
        assert!((contour.aspect_ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn min_area_rect_spans_whole_pixels() {
        let contour = Contour::new(0, square_outline(0, 0, 30));
        let rect = contour.min_area_rect();

        assert!((rect.short_side() - 30.0).abs() < 1e-6);
        assert!((rect.long_side() - 30.0).abs() < 1e-6);
        assert!((rect.grid_factor() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tilted_rect_keeps_fractional_corners() {
        // pixel centers of a diamond, sides at 45 degrees
        let contour = Contour::new(
            0,
            vec![Point::new(10, 0), Point::new(20, 10), Point::new(10, 20), Point::new(0, 10)],
        );
        let rect = contour.min_area_rect();

        let side = 10.0 * 2f64.sqrt() + 1.0;
        assert!((rect.short_side() - side).abs() < 1e-6, "short {}", rect.short_side());
        assert!((rect.long_side() - side).abs() < 1e-6, "long {}", rect.long_side());
        assert!((rect.grid_factor() - 2f64.sqrt()).abs() < 1e-9);
        assert!(rect.corners.iter().any(|(x, _)| x.fract().abs() > 1e-3));
    }

    #[test]
    fn outline_follows_pixel_edges() {
        assert_eq!(Contour::new(0, square_outline(5, 5, 30)).outline_length(), 120.0);
        assert_eq!(Contour::new(0, vec![Point::new(3, 3)]).outline_length(), 4.0);

        // corner pixels cut away: the staircase is as long as the corner it replaces
        let mut points = square_outline(0, 0, 10);
        points.retain(|p| *p != Point::new(0, 0));
        assert_eq!(Contour::new(0, points).outline_length(), 40.0);
    }

    #[test]
    fn degenerate_contour_has_no_area() {
        let contour = Contour::new(0, vec![Point::new(3, 3)]);

        assert_eq!(contour.area(), 0.0);
        assert_eq!(contour.perimeter(), 0.0);
        assert_eq!(contour.solidity(), 0.0);
        assert_eq!(contour.approximate(0.02).len(), 1);
    }

    #[test]
    fn points_serialize_as_pairs() {
        let contour = Contour::new(4, vec![Point::new(1, 2), Point::new(3, 4)]);
        let json = serde_json::to_value(&contour).unwrap();

        assert_eq!(json["index"], 4);
        assert_eq!(json["points"], serde_json::json!([[1, 2], [3, 4]]));
        assert!(json["parent"].is_null());
    }
}
