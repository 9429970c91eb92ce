use nalgebra::{Point2, Vector2};
use serde::Serialize;

use crate::bbox::BBox;

/// Counting line through two points. Only the infinite line matters, the
/// endpoints do not bound the test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Line {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Line {
    pub fn new(x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Self {
        Self {
            start: Point2::new(x_1, y_1),
            end: Point2::new(x_2, y_2),
        }
    }

    fn direction(&self) -> Vector2<f64> {
        self.end - self.start
    }

    /// Signed cross product of the line direction with `start -> point`.
    pub fn side(&self, point: &Point2<f64>) -> f64 {
        self.direction().perp(&(*point - self.start))
    }

    /// True when `p` and `q` lie on the same side of the line. A point
    /// exactly on the line is on the same side as anything.
    pub fn is_same_side(&self, p: &Point2<f64>, q: &Point2<f64>) -> bool {
        let side_p = self.side(p);
        let side_q = self.side(q);
        if side_p == 0.0 || side_q == 0.0 {
            return true;
        }
        side_p.signum() == side_q.signum()
    }
}

/// Rectangular danger zone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x_1: f64,
    pub y_1: f64,
    pub x_2: f64,
    pub y_2: f64,
}

impl Rect {
    pub fn new(x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Self {
        Self { x_1, y_1, x_2, y_2 }
    }

    /// Full containment, bounds inclusive. A box straddling the border is
    /// not inside.
    pub fn is_inside(&self, bbox: &BBox) -> bool {
        bbox.x_1 >= self.x_1 && bbox.y_1 >= self.y_1 && bbox.x_2 <= self.x_2 && bbox.y_2 <= self.y_2
    }
}

impl From<[f64; 4]> for Rect {
    fn from([x_1, y_1, x_2, y_2]: [f64; 4]) -> Self {
        Rect::new(x_1, y_1, x_2, y_2)
    }
}

impl From<[f64; 4]> for Line {
    fn from([x_1, y_1, x_2, y_2]: [f64; 4]) -> Self {
        Line::new(x_1, y_1, x_2, y_2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_on_opposite_sides_of_vertical_line() {
        let line = Line::new(100.0, 0.0, 100.0, 500.0);

        assert!(!line.is_same_side(&Point2::new(80.0, 50.0), &Point2::new(120.0, 50.0)));
        assert!(line.is_same_side(&Point2::new(80.0, 50.0), &Point2::new(20.0, 400.0)));
    }

    #[test]
    fn test_same_side_ignores_line_direction() {
        let forward = Line::new(0.0, 0.0, 10.0, 10.0);
        let backward = Line::new(10.0, 10.0, 0.0, 0.0);
        let p = Point2::new(0.0, 5.0);
        let q = Point2::new(5.0, 0.0);

        assert!(!forward.is_same_side(&p, &q));
        assert!(!backward.is_same_side(&p, &q));
    }

    #[test]
    fn test_point_on_line_is_same_side() {
        let line = Line::new(100.0, 0.0, 100.0, 500.0);
        let on_line = Point2::new(100.0, 250.0);

        assert!(line.is_same_side(&on_line, &Point2::new(0.0, 0.0)));
        assert!(line.is_same_side(&Point2::new(200.0, 0.0), &on_line));
    }

    #[test]
    fn test_degenerate_line_never_separates() {
        let line = Line::new(5.0, 5.0, 5.0, 5.0);

        assert!(line.is_same_side(&Point2::new(0.0, 0.0), &Point2::new(10.0, 10.0)));
    }

    #[test]
    fn test_rect_contains_box_fully_inside() {
        let zone = Rect::new(0.0, 0.0, 100.0, 100.0);

        assert!(zone.is_inside(&BBox::new(10.0, 10.0, 50.0, 50.0)));
        assert!(zone.is_inside(&BBox::new(0.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_rect_rejects_straddling_box() {
        let zone = Rect::new(0.0, 0.0, 100.0, 100.0);

        assert!(!zone.is_inside(&BBox::new(90.0, 10.0, 110.0, 50.0)));
        assert!(!zone.is_inside(&BBox::new(-5.0, -5.0, 105.0, 105.0)));
        assert!(!zone.is_inside(&BBox::new(200.0, 200.0, 210.0, 210.0)));
    }
}
