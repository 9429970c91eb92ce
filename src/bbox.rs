use nalgebra::Point2;
use serde::Serialize;

/// Axis aligned box in pixel coordinates, `(x_1, y_1)` top left and
/// `(x_2, y_2)` bottom right.
///
/// Boxes with `x_1 >= x_2` or `y_1 >= y_2` are kept as given but have zero
/// area, so they never overlap anything.
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize)]
pub struct BBox {
    pub x_1: f64,
    pub y_1: f64,
    pub x_2: f64,
    pub y_2: f64,
}

impl BBox {
    pub fn new(x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Self {
        BBox { x_1, y_1, x_2, y_2 }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.x_1 < self.x_2 && self.y_1 < self.y_2)
    }

    pub fn area(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (self.x_2 - self.x_1) * (self.y_2 - self.y_1)
    }

    pub fn centroid(&self) -> Point2<f64> {
        Point2::new((self.x_1 + self.x_2) / 2.0, (self.y_1 + self.y_2) / 2.0)
    }

    pub fn iou(&self, other: &Self) -> f64 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.0;
        }
        let iwidth = (self.x_2.min(other.x_2) - self.x_1.max(other.x_1)).max(0.0);
        let iheight = (self.y_2.min(other.y_2) - self.y_1.max(other.y_1)).max(0.0);
        let iarea = iwidth * iheight;

        let union = self.area() + other.area() - iarea;

        if union <= 0.0 {
            return 0.0;
        }

        iarea / union
    }
}

impl From<[f64; 4]> for BBox {
    fn from([x_1, y_1, x_2, y_2]: [f64; 4]) -> Self {
        BBox::new(x_1, y_1, x_2, y_2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_bbox_has_zero_area() {
        let bbox = BBox::new(3.0, 4.0, 2.0, 5.0);

        assert!(bbox.is_degenerate());
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_iou_returns_correct_value_1() {
        let bbox_1 = BBox::new(1.0, 1.0, 2.0, 2.0);
        let bbox_2 = BBox::new(1.0, 1.0, 1.5, 1.5);

        assert_eq!(bbox_1.iou(&bbox_2), 0.25)
    }

    #[test]
    fn test_iou_returns_correct_value_2() {
        let bbox_1 = BBox::new(0.0, 0.0, 1.0, 2.0);
        let bbox_2 = BBox::new(1.0, 2.0, 3.0, 3.0);

        assert_eq!(bbox_1.iou(&bbox_2), 0.0)
    }

    #[test]
    fn test_iou_returns_correct_value_3() {
        let bbox_1 = BBox::new(0.0, 0.0, 3.0, 3.0);
        let bbox_2 = BBox::new(1.0, 1.0, 2.0, 2.0);

        assert_eq!(bbox_1.iou(&bbox_2), 1.0 / 9.0)
    }

    #[test]
    fn test_iou_of_identical_boxes_is_one() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 60.0);

        assert_eq!(bbox.iou(&bbox), 1.0)
    }

    #[test]
    fn test_iou_with_degenerate_bbox_is_zero() {
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        let flat = BBox::new(2.0, 2.0, 8.0, 2.0);
        let inverted = BBox::new(8.0, 8.0, 2.0, 2.0);

        assert_eq!(bbox.iou(&flat), 0.0);
        assert_eq!(flat.iou(&bbox), 0.0);
        assert_eq!(inverted.iou(&inverted), 0.0);
    }

    #[test]
    fn test_centroid_is_box_center() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 60.0);

        assert_eq!(bbox.centroid(), Point2::new(20.0, 40.0));
    }
}
