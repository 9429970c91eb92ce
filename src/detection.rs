use crate::bbox::BBox;

/// One detector output for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub tag: String,
    pub bbox: BBox,
    pub score: f64,
}

impl Detection {
    pub fn new(tag: impl Into<String>, x_1: f64, y_1: f64, x_2: f64, y_2: f64, score: f64) -> Self {
        Self {
            tag: tag.into(),
            bbox: BBox::new(x_1, y_1, x_2, y_2),
            score,
        }
    }
}

impl AsRef<Detection> for Detection {
    fn as_ref(&self) -> &Detection {
        self
    }
}
