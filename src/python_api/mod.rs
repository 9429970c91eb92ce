mod py_danger_zone;
mod py_defect_detection;
mod py_detection;
mod py_metric;
mod py_part_counter;

pub use py_danger_zone::PyDangerZone;
pub use py_defect_detection::PyDefectDetection;
pub use py_detection::PyDetection;
pub use py_metric::PyMetric;
pub use py_part_counter::PyPartCounter;

use pyo3::{PyErr, PyRef, exceptions::PyValueError};

use crate::{ConfigError, Detection, ReportedObject};

/// `(x1, y1, x2, y2, id)` as the inference module draws them.
pub type PyObj = (f64, f64, f64, f64, u32);

impl From<ConfigError> for PyErr {
    fn from(err: ConfigError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn to_detections(detections: &[PyRef<'_, PyDetection>]) -> Vec<Detection> {
    detections
        .iter()
        .map(|detection| detection.inner.clone())
        .collect()
}

fn to_obj(object: &ReportedObject) -> PyObj {
    (
        object.bbox.x_1,
        object.bbox.y_1,
        object.bbox.x_2,
        object.bbox.y_2,
        object.id,
    )
}
