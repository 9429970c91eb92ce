use pyo3::{PyRef, PyResult, pyclass, pymethods};

use crate::{
    DefectDetection, Line, Scenario, Threshold, TrackerParams,
    python_api::{PyDetection, PyMetric, to_detections},
};

/// `(x1, y1, x2, y2, id, tag, score)`.
type PyLabelledObj = (f64, f64, f64, f64, u32, String, f64);

#[pyclass(name = "DefectDetection")]
pub struct PyDefectDetection {
    inner: DefectDetection,
}

#[pymethods]
impl PyDefectDetection {
    #[new]
    #[pyo3(signature = (threshold = 0.35, max_age = 5, min_hits = 1, iou_threshold = 0.2))]
    pub fn new(threshold: f64, max_age: u32, min_hits: u32, iou_threshold: f64) -> PyResult<Self> {
        Ok(Self {
            inner: DefectDetection::new(
                Threshold::from_fraction(threshold)?,
                TrackerParams::new(max_age, min_hits, iou_threshold),
            ),
        })
    }

    pub fn set_threshold(&self, threshold: f64) -> PyResult<()> {
        self.inner.set_threshold(Threshold::from_fraction(threshold)?);
        Ok(())
    }

    pub fn set_line(&self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.inner.set_line(Some(Line::new(x1, y1, x2, y2)));
    }

    /// Keeps tracking but stops counting.
    pub fn clear_line(&self) {
        self.inner.set_line(None);
    }

    pub fn set_ok(&self, name: String) {
        self.inner.set_ok(name);
    }

    pub fn set_ng(&self, name: String) {
        self.inner.set_ng(name);
    }

    pub fn reset_metrics(&self) {
        self.inner.reset_metrics();
    }

    pub fn get_metrics(&self) -> Vec<PyMetric> {
        self.inner
            .get_metrics()
            .into_iter()
            .map(PyMetric::from)
            .collect()
    }

    /// Returns the confirmed objects with their stored tag and score.
    pub fn update(&self, detections: Vec<PyRef<PyDetection>>) -> Vec<PyLabelledObj> {
        let report = self.inner.update(&to_detections(&detections));

        report
            .objects
            .into_iter()
            .map(|object| {
                (
                    object.bbox.x_1,
                    object.bbox.y_1,
                    object.bbox.x_2,
                    object.bbox.y_2,
                    object.id,
                    object.tag.unwrap_or_default(),
                    object.score.unwrap_or_default(),
                )
            })
            .collect()
    }
}
