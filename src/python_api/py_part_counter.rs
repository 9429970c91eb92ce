use pyo3::{PyRef, PyResult, pyclass, pymethods};

use crate::{
    Line, PartCounter, Scenario, Threshold, TrackerParams,
    python_api::{PyDetection, PyMetric, PyObj, to_detections, to_obj},
};

#[pyclass(name = "PartCounter")]
pub struct PyPartCounter {
    inner: PartCounter,
}

#[pymethods]
impl PyPartCounter {
    #[new]
    #[pyo3(signature = (threshold = 0.5, max_age = 5, min_hits = 5, iou_threshold = 0.3))]
    pub fn new(threshold: f64, max_age: u32, min_hits: u32, iou_threshold: f64) -> PyResult<Self> {
        Ok(Self {
            inner: PartCounter::new(
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

    /// Returns `(counter, objs, counted_ids)`.
    pub fn update(&self, detections: Vec<PyRef<PyDetection>>) -> (u64, Vec<PyObj>, Vec<u32>) {
        let report = self.inner.update(&to_detections(&detections));

        (
            report.count("all_objects").unwrap_or_default(),
            report.objects.iter().map(to_obj).collect(),
            report.counted(),
        )
    }
}
