use pyo3::{PyRef, PyResult, pyclass, pymethods};

use crate::{
    DangerZone, Rect, Scenario, Threshold, TrackerParams,
    python_api::{PyDetection, PyMetric, PyObj, to_detections, to_obj},
};

#[pyclass(name = "DangerZone")]
pub struct PyDangerZone {
    inner: DangerZone,
}

#[pymethods]
impl PyDangerZone {
    #[new]
    #[pyo3(signature = (threshold = 0.5, max_age = 20, min_hits = 10, iou_threshold = 0.5))]
    pub fn new(threshold: f64, max_age: u32, min_hits: u32, iou_threshold: f64) -> PyResult<Self> {
        Ok(Self {
            inner: DangerZone::new(
                Threshold::from_fraction(threshold)?,
                TrackerParams::new(max_age, min_hits, iou_threshold),
            ),
        })
    }

    pub fn set_threshold(&self, threshold: f64) -> PyResult<()> {
        self.inner.set_threshold(Threshold::from_fraction(threshold)?);
        Ok(())
    }

    pub fn set_zones(&self, zones: Vec<[f64; 4]>) {
        self.inner
            .set_zones(zones.into_iter().map(Rect::from).collect());
    }

    pub fn set_targets(&self, targets: Vec<String>) {
        self.inner.set_targets(targets);
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
            report.count("violation").unwrap_or_default(),
            report.objects.iter().map(to_obj).collect(),
            report.counted(),
        )
    }
}
