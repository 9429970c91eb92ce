use pyo3::{pyclass, pymethods};

use crate::Detection;

#[pyclass(name = "Detection")]
pub struct PyDetection {
    pub inner: Detection,
}

#[pymethods]
impl PyDetection {
    #[new]
    pub fn new(tag: String, x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> Self {
        Self {
            inner: Detection::new(tag, x1, y1, x2, y2, score),
        }
    }

    #[getter]
    fn tag(&self) -> String {
        self.inner.tag.clone()
    }

    #[getter]
    fn x1(&self) -> f64 {
        self.inner.bbox.x_1
    }

    #[getter]
    fn y1(&self) -> f64 {
        self.inner.bbox.y_1
    }

    #[getter]
    fn x2(&self) -> f64 {
        self.inner.bbox.x_2
    }

    #[getter]
    fn y2(&self) -> f64 {
        self.inner.bbox.y_2
    }

    #[getter]
    fn score(&self) -> f64 {
        self.inner.score
    }

    fn __repr__(&self) -> String {
        format!(
            "Detection(tag={}, x1={}, y1={}, x2={}, y2={}, score={})",
            self.inner.tag,
            self.x1(),
            self.y1(),
            self.x2(),
            self.y2(),
            self.score()
        )
    }
}
