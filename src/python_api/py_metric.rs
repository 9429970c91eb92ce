use pyo3::{pyclass, pymethods};

use crate::Metric;

#[pyclass(name = "Metric")]
pub struct PyMetric {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub count: u64,
}

impl From<Metric> for PyMetric {
    fn from(metric: Metric) -> Self {
        Self {
            name: metric.name,
            count: metric.count,
        }
    }
}

#[pymethods]
impl PyMetric {
    fn __repr__(&self) -> String {
        format!("Metric(name={}, count={})", self.name, self.count)
    }
}
