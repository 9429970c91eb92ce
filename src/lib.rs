mod associate;
mod bbox;
mod detection;
mod geometry;
mod track;
mod tracker;

pub mod config;
pub mod error;
pub mod scenario;

#[cfg(feature = "python")]
mod python_api;

pub use bbox::BBox;
pub use config::{ConfigChange, InferenceMode, ScenarioConfig, Threshold};
pub use detection::Detection;
pub use error::ConfigError;
pub use geometry::{Line, Rect};
pub use scenario::{
    DangerZone, DedupPolicy, DefectDetection, FrameReport, Metric, PartCounter, ReportedObject,
    Scenario, ScenarioEvent,
};
pub use track::TrackedObject;
pub use tracker::{Tracker, TrackerParams};

#[cfg(feature = "python")]
use pyo3::{
    Bound, PyResult, pymodule,
    types::{PyModule, PyModuleMethods},
};

#[cfg(feature = "python")]
use crate::python_api::{PyDangerZone, PyDefectDetection, PyDetection, PyMetric, PyPartCounter};

#[cfg(feature = "python")]
#[pymodule]
fn vision_scenarios(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDetection>()?;
    m.add_class::<PyMetric>()?;
    m.add_class::<PyPartCounter>()?;
    m.add_class::<PyDefectDetection>()?;
    m.add_class::<PyDangerZone>()?;

    Ok(())
}
