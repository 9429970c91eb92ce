//! Configuration boundary between the management backend and the engines.
//!
//! Everything coming from outside is validated here; the engines only ever
//! see normalized values.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::ConfigError,
    geometry::{Line, Rect},
    scenario::{DangerZone, DedupPolicy, DefectDetection, PartCounter, Scenario},
    tracker::TrackerParams,
};

/// Detection score cut-off as a fraction in `[0, 1]`. Detections must score
/// strictly above it.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
pub struct Threshold(f64);

impl Threshold {
    /// Integer percent as stored by the backend.
    pub fn from_percent(percent: i64) -> Result<Self, ConfigError> {
        if !(0..=100).contains(&percent) {
            return Err(ConfigError::ThresholdPercentOutOfRange(percent));
        }
        Ok(Self(percent as f64 / 100.0))
    }

    pub fn from_fraction(fraction: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::ThresholdFractionOutOfRange(fraction));
        }
        Ok(Self(fraction))
    }

    pub fn fraction(self) -> f64 {
        self.0
    }

    pub fn passes(self, score: f64) -> bool {
        score > self.0
    }
}

/// Scenario kinds as named by the management backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InferenceMode {
    #[serde(rename = "PC")]
    PartCounting,
    #[serde(rename = "DD")]
    DefectDetection,
    #[serde(rename = "ES")]
    EmployeeSafety,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScenarioDefaults {
    pub threshold: Threshold,
    pub tracker: TrackerParams,
}

impl InferenceMode {
    pub fn defaults(self) -> ScenarioDefaults {
        match self {
            InferenceMode::PartCounting => ScenarioDefaults {
                threshold: Threshold(0.5),
                tracker: TrackerParams::new(5, 5, 0.3),
            },
            InferenceMode::DefectDetection => ScenarioDefaults {
                threshold: Threshold(0.35),
                tracker: TrackerParams::new(5, 1, 0.2),
            },
            InferenceMode::EmployeeSafety => ScenarioDefaults {
                threshold: Threshold(0.5),
                tracker: TrackerParams::new(20, 10, 0.5),
            },
        }
    }
}

/// Runtime configuration change pushed from the control path.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigChange {
    Threshold(Threshold),
    Line(Option<Line>),
    Zones(Vec<Rect>),
    Targets(Vec<String>),
    ClassNames { ok: String, ng: String },
    Dedup(DedupPolicy),
}

impl ConfigChange {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigChange::Threshold(_) => "threshold",
            ConfigChange::Line(_) => "line",
            ConfigChange::Zones(_) => "zones",
            ConfigChange::Targets(_) => "targets",
            ConfigChange::ClassNames { .. } => "class names",
            ConfigChange::Dedup(_) => "dedup",
        }
    }
}

/// Scenario document, e.g.
///
/// ```json
/// {"mode": "ES", "threshold": 60, "zones": [[0, 0, 200, 200]], "targets": ["person"]}
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioConfig {
    pub mode: InferenceMode,
    /// Percent, 0 to 100.
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(default)]
    pub tracker: Option<TrackerParams>,
    #[serde(default)]
    pub line: Option<[f64; 4]>,
    #[serde(default)]
    pub zones: Vec<[f64; 4]>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub ok_name: Option<String>,
    #[serde(default)]
    pub ng_name: Option<String>,
    #[serde(default)]
    pub dedup: Option<DedupPolicy>,
}

impl ScenarioConfig {
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn threshold(&self) -> Result<Threshold, ConfigError> {
        match self.threshold {
            Some(percent) => Threshold::from_percent(percent),
            None => Ok(self.mode.defaults().threshold),
        }
    }

    pub fn tracker_params(&self) -> TrackerParams {
        self.tracker.unwrap_or(self.mode.defaults().tracker)
    }

    /// Builds a configured engine. Fields that do not apply to the mode are
    /// ignored.
    pub fn build(&self) -> Result<Box<dyn Scenario>, ConfigError> {
        let threshold = self.threshold()?;
        let params = self.tracker_params();
        debug!(mode = ?self.mode, threshold = threshold.fraction(), ?params, "building scenario");

        let scenario: Box<dyn Scenario> = match self.mode {
            InferenceMode::PartCounting => {
                let counter = PartCounter::new(threshold, params);
                if let Some(line) = self.line {
                    counter.set_line(Some(Line::from(line)));
                }
                Box::new(counter)
            }
            InferenceMode::DefectDetection => {
                let defects = DefectDetection::new(threshold, params);
                if let Some(line) = self.line {
                    defects.set_line(Some(Line::from(line)));
                }
                if let Some(ok) = &self.ok_name {
                    defects.set_ok(ok.clone());
                }
                if let Some(ng) = &self.ng_name {
                    defects.set_ng(ng.clone());
                }
                if let Some(policy) = self.dedup {
                    defects.set_dedup_policy(policy);
                }
                Box::new(defects)
            }
            InferenceMode::EmployeeSafety => {
                let zone = DangerZone::new(threshold, params);
                zone.set_zones(self.zones.iter().copied().map(Rect::from).collect());
                zone.set_targets(self.targets.clone());
                Box::new(zone)
            }
        };

        Ok(scenario)
    }
}
