mod danger_zone;
mod defect_detection;
mod part_counter;

use std::collections::HashMap;

use nalgebra::Point2;
use serde::Serialize;

use crate::{
    bbox::BBox,
    config::{ConfigChange, InferenceMode},
    detection::Detection,
    error::ConfigError,
    tracker::Tracker,
};

pub use danger_zone::DangerZone;
pub use defect_detection::{DedupPolicy, DefectDetection, remove_overlapping};
pub use part_counter::PartCounter;

/// Common contract of the scenario engines.
///
/// All methods take `&self`: the frame path and the control path may share
/// one engine across threads. Every engine serializes `update` and
/// `reset_metrics` internally and reads one configuration snapshot per frame.
pub trait Scenario: Send + Sync {
    fn name(&self) -> &'static str;

    fn mode(&self) -> InferenceMode;

    /// Processes one frame of detections.
    fn update(&self, detections: &[Detection]) -> FrameReport;

    /// Zeroes the counters. Tracking identity and expired tracks survive.
    fn reset_metrics(&self);

    fn get_metrics(&self) -> Vec<Metric>;

    fn apply(&self, change: ConfigChange) -> Result<(), ConfigError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: String,
    pub count: u64,
}

impl Metric {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Countable transition of a track. Each track produces at most one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioEvent {
    LineCrossed {
        track_id: u32,
        /// Counter that was incremented, `None` when the track's tag matched
        /// no configured class.
        counter: Option<String>,
        centroid: Point2<f64>,
    },
    ZoneViolation {
        track_id: u32,
        zone: usize,
        bbox: BBox,
    },
}

impl ScenarioEvent {
    pub fn track_id(&self) -> u32 {
        match self {
            ScenarioEvent::LineCrossed { track_id, .. } => *track_id,
            ScenarioEvent::ZoneViolation { track_id, .. } => *track_id,
        }
    }
}

/// Confirmed track together with what the engine knows about it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportedObject {
    pub id: u32,
    pub bbox: BBox,
    pub tag: Option<String>,
    pub score: Option<f64>,
    pub expired: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub counters: Vec<Metric>,
    pub objects: Vec<ReportedObject>,
    pub events: Vec<ScenarioEvent>,
}

impl FrameReport {
    /// Ids of the tracks counted during this frame.
    pub fn counted(&self) -> Vec<u32> {
        self.events.iter().map(ScenarioEvent::track_id).collect()
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|metric| metric.name == name)
            .map(|metric| metric.count)
    }
}

/// Drops per-track records whose track the tracker no longer holds.
fn prune_states<S>(states: &mut HashMap<u32, S>, tracker: &Tracker) {
    states.retain(|id, _| tracker.is_tracked(*id));
}

fn unsupported(scenario: &'static str, change: &ConfigChange) -> ConfigError {
    ConfigError::Unsupported {
        scenario,
        change: change.kind(),
    }
}
