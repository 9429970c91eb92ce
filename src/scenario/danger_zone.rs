use std::collections::{HashMap, HashSet};

use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::{
    bbox::BBox,
    config::{ConfigChange, InferenceMode, Threshold},
    detection::Detection,
    error::ConfigError,
    geometry::Rect,
    scenario::{
        FrameReport, Metric, ReportedObject, Scenario, ScenarioEvent, prune_states, unsupported,
    },
    tracker::{Tracker, TrackerParams},
};

const VIOLATION: &str = "violation";

#[derive(Clone)]
struct DangerZoneConfig {
    threshold: Threshold,
    zones: Vec<Rect>,
    targets: HashSet<String>,
}

struct ZoneState {
    bbox: BBox,
    expired: bool,
}

struct DangerZoneState {
    tracker: Tracker,
    detected: HashMap<u32, ZoneState>,
    counter: u64,
}

/// Counts target objects entering any danger zone. Only detections whose tag
/// is a configured target are tracked at all.
pub struct DangerZone {
    config: RwLock<DangerZoneConfig>,
    state: Mutex<DangerZoneState>,
}

impl DangerZone {
    pub fn new(threshold: Threshold, params: TrackerParams) -> Self {
        Self {
            config: RwLock::new(DangerZoneConfig {
                threshold,
                zones: Vec::new(),
                targets: HashSet::new(),
            }),
            state: Mutex::new(DangerZoneState {
                tracker: Tracker::new(params),
                detected: HashMap::new(),
                counter: 0,
            }),
        }
    }

    pub fn set_threshold(&self, threshold: Threshold) {
        info!(threshold = threshold.fraction(), "danger zone threshold updated");
        self.config.write().threshold = threshold;
    }

    /// Replaces every zone at once.
    pub fn set_zones(&self, zones: Vec<Rect>) {
        info!(zones = zones.len(), "danger zones updated");
        self.config.write().zones = zones;
    }

    pub fn set_targets<I, S>(&self, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: HashSet<String> = targets.into_iter().map(Into::into).collect();
        info!(?targets, "danger zone targets updated");
        self.config.write().targets = targets;
    }

    pub fn threshold(&self) -> Threshold {
        self.config.read().threshold
    }

    pub fn zones(&self) -> Vec<Rect> {
        self.config.read().zones.clone()
    }

    pub fn targets(&self) -> HashSet<String> {
        self.config.read().targets.clone()
    }

    pub fn is_inside_zones(&self, bbox: &BBox) -> bool {
        self.config.read().zones.iter().any(|zone| zone.is_inside(bbox))
    }
}

impl Default for DangerZone {
    fn default() -> Self {
        let defaults = InferenceMode::EmployeeSafety.defaults();
        Self::new(defaults.threshold, defaults.tracker)
    }
}

impl Scenario for DangerZone {
    fn name(&self) -> &'static str {
        "danger_zone"
    }

    fn mode(&self) -> InferenceMode {
        InferenceMode::EmployeeSafety
    }

    fn update(&self, detections: &[Detection]) -> FrameReport {
        let mut state = self.state.lock();
        let config = self.config.read().clone();

        let boxes: Vec<BBox> = detections
            .iter()
            .filter(|detection| config.threshold.passes(detection.score))
            .filter(|detection| config.targets.contains(&detection.tag))
            .map(|detection| detection.bbox)
            .collect();

        let DangerZoneState {
            tracker,
            detected,
            counter,
        } = &mut *state;
        tracker.update(&boxes);

        let mut objects = Vec::new();
        let mut events = Vec::new();

        for obj in tracker.get_objs() {
            let zone_state = detected.entry(obj.id).or_insert(ZoneState {
                bbox: obj.bbox,
                expired: false,
            });

            if !zone_state.expired {
                match config.zones.iter().position(|zone| zone.is_inside(&obj.bbox)) {
                    Some(zone) => {
                        zone_state.expired = true;
                        *counter += 1;
                        info!(track_id = obj.id, zone, total = *counter, "danger zone violation");
                        events.push(ScenarioEvent::ZoneViolation {
                            track_id: obj.id,
                            zone,
                            bbox: obj.bbox,
                        });
                    }
                    None => zone_state.bbox = obj.bbox,
                }
            }

            objects.push(ReportedObject {
                id: obj.id,
                bbox: obj.bbox,
                tag: None,
                score: None,
                expired: zone_state.expired,
            });
        }

        prune_states(detected, tracker);

        FrameReport {
            counters: vec![Metric::new(VIOLATION, *counter)],
            objects,
            events,
        }
    }

    fn reset_metrics(&self) {
        self.state.lock().counter = 0;
    }

    fn get_metrics(&self) -> Vec<Metric> {
        vec![Metric::new(VIOLATION, self.state.lock().counter)]
    }

    fn apply(&self, change: ConfigChange) -> Result<(), ConfigError> {
        match change {
            ConfigChange::Threshold(threshold) => self.set_threshold(threshold),
            ConfigChange::Zones(zones) => self.set_zones(zones),
            ConfigChange::Targets(targets) => self.set_targets(targets),
            other => return Err(unsupported(self.name(), &other)),
        }
        Ok(())
    }
}
