use std::collections::{HashMap, hash_map::Entry};

use nalgebra::Point2;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::{
    bbox::BBox,
    config::{ConfigChange, InferenceMode, Threshold},
    detection::Detection,
    error::ConfigError,
    geometry::Line,
    scenario::{
        FrameReport, Metric, ReportedObject, Scenario, ScenarioEvent, prune_states, unsupported,
    },
    tracker::{Tracker, TrackerParams},
};

const ALL_OBJECTS: &str = "all_objects";

#[derive(Clone)]
struct PartCounterConfig {
    threshold: Threshold,
    line: Option<Line>,
}

struct PartState {
    centroid: Point2<f64>,
    expired: bool,
}

struct PartCounterState {
    tracker: Tracker,
    detected: HashMap<u32, PartState>,
    counter: u64,
}

/// Counts every object whose centroid crosses the configured line, once per
/// track. Without a line objects are tracked but never counted.
pub struct PartCounter {
    config: RwLock<PartCounterConfig>,
    state: Mutex<PartCounterState>,
}

impl PartCounter {
    pub fn new(threshold: Threshold, params: TrackerParams) -> Self {
        Self {
            config: RwLock::new(PartCounterConfig {
                threshold,
                line: None,
            }),
            state: Mutex::new(PartCounterState {
                tracker: Tracker::new(params),
                detected: HashMap::new(),
                counter: 0,
            }),
        }
    }

    pub fn set_threshold(&self, threshold: Threshold) {
        info!(threshold = threshold.fraction(), "part counter threshold updated");
        self.config.write().threshold = threshold;
    }

    pub fn set_line(&self, line: Option<Line>) {
        info!(?line, "part counter line updated");
        self.config.write().line = line;
    }

    pub fn threshold(&self) -> Threshold {
        self.config.read().threshold
    }

    pub fn line(&self) -> Option<Line> {
        self.config.read().line
    }
}

impl Default for PartCounter {
    fn default() -> Self {
        let defaults = InferenceMode::PartCounting.defaults();
        Self::new(defaults.threshold, defaults.tracker)
    }
}

impl Scenario for PartCounter {
    fn name(&self) -> &'static str {
        "part_counter"
    }

    fn mode(&self) -> InferenceMode {
        InferenceMode::PartCounting
    }

    fn update(&self, detections: &[Detection]) -> FrameReport {
        let mut state = self.state.lock();
        let config = self.config.read().clone();

        let boxes: Vec<BBox> = detections
            .iter()
            .filter(|detection| config.threshold.passes(detection.score))
            .map(|detection| detection.bbox)
            .collect();

        let PartCounterState {
            tracker,
            detected,
            counter,
        } = &mut *state;
        tracker.update(&boxes);

        let mut objects = Vec::new();
        let mut events = Vec::new();

        for obj in tracker.get_objs() {
            let centroid = obj.bbox.centroid();
            let part = match detected.entry(obj.id) {
                Entry::Vacant(entry) => entry.insert(PartState {
                    centroid,
                    expired: false,
                }),
                Entry::Occupied(entry) => {
                    let part = entry.into_mut();
                    if !part.expired {
                        let crossed = config
                            .line
                            .is_some_and(|line| !line.is_same_side(&centroid, &part.centroid));
                        if crossed {
                            part.expired = true;
                            *counter += 1;
                            info!(
                                track_id = obj.id,
                                x = centroid.x,
                                y = centroid.y,
                                total = *counter,
                                "part counted"
                            );
                            events.push(ScenarioEvent::LineCrossed {
                                track_id: obj.id,
                                counter: Some(ALL_OBJECTS.to_string()),
                                centroid,
                            });
                        } else {
                            part.centroid = centroid;
                        }
                    }
                    part
                }
            };

            objects.push(ReportedObject {
                id: obj.id,
                bbox: obj.bbox,
                tag: None,
                score: None,
                expired: part.expired,
            });
        }

        prune_states(detected, tracker);

        FrameReport {
            counters: vec![Metric::new(ALL_OBJECTS, *counter)],
            objects,
            events,
        }
    }

    fn reset_metrics(&self) {
        self.state.lock().counter = 0;
    }

    fn get_metrics(&self) -> Vec<Metric> {
        vec![Metric::new(ALL_OBJECTS, self.state.lock().counter)]
    }

    fn apply(&self, change: ConfigChange) -> Result<(), ConfigError> {
        match change {
            ConfigChange::Threshold(threshold) => self.set_threshold(threshold),
            ConfigChange::Line(line) => self.set_line(line),
            other => return Err(unsupported(self.name(), &other)),
        }
        Ok(())
    }
}
