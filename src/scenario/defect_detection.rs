use std::collections::{HashMap, hash_map::Entry};

use itertools::Itertools;
use nalgebra::Point2;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

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

/// Overlap above which two detections are taken to be the same object, both
/// for cleanup and for recovering a track's tag.
const OVERLAP_IOU: f64 = 0.3;

/// How overlapping ok/ng detections of one object are cleaned up before
/// tracking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Remove detections until no two remaining ones overlap.
    #[default]
    Full,
    /// Remove at most one detection per frame, looking only at neighbours in
    /// input order.
    SinglePass,
}

/// Removes the lower scoring detection of overlapping pairs. On equal scores
/// the later detection of the pair goes.
pub fn remove_overlapping(detections: &mut Vec<Detection>, policy: DedupPolicy) {
    loop {
        let pair = match policy {
            DedupPolicy::Full => (0..detections.len())
                .tuple_combinations()
                .find(|&(i, j)| detections[i].bbox.iou(&detections[j].bbox) > OVERLAP_IOU),
            DedupPolicy::SinglePass => (0..detections.len())
                .tuple_windows()
                .find(|&(i, j)| detections[i].bbox.iou(&detections[j].bbox) > OVERLAP_IOU),
        };
        let Some((i, j)) = pair else {
            return;
        };

        let removed = if detections[i].score < detections[j].score { i } else { j };
        let detection = detections.remove(removed);
        debug!(tag = %detection.tag, score = detection.score, "overlapping detection removed");

        if policy == DedupPolicy::SinglePass {
            return;
        }
    }
}

#[derive(Clone)]
struct DefectConfig {
    threshold: Threshold,
    line: Option<Line>,
    ok_name: String,
    ng_name: String,
    dedup: DedupPolicy,
}

struct DefectState {
    centroid: Point2<f64>,
    expired: bool,
    tag: String,
    score: f64,
}

struct DefectDetectionState {
    tracker: Tracker,
    detected: HashMap<u32, DefectState>,
    ok_counter: u64,
    ng_counter: u64,
}

/// Ok/ng classification of parts passing a line. Once a track has been seen
/// as ng it stays ng.
pub struct DefectDetection {
    config: RwLock<DefectConfig>,
    state: Mutex<DefectDetectionState>,
}

impl DefectDetection {
    pub fn new(threshold: Threshold, params: TrackerParams) -> Self {
        Self {
            config: RwLock::new(DefectConfig {
                threshold,
                line: None,
                ok_name: "ok".to_string(),
                ng_name: "ng".to_string(),
                dedup: DedupPolicy::default(),
            }),
            state: Mutex::new(DefectDetectionState {
                tracker: Tracker::new(params),
                detected: HashMap::new(),
                ok_counter: 0,
                ng_counter: 0,
            }),
        }
    }

    pub fn set_threshold(&self, threshold: Threshold) {
        info!(threshold = threshold.fraction(), "defect detection threshold updated");
        self.config.write().threshold = threshold;
    }

    pub fn set_line(&self, line: Option<Line>) {
        info!(?line, "defect detection line updated");
        self.config.write().line = line;
    }

    pub fn set_ok(&self, name: String) {
        info!(%name, "ok class renamed");
        self.config.write().ok_name = name;
    }

    pub fn set_ng(&self, name: String) {
        info!(%name, "ng class renamed");
        self.config.write().ng_name = name;
    }

    pub fn set_dedup_policy(&self, policy: DedupPolicy) {
        info!(?policy, "dedup policy updated");
        self.config.write().dedup = policy;
    }

    pub fn threshold(&self) -> Threshold {
        self.config.read().threshold
    }

    pub fn line(&self) -> Option<Line> {
        self.config.read().line
    }

    /// `(ok, ng)` class names.
    pub fn class_names(&self) -> (String, String) {
        let config = self.config.read();
        (config.ok_name.clone(), config.ng_name.clone())
    }

    pub fn dedup_policy(&self) -> DedupPolicy {
        self.config.read().dedup
    }
}

impl Default for DefectDetection {
    fn default() -> Self {
        let defaults = InferenceMode::DefectDetection.defaults();
        Self::new(defaults.threshold, defaults.tracker)
    }
}

/// Tag and score of the detection overlapping `bbox` the most.
fn best_match<'a>(bbox: &BBox, detections: &'a [Detection]) -> Option<&'a Detection> {
    detections
        .iter()
        .map(|detection| (detection, bbox.iou(&detection.bbox)))
        .filter(|(_, iou)| *iou > OVERLAP_IOU)
        .min_by(|a, b| b.1.total_cmp(&a.1))
        .map(|(detection, _)| detection)
}

impl Scenario for DefectDetection {
    fn name(&self) -> &'static str {
        "defect_detection"
    }

    fn mode(&self) -> InferenceMode {
        InferenceMode::DefectDetection
    }

    fn update(&self, detections: &[Detection]) -> FrameReport {
        let mut state = self.state.lock();
        let config = self.config.read().clone();

        let mut detections: Vec<Detection> = detections
            .iter()
            .filter(|detection| config.threshold.passes(detection.score))
            .cloned()
            .collect();
        remove_overlapping(&mut detections, config.dedup);

        let boxes: Vec<BBox> = detections.iter().map(|detection| detection.bbox).collect();

        let DefectDetectionState {
            tracker,
            detected,
            ok_counter,
            ng_counter,
        } = &mut *state;
        tracker.update(&boxes);

        let mut objects = Vec::new();
        let mut events = Vec::new();

        for obj in tracker.get_objs() {
            let (tag, score) = match best_match(&obj.bbox, &detections) {
                Some(detection) => (detection.tag.clone(), detection.score),
                None => (config.ok_name.clone(), 0.0),
            };
            let centroid = obj.bbox.centroid();

            let defect = match detected.entry(obj.id) {
                Entry::Vacant(entry) => entry.insert(DefectState {
                    centroid,
                    expired: false,
                    tag,
                    score,
                }),
                Entry::Occupied(entry) => {
                    let defect = entry.into_mut();
                    defect.score = score;
                    if tag == config.ng_name {
                        defect.tag = tag;
                    }
                    if !defect.expired {
                        let crossed = config
                            .line
                            .is_some_and(|line| !line.is_same_side(&centroid, &defect.centroid));
                        if crossed {
                            defect.expired = true;
                            let counted = if defect.tag == config.ok_name {
                                *ok_counter += 1;
                                Some(config.ok_name.clone())
                            } else if defect.tag == config.ng_name {
                                *ng_counter += 1;
                                Some(config.ng_name.clone())
                            } else {
                                None
                            };
                            info!(
                                track_id = obj.id,
                                tag = %defect.tag,
                                counter = ?counted,
                                "part classified"
                            );
                            events.push(ScenarioEvent::LineCrossed {
                                track_id: obj.id,
                                counter: counted,
                                centroid,
                            });
                        } else {
                            defect.centroid = centroid;
                        }
                    }
                    defect
                }
            };

            objects.push(ReportedObject {
                id: obj.id,
                bbox: obj.bbox,
                tag: Some(defect.tag.clone()),
                score: Some(defect.score),
                expired: defect.expired,
            });
        }

        prune_states(detected, tracker);

        FrameReport {
            counters: vec![
                Metric::new(config.ok_name.clone(), *ok_counter),
                Metric::new(config.ng_name.clone(), *ng_counter),
            ],
            objects,
            events,
        }
    }

    fn reset_metrics(&self) {
        let mut state = self.state.lock();
        state.ok_counter = 0;
        state.ng_counter = 0;
    }

    fn get_metrics(&self) -> Vec<Metric> {
        let state = self.state.lock();
        let config = self.config.read();
        vec![
            Metric::new(config.ok_name.clone(), state.ok_counter),
            Metric::new(config.ng_name.clone(), state.ng_counter),
        ]
    }

    fn apply(&self, change: ConfigChange) -> Result<(), ConfigError> {
        match change {
            ConfigChange::Threshold(threshold) => self.set_threshold(threshold),
            ConfigChange::Line(line) => self.set_line(line),
            ConfigChange::ClassNames { ok, ng } => {
                self.set_ok(ok);
                self.set_ng(ng);
            }
            ConfigChange::Dedup(policy) => self.set_dedup_policy(policy),
            other => return Err(unsupported(self.name(), &other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> DefectDetection {
        let defects = DefectDetection::new(
            Threshold::from_fraction(0.35).unwrap(),
            TrackerParams::new(5, 1, 0.2),
        );
        defects.set_line(Some(Line::new(100.0, 0.0, 100.0, 500.0)));
        defects
    }

    fn bottle(tag: &str, center_x: f64, score: f64) -> Detection {
        Detection::new(tag, center_x - 30.0, 100.0, center_x + 30.0, 160.0, score)
    }

    #[test]
    fn test_full_dedup_keeps_highest_score() {
        let mut detections = vec![
            bottle("ok", 50.0, 0.6),
            bottle("ng", 52.0, 0.9),
            bottle("ok", 54.0, 0.7),
        ];

        remove_overlapping(&mut detections, DedupPolicy::Full);

        assert_eq!(detections, vec![bottle("ng", 52.0, 0.9)]);
    }

    #[test]
    fn test_full_dedup_checks_non_adjacent_pairs() {
        let mut detections = vec![
            bottle("ok", 50.0, 0.6),
            bottle("ok", 400.0, 0.8),
            bottle("ng", 52.0, 0.9),
        ];

        remove_overlapping(&mut detections, DedupPolicy::Full);

        assert_eq!(
            detections,
            vec![bottle("ok", 400.0, 0.8), bottle("ng", 52.0, 0.9)]
        );
    }

    #[test]
    fn test_single_pass_removes_one_detection() {
        let mut detections = vec![
            bottle("ok", 50.0, 0.6),
            bottle("ng", 52.0, 0.9),
            bottle("ok", 54.0, 0.7),
        ];

        remove_overlapping(&mut detections, DedupPolicy::SinglePass);

        assert_eq!(
            detections,
            vec![bottle("ng", 52.0, 0.9), bottle("ok", 54.0, 0.7)]
        );
    }

    #[test]
    fn test_dedup_equal_scores_drops_later_detection() {
        let mut detections = vec![bottle("ok", 50.0, 0.8), bottle("ng", 52.0, 0.8)];

        remove_overlapping(&mut detections, DedupPolicy::Full);

        assert_eq!(detections, vec![bottle("ok", 50.0, 0.8)]);
    }

    #[test]
    fn test_best_match_prefers_highest_overlap() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 100.0);
        let detections = vec![
            Detection::new("ok", 0.0, 0.0, 100.0, 50.0, 0.9),
            Detection::new("ng", 0.0, 0.0, 100.0, 80.0, 0.4),
        ];

        let detection = best_match(&bbox, &detections).unwrap();

        assert_eq!(detection.tag, "ng");
    }

    #[test]
    fn test_best_match_tie_goes_to_earlier_detection() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 100.0);
        let detections = vec![
            Detection::new("ng", 0.0, 0.0, 100.0, 80.0, 0.5),
            Detection::new("ok", 0.0, 0.0, 100.0, 80.0, 0.9),
        ];

        let detection = best_match(&bbox, &detections).unwrap();

        assert_eq!(detection.tag, "ng");
    }

    #[test]
    fn test_best_match_ignores_small_overlap() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 100.0);
        let detections = vec![Detection::new("ok", 0.0, 0.0, 100.0, 30.0, 0.9)];

        assert!(best_match(&bbox, &detections).is_none());
    }

    #[test]
    fn test_equal_overlap_goes_to_earlier_detection() {
        let defects = detector();
        defects.update(&[bottle("ok", 50.0, 0.9)]);

        // Both overlap the track at 0.5 and each other at 0.2.
        let report = defects.update(&[bottle("ng", 30.0, 0.8), bottle("ok", 70.0, 0.9)]);

        let tags: Vec<(u32, Option<&str>)> = report
            .objects
            .iter()
            .map(|obj| (obj.id, obj.tag.as_deref()))
            .collect();
        assert_eq!(tags, vec![(0, Some("ng")), (1, Some("ok"))]);
    }

    #[test]
    fn test_applied_dedup_policy_changes_tracked_objects() {
        let frame = [
            bottle("ok", 50.0, 0.6),
            bottle("ng", 52.0, 0.9),
            bottle("ok", 54.0, 0.7),
        ];

        let full = detector();
        assert_eq!(full.update(&frame).objects.len(), 1);

        let single_pass = detector();
        single_pass
            .apply(ConfigChange::Dedup(DedupPolicy::SinglePass))
            .unwrap();
        assert_eq!(single_pass.dedup_policy(), DedupPolicy::SinglePass);
        assert_eq!(single_pass.update(&frame).objects.len(), 2);
    }

    #[test]
    fn test_applied_changes_are_read_back() {
        let defects = detector();

        defects
            .apply(ConfigChange::Threshold(Threshold::from_percent(60).unwrap()))
            .unwrap();
        defects
            .apply(ConfigChange::ClassNames {
                ok: "good".to_string(),
                ng: "bad".to_string(),
            })
            .unwrap();

        assert_eq!(defects.threshold().fraction(), 0.6);
        assert_eq!(defects.class_names(), ("good".to_string(), "bad".to_string()));
        assert_eq!(defects.line(), Some(Line::new(100.0, 0.0, 100.0, 500.0)));
        assert_eq!(defects.dedup_policy(), DedupPolicy::Full);
        assert!(defects.apply(ConfigChange::Zones(Vec::new())).is_err());
    }

    #[test]
    fn test_cleared_line_stops_counting() {
        let defects = detector();
        defects.apply(ConfigChange::Line(None)).unwrap();

        let mut events = 0;
        for x in [55.0, 80.0, 105.0, 130.0] {
            let report = defects.update(&[bottle("ok", x, 0.9)]);
            assert_eq!(report.objects.len(), 1);
            events += report.events.len();
        }

        assert_eq!(events, 0);
        assert_eq!(defects.line(), None);
        assert_eq!(
            defects.get_metrics(),
            vec![Metric::new("ok", 0), Metric::new("ng", 0)]
        );
    }

    #[test]
    fn test_ok_part_crossing_counts_ok() {
        let defects = detector();

        for x in [55.0, 80.0, 105.0, 130.0] {
            defects.update(&[bottle("ok", x, 0.9)]);
        }

        assert_eq!(
            defects.get_metrics(),
            vec![Metric::new("ok", 1), Metric::new("ng", 0)]
        );
    }

    #[test]
    fn test_ng_tag_is_sticky() {
        let defects = detector();

        let report = defects.update(&[bottle("ok", 55.0, 0.9)]);
        assert_eq!(report.objects[0].tag.as_deref(), Some("ok"));

        let report = defects.update(&[bottle("ng", 65.0, 0.8)]);
        assert_eq!(report.objects[0].tag.as_deref(), Some("ng"));

        let report = defects.update(&[bottle("ok", 80.0, 0.9)]);
        assert_eq!(report.objects[0].tag.as_deref(), Some("ng"));
        assert_eq!(report.objects[0].score, Some(0.9));

        let report = defects.update(&[bottle("ok", 105.0, 0.9)]);
        assert_eq!(report.count("ng"), Some(1));
        assert_eq!(report.count("ok"), Some(0));
        assert_eq!(report.events.len(), 1);
    }

    #[test]
    fn test_renamed_classes_are_counted() {
        let defects = detector();
        defects
            .apply(ConfigChange::ClassNames {
                ok: "Bottle - OK".to_string(),
                ng: "Bottle - NG".to_string(),
            })
            .unwrap();

        for x in [55.0, 80.0, 105.0] {
            defects.update(&[bottle("Bottle - NG", x, 0.9)]);
        }

        assert_eq!(
            defects.get_metrics(),
            vec![Metric::new("Bottle - OK", 0), Metric::new("Bottle - NG", 1)]
        );
    }

    #[test]
    fn test_unknown_tag_crossing_counts_nothing() {
        let defects = detector();

        for x in [55.0, 80.0, 105.0] {
            defects.update(&[bottle("cap", x, 0.9)]);
        }

        assert_eq!(
            defects.get_metrics(),
            vec![Metric::new("ok", 0), Metric::new("ng", 0)]
        );
    }

    #[test]
    fn test_coasting_track_defaults_to_ok_score_zero() {
        let defects = detector();
        defects.update(&[bottle("ok", 55.0, 0.9)]);

        let report = defects.update(&[]);

        assert_eq!(report.objects[0].tag.as_deref(), Some("ok"));
        assert_eq!(report.objects[0].score, Some(0.0));
    }
}
