use serde::Deserialize;
use tracing::debug;

use crate::{
    associate::associate_detections_to_tracks,
    bbox::BBox,
    track::{Track, TrackedObject},
};

/// Tracker tuning, fixed for the lifetime of a tracker.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct TrackerParams {
    /// Frames a track may go unmatched before it is deleted.
    pub max_age: u32,
    /// Matched frames before a track is reported.
    pub min_hits: u32,
    /// Minimum iou for a detection to continue a track.
    pub iou_threshold: f64,
}

impl TrackerParams {
    pub fn new(max_age: u32, min_hits: u32, iou_threshold: f64) -> Self {
        Self {
            max_age,
            min_hits,
            iou_threshold,
        }
    }
}

pub struct Tracker {
    tracks: Vec<Track>,
    params: TrackerParams,
    next_id: u32,
}

impl Tracker {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            tracks: Vec::new(),
            params,
            next_id: 0,
        }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Confirmed tracks, in creation order.
    pub fn get_objs(&self) -> Vec<TrackedObject> {
        self.tracks
            .iter()
            .filter(|track| track.is_confirmed(self.params.min_hits))
            .map(|track| track.get_state())
            .collect()
    }

    /// Whether `id` still belongs to a live track, confirmed or not.
    pub fn is_tracked(&self, id: u32) -> bool {
        self.tracks.iter().any(|track| track.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn update(&mut self, detections: &[BBox]) {
        let (matched_indices, unmatched_detection_indices, unmatched_track_indices) =
            associate_detections_to_tracks(detections, &self.tracks, self.params.iou_threshold);

        for (i, j) in matched_indices.iter() {
            self.tracks[*j].update(detections[*i]);
        }
        for j in unmatched_track_indices.iter() {
            self.tracks[*j].mark_missed();
        }

        let max_age = self.params.max_age;
        self.tracks.retain(|track| {
            let alive = track.age_since_update() <= max_age;
            if !alive {
                debug!(track_id = track.id(), hits = track.hits(), "track deleted");
            }
            alive
        });

        for i in unmatched_detection_indices.iter() {
            let id = self.next_id;
            self.next_id += 1;
            debug!(track_id = id, "track created");
            self.tracks.push(Track::new(id, detections[*i]));
        }
    }
}
