use serde::Serialize;

use crate::bbox::BBox;

/// Confirmed track as handed to the scenario engines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrackedObject {
    pub id: u32,
    pub bbox: BBox,
}

pub struct Track {
    id: u32,
    bbox: BBox,
    hits: u32,
    age_since_update: u32,
}

impl Track {
    pub fn new(id: u32, bbox: BBox) -> Self {
        Self {
            id,
            bbox,
            hits: 1,
            age_since_update: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn age_since_update(&self) -> u32 {
        self.age_since_update
    }

    pub fn update(&mut self, bbox: BBox) {
        self.bbox = bbox;
        self.hits += 1;
        self.age_since_update = 0;
    }

    pub fn mark_missed(&mut self) {
        self.age_since_update += 1;
    }

    pub fn is_confirmed(&self, min_hits: u32) -> bool {
        self.hits >= min_hits
    }

    pub fn get_state(&self) -> TrackedObject {
        TrackedObject {
            id: self.id,
            bbox: self.bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_replaces_bbox_and_resets_age() {
        let mut track = Track::new(7, BBox::new(0.0, 0.0, 10.0, 10.0));
        track.mark_missed();
        track.mark_missed();

        track.update(BBox::new(2.0, 0.0, 12.0, 10.0));

        assert_eq!(track.hits(), 2);
        assert_eq!(track.age_since_update(), 0);
        assert_eq!(*track.bbox(), BBox::new(2.0, 0.0, 12.0, 10.0));
    }

    #[test]
    fn test_confirmation_follows_hits() {
        let mut track = Track::new(0, BBox::new(0.0, 0.0, 1.0, 1.0));

        assert!(track.is_confirmed(1));
        assert!(!track.is_confirmed(2));

        track.update(BBox::new(0.0, 0.0, 1.0, 1.0));

        assert!(track.is_confirmed(2));
    }
}
