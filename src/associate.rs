use itertools::{Itertools, iproduct};

use crate::{bbox::BBox, track::Track};

/// Greedily associates the given detections to the given tracks.
///
/// ## Args
///  - detections: Boxes observed in the current frame.
///  - tracks: Live tracks, compared by their last box.
///  - iou_threshold: A pair is only accepted when its iou is strictly greater.
///
/// Pairs are taken in descending iou order and each detection and each track
/// is used at most once. Equal ious go to the lower track index first, then
/// the lower detection index.
///
/// Returns `(matched (detection, track), unmatched detections, unmatched tracks)`.
pub fn associate_detections_to_tracks(
    detections: &[BBox],
    tracks: &[Track],
    iou_threshold: f64,
) -> (Vec<(usize, usize)>, Vec<usize>, Vec<usize>) {
    if detections.is_empty() || tracks.is_empty() {
        return (
            Vec::new(),
            (0..detections.len()).collect(),
            (0..tracks.len()).collect(),
        );
    }

    let candidates = iproduct!(0..detections.len(), 0..tracks.len())
        .map(|(d, t)| (d, t, detections[d].iou(tracks[t].bbox())))
        .filter(|&(_, _, iou)| iou > iou_threshold)
        .sorted_by(|a, b| b.2.total_cmp(&a.2).then(a.1.cmp(&b.1)).then(a.0.cmp(&b.0)));

    let mut detection_taken = vec![false; detections.len()];
    let mut track_taken = vec![false; tracks.len()];
    let mut matched = Vec::new();

    for (d, t, _) in candidates {
        if detection_taken[d] || track_taken[t] {
            continue;
        }
        detection_taken[d] = true;
        track_taken[t] = true;
        matched.push((d, t));
    }

    let unmatched_detections = (0..detections.len())
        .filter(|&d| !detection_taken[d])
        .collect();
    let unmatched_tracks = (0..tracks.len()).filter(|&t| !track_taken[t]).collect();

    (matched, unmatched_detections, unmatched_tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u32, x_1: f64, y_1: f64, x_2: f64, y_2: f64) -> Track {
        Track::new(id, BBox::new(x_1, y_1, x_2, y_2))
    }

    #[test]
    fn test_associate_detections_to_tracks_returns_correct_matching() {
        let detections = vec![BBox::new(0.0, 0.0, 1.0, 1.0), BBox::new(2.0, 3.0, 4.0, 4.0)];
        let tracks = vec![track(0, 0.5, 0.0, 1.5, 1.0)];

        let (matched, unmatched_detections, unmatched_tracks) =
            associate_detections_to_tracks(&detections, &tracks, 0.3);

        assert_eq!(matched, vec![(0, 0)]);
        assert_eq!(unmatched_detections, vec![1]);
        assert_eq!(unmatched_tracks, Vec::<usize>::new());
    }

    #[test]
    fn test_highest_iou_wins_contested_track() {
        // Both detections overlap the single track; the closer one gets it.
        let detections = vec![BBox::new(3.0, 0.0, 13.0, 10.0), BBox::new(1.0, 0.0, 11.0, 10.0)];
        let tracks = vec![track(0, 0.0, 0.0, 10.0, 10.0)];

        let (matched, unmatched_detections, unmatched_tracks) =
            associate_detections_to_tracks(&detections, &tracks, 0.3);

        assert_eq!(matched, vec![(1, 0)]);
        assert_eq!(unmatched_detections, vec![0]);
        assert!(unmatched_tracks.is_empty());
    }

    #[test]
    fn test_one_detection_never_matches_two_tracks() {
        let detections = vec![BBox::new(0.0, 0.0, 10.0, 10.0)];
        let tracks = vec![track(0, 0.0, 0.0, 10.0, 10.0), track(1, 1.0, 0.0, 11.0, 10.0)];

        let (matched, unmatched_detections, unmatched_tracks) =
            associate_detections_to_tracks(&detections, &tracks, 0.3);

        assert_eq!(matched, vec![(0, 0)]);
        assert!(unmatched_detections.is_empty());
        assert_eq!(unmatched_tracks, vec![1]);
    }

    #[test]
    fn test_iou_equal_to_threshold_is_rejected() {
        // iou of these boxes is exactly 0.5
        let detections = vec![BBox::new(0.0, 0.0, 2.0, 1.0)];
        let tracks = vec![track(0, 0.0, 0.0, 1.0, 1.0)];

        let (matched, unmatched_detections, unmatched_tracks) =
            associate_detections_to_tracks(&detections, &tracks, 0.5);

        assert!(matched.is_empty());
        assert_eq!(unmatched_detections, vec![0]);
        assert_eq!(unmatched_tracks, vec![0]);
    }

    #[test]
    fn test_equal_iou_prefers_lower_track_index() {
        let detections = vec![BBox::new(0.0, 0.0, 10.0, 10.0)];
        let tracks = vec![track(4, 0.0, 0.0, 10.0, 10.0), track(9, 0.0, 0.0, 10.0, 10.0)];

        let (matched, _, unmatched_tracks) =
            associate_detections_to_tracks(&detections, &tracks, 0.3);

        assert_eq!(matched, vec![(0, 0)]);
        assert_eq!(unmatched_tracks, vec![1]);
    }

    #[test]
    fn test_empty_inputs_leave_everything_unmatched() {
        let tracks = vec![track(0, 0.0, 0.0, 1.0, 1.0)];

        let (matched, unmatched_detections, unmatched_tracks) =
            associate_detections_to_tracks(&[], &tracks, 0.3);

        assert!(matched.is_empty());
        assert!(unmatched_detections.is_empty());
        assert_eq!(unmatched_tracks, vec![0]);
    }
}
