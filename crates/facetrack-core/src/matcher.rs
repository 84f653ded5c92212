//! Detection-to-track association.

use crate::geometry::overlap;
use crate::track::Track;
use crate::types::{Detection, TrackId};
use std::collections::{BTreeMap, HashSet};

/// Per-detection assignment: `(detection_index, matched_track)`.
pub type Assignment = (usize, Option<TrackId>);

/// Strategy for pairing the current frame's detections with live tracks.
///
/// Implementations must return one entry per detection, in input order, and
/// never assign the same track twice.
pub trait Matcher {
    fn assign(&self, detections: &[Detection], tracks: &BTreeMap<TrackId, Track>) -> Vec<Assignment>;
}

/// Greedy IoU matcher.
///
/// Detections claim tracks in input order. Each takes the unclaimed track it
/// overlaps most, provided the overlap is strictly above `iou_threshold`.
/// Tracks are scanned in ascending id order and only a strictly better
/// overlap replaces the current best, so ties go to the oldest track.
/// Not globally optimal: an early detection can take a track a later one
/// overlaps better.
#[derive(Debug, Clone, Copy)]
pub struct GreedyMatcher {
    pub iou_threshold: f32,
}

impl GreedyMatcher {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }
}

impl Matcher for GreedyMatcher {
    fn assign(&self, detections: &[Detection], tracks: &BTreeMap<TrackId, Track>) -> Vec<Assignment> {
        let mut claimed: HashSet<TrackId> = HashSet::with_capacity(tracks.len());
        let mut assignments = Vec::with_capacity(detections.len());

        for (idx, det) in detections.iter().enumerate() {
            let mut best: Option<(TrackId, f32)> = None;

            for (&track_id, track) in tracks {
                if claimed.contains(&track_id) {
                    continue;
                }

                let score = overlap(&det.bbox, &track.last_bbox);
                let best_score = best.map_or(0.0, |(_, s)| s);
                if score > best_score && score > self.iou_threshold {
                    best = Some((track_id, score));
                }
            }

            if let Some((track_id, score)) = best {
                tracing::trace!(detection = idx, track_id, iou = score, "matched");
                claimed.insert(track_id);
            }

            assignments.push((idx, best.map(|(id, _)| id)));
        }

        assignments
    }
}

/// Greedy assignment with the given threshold.
pub fn match_detections(
    detections: &[Detection],
    tracks: &BTreeMap<TrackId, Track>,
    iou_threshold: f32,
) -> Vec<Assignment> {
    GreedyMatcher::new(iou_threshold).assign(detections, tracks)
}
