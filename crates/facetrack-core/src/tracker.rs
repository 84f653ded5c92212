//! Track registry: owns live tracks and runs matching, smoothing and eviction
//! once per frame.

use crate::config::{ConfigError, TrackerConfig};
use crate::matcher::{GreedyMatcher, Matcher};
use crate::smoother;
use crate::track::Track;
use crate::types::{Detection, Emotion, TrackId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Confidence assumed for an age or emotion estimate that arrives without one.
const DEFAULT_ATTRIBUTE_CONFIDENCE: f32 = 0.5;
/// Dominant emotion assumed when scores arrive without a label.
const DEFAULT_DOMINANT_EMOTION: Emotion = Emotion::Neutral;
/// Consecutive frames with untracked faces before the first warning.
const CAPACITY_WARN_STREAK: u64 = 30;
/// Frames between repeated warnings while capacity stays exhausted.
const CAPACITY_WARN_INTERVAL: u64 = 300;

/// Snapshot of the registry, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackStatistics {
    pub active_tracks: usize,
    pub frame_count: u64,
    pub track_ids: Vec<TrackId>,
    /// Detections passed through without a track because capacity was full.
    pub untracked_total: u64,
}

/// Per-stream face tracker.
///
/// Not shared between streams: each video source owns its own instance and
/// feeds it one frame at a time.
#[derive(Debug, Clone)]
pub struct FaceTracker {
    config: TrackerConfig,
    matcher: GreedyMatcher,
    tracks: BTreeMap<TrackId, Track>,
    next_track_id: TrackId,
    frame_count: u64,
    untracked_total: u64,
    exhausted_streak: u64,
}

impl Default for FaceTracker {
    fn default() -> Self {
        Self::from_valid(TrackerConfig::default())
    }
}

impl FaceTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: TrackerConfig) -> Self {
        Self {
            matcher: GreedyMatcher::new(config.iou_threshold),
            config,
            tracks: BTreeMap::new(),
            next_track_id: 0,
            frame_count: 0,
            untracked_total: 0,
            exhausted_streak: 0,
        }
    }

    /// Process one frame of detections.
    ///
    /// Returns the same detections in the same order. Each one that got a
    /// track carries `track_id` and `track_age` and has its age and emotion
    /// fields replaced by smoothed values. When all `max_tracks` slots are
    /// taken, unmatched detections are returned untouched.
    pub fn update(&mut self, mut detections: Vec<Detection>) -> Vec<Detection> {
        self.frame_count += 1;
        let frame = self.frame_count;

        let assignments = self.matcher.assign(&detections, &self.tracks);

        let mut touched: HashSet<TrackId> = HashSet::with_capacity(assignments.len());
        let mut untracked = 0u64;

        for (idx, assigned) in assignments {
            let track_id = match assigned {
                Some(id) => id,
                None if self.tracks.len() < self.config.max_tracks => {
                    self.create_track(&detections[idx], frame)
                }
                None => {
                    untracked += 1;
                    continue;
                }
            };

            let Some(track) = self.tracks.get_mut(&track_id) else {
                continue;
            };
            touched.insert(track_id);
            apply_track(track, &mut detections[idx], frame);
        }

        self.note_capacity(untracked, frame);
        self.evict_stale(&touched, frame);

        detections
    }

    fn create_track(&mut self, det: &Detection, frame: u64) -> TrackId {
        let track_id = self.next_track_id;
        self.next_track_id += 1;

        self.tracks.insert(
            track_id,
            Track::new(
                track_id,
                det.bbox,
                frame,
                self.config.max_age_history,
                self.config.max_emotion_history,
            ),
        );
        tracing::debug!(track_id, frame, live = self.tracks.len(), "track created");

        track_id
    }

    fn note_capacity(&mut self, untracked: u64, frame: u64) {
        if untracked == 0 {
            self.exhausted_streak = 0;
            return;
        }

        self.untracked_total += untracked;
        self.exhausted_streak += 1;
        tracing::debug!(frame, untracked, max_tracks = self.config.max_tracks, "track capacity full");

        let streak = self.exhausted_streak;
        if streak >= CAPACITY_WARN_STREAK && (streak - CAPACITY_WARN_STREAK) % CAPACITY_WARN_INTERVAL == 0 {
            tracing::warn!(
                frames = streak,
                max_tracks = self.config.max_tracks,
                untracked_total = self.untracked_total,
                "faces repeatedly left untracked; consider raising max_tracks"
            );
        }
    }

    fn evict_stale(&mut self, touched: &HashSet<TrackId>, frame: u64) {
        let max_missing = self.config.max_missing_frames;
        self.tracks.retain(|&track_id, track| {
            let keep = touched.contains(&track_id) || track.missing_for(frame) <= max_missing;
            if !keep {
                tracing::debug!(
                    track_id,
                    last_seen = track.last_seen_frame,
                    frame,
                    "track evicted after inactivity"
                );
            }
            keep
        });
    }

    /// Drop every track and restart frame counting. Ids keep increasing.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.frame_count = 0;
        self.exhausted_streak = 0;
        tracing::debug!(next_track_id = self.next_track_id, "tracker reset");
    }

    pub fn statistics(&self) -> TrackStatistics {
        TrackStatistics {
            active_tracks: self.tracks.len(),
            frame_count: self.frame_count,
            track_ids: self.tracks.keys().copied().collect(),
            untracked_total: self.untracked_total,
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Live tracks in creation order.
    #[inline]
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }
}

/// Fold `det` into `track` and annotate it with the smoothed values.
fn apply_track(track: &mut Track, det: &mut Detection, frame: u64) {
    track.mark_seen(det.bbox, frame);

    // Non-finite ages are passed through untouched and never enter history.
    if let Some(age) = det.age.filter(|a| a.is_finite()) {
        let confidence = det.age_confidence.unwrap_or(DEFAULT_ATTRIBUTE_CONFIDENCE);
        let (smoothed, aggregate) = smoother::smooth_age(track, age, confidence, frame);
        det.age = Some(round_tenth(smoothed));
        det.age_confidence = Some(aggregate);
    }

    if let Some(scores) = det.emotions {
        let (smoothed, dominant, confidence) = smoother::smooth_emotion(
            track,
            scores,
            det.dominant_emotion.unwrap_or(DEFAULT_DOMINANT_EMOTION),
            det.emotion_confidence.unwrap_or(DEFAULT_ATTRIBUTE_CONFIDENCE),
            frame,
        );
        det.emotions = Some(smoothed);
        det.dominant_emotion = Some(dominant);
        det.emotion_confidence = Some(confidence);
    }

    det.track_id = Some(track.track_id);
    det.track_age = Some(track.age_in_frames(frame));
}

#[inline]
fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}
