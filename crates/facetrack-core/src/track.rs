use crate::history::BoundedHistory;
use crate::types::{BoundingBox, Emotion, EmotionScores, TrackId};

/// One age estimate as it entered a track's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeSample {
    pub age: f32,
    pub confidence: f32,
    pub frame: u64,
}

/// One emotion estimate as it entered a track's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionSample {
    pub scores: EmotionScores,
    /// Dominant label reported upstream for this frame.
    pub dominant: Emotion,
    pub confidence: f32,
    pub frame: u64,
}

/// A face followed across frames.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: TrackId,
    /// Box of the most recent matched detection; only used for matching.
    pub last_bbox: BoundingBox,
    pub age_history: BoundedHistory<AgeSample>,
    pub emotion_history: BoundedHistory<EmotionSample>,
    pub created_frame: u64,
    pub last_seen_frame: u64,
}

impl Track {
    pub fn new(
        track_id: TrackId,
        bbox: BoundingBox,
        frame: u64,
        max_age_history: usize,
        max_emotion_history: usize,
    ) -> Self {
        Self {
            track_id,
            last_bbox: bbox,
            age_history: BoundedHistory::with_capacity(max_age_history),
            emotion_history: BoundedHistory::with_capacity(max_emotion_history),
            created_frame: frame,
            last_seen_frame: frame,
        }
    }

    /// Frames elapsed since the track was created.
    #[inline]
    pub fn age_in_frames(&self, frame: u64) -> u64 {
        frame.saturating_sub(self.created_frame)
    }

    /// Frames elapsed since the track was last matched.
    #[inline]
    pub fn missing_for(&self, frame: u64) -> u64 {
        frame.saturating_sub(self.last_seen_frame)
    }

    /// Record a match in `frame`.
    #[inline]
    pub fn mark_seen(&mut self, bbox: BoundingBox, frame: u64) {
        self.last_bbox = bbox;
        self.last_seen_frame = frame;
    }
}
