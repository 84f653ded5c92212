//! Temporal smoothing of per-frame attribute estimates.
//!
//! Each sample is weighted by `confidence * recency`, where recency decays
//! linearly from 1.0 for the current frame to 0.0 for a sample as old as the
//! history capacity. When the total weight is zero the newest raw sample is
//! returned instead.

use crate::history::BoundedHistory;
use crate::track::{AgeSample, EmotionSample, Track};
use crate::types::{Emotion, EmotionScores};

/// Linearly decaying weight of a sample taken `frame - sample_frame` frames ago.
/// Never negative.
#[inline]
pub fn recency_weight(frame: u64, sample_frame: u64, capacity: usize) -> f32 {
    if capacity == 0 {
        return 0.0;
    }
    let elapsed = frame.saturating_sub(sample_frame) as f32;
    (1.0 - elapsed / capacity as f32).max(0.0)
}

#[inline]
fn sample_weight(confidence: f32, frame: u64, sample_frame: u64, capacity: usize) -> f32 {
    let w = confidence * recency_weight(frame, sample_frame, capacity);
    if w.is_finite() {
        w.max(0.0)
    } else {
        0.0
    }
}

/// Record an age estimate on `track` and return `(smoothed_age, aggregate_confidence)`.
///
/// The aggregate confidence is the plain mean of the retained confidences.
pub fn smooth_age(track: &mut Track, age: f32, confidence: f32, frame: u64) -> (f32, f32) {
    track.age_history.push(AgeSample {
        age,
        confidence,
        frame,
    });

    weighted_age(&track.age_history, frame).unwrap_or((age, confidence))
}

fn weighted_age(history: &BoundedHistory<AgeSample>, frame: u64) -> Option<(f32, f32)> {
    let capacity = history.capacity();
    let mut total_weight = 0.0f32;
    let mut weighted_sum = 0.0f32;

    for sample in history.iter() {
        let weight = sample_weight(sample.confidence, frame, sample.frame, capacity);
        weighted_sum += sample.age * weight;
        total_weight += weight;
    }

    if total_weight.is_nan() || total_weight <= 0.0 || !weighted_sum.is_finite() {
        return None;
    }

    let mean_confidence =
        history.iter().map(|s| s.confidence).sum::<f32>() / history.len() as f32;

    Some((weighted_sum / total_weight, mean_confidence))
}

/// Record an emotion estimate on `track` and return
/// `(smoothed_scores, smoothed_dominant, smoothed_confidence)`.
///
/// Scores are the per-label weighted mean and are not renormalized. The
/// dominant label is the argmax of the smoothed scores and the confidence is
/// its score; the `dominant` passed in is only kept in the history.
pub fn smooth_emotion(
    track: &mut Track,
    scores: EmotionScores,
    dominant: Emotion,
    confidence: f32,
    frame: u64,
) -> (EmotionScores, Emotion, f32) {
    track.emotion_history.push(EmotionSample {
        scores,
        dominant,
        confidence,
        frame,
    });

    let smoothed = weighted_emotions(&track.emotion_history, frame).unwrap_or(scores);
    let (smoothed_dominant, smoothed_confidence) = smoothed.dominant();

    (smoothed, smoothed_dominant, smoothed_confidence)
}

fn weighted_emotions(history: &BoundedHistory<EmotionSample>, frame: u64) -> Option<EmotionScores> {
    let capacity = history.capacity();
    let mut sums = EmotionScores::default();
    let mut total_weight = 0.0f32;

    for sample in history.iter() {
        let weight = sample_weight(sample.confidence, frame, sample.frame, capacity);
        for (emotion, score) in sample.scores.iter() {
            sums.set(emotion, sums.get(emotion) + score * weight);
        }
        total_weight += weight;
    }

    if total_weight.is_nan() || total_weight <= 0.0 {
        return None;
    }

    Some(
        sums.iter()
            .map(|(emotion, sum)| (emotion, sum / total_weight))
            .collect(),
    )
}
