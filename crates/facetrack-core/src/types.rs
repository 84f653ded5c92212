use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identity of a track. Assigned in increasing order and never reused by a tracker.
pub type TrackId = u64;

/// Axis-aligned face box in pixel coordinates, left-top corner plus size.
///
/// On the wire this is the array `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Area with negative or non-finite extents counted as zero.
    pub fn area(&self) -> f32 {
        clamp_extent(self.width) * clamp_extent(self.height)
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() <= 0.0
    }
}

pub(crate) fn clamp_extent(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// Emotion labels produced by the upstream classifier, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const COUNT: usize = 7;

    pub const ALL: [Emotion; Emotion::COUNT] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Per-label emotion probabilities.
///
/// Serialized as an object keyed by label. Labels missing from the input read
/// as 0.0 and unknown labels are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmotionScores([f32; Emotion::COUNT]);

impl EmotionScores {
    pub fn new(scores: [f32; Emotion::COUNT]) -> Self {
        Self(scores)
    }

    #[inline]
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0[emotion.index()]
    }

    #[inline]
    pub fn set(&mut self, emotion: Emotion, score: f32) {
        self.0[emotion.index()] = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }

    /// Label with the highest score and that score. Ties keep the earlier label.
    pub fn dominant(&self) -> (Emotion, f32) {
        let mut best = (Emotion::ALL[0], self.0[0]);
        for (emotion, score) in self.iter().skip(1) {
            if score > best.1 {
                best = (emotion, score);
            }
        }
        best
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

impl FromIterator<(Emotion, f32)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (Emotion, f32)>>(iter: I) -> Self {
        let mut scores = Self::default();
        for (emotion, score) in iter {
            scores.set(emotion, score);
        }
        scores
    }
}

impl Serialize for EmotionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::COUNT))?;
        for (emotion, score) in self.iter() {
            map.serialize_entry(emotion.as_str(), &score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EmotionScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, f32>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(label, score)| label.parse::<Emotion>().ok().map(|e| (e, score)))
            .collect())
    }
}

/// A single face found in one frame, as produced by the inference stage.
///
/// The tracker fills in `track_id` and `track_age` and rewrites the age and
/// emotion fields with smoothed values. Fields this crate does not know about
/// (gender, landmarks, ...) are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, deserialize_with = "lenient_bbox")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub confidence: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_confidence: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotions: Option<EmotionScores>,
    #[serde(
        default,
        deserialize_with = "lenient_emotion",
        skip_serializing_if = "Option::is_none"
    )]
    pub dominant_emotion: Option<Emotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_confidence: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_age: Option<u64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            bbox,
            confidence,
            ..Default::default()
        }
    }

    pub fn with_age(mut self, age: f32, confidence: f32) -> Self {
        self.age = Some(age);
        self.age_confidence = Some(confidence);
        self
    }

    pub fn with_emotions(mut self, emotions: EmotionScores, confidence: f32) -> Self {
        let (dominant, _) = emotions.dominant();
        self.emotions = Some(emotions);
        self.dominant_emotion = Some(dominant);
        self.emotion_confidence = Some(confidence);
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.track_id.is_some()
    }
}

/// Accepts anything for `bbox`; only a 4-element numeric array is a real box,
/// everything else becomes the zero box.
fn lenient_bbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BoundingBox, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let coords = match value.as_array() {
        Some(items) if items.len() == 4 => items
            .iter()
            .map(|v| v.as_f64().map(|n| n as f32))
            .collect::<Option<Vec<f32>>>(),
        _ => None,
    };

    Ok(match coords {
        Some(c) => BoundingBox::new(c[0], c[1], c[2], c[3]),
        None => {
            tracing::trace!(bbox = %value, "malformed bbox, using zero box");
            BoundingBox::default()
        }
    })
}

fn lenient_emotion<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Emotion>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        None | Some(serde_json::Value::Null) => None,
        Some(other) => {
            tracing::trace!(dominant_emotion = %other, "malformed dominant_emotion, dropping");
            None
        }
    })
}
