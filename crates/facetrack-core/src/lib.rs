//! facetrack-core — Face tracking and temporal smoothing.
//!
//! Links per-frame face detections into stable tracks by greedy IoU
//! matching, then smooths each track's age and emotion estimates over a
//! bounded, recency- and confidence-weighted history.

pub mod config;
pub mod geometry;
pub mod history;
pub mod matcher;
pub mod smoother;
pub mod track;
pub mod tracker;
pub mod types;

pub use config::{ConfigError, TrackerConfig};
pub use geometry::overlap;
pub use matcher::{match_detections, GreedyMatcher, Matcher};
pub use track::Track;
pub use tracker::{FaceTracker, TrackStatistics};
pub use types::{BoundingBox, Detection, Emotion, EmotionScores, TrackId};
