use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_TRACKS: usize = 3;
pub const DEFAULT_MAX_AGE_HISTORY: usize = 10;
pub const DEFAULT_MAX_EMOTION_HISTORY: usize = 5;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;
pub const DEFAULT_MAX_MISSING_FRAMES: u64 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroHistory { field: &'static str },
    #[error("iou_threshold must be a finite value in [0, 1], got {0}")]
    IouThreshold(f32),
}

/// Tracker tuning, fixed for the lifetime of a [`FaceTracker`](crate::FaceTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Maximum number of faces tracked at once. Extra faces pass through untracked.
    pub max_tracks: usize,
    /// Age samples kept per track.
    pub max_age_history: usize,
    /// Emotion samples kept per track.
    pub max_emotion_history: usize,
    /// Minimum IoU (exclusive) for a detection to continue a track.
    pub iou_threshold: f32,
    /// Frames a track may go unmatched before it is dropped.
    pub max_missing_frames: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tracks: DEFAULT_MAX_TRACKS,
            max_age_history: DEFAULT_MAX_AGE_HISTORY,
            max_emotion_history: DEFAULT_MAX_EMOTION_HISTORY,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_missing_frames: DEFAULT_MAX_MISSING_FRAMES,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age_history == 0 {
            return Err(ConfigError::ZeroHistory {
                field: "max_age_history",
            });
        }
        if self.max_emotion_history == 0 {
            return Err(ConfigError::ZeroHistory {
                field: "max_emotion_history",
            });
        }
        if !self.iou_threshold.is_finite() || !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::IouThreshold(self.iou_threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = TrackerConfig::default();
        assert_eq!(c.max_tracks, 3);
        assert_eq!(c.max_age_history, 10);
        assert_eq!(c.max_emotion_history, 5);
        assert!((c.iou_threshold - 0.3).abs() < 1e-6);
        assert_eq!(c.max_missing_frames, 10);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let c = TrackerConfig {
            max_age_history: 0,
            ..Default::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::ZeroHistory {
                field: "max_age_history"
            })
        );

        let c = TrackerConfig {
            max_emotion_history: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_iou_range() {
        for bad in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            let c = TrackerConfig {
                iou_threshold: bad,
                ..Default::default()
            };
            assert!(c.validate().is_err(), "{bad} should be rejected");
        }
        for ok in [0.0, 0.5, 1.0] {
            let c = TrackerConfig {
                iou_threshold: ok,
                ..Default::default()
            };
            assert!(c.validate().is_ok());
        }
    }

    #[test]
    fn test_zero_max_tracks_is_valid() {
        let c = TrackerConfig {
            max_tracks: 0,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let c: TrackerConfig = serde_json::from_str(r#"{"max_tracks": 8}"#).unwrap();
        assert_eq!(c.max_tracks, 8);
        assert_eq!(c.max_age_history, DEFAULT_MAX_AGE_HISTORY);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<TrackerConfig>(r#"{"max_trakcs": 8}"#).is_err());
    }
}
