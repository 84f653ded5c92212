use facetrack_core::{ConfigError, TrackerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid tracker config: {0}")]
    Tracker(#[from] ConfigError),
    #[error("channel_capacity must be at least 1")]
    ZeroChannelCapacity,
}

/// Runner configuration.
///
/// Layered as: built-in defaults, then an optional TOML file, then
/// `FACETRACK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Stream id used for input frames that do not name one.
    pub default_stream: String,
    /// Capacity of each stream's request queue. The runner waits for each
    /// frame's reply before sending the next, so only concurrent callers of a
    /// shared handle ever queue more than one request.
    pub channel_capacity: usize,
    /// Tracker settings, shared by every stream.
    pub tracker: TrackerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_stream: "default".to_string(),
            channel_capacity: 8,
            tracker: TrackerConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path` (or `FACETRACK_CONFIG` when `path` is `None`), apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("FACETRACK_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                let config = Self::from_file(&path)?;
                tracing::debug!(path = %path.display(), "loaded config file");
                config
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let src = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(src)?)
    }

    /// Override fields from `FACETRACK_*` variables. Values that fail to parse
    /// leave the current setting in place.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let t = &mut self.tracker;
        t.max_tracks = env_usize(&lookup, "FACETRACK_MAX_TRACKS", t.max_tracks);
        t.max_age_history = env_usize(&lookup, "FACETRACK_MAX_AGE_HISTORY", t.max_age_history);
        t.max_emotion_history =
            env_usize(&lookup, "FACETRACK_MAX_EMOTION_HISTORY", t.max_emotion_history);
        t.iou_threshold = env_f32(&lookup, "FACETRACK_IOU_THRESHOLD", t.iou_threshold);
        t.max_missing_frames =
            env_u64(&lookup, "FACETRACK_MAX_MISSING_FRAMES", t.max_missing_frames);

        if let Some(stream) = lookup("FACETRACK_DEFAULT_STREAM").filter(|s| !s.is_empty()) {
            self.default_stream = stream;
        }
        self.channel_capacity =
            env_usize(&lookup, "FACETRACK_CHANNEL_CAPACITY", self.channel_capacity);
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        self.tracker.validate()?;
        if self.channel_capacity == 0 {
            return Err(LoadError::ZeroChannelCapacity);
        }
        Ok(())
    }
}

fn env_f32<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: f32) -> f32 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: usize) -> usize {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
