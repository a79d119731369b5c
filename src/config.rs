//! User configuration and review tuning knobs

use crate::domain::Size;
use crate::error::{PhotoTinderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_REFETCH_THRESHOLD: usize = 3;
pub const DEFAULT_DECODE_CONCURRENCY: usize = 4;

/// Tuning for the review controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewConfig {
    /// How far each fetch cycle raises the fetch cursor
    pub page_size: NonZeroUsize,
    /// Queue length at or below which a fetch cycle starts automatically
    pub refetch_threshold: usize,
    pub target_size: Size,
    /// Image decodes in flight per fetch cycle
    pub decode_concurrency: NonZeroUsize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
            refetch_threshold: DEFAULT_REFETCH_THRESHOLD,
            target_size: Size::default(),
            decode_concurrency: NonZeroUsize::new(DEFAULT_DECODE_CONCURRENCY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Persisted preferences (~/.config/pswp/config.json).
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Whether the key help overlay has been shown once
    pub welcome_shown: bool,
    pub page_size: usize,
    pub refetch_threshold: usize,
    pub target_size: Size,
    pub decode_concurrency: usize,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            welcome_shown: false,
            page_size: DEFAULT_PAGE_SIZE,
            refetch_threshold: DEFAULT_REFETCH_THRESHOLD,
            target_size: Size::default(),
            decode_concurrency: DEFAULT_DECODE_CONCURRENCY,
        }
    }
}

impl UserConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pswp").join("config.json"))
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            PhotoTinderError::ConfigError("Could not determine config directory".to_string())
        })?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            PhotoTinderError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            PhotoTinderError::ConfigError(format!("Failed to parse config file: {}", e))
        })
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            PhotoTinderError::ConfigError("Could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PhotoTinderError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            PhotoTinderError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            PhotoTinderError::ConfigError(format!("Failed to write config file: {}", e))
        })
    }

    /// Validates the tuning values into a controller config
    pub fn review_config(&self) -> Result<ReviewConfig> {
        let page_size = NonZeroUsize::new(self.page_size).ok_or_else(|| {
            PhotoTinderError::ConfigError("page_size must be greater than zero".to_string())
        })?;
        let decode_concurrency = NonZeroUsize::new(self.decode_concurrency).ok_or_else(|| {
            PhotoTinderError::ConfigError(
                "decode_concurrency must be greater than zero".to_string(),
            )
        })?;
        if self.target_size.width == 0 || self.target_size.height == 0 {
            return Err(PhotoTinderError::ConfigError(format!(
                "target_size must be non-empty, got {}",
                self.target_size
            )));
        }

        Ok(ReviewConfig {
            page_size,
            refetch_threshold: self.refetch_threshold,
            target_size: self.target_size,
            decode_concurrency,
        })
    }
}
