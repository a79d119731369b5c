pub mod review_queue;

pub use review_queue::ReviewQueue;

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque, stable identifier assigned to an asset by the photo store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An asset as listed by the store, before any pixels are loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub id: AssetId,
    pub created_at: DateTime<Utc>,
}

impl AssetRef {
    pub fn new(id: impl Into<AssetId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }
}

/// Target display size for decoded photos, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    /// A 390x844 phone display minus 200 rows of chrome
    fn default() -> Self {
        Self::new(390, 644)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A reviewable photo: its asset identifier plus pixels at display resolution.
///
/// The image is shared so snapshots of the queue stay cheap to clone.
#[derive(Clone)]
pub struct Photo {
    pub id: AssetId,
    pub image: Arc<DynamicImage>,
}

impl Photo {
    pub fn new(id: AssetId, image: DynamicImage) -> Self {
        Self {
            id,
            image: Arc::new(image),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("Photo")
            .field("id", &self.id)
            .field("size", &format_args!("{}x{}", width, height))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Delete,
}

/// Outcome of asking the store for library access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Granted,
    /// Access to a subset of the library, or without write permission
    GrantedLimited,
    Denied,
}

impl AccessResult {
    pub fn is_granted(self) -> bool {
        matches!(self, AccessResult::Granted | AccessResult::GrantedLimited)
    }
}

/// Lifecycle phase of the review controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewPhase {
    #[default]
    Idle,
    RequestingAccess,
    /// A fetch cycle is running and there is nothing to review yet
    Fetching,
    Ready,
    Empty,
    Deleting,
}

impl ReviewPhase {
    pub fn label(self) -> &'static str {
        match self {
            ReviewPhase::Idle => "idle",
            ReviewPhase::RequestingAccess => "requesting access",
            ReviewPhase::Fetching => "loading",
            ReviewPhase::Ready => "ready",
            ReviewPhase::Empty => "empty",
            ReviewPhase::Deleting => "deleting",
        }
    }
}

/// Statistics about decisions made during the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageStatistics {
    pub queued: usize,
    pub kept: usize,
    pub pending_delete: usize,
    pub deleted: usize,
}

impl TriageStatistics {
    /// Photos the user has made a decision on, committed or not
    pub fn reviewed(&self) -> usize {
        self.kept + self.pending_delete + self.deleted
    }
}
