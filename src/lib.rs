//! Pswp - photo triage by swiping
//!
//! This crate provides the review queue behind the Pswp application: a paginated
//! queue of photos fetched newest first from a photo store, keep/delete decisions
//! that keep judged photos from coming back, and a bulk delete that reconciles the
//! decisions with the store.

pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod source;
pub mod tui;

// Re-export primary types for convenience
pub use config::{ReviewConfig, UserConfig};
pub use controller::{
    DeleteOutcome, ReviewController, ReviewEvent, ReviewHandle, ReviewSnapshot, SwipeOutcome,
    SyncReviewClient,
};
pub use domain::{
    AccessResult, AssetId, AssetRef, Decision, Photo, ReviewPhase, ReviewQueue, Size,
    TriageStatistics,
};
pub use error::{DeleteError, PhotoTinderError, Result};
pub use source::{AssetSource, DirectorySource, FixtureSource};
