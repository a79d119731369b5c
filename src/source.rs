//! Asset source adapter: the narrow contract the review controller needs from a
//! photo store.

pub mod directory;
pub mod fixture;

pub use directory::DirectorySource;
pub use fixture::FixtureSource;

use crate::domain::{AccessResult, AssetId, AssetRef, Size};
use crate::error::{DeleteError, Result};
use async_trait::async_trait;
use image::DynamicImage;
use std::num::NonZeroUsize;

#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Asks the store for permission to read (and possibly modify) the library.
    /// May prompt the user once.
    async fn request_access(&self) -> AccessResult;

    /// Lists up to `limit` assets, newest creation time first.
    ///
    /// Deterministic for a fixed store state and limit. Fails with
    /// `StoreUnavailable` if the store cannot be queried.
    async fn enumerate_newest(&self, limit: NonZeroUsize) -> Result<Vec<AssetRef>>;

    /// Decodes an asset bounded to `target`.
    ///
    /// Fails with `DecodeFailed` or `AssetUnavailable`. Called concurrently for the
    /// assets of one fetch cycle.
    async fn fetch_image(&self, asset: &AssetRef, target: Size) -> Result<DynamicImage>;

    /// Removes every listed asset, or none of them
    async fn delete_assets(&self, ids: &[AssetId]) -> std::result::Result<(), DeleteError>;
}
