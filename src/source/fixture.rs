//! In-memory photo store with scriptable failures and latency gates.
//!
//! Used by the controller tests and handy for exercising a front-end without a real
//! library. Every call is recorded so tests can assert on what the controller asked.

use super::AssetSource;
use crate::domain::{AccessResult, AssetId, AssetRef, Size};
use crate::error::{DeleteError, PhotoTinderError, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use image::DynamicImage;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug)]
struct FixtureState {
    /// Newest first
    assets: Vec<AssetRef>,
    access: AccessResult,
    enumerate_fails: bool,
    delete_fails: bool,
    undecodable: HashSet<AssetId>,
    unavailable: HashSet<AssetId>,
    store_errors: HashSet<AssetId>,
    access_calls: usize,
    enumerate_calls: Vec<usize>,
    fetch_calls: usize,
    delete_calls: Vec<Vec<AssetId>>,
}

#[derive(Debug)]
pub struct FixtureSource {
    state: Mutex<FixtureState>,
    decode_latency: Duration,
    enumerate_gate: watch::Sender<bool>,
    delete_gate: watch::Sender<bool>,
}

impl FixtureSource {
    /// Creates an empty store that grants access
    pub fn new() -> Self {
        let (enumerate_gate, _) = watch::channel(true);
        let (delete_gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(FixtureState {
                assets: Vec::new(),
                access: AccessResult::Granted,
                enumerate_fails: false,
                delete_fails: false,
                undecodable: HashSet::new(),
                unavailable: HashSet::new(),
                store_errors: HashSet::new(),
                access_calls: 0,
                enumerate_calls: Vec::new(),
                fetch_calls: 0,
                delete_calls: Vec::new(),
            }),
            decode_latency: Duration::ZERO,
            enumerate_gate,
            delete_gate,
        }
    }

    /// Creates a store with `count` assets named `asset-00`, `asset-01`, ...
    /// where `asset-00` is the newest.
    pub fn with_assets(count: usize) -> Self {
        let source = Self::new();
        let now = Utc::now();
        {
            let mut state = source.state();
            state.assets = (0..count)
                .map(|i| {
                    AssetRef::new(
                        format!("asset-{:02}", i),
                        now - ChronoDuration::minutes(i as i64),
                    )
                })
                .collect();
        }
        source
    }

    pub fn with_access(self, access: AccessResult) -> Self {
        self.state().access = access;
        self
    }

    pub fn with_decode_latency(mut self, latency: Duration) -> Self {
        self.decode_latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an asset newer than everything already in the store
    pub fn push_newest(&self, id: impl Into<AssetId>) {
        let mut state = self.state();
        let created_at = state
            .assets
            .first()
            .map(|newest| newest.created_at + ChronoDuration::minutes(1))
            .unwrap_or_else(Utc::now);
        state.assets.insert(0, AssetRef::new(id, created_at));
    }

    /// Appends an asset ref as-is, duplicates included
    pub fn push_raw(&self, asset: AssetRef) {
        self.state().assets.push(asset);
    }

    pub fn set_enumerate_failure(&self, fails: bool) {
        self.state().enumerate_fails = fails;
    }

    pub fn set_delete_failure(&self, fails: bool) {
        self.state().delete_fails = fails;
    }

    pub fn mark_undecodable(&self, id: impl Into<AssetId>) {
        self.state().undecodable.insert(id.into());
    }

    pub fn mark_unavailable(&self, id: impl Into<AssetId>) {
        self.state().unavailable.insert(id.into());
    }

    /// Fetching this asset fails as if the whole store went away
    pub fn mark_store_error(&self, id: impl Into<AssetId>) {
        self.state().store_errors.insert(id.into());
    }

    /// Enumeration calls block (after being recorded) until resumed
    pub fn pause_enumeration(&self) {
        self.enumerate_gate.send_replace(false);
    }

    pub fn resume_enumeration(&self) {
        self.enumerate_gate.send_replace(true);
    }

    /// Delete calls block (after being recorded) until resumed
    pub fn pause_deletion(&self) {
        self.delete_gate.send_replace(false);
    }

    pub fn resume_deletion(&self) {
        self.delete_gate.send_replace(true);
    }

    pub fn access_calls(&self) -> usize {
        self.state().access_calls
    }

    /// Limits passed to each enumeration, in call order
    pub fn enumerate_calls(&self) -> Vec<usize> {
        self.state().enumerate_calls.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    /// Identifier batches passed to each delete, in call order
    pub fn delete_calls(&self) -> Vec<Vec<AssetId>> {
        self.state().delete_calls.clone()
    }

    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.state().assets.iter().map(|a| a.id.clone()).collect()
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.state().assets.iter().any(|a| &a.id == id)
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_open(gate: &watch::Sender<bool>) {
    let mut rx = gate.subscribe();
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[async_trait]
impl AssetSource for FixtureSource {
    async fn request_access(&self) -> AccessResult {
        let mut state = self.state();
        state.access_calls += 1;
        state.access
    }

    async fn enumerate_newest(&self, limit: NonZeroUsize) -> Result<Vec<AssetRef>> {
        self.state().enumerate_calls.push(limit.get());
        wait_open(&self.enumerate_gate).await;

        let state = self.state();
        if state.enumerate_fails {
            return Err(PhotoTinderError::StoreUnavailable(
                "fixture store offline".to_string(),
            ));
        }
        Ok(state.assets.iter().take(limit.get()).cloned().collect())
    }

    async fn fetch_image(&self, asset: &AssetRef, target: Size) -> Result<DynamicImage> {
        self.state().fetch_calls += 1;
        if !self.decode_latency.is_zero() {
            tokio::time::sleep(self.decode_latency).await;
        }

        let state = self.state();
        if state.store_errors.contains(&asset.id) {
            return Err(PhotoTinderError::StoreUnavailable(format!(
                "fixture store dropped while reading {}",
                asset.id
            )));
        }
        if state.unavailable.contains(&asset.id) || !state.assets.iter().any(|a| a.id == asset.id)
        {
            return Err(PhotoTinderError::AssetUnavailable(asset.id.clone()));
        }
        if state.undecodable.contains(&asset.id) {
            return Err(PhotoTinderError::DecodeFailed {
                id: asset.id.clone(),
                reason: "corrupt fixture data".to_string(),
            });
        }

        Ok(DynamicImage::new_rgb8(
            target.width.clamp(1, 8),
            target.height.clamp(1, 8),
        ))
    }

    async fn delete_assets(&self, ids: &[AssetId]) -> std::result::Result<(), DeleteError> {
        self.state().delete_calls.push(ids.to_vec());
        wait_open(&self.delete_gate).await;

        let mut state = self.state();
        if state.delete_fails {
            return Err(DeleteError::with_failed(
                "fixture store refused the change",
                ids.to_vec(),
            ));
        }

        let missing: Vec<AssetId> = ids
            .iter()
            .filter(|id| !state.assets.iter().any(|a| &a.id == *id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DeleteError::with_failed("unknown assets", missing));
        }

        state.assets.retain(|a| !ids.contains(&a.id));
        Ok(())
    }
}
