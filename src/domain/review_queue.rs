use super::{AssetId, Decision, Photo, TriageStatistics};
use crate::error::{PhotoTinderError, Result};
use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;

/// In-memory triage state: the queue awaiting review, the kept and pending-delete
/// sets, and the fetch cursor.
///
/// An asset identifier is in at most one of queue, kept, pending or committed.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    queue: VecDeque<Photo>,
    kept: HashSet<AssetId>,
    pending: Vec<Photo>,
    pending_ids: HashSet<AssetId>,
    /// Deleted from the store this session
    committed: HashSet<AssetId>,
    fetch_limit: usize,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn photos(&self) -> impl Iterator<Item = &Photo> {
        self.queue.iter()
    }

    pub fn pending(&self) -> &[Photo] {
        &self.pending
    }

    pub fn pending_ids(&self) -> Vec<AssetId> {
        self.pending.iter().map(|photo| photo.id.clone()).collect()
    }

    pub fn fetch_limit(&self) -> usize {
        self.fetch_limit
    }

    /// Resolves the photo at `index` with the given decision.
    ///
    /// Only the front of the queue is actionable. Any other index, or any index on an
    /// empty queue, is rejected with `IndexOutOfRange` and nothing changes.
    pub fn resolve(&mut self, index: usize, decision: Decision) -> Result<AssetId> {
        if index != 0 || self.queue.is_empty() {
            return Err(PhotoTinderError::IndexOutOfRange {
                index,
                len: self.queue.len(),
            });
        }

        let photo = self
            .queue
            .pop_front()
            .ok_or(PhotoTinderError::IndexOutOfRange { index, len: 0 })?;
        let id = photo.id.clone();

        match decision {
            Decision::Keep => {
                self.kept.insert(photo.id);
            }
            Decision::Delete => {
                self.pending_ids.insert(photo.id.clone());
                self.pending.push(photo);
            }
        }

        Ok(id)
    }

    /// Raises the fetch cursor by one page and returns the new limit
    pub fn advance_cursor(&mut self, page_size: NonZeroUsize) -> NonZeroUsize {
        self.fetch_limit = self.fetch_limit.saturating_add(page_size.get());
        NonZeroUsize::new(self.fetch_limit).unwrap_or(page_size)
    }

    /// Every identifier a fetch cycle must skip
    pub fn exclusion_set(&self) -> HashSet<AssetId> {
        self.kept
            .iter()
            .chain(self.pending_ids.iter())
            .chain(self.committed.iter())
            .cloned()
            .chain(self.queue.iter().map(|photo| photo.id.clone()))
            .collect()
    }

    /// Appends freshly fetched photos at the back, in the given order.
    ///
    /// Photos that are already queued or judged, or repeated within the batch, are
    /// skipped. Returns how many were appended.
    pub fn admit(&mut self, photos: Vec<Photo>) -> usize {
        let mut excluded = self.exclusion_set();
        let mut appended = 0;

        for photo in photos {
            if excluded.insert(photo.id.clone()) {
                self.queue.push_back(photo);
                appended += 1;
            }
        }

        appended
    }

    /// Removes committed identifiers from the pending-delete set and remembers them
    /// as deleted. Returns how many pending photos were committed.
    pub fn commit_deleted(&mut self, ids: &[AssetId]) -> usize {
        let ids: HashSet<&AssetId> = ids.iter().collect();
        let before = self.pending.len();

        self.pending.retain(|photo| !ids.contains(&photo.id));
        for id in ids {
            self.pending_ids.remove(id);
            self.committed.insert(id.clone());
        }

        before - self.pending.len()
    }

    pub fn needs_refetch(&self, threshold: usize) -> bool {
        self.queue.len() <= threshold
    }

    pub fn statistics(&self) -> TriageStatistics {
        TriageStatistics {
            queued: self.queue.len(),
            kept: self.kept.len(),
            pending_delete: self.pending.len(),
            deleted: self.committed.len(),
        }
    }

    /// Checks that queue, kept and pending share no identifier
    pub fn is_disjoint(&self) -> bool {
        let queued: HashSet<&AssetId> = self.queue.iter().map(|photo| &photo.id).collect();
        queued.len() == self.queue.len()
            && self.pending_ids.len() == self.pending.len()
            && queued.iter().all(|id| !self.kept.contains(*id))
            && queued.iter().all(|id| !self.pending_ids.contains(*id))
            && self.kept.is_disjoint(&self.pending_ids)
    }
}
