// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview handles: one displayable thumbnail per uploaded item, released
// exactly once when the item is removed or replaced.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;
use imagewhiz_core::ItemId;
use tracing::debug;

#[derive(Debug, Default)]
struct PoolCounters {
    live: AtomicUsize,
    released: AtomicUsize,
}

/// Issues preview handles and tracks how many are still alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewPool {
    counters: Arc<PoolCounters>,
}

impl PreviewPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, item: ItemId, thumbnail: DynamicImage) -> PreviewHandle {
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        debug!(item = %item, "Preview acquired");
        PreviewHandle {
            item,
            thumbnail,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Handles acquired and not yet released.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Handles released over the pool's lifetime.
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }
}

/// Exclusive owner of one item's preview. Not `Clone`: the release in `Drop`
/// therefore runs exactly once.
#[derive(Debug)]
pub struct PreviewHandle {
    item: ItemId,
    thumbnail: DynamicImage,
    counters: Arc<PoolCounters>,
}

impl PreviewHandle {
    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn thumbnail(&self) -> &DynamicImage {
        &self.thumbnail
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        debug!(item = %self.item, "Preview released");
    }
}
