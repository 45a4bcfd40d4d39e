//! TTL cache over a catalog source.
//!
//! Holds at most one snapshot. Readers clone the `Arc` and keep using it even
//! if a reload swaps in a newer one. Reloads are full: the source is read
//! outside the lock and the new snapshot replaces the old one in a single
//! write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use docfill_core::Result;

use crate::snapshot::CatalogSnapshot;
use crate::source::CatalogSource;

struct CachedSnapshot {
    snapshot: Arc<CatalogSnapshot>,
    fetched_at: Instant,
}

pub struct CatalogCache {
    source: Box<dyn CatalogSource>,
    ttl: Duration,
    slot: RwLock<Option<CachedSnapshot>>,
    reloads: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub source: String,
    pub ttl_secs: u64,
    pub reloads: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<u64>,
    pub blocks: usize,
    pub variables: usize,
    pub keywords: usize,
}

impl CatalogCache {
    pub fn new(source: Box<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: RwLock::new(None),
            reloads: AtomicU64::new(0),
        }
    }

    /// Current snapshot, reloading when missing or older than the TTL.
    ///
    /// A failed reload with a stale snapshot present logs a warning and
    /// returns the stale one; without any snapshot the error is returned.
    pub fn snapshot(&self) -> Result<Arc<CatalogSnapshot>> {
        if let Some(cached) = self.slot.read().as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        match self.refresh() {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                if let Some(cached) = self.slot.read().as_ref() {
                    warn!("Catalog reload from {} failed, serving stale snapshot: {}", self.source.name(), e);
                    return Ok(Arc::clone(&cached.snapshot));
                }
                Err(e)
            }
        }
    }

    /// Load from the source now and swap the result in.
    pub fn refresh(&self) -> Result<Arc<CatalogSnapshot>> {
        let data = self.source.load()?;
        let snapshot = Arc::new(CatalogSnapshot::build(data)?);

        *self.slot.write() = Some(CachedSnapshot {
            snapshot: Arc::clone(&snapshot),
            fetched_at: Instant::now(),
        });
        self.reloads.fetch_add(1, Ordering::Relaxed);

        info!(
            "Catalog loaded from {}: {} blocks, {} variables, {} keywords",
            self.source.name(),
            snapshot.blocks().len(),
            snapshot.variables().len(),
            snapshot.keywords().len()
        );
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next read reloads.
    pub fn invalidate(&self) {
        self.slot.write().take();
        debug!("Catalog cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        let slot = self.slot.read();
        let snap = slot.as_ref();
        CacheStats {
            source: self.source.name().to_string(),
            ttl_secs: self.ttl.as_secs(),
            reloads: self.reloads.load(Ordering::Relaxed),
            loaded_at: snap.map(|c| c.snapshot.loaded_at()),
            age_secs: snap.map(|c| c.fetched_at.elapsed().as_secs()),
            blocks: snap.map_or(0, |c| c.snapshot.blocks().len()),
            variables: snap.map_or(0, |c| c.snapshot.variables().len()),
            keywords: snap.map_or(0, |c| c.snapshot.keywords().len()),
        }
    }
}
