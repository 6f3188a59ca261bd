//! Unique ID allocation for asset instances and physics bodies.
//!
//! Two schemes are offered:
//! - numeric IDs: an atomic counter, strictly increasing, never reused by an allocator.
//! - string IDs: `"<prefix>_<unix millis>_<random 0..=9999>"`.
//!
//! String IDs are only probabilistically unique. Two IDs generated in the same
//! millisecond collide with probability 1/10000; this is not detected.
//!
//! The composition root owns an [`IdAllocator`] and passes it to consumers. For code
//! that cannot be handed one, [`IdAllocator::global`] lazily installs a process-wide
//! instance on first use.

use crate::constants::{ASSET_ID_PREFIX, ID_SUFFIX_RANGE};
use rand::Rng;
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

static GLOBAL_ALLOCATOR: OnceLock<IdAllocator> = OnceLock::new();

#[derive(Debug, Default)]
pub struct IdAllocator {
    counter: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the process-wide allocator, constructing it on the first call.
    pub fn global() -> &'static IdAllocator {
        GLOBAL_ALLOCATOR.get_or_init(IdAllocator::new)
    }

    /// `"asset_<timestampMillis>_<random0..9999>"`.
    pub fn generate_asset_id(&self) -> String {
        self.generate_prefixed_id(ASSET_ID_PREFIX)
    }

    /// Increment the counter and return the new value. The first ID is `1`.
    pub fn generate_numeric_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn generate_prefixed_id(&self, prefix: &str) -> String {
        let suffix = rand::thread_rng().gen_range(0..ID_SUFFIX_RANGE);
        format!("{prefix}_{}_{suffix}", unix_millis())
    }

    /// Number of numeric IDs handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

fn unix_millis() -> u128 {
    // A clock before the epoch only happens on a misconfigured host; fall back to 0.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
