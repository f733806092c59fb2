//! Single-flight coalescing for concurrent scans of the same cache key.
//!
//! The teacher's own `TreeLruCache::get_node` coalesces concurrent misses
//! via `quick_cache::get_value_or_guard`, but that guard blocks the
//! calling thread until the winner finishes — fine in the teacher's
//! sync-locked storage engine, wrong here: callers await this table from
//! cooperatively-scheduled async tasks, and blocking one of those on
//! another task's I/O can stall the whole executor. `futures::future::
//! Shared` gives the same coalescing (only the first poll of the inner
//! future does real work; every other clone just observes its result)
//! without blocking anything, and `DashMap`'s entry API gives the atomic
//! check-and-insert the teacher gets from `get_value_or_guard` for free.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{FutureExt, Shared};

use crate::cache::entry::CacheEntry;
use crate::cache::key::CacheKey;
use crate::err::Error;
use crate::node::NodeHandle;

type ScanResult<N> = Result<Arc<CacheEntry<N>>, Error>;
type ScanFuture<N> = Pin<Box<dyn Future<Output = ScanResult<N>> + Send>>;
pub(crate) type SharedScan<N> = Shared<ScanFuture<N>>;

/// Registry of in-progress scans, keyed the same way as the completeness
/// table. An entry is removed as soon as its scan finishes, successfully
/// or not — it never itself caches results (spec §4.4.1 step 7 is the
/// caller's job).
pub(crate) struct InFlightTable<N: NodeHandle>(Arc<DashMap<CacheKey, SharedScan<N>>>);

impl<N: NodeHandle> Default for InFlightTable<N> {
	fn default() -> Self {
		Self(Arc::new(DashMap::new()))
	}
}

impl<N: NodeHandle> Clone for InFlightTable<N> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

/// Outcome of [`InFlightTable::join_or_register`].
pub(crate) enum Joined<N: NodeHandle> {
	/// Another task's scan is already running; await this handle.
	Existing(SharedScan<N>),
	/// This call created the entry and must drive `scan` itself.
	Created(SharedScan<N>),
}

impl<N: NodeHandle> InFlightTable<N> {
	/// Atomically joins an in-progress scan for `key`, or registers `scan`
	/// as the new one. `DashMap::entry` holds the shard lock for the
	/// duration of the match arm, so two concurrent misses can never both
	/// observe an empty slot (spec §4.4.4: the `Scanning` transition is
	/// exactly the `Vacant` arm).
	pub(crate) fn join_or_register(
		&self,
		key: CacheKey,
		scan: impl Future<Output = ScanResult<N>> + Send + 'static,
	) -> Joined<N> {
		match self.0.entry(key) {
			Entry::Occupied(e) => Joined::Existing(e.get().clone()),
			Entry::Vacant(e) => {
				let boxed: ScanFuture<N> = Box::pin(scan);
				let shared = boxed.shared();
				e.insert(shared.clone());
				Joined::Created(shared)
			}
		}
	}

	pub(crate) fn clear(&self, key: &CacheKey) {
		self.0.remove(key);
	}

	pub(crate) fn len(&self) -> usize {
		self.0.len()
	}
}
