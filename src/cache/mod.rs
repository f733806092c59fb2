//! Completeness-aware cache adapter (C5) — the hard part.
//!
//! Decorates any [`Adapter`] with a completeness table plus single-flight
//! coordination, per spec §4.4. Grounded throughout on the teacher's
//! `idx/trees/store/cache.rs` (`TreeCache::{Lru, Full}`, the
//! `quick_cache` single-flight guard, `NodeIdsTracker`'s eviction hook)
//! and `kvs/cache.rs` (the plain key→entry vocabulary this module
//! generalizes).

mod entry;
mod inflight;
mod key;
mod table;

pub use entry::{CacheEntry, DepthScanned, ValidatorToken};
pub use key::CacheKey;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::adapter::{Adapter, AdapterId};
use crate::err::{Error, Result};
use crate::node::{Metadata, NodeHandle};

use inflight::{InFlightTable, Joined};
use table::Table;

/// Obtains a source-level change token for revalidation (spec §4.4,
/// `validator_fn`). Returning `None` disables revalidation entirely —
/// entries are served until `validation_ttl` forces a rescan regardless
/// of source changes.
pub type ValidatorFn<N> =
	Arc<dyn Fn(&N) -> Pin<Box<dyn Future<Output = Result<ValidatorToken>> + Send>> + Send + Sync>;

/// Safe: an LRU-ordered table, bounded, evicting. Fast: an unordered
/// table, unbounded, never evicting. Fixed at construction (spec §4.4.3)
/// — nothing past this point branches on which mode is active; each
/// holds a distinct concrete [`Table`] variant instead.
#[derive(Clone, Copy, Debug)]
pub enum CacheMode {
	Safe {
		max_entries: usize,
	},
	Fast,
}

/// Construction-time configuration for a [`CacheAdapter`] (spec §4.4,
/// §6).
pub struct CacheConfig<N> {
	pub mode: CacheMode,
	pub validation_ttl: Duration,
	pub validator_fn: Option<ValidatorFn<N>>,
}

impl<N> Clone for CacheConfig<N> {
	fn clone(&self) -> Self {
		Self {
			mode: self.mode,
			validation_ttl: self.validation_ttl,
			validator_fn: self.validator_fn.clone(),
		}
	}
}

impl<N> Default for CacheConfig<N> {
	fn default() -> Self {
		Self {
			mode: CacheMode::Safe {
				max_entries: *crate::cnf::DEFAULT_CACHE_MAX_ENTRIES,
			},
			validation_ttl: Duration::MAX,
			validator_fn: None,
		}
	}
}

/// The six observable counters from spec §4.4.5. Advisory only — never
/// consulted for correctness, only for diagnostics and tests.
#[derive(Default)]
struct Counters {
	hits: AtomicU64,
	misses: AtomicU64,
	bypasses: AtomicU64,
	upgrades: AtomicU64,
	coalesced_waits: AtomicU64,
}

/// Snapshot of a [`CacheAdapter`]'s counters at one instant.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub bypasses: u64,
	pub evictions: u64,
	pub upgrades: u64,
	pub coalesced_waits: u64,
}

/// Decorates `A` with a completeness-aware cache (spec §4.4).
///
/// Two stacked `CacheAdapter`s never share state even over the same
/// inner adapter (spec invariant 5, scope isolation): each derives its
/// `scope` from its own [`AdapterId`], which is in turn derived from the
/// inner adapter's identity plus this instance's own configuration.
pub struct CacheAdapter<A: Adapter> {
	inner: Arc<A>,
	id: AdapterId,
	scope: AdapterId,
	config: CacheConfig<A::Node>,
	table: Table<CacheKey, Arc<CacheEntry<A::Node>>>,
	inflight: InFlightTable<A::Node>,
	counters: Counters,
	/// Serializes the lookup-then-register decision in `children_ext` so a
	/// concurrent scan cannot publish and clear its in-flight record
	/// between this call's table read and its single-flight registration
	/// (spec §5's per-adapter mutual-exclusion discipline). An async mutex
	/// rather than the teacher's `parking_lot::Mutex`: the freshness check
	/// it guards may itself await a `validator_fn` call.
	coordination: Mutex<()>,
}

impl<A: Adapter> CacheAdapter<A> {
	/// Validates `config` and wraps `inner`. Returns
	/// [`Error::ConfigurationError`] if Safe mode is configured with a
	/// `max_entries` below [`crate::cnf::MIN_SAFE_MODE_ENTRIES`].
	pub fn new(inner: A, config: CacheConfig<A::Node>) -> Result<Self> {
		if let CacheMode::Safe {
			max_entries, ..
		} = config.mode
		{
			if max_entries < crate::cnf::MIN_SAFE_MODE_ENTRIES {
				return Err(Error::configuration(format!(
					"cache max_entries={max_entries} below minimum {}",
					crate::cnf::MIN_SAFE_MODE_ENTRIES
				)));
			}
		}
		let id = AdapterId::wrap("cache", &inner.identity());
		let scope = id.clone();
		let table = match config.mode {
			CacheMode::Safe {
				max_entries,
			} => Table::safe(max_entries),
			CacheMode::Fast => Table::fast(),
		};
		Ok(Self {
			inner: Arc::new(inner),
			id,
			scope,
			config,
			table,
			inflight: InFlightTable::default(),
			counters: Counters::default(),
			coordination: Mutex::new(()),
		})
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.counters.hits.load(Ordering::Relaxed),
			misses: self.counters.misses.load(Ordering::Relaxed),
			bypasses: self.counters.bypasses.load(Ordering::Relaxed),
			evictions: self.table.evictions(),
			upgrades: self.counters.upgrades.load(Ordering::Relaxed),
			coalesced_waits: self.counters.coalesced_waits.load(Ordering::Relaxed),
		}
	}

	/// Number of entries currently held in the completeness table.
	/// Exposed for tests covering invariant 4 (LRU bound) and scenario
	/// E6 (Fast-mode unbounded growth).
	pub fn len(&self) -> usize {
		self.table.len()
	}

	/// Returns `None` if no entry for `key` is present, else whether it
	/// is still within `validation_ttl` and (if configured) whether
	/// `validator_fn` still agrees with the stored token.
	async fn is_fresh(&self, entry: &CacheEntry<A::Node>, node: &A::Node) -> Result<bool> {
		if entry.inserted_at.elapsed() < self.config.validation_ttl {
			return Ok(true);
		}
		match &self.config.validator_fn {
			None => Ok(true),
			Some(validator_fn) => {
				let current = validator_fn(node).await?;
				Ok(Some(&current) == entry.validator.as_ref())
			}
		}
	}

	/// Builds the future that performs the actual scan, publish, and
	/// in-flight deregistration (spec §4.4.1 steps 5–7). Registered with
	/// [`InFlightTable`] so at most one of these runs per key at a time;
	/// every joiner — including the task that created it — awaits the
	/// same `Shared` handle.
	fn scan_and_publish(
		&self,
		key: CacheKey,
		node: A::Node,
		required_depth: u32,
	) -> impl Future<Output = Result<Arc<CacheEntry<A::Node>>>> + Send + 'static {
		let inner = self.inner.clone();
		let table = self.table.clone();
		let inflight = self.inflight.clone();
		let validator_fn = self.config.validator_fn.clone();
		async move {
			let result = inner.children_ext(&node, required_depth, true).await;
			let outcome = match result {
				Ok(children) => {
					let validator = match &validator_fn {
						Some(f) => Some(f(&node).await?),
						None => None,
					};
					let depth_scanned = if required_depth <= 1 {
						DepthScanned::Depth(0)
					} else {
						DepthScanned::Depth(required_depth)
					};
					let published = Arc::new(CacheEntry {
						children,
						depth_scanned,
						inserted_at: Instant::now(),
						validator,
					});
					table.insert(key.clone(), published.clone());
					Ok(published)
				}
				Err(e) => Err(e),
			};
			// Entry must be visible before the in-flight record is
			// dropped (spec §4.4.1 ordering requirement): the insert
			// above already happened, so clearing here is safe even
			// though other waiters may observe it concurrently.
			inflight.clear(&key);
			outcome
		}
	}
}

#[async_trait]
impl<A: Adapter> Adapter for CacheAdapter<A> {
	type Node = A::Node;

	#[instrument(level = "trace", skip(self, node))]
	async fn children_ext(
		&self,
		node: &Self::Node,
		required_depth: u32,
		use_cache: bool,
	) -> Result<Vec<Self::Node>> {
		if !use_cache {
			self.counters.bypasses.fetch_add(1, Ordering::Relaxed);
			return self.inner.children_ext(node, required_depth, false).await;
		}

		let key = CacheKey::new(node.key().clone(), self.scope.clone());

		loop {
			// The lookup and the single-flight join-or-register must act
			// as one decision: without this lock, a concurrent scan could
			// publish its entry and clear its in-flight record in the gap
			// between this call's `table.get` miss and its own
			// `join_or_register`, causing two inner scans for one key
			// (spec §5, property-test 3).
			let guard = self.coordination.lock().await;
			if let Some(entry) = self.table.get(&key) {
				if self.is_fresh(&entry, node).await? {
					if entry.depth_scanned.satisfies(required_depth) {
						drop(guard);
						self.counters.hits.fetch_add(1, Ordering::Relaxed);
						trace!(key = %key_debug(&key), "cache hit");
						return Ok(entry.children.clone());
					}
					self.counters.upgrades.fetch_add(1, Ordering::Relaxed);
					trace!(key = %key_debug(&key), "depth upgrade required");
				} else {
					self.table.remove(&key);
				}
			}

			let scan = self.scan_and_publish(key.clone(), node.clone(), required_depth);
			let joined = self.inflight.join_or_register(key.clone(), scan);
			drop(guard);
			match joined {
				Joined::Created(shared) => {
					self.counters.misses.fetch_add(1, Ordering::Relaxed);
					return shared.await.map(|e| e.children.clone());
				}
				Joined::Existing(shared) => {
					self.counters.coalesced_waits.fetch_add(1, Ordering::Relaxed);
					shared.await?;
					// Re-evaluate the lookup: the resolved entry may now
					// satisfy the request (spec §4.4.1 step 4).
					continue;
				}
			}
		}
	}

	fn identity(&self) -> AdapterId {
		self.id.clone()
	}

	async fn metadata(&self, node: &Self::Node) -> Result<Metadata> {
		self.inner.metadata(node).await
	}
}

fn key_debug(key: &CacheKey) -> impl fmt::Display + '_ {
	struct D<'a>(&'a CacheKey);
	impl fmt::Display for D<'_> {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "{}", self.0.node_key.as_str())
		}
	}
	D(key)
}
