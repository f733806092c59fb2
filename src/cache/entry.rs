use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// How deep a [`CacheEntry`]'s subtree is known to be enumerated.
///
/// `Depth(d)` means: every sub-tree rooted at a child of this entry is
/// itself guaranteed enumerated down to depth `d - 1`, transitively,
/// within the same cache (spec §3). `Complete` means the sub-tree is
/// exhaustively known.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DepthScanned {
	Depth(u32),
	Complete,
}

impl DepthScanned {
	/// Whether this entry can answer a request that needs `required`
	/// further levels without consulting the inner adapter.
	pub fn satisfies(&self, required: u32) -> bool {
		match self {
			DepthScanned::Complete => true,
			DepthScanned::Depth(d) => *d >= required,
		}
	}
}

/// An opaque source-level change marker (e.g. a modification timestamp),
/// compared for equality only — never ordered (spec §3).
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ValidatorToken(Arc<str>);

impl ValidatorToken {
	pub fn new(raw: impl fmt::Display) -> Self {
		Self(Arc::from(raw.to_string()))
	}
}

impl fmt::Debug for ValidatorToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ValidatorToken({:?})", self.0)
	}
}

/// A published cache slot: the result of one successful inner scan.
///
/// Once constructed, a `CacheEntry` is immutable. `inserted_at` and
/// `validator` are fixed at publish time and are never rewritten by a hit
/// (spec invariant 5) — a revalidation failure or depth upgrade replaces
/// the whole entry rather than mutating it in place.
#[derive(Debug)]
pub struct CacheEntry<N> {
	pub children: Vec<N>,
	pub depth_scanned: DepthScanned,
	pub inserted_at: Instant,
	pub validator: Option<ValidatorToken>,
}

impl<N: Clone> Clone for CacheEntry<N> {
	fn clone(&self) -> Self {
		Self {
			children: self.children.clone(),
			depth_scanned: self.depth_scanned,
			inserted_at: self.inserted_at,
			validator: self.validator.clone(),
		}
	}
}
