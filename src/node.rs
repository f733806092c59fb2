//! Node identity (C1): the handles the rest of the crate is built around.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A stable, hashable, value-equal identifier for a position in a source
/// tree. Two nodes with the same key are the same tree position, even if
/// produced by independent calls into an adapter.
///
/// Keys are cheap to clone (an `Arc<str>` under the hood) since the cache
/// retains them for the lifetime of a `CacheEntry`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(Arc<str>);

impl NodeKey {
	pub fn new(raw: impl Into<Arc<str>>) -> Self {
		Self(raw.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NodeKey({:?})", self.0)
	}
}

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl From<&str> for NodeKey {
	fn from(s: &str) -> Self {
		Self(Arc::from(s))
	}
}

impl From<String> for NodeKey {
	fn from(s: String) -> Self {
		Self(Arc::from(s))
	}
}

/// Source-specific, lazily-fetched scalar attached to a node's metadata map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MetadataValue {
	Str(String),
	Int(i64),
	Float(f64),
	Bool(bool),
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// A handle to a position in some source tree.
///
/// Implementations are produced by an [`crate::adapter::Adapter`] and are
/// immutable after creation: the engine and cache never mutate a node, they
/// only clone and compare its [`NodeKey`]. A `NodeHandle` must be cheap to
/// clone because the cache retains copies of every child it enumerates.
pub trait NodeHandle: Clone + fmt::Debug + Send + Sync + 'static {
	/// This node's stable identity.
	fn key(&self) -> &NodeKey;
}

impl NodeHandle for NodeKey {
	fn key(&self) -> &NodeKey {
		self
	}
}
