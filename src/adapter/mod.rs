//! Adapter protocol (C2): the single contract every source and decorator
//! implements, and the composition model (decorators wrapping an inner
//! adapter) built on top of it.

pub mod base;
pub mod filter;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::err::Result;
use crate::node::{Metadata, NodeHandle};

/// An opaque, per-instance tag identifying an adapter within a stack.
///
/// Stable for the lifetime of the adapter instance; two adapters wrapping
/// the same inner adapter with different configuration must produce
/// distinct tags so the cache layer can derive non-colliding scopes from
/// them (spec §3, `CacheKey`). Never derived from a memory address — that
/// would not be stable across runs — always from configuration content or a
/// process-local instance counter.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct AdapterId(Arc<str>);

impl AdapterId {
	pub fn new(raw: impl Into<Arc<str>>) -> Self {
		Self(raw.into())
	}

	/// Builds a decorator's identity from a tag describing the decorator's
	/// own configuration and the identity of what it wraps.
	pub fn wrap(tag: impl fmt::Display, inner: &AdapterId) -> Self {
		Self(Arc::from(format!("{tag}({inner})")))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for AdapterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "AdapterId({:?})", self.0)
	}
}

impl fmt::Display for AdapterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

/// Enumerates the children of a node in a source-defined deterministic
/// order (spec §4.1).
///
/// Implementations must be safely callable concurrently from independent
/// traversals; anything held across a call (a socket, a transaction) must
/// not be shared between concurrent calls unless it is itself safe to share.
/// Per-node failures are reported as [`crate::err::Error::SourceUnavailable`]
/// or [`crate::err::Error::NodeGone`] and are not fatal to a traversal using
/// the default error policy (spec §7).
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
	/// The node handle this adapter produces and consumes.
	type Node: NodeHandle;

	/// Full form of the contract: a depth hint the caller intends to
	/// traverse beneath the returned children, and a per-call cache-bypass
	/// flag (spec §4.4.1, §6). Adapters with no cache of their own ignore
	/// both and simply enumerate; [`crate::cache::CacheAdapter`] is the one
	/// implementation that acts on them.
	async fn children_ext(
		&self,
		node: &Self::Node,
		required_depth: u32,
		use_cache: bool,
	) -> Result<Vec<Self::Node>>;

	/// Convenience form: direct children only, cache enabled.
	async fn children(&self, node: &Self::Node) -> Result<Vec<Self::Node>> {
		self.children_ext(node, 0, true).await
	}

	/// This adapter instance's stable identity (spec §4.1).
	fn identity(&self) -> AdapterId;

	/// Optional source-specific key/value metadata for `node`. Not required
	/// by the engine; decorators default to delegating to the inner
	/// adapter.
	async fn metadata(&self, node: &Self::Node) -> Result<Metadata> {
		let _ = node;
		Ok(Metadata::default())
	}
}
