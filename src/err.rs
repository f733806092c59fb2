use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::node::NodeKey;

/// Errors produced by adapters, the cache layer, and the traversal engine.
///
/// Per-node errors (`SourceUnavailable`, `NodeGone`) are not fatal by
/// default; see [`crate::engine::ErrorPolicy`] for how the engine reacts
/// to them.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum Error {
	/// The adapter's backing source could not be read (permission denied,
	/// transport failure, and similar transient conditions).
	#[error("source unavailable for {key}: {reason}")]
	SourceUnavailable {
		key: NodeKey,
		reason: Arc<str>,
	},

	/// The node disappeared between discovery and enumeration.
	#[error("node gone: {key}")]
	NodeGone {
		key: NodeKey,
	},

	/// Cooperative cancellation unwound the traversal.
	#[error("traversal cancelled")]
	Cancelled,

	/// Invalid parameters supplied to an adapter or engine constructor.
	#[error("configuration error: {0}")]
	ConfigurationError(Arc<str>),

	/// An invariant the engine or cache relies on was violated. Indicates a
	/// bug; callers should treat this as a test failure rather than a
	/// recoverable condition.
	#[error("internal invariant violated: {0}")]
	InternalInvariant(&'static str),
}

impl Error {
	pub fn source_unavailable(key: NodeKey, reason: impl fmt::Display) -> Self {
		Error::SourceUnavailable {
			key,
			reason: Arc::from(reason.to_string()),
		}
	}

	pub fn configuration(reason: impl fmt::Display) -> Self {
		Error::ConfigurationError(Arc::from(reason.to_string()))
	}

	/// Per-node errors are the only kind `ContinueOnErrors`/`CollectErrors`
	/// are allowed to swallow; `Cancelled` and bugs are never per-node.
	pub fn is_per_node(&self) -> bool {
		matches!(self, Error::SourceUnavailable { .. } | Error::NodeGone { .. })
	}
}

pub type Result<T> = std::result::Result<T, Error>;
