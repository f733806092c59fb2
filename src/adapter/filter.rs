//! Filtering wrapper (C4): a decorator applying an inclusion predicate to
//! whatever it wraps.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::{Adapter, AdapterId};
use crate::err::Result;
use crate::node::Metadata;

/// Decorates any [`Adapter`] with an inclusion predicate.
///
/// `children(n)` returns only the children the inner adapter reports for
/// which `keep` holds. Stacking this above a [`crate::cache::CacheAdapter`]
/// hides entries from callers without shrinking what gets cached; stacking
/// it below narrows what the cache ever sees in the first place. Both are
/// legal (spec §4.3) — which one the caller gets depends entirely on
/// construction order.
pub struct FilterAdapter<A: Adapter> {
	inner: A,
	keep: Arc<dyn Fn(&A::Node) -> bool + Send + Sync>,
	id: AdapterId,
}

impl<A: Adapter> FilterAdapter<A> {
	/// `predicate_tag` names the predicate's configuration (e.g.
	/// `"ext=rs"`) so that two filters over the same inner adapter with
	/// different predicates get distinct identities, per spec §4.3.
	pub fn new(
		inner: A,
		predicate_tag: impl fmt::Display,
		keep: impl Fn(&A::Node) -> bool + Send + Sync + 'static,
	) -> Self {
		let id = AdapterId::wrap(format!("filter:{predicate_tag}"), &inner.identity());
		Self {
			inner,
			keep: Arc::new(keep),
			id,
		}
	}
}

#[async_trait]
impl<A: Adapter> Adapter for FilterAdapter<A> {
	type Node = A::Node;

	async fn children_ext(
		&self,
		node: &Self::Node,
		required_depth: u32,
		use_cache: bool,
	) -> Result<Vec<Self::Node>> {
		let children = self.inner.children_ext(node, required_depth, use_cache).await?;
		Ok(children.into_iter().filter(|c| (self.keep)(c)).collect())
	}

	fn identity(&self) -> AdapterId {
		self.id.clone()
	}

	async fn metadata(&self, node: &Self::Node) -> Result<Metadata> {
		self.inner.metadata(node).await
	}
}
