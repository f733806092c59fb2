use crate::adapter::AdapterId;
use crate::node::NodeKey;

/// `(node_key, scope_tag)` — the pair that uniquely identifies a cache
/// slot (spec §3). `scope` is the owning [`crate::cache::CacheAdapter`]'s
/// identity, so two cache adapters stacked over the same (or different)
/// base adapters never share entries.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CacheKey {
	pub node_key: NodeKey,
	pub scope: AdapterId,
}

impl CacheKey {
	pub fn new(node_key: NodeKey, scope: AdapterId) -> Self {
		Self {
			node_key,
			scope,
		}
	}
}
