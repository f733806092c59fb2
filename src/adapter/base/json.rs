//! Reference in-memory adapter over a `serde_json::Value` document.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::{Adapter, AdapterId};
use crate::err::{Error, Result};
use crate::node::{NodeHandle, NodeKey};

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A position in a JSON document, identified by its JSON Pointer
/// (RFC 6901) path. The root is `"/"`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JsonNode {
	key: NodeKey,
}

impl NodeHandle for JsonNode {
	fn key(&self) -> &NodeKey {
		&self.key
	}
}

/// Enumerates object members and array elements deterministically by key
/// (sorted) or index.
pub struct JsonAdapter {
	root: Arc<Value>,
	id: AdapterId,
}

impl JsonAdapter {
	pub fn new(root: Value) -> Self {
		let instance = INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed);
		Self {
			root: Arc::new(root),
			id: AdapterId::new(format!("json#{instance}")),
		}
	}

	pub fn root_node(&self) -> JsonNode {
		JsonNode {
			key: NodeKey::from("/"),
		}
	}

	fn resolve(&self, pointer: &str) -> Option<&Value> {
		if pointer == "/" {
			Some(&self.root)
		} else {
			self.root.pointer(pointer)
		}
	}
}

fn escape_pointer_token(token: &str) -> String {
	token.replace('~', "~0").replace('/', "~1")
}

#[async_trait]
impl Adapter for JsonAdapter {
	type Node = JsonNode;

	async fn children_ext(
		&self,
		node: &Self::Node,
		_required_depth: u32,
		_use_cache: bool,
	) -> Result<Vec<Self::Node>> {
		let value = self.resolve(node.key.as_str()).ok_or_else(|| Error::NodeGone {
			key: node.key.clone(),
		})?;
		let base = if node.key.as_str() == "/" {
			String::new()
		} else {
			node.key.as_str().to_string()
		};
		let children = match value {
			Value::Object(map) => {
				let mut keys: Vec<&String> = map.keys().collect();
				keys.sort();
				keys.into_iter()
					.map(|k| JsonNode {
						key: NodeKey::from(format!("{base}/{}", escape_pointer_token(k))),
					})
					.collect()
			}
			Value::Array(items) => (0..items.len())
				.map(|i| JsonNode {
					key: NodeKey::from(format!("{base}/{i}")),
				})
				.collect(),
			_ => Vec::new(),
		};
		Ok(children)
	}

	fn identity(&self) -> AdapterId {
		self.id.clone()
	}
}
