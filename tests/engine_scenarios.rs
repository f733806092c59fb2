//! Traversal engine scenarios: cancellation bounds, and error-policy
//! divergence between `FailFast` and `ContinueOnErrors`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use grove::prelude::*;

struct FlakyAdapter {
	edges: BTreeMap<&'static str, Vec<&'static str>>,
	fails_on: &'static str,
	id: AdapterId,
}

#[async_trait]
impl Adapter for FlakyAdapter {
	type Node = NodeKey;

	async fn children_ext(
		&self,
		node: &Self::Node,
		_required_depth: u32,
		_use_cache: bool,
	) -> grove::err::Result<Vec<Self::Node>> {
		if node.as_str() == self.fails_on {
			return Err(Error::source_unavailable(node.clone(), "simulated outage"));
		}
		Ok(self
			.edges
			.get(node.as_str())
			.cloned()
			.unwrap_or_default()
			.into_iter()
			.map(NodeKey::from)
			.collect())
	}

	fn identity(&self) -> AdapterId {
		self.id.clone()
	}
}

fn flaky_tree(fails_on: &'static str) -> FlakyAdapter {
	let mut edges = BTreeMap::new();
	edges.insert("/a", vec!["/a/b", "/a/c"]);
	edges.insert("/a/b", vec!["/a/b/d"]);
	FlakyAdapter {
		edges,
		fails_on,
		id: AdapterId::new("flaky"),
	}
}

/// E5: cancelling a traversal mid-stream terminates the output sequence
/// within a bounded number of further emissions.
#[tokio::test]
async fn cancellation_bounds_additional_emissions() {
	// A wide, shallow fan-out so there's plenty left to cancel before it
	// would naturally finish.
	let mut wide = BTreeMap::new();
	let children: Vec<&'static str> =
		(0..200).map(|i| -> &'static str { Box::leak(format!("/root/{i}").into_boxed_str()) }).collect();
	wide.insert("/root", children.clone());
	let adapter = Arc::new(FlakyAdapter {
		edges: wide,
		fails_on: "",
		id: AdapterId::new("wide"),
	});

	// A small `batch_size` keeps the output channel's capacity small too,
	// so the producer has to block on backpressure rather than racing
	// ahead of a slow consumer — otherwise cancellation would never have
	// a chance to land before the (small) tree finishes on its own.
	let config = TraversalConfig {
		batch_size: 4,
		..TraversalConfig::default()
	};
	let (rx, canceller, driver) = traverse(NodeKey::from("/root"), adapter, config);
	let handle = tokio::spawn(driver);

	let mut seen = 0;
	while let Ok(item) = rx.recv().await {
		item.unwrap();
		seen += 1;
		if seen == 10 {
			canceller.cancel();
		}
	}
	handle.await.unwrap();
	assert!(seen < children.len(), "cancellation should cut the traversal short");
}

/// `FailFast` surfaces the first per-node error; `ContinueOnErrors` skips
/// the affected subtree and keeps emitting siblings.
#[tokio::test]
async fn fail_fast_surfaces_error_continue_skips_subtree() {
	let adapter = Arc::new(flaky_tree("/a/b"));
	let config = TraversalConfig {
		error_policy: ErrorPolicy::FailFast,
		..TraversalConfig::default()
	};
	let (rx, _c, driver) = traverse(NodeKey::from("/a"), adapter.clone(), config);
	let handle = tokio::spawn(driver);
	let mut saw_error = false;
	while let Ok(item) = rx.recv().await {
		if item.is_err() {
			saw_error = true;
		}
	}
	handle.await.unwrap();
	assert!(saw_error);

	let config = TraversalConfig {
		error_policy: ErrorPolicy::ContinueOnErrors,
		..TraversalConfig::default()
	};
	let (rx, _c, driver) = traverse(NodeKey::from("/a"), adapter, config);
	let handle = tokio::spawn(driver);
	let mut out = Vec::new();
	while let Ok(item) = rx.recv().await {
		out.push(item.unwrap());
	}
	handle.await.unwrap();
	let keys: Vec<_> = out.iter().map(|(n, _)| n.as_str().to_string()).collect();
	assert!(keys.contains(&"/a".to_string()));
	assert!(keys.contains(&"/a/c".to_string()));
	assert!(keys.contains(&"/a/b".to_string()), "the failing node itself is still emitted");
	assert!(!keys.contains(&"/a/b/d".to_string()), "its subtree is skipped");
}
