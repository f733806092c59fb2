//! A universal, adapter-composed concurrent tree traversal engine with a
//! completeness-aware cache.
//!
//! Six pieces, composed rather than monolithic:
//! - [`node`]: the identity types every other module is built around.
//! - [`adapter`]: the protocol a tree source implements (`Adapter`), the
//!   reference base adapters (`fs`, `json`), and the filtering decorator.
//! - [`cache`]: a completeness-aware caching decorator over any adapter.
//! - [`engine`]: the bounded-concurrency traversal driver.
//! - [`err`]: the crate's error type.
//! - [`cnf`]: tuned defaults.

#[macro_use]
extern crate tracing;

pub mod adapter;
pub mod cache;
pub mod cnf;
pub mod engine;
pub mod err;
pub mod node;

pub mod prelude {
	//! The types most callers need, re-exported for a single `use`.
	pub use crate::adapter::filter::FilterAdapter;
	pub use crate::adapter::{Adapter, AdapterId};
	pub use crate::cache::{CacheAdapter, CacheConfig, CacheMode, CacheStats};
	pub use crate::engine::{traverse, Canceller, ErrorPolicy, Strategy, TraversalConfig};
	pub use crate::err::{Error, Result};
	pub use crate::node::{NodeHandle, NodeKey};
}
