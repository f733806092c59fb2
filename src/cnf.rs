//! Crate-wide tunables.
//!
//! Mirrors the constant-plus-lazy-default shape of a configuration module:
//! named constants for values the spec pins down exactly, and a handful of
//! `once_cell::Lazy` statics for defaults that are derived rather than fixed
//! (scaled off the host's core count). None of these are read from the
//! environment — this is a library with no process-wide configuration
//! surface — but the idiom (a `cnf` module of tuned constants) is carried
//! regardless.

use once_cell::sync::Lazy;

/// Default `batch_size` for [`crate::engine::TraversalConfig`] (spec §6).
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Default `max_concurrent` for [`crate::engine::TraversalConfig`] (spec §6).
pub const DEFAULT_MAX_CONCURRENT: usize = 100;

/// Default `max_depth`: unbounded.
pub const DEFAULT_MAX_DEPTH: Option<u32> = None;

/// Minimum `max_entries` a Safe-mode cache will accept; below this the
/// eviction bookkeeping has no room to do useful work.
pub const MIN_SAFE_MODE_ENTRIES: usize = 2;

/// Scaled default for a cache's `max_entries` when the caller wants a
/// reasonable Safe-mode size without picking one by hand.
pub static DEFAULT_CACHE_MAX_ENTRIES: Lazy<usize> = Lazy::new(|| num_cpus::get().max(1) * 4096);
