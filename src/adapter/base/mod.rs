//! Base adapters (C3): concrete implementations of the adapter protocol
//! over specific sources.

#[cfg(feature = "fs")]
pub mod fs;
#[cfg(feature = "json")]
pub mod json;
