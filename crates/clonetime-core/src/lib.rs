//! # Clonetime Core
//!
//! Pure logic for Clonetime: data models, URL canonicalization and
//! fingerprints, crawl heuristics, prompt building and response parsing,
//! the static fallback estimate, the hint filter, and the store trait.
//!
//! This crate does no network or database I/O. The crawler, model client,
//! SQLite store, and HTTP server live in the `clonetime` crate.

pub mod error;
pub mod fallback;
pub mod filter;
pub mod hints;
pub mod models;
pub mod normalize;
pub mod outcome;
pub mod prompt;
pub mod store;
