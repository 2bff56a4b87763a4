//! # Clonetime
//!
//! Estimates how many engineering hours it would take to rebuild a website
//! at a chosen quality tier (`speedrun`, `mvp`, `prod-lite`).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │ Crawler  │──▶│  Hints +  │──▶│ LLM / or  │──▶│  SQLite  │
//! │ Chromium │   │  Prompt   │   │ Fallback  │   │  cache   │
//! │  + HTTP  │   └───────────┘   └───────────┘   └────┬─────┘
//! └──────────┘                                        │
//!                        ┌────────────────────────────┤
//!                        ▼                            ▼
//!                   ┌──────────┐                ┌──────────┐
//!                   │   CLI    │                │   HTTP   │
//!                   └──────────┘                └──────────┘
//! ```
//!
//! The pure pieces (URL normalization, fingerprinting, hint detection,
//! prompt building, response parsing, filtering, the fallback estimate, and
//! the store trait) live in the `clonetime-core` crate. This crate adds the
//! I/O around them.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`crawl`] | Two-strategy multi-page crawler |
//! | [`browser`] | Headless Chromium renderer (`browser` feature) |
//! | [`extract`] | HTML to text |
//! | [`llm`] | Chat completion client abstraction |
//! | [`analyzer`] | Pages to estimate, with fallback |
//! | [`pipeline`] | Cache-first orchestration |
//! | [`sqlite_store`] | SQLite `AnalysisStore` |
//! | [`server`] | HTTP API |
//! | [`report`] | CLI commands |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyzer;
pub mod browser;
pub mod config;
pub mod crawl;
pub mod db;
pub mod extract;
pub mod llm;
pub mod migrate;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod sqlite_store;
