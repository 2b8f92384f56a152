//! # Caffeine Lookup
//!
//! Answers "how much caffeine is in X" for a voice assistant.
//!
//! Two public caffeine databases are scraped, validated and merged into one
//! drink store, cached on disk with a one-hour staleness window. Spoken drink
//! names are canonicalized, matched loosely against the store and answered in
//! imperial or metric servings.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌─────────────┐
//! │  Connectors  │──▶│  Ingest  │──▶│ Drink Store │◀──▶ cache slots
//! │ list / table │   │ validate │   │ merge+fresh │     + lastUpdate
//! └──────────────┘   └──────────┘   └──────┬──────┘
//!                                          │ snapshot
//!                   ┌──────────────────────┤
//!                   ▼                      ▼
//!            ┌─────────────┐        ┌─────────────┐
//!            │  Normalize  │──────▶ │   Resolve   │──▶ answer
//!            │ + aliases   │        │ + fuzzy pick│
//!            └─────────────┘        └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! caff refresh                     # fetch both sources
//! caff drink "a cup of coffee"     # answer a drink slot
//! caff ask "what is the caffeine content of diet coke" --metric
//! caff sources                     # cache and source status
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`normalize`] | Drink name canonicalization and aliases |
//! | [`speech`] | Spoken-form names for source records |
//! | [`fetch`] | Document fetching (HTTP and `file://`) |
//! | [`traits`] | The [`Connector`](traits::Connector) extension point |
//! | [`connector_embedded`] | Source A: list literal embedded in a page script |
//! | [`connector_table`] | Source B: first HTML table on a page |
//! | [`ingest`] | Rows to validated records |
//! | [`cache`] | On-disk cache slots |
//! | [`settings`] | Persisted `lastUpdate` |
//! | [`store`] | Merged store, staleness and refresh |
//! | [`resolve`] | Query to record matching |
//! | [`units`] | Metric serving conversion |
//! | [`answer`] | Spoken answer text |
//! | [`service`] | Request handling |
//! | [`query`] | Whole-question matching |
//! | [`sources`] | Source status listing |

pub mod answer;
pub mod cache;
pub mod config;
pub mod connector_embedded;
pub mod connector_table;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod query;
pub mod resolve;
pub mod service;
pub mod settings;
pub mod sources;
pub mod speech;
pub mod store;
pub mod traits;
pub mod units;
