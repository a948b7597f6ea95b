//! # Flow Catalog
//!
//! A local indexer and search engine for a corpus of automation workflow
//! documents (JSON graphs of typed nodes and connections).
//!
//! Flow Catalog walks a directory of workflow files, derives a compact
//! record for each one (display name, trigger type, complexity, external
//! integrations, tags, a synthesized description), and stores the records
//! in SQLite with an FTS5 index for ranked search. Re-indexing is
//! incremental: only files whose content fingerprint changed are analyzed
//! again.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │   Corpus    │──▶│   Pipeline    │──▶│  SQLite    │
//! │  *.json     │   │ Detect+Analyze│   │ table+FTS5 │
//! └─────────────┘   └──────────────┘   └─────┬─────┘
//!                                            │
//!                                            ▼
//!                                      ┌───────────┐
//!                                      │    CLI     │
//!                                      │ (flowcat)  │
//!                                      └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! flowcat init                         # create database
//! flowcat index                        # analyze changed workflows
//! flowcat search "slack alert" --trigger webhook
//! flowcat category messaging
//! flowcat export --output site/search-index.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`services`] | Node type → service table and categories |
//! | [`analyze`] | Workflow document analysis |
//! | [`fingerprint`] | Content-hash change detection |
//! | [`connector_fs`] | Corpus enumeration |
//! | [`catalog`] | SQLite catalog store with FTS5 |
//! | [`ingest`] | Indexing pipeline |
//! | [`search`] | Full-text and category search |
//! | [`get`] | Lookup by filename |
//! | [`stats`] | Catalog statistics |
//! | [`export`] | Static JSON search index |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod analyze;
pub mod catalog;
pub mod config;
pub mod connector_fs;
pub mod db;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod get;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod search;
pub mod services;
pub mod stats;
