//! # QuillDB
//!
//! A single-node document store with:
//! - Versioned, immutable documents and optimistic locking
//! - A write-ahead log (data file + index file) for durability
//! - Crash recovery that cuts torn tails and replays the log on startup
//! - Single-writer/multi-reader concurrency model
//! - A transport-agnostic request/reply protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         DbClient                             │
//! │           (typed API, content pipe, error mapping)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Request / Reply
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                          Engine                              │
//! │        validate ──► log ──► apply      (single writer)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │     WAL     │          │ OrderedStore │
//!   │  (Append)   │          │   (RwLock)   │
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod document;
pub mod wal;
pub mod storage;
pub mod protocol;
pub mod engine;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{QuillError, Result};
pub use config::Config;
pub use document::{Document, DocumentContents};
pub use engine::Engine;
pub use client::DbClient;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of QuillDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
