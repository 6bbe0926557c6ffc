//! Storage Module
//!
//! The in-memory ordered index the engine serves reads from.
//!
//! ## Responsibilities
//! - Upsert, delete-by-keys, point/multi-get
//! - Ordered full scan and bounded range scan
//! - Single-writer/multi-reader access; a batch is applied under one write
//!   lock so readers never see half of it
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock: `Vec<u8>` keys already order
//! lexicographically byte by byte, shorter-is-less on a shared prefix,
//! which is exactly the order range requests rely on.
//!
//! The store knows nothing about versions or the log; the engine validates
//! and logs before it writes here.

mod store;

pub use store::{OrderedStore, StoreIter};
