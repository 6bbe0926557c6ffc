//! Client Module
//!
//! Everything a caller needs to talk to an engine without touching it
//! directly.
//!
//! ## Architecture
//! ```text
//!   DbClient ──► CommClient ──► Engine::handle
//!                  │
//!                  ├── DirectCommClient   (plain in-process call)
//!                  └── ChannelCommClient  (encoded frames over a channel
//!                                          to a single dispatcher thread)
//! ```
//!
//! A remote transport is one more `CommClient` carrying the same frames.

mod db_client;
mod settings;
mod transport;

pub use db_client::DbClient;
pub use settings::{ClientSettings, ClientSettingsBuilder};
pub use transport::{ChannelCommClient, CommClient, DirectCommClient, Dispatcher};
