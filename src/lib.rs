//! # lanepager
//!
//! A lazy, fault-tolerant iterator over large paginated REST collections.
//!
//! ## Features
//!
//! - **Lane partitioning**: N lanes fetch pages concurrently, lane `i`
//!   taking pages `i+1, i+1+N, i+1+2N, ...`, so no page is fetched twice or
//!   skipped
//! - **Round retries**: a round with any failing lane is retried as a whole,
//!   with bounded attempts and a fixed, cancellable delay
//! - **Lane exhaustion**: a 404 or an empty page retires a lane without
//!   affecting the others
//! - **Pull-based**: nothing is fetched until the buffer runs dry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lanepager::config::PagerConfig;
//! use lanepager::http::{HttpClientConfig, HttpTransport};
//! use lanepager::pager::LanePager;
//! use lanepager::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = HttpTransport::new(
//!         HttpClientConfig::builder()
//!             .base_url("https://api.example.com/v3")
//!             .build(),
//!     )?;
//!
//!     let mut pager = LanePager::new("item", transport, PagerConfig::default())?;
//!     pager.add_query_params([("category_id", "12")]);
//!
//!     while let Some(record) = pager.next_record().await? {
//!         println!("{record}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  LanePager: buffer + forward iterator (next / rewind)    │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ buffer empty
//! ┌────────────────────────────┴─────────────────────────────┐
//! │  RetryController: attempts × fixed delay, cancellable    │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ one attempt
//! ┌──────────────┬─────────────┴──────────┬──────────────────┐
//! │   LaneSet    │   execute_round        │   classify       │
//! │ cursors,     │ fan-out to Transport,  │ 404/empty → drop │
//! │ stride N     │ barrier on all lanes   │ 200 → advance    │
//! └──────────────┴────────────────────────┴──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Entity capability trait
pub mod entity;

/// Lane requests and lane sets
pub mod lanes;

/// Transport trait and HTTP implementation
pub mod http;

/// Fetch rounds, classification and retries
pub mod engine;

/// Buffered record iterator
pub mod pager;

/// Configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{load_config, AppConfig, PagerConfig};
pub use entity::{Entity, NamedEntity};
pub use error::{Error, Result};
pub use http::{HttpTransport, Transport};
pub use pager::LanePager;
pub use types::{RawResponse, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
