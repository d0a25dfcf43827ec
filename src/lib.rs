//! # rxline
//!
//! An async client for Xline-style consensus-backed key-value clusters:
//! - Endpoint registry tracking membership and the believed leader
//! - One persistent channel per member, lazily built, evicted on sustained failure
//! - Retry/redirect dispatch with per-call deadlines and cancellation
//! - Thin typed facade over the etcd-compatible KV surface
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │                Cluster Client              │
//! │        put / get / delete / members        │
//! └───────────────────┬────────────────────────┘
//!                     │
//! ┌───────────────────▼────────────────────────┐
//! │             Request Dispatcher             │
//! │  INIT → SENT → SUCCESS | REDIRECT | RETRY  │
//! └──────┬──────────────────────────┬──────────┘
//!        │                          │
//! ┌──────▼──────────┐      ┌────────▼──────────┐
//! │ Connection Pool │─────▶│ Endpoint Registry │
//! │ (chan / member) │      │ members + leader  │
//! └──────┬──────────┘      └───────────────────┘
//!        │ gRPC
//! ┌──────▼──────┐   ┌────────────┐   ┌────────────┐
//! │  Member 1   │   │  Member 2  │   │  Member 3  │
//! │  (leader)   │   │ (follower) │   │ (follower) │
//! └─────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use rxline::{Client, ClientConfig};
//!
//! # async fn example() -> rxline::Result<()> {
//! let config = ClientConfig::new(vec!["http://127.0.0.1:2379".into()]);
//! let client = Client::connect(config).await?;
//!
//! client.put("greeting", "hello").await?;
//! let resp = client.get("greeting").await?;
//! for kv in resp.kvs {
//!     println!("{} = {:?}", String::from_utf8_lossy(&kv.key), kv.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod cluster;
pub mod common;
pub mod rpc;

// Wire messages for the etcd-compatible surface
pub mod proto;

// Re-export commonly used types
pub use client::Client;
pub use cluster::{Dispatcher, EndpointRegistry, Member};
pub use common::{ClientConfig, Error, Result};
pub use rpc::{GrpcTransport, KvRequest, KvResponse, Transport};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
