//! Client-side cluster core: membership, channels, dispatch
//!
//! Responsibilities:
//! - Membership and leader tracking (endpoint registry)
//! - One persistent channel per member with failure-based eviction (pool)
//! - Per-request retry/redirect state machine (dispatcher)

pub mod dispatch;
pub mod pool;
pub mod registry;

pub use dispatch::{AttemptOutcome, DispatchState, Dispatcher, PendingRequest};
pub use pool::ChannelPool;
pub use registry::{EndpointRegistry, Member};
