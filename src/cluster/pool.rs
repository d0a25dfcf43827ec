//! Per-member channel pool
//!
//! Owns one persistent channel per known member. Channels are established
//! lazily on first acquire with a single-creation guarantee: two callers
//! racing on the same uninitialized member end up sharing one connection.
//! Health is a consecutive-failure counter per channel; crossing the
//! threshold evicts the channel so the next acquire rebuilds it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::OnceCell;

use crate::cluster::registry::Member;
use crate::common::Result;
use crate::rpc::Transport;

struct PoolEntry<C> {
    channel: OnceCell<C>,
    failures: AtomicU32,
}

impl<C> PoolEntry<C> {
    fn new() -> Self {
        Self {
            channel: OnceCell::new(),
            failures: AtomicU32::new(0),
        }
    }
}

pub struct ChannelPool<T: Transport> {
    transport: Arc<T>,
    entries: RwLock<HashMap<u64, Arc<PoolEntry<T::Channel>>>>,
    failure_threshold: u32,
}

impl<T: Transport> ChannelPool<T> {
    pub fn new(transport: Arc<T>, failure_threshold: u32) -> Self {
        Self {
            transport,
            entries: RwLock::new(HashMap::new()),
            failure_threshold,
        }
    }

    /// Return the member's channel, establishing it on first use.
    ///
    /// The once-cell makes creation idempotent under races: the first caller
    /// to start connecting wins, everyone else awaits and shares the result.
    /// A failed connect leaves the cell empty, so the next acquire retries.
    pub async fn acquire(&self, member: &Member) -> Result<T::Channel> {
        let entry = self.entry(member.id);
        let channel = entry
            .channel
            .get_or_try_init(|| {
                tracing::debug!(member = member.id, addr = %member.addr, "establishing channel");
                self.transport.connect(member)
            })
            .await?;
        Ok(channel.clone())
    }

    fn entry(&self, id: u64) -> Arc<PoolEntry<T::Channel>> {
        if let Some(entry) = self.entries.read().unwrap().get(&id) {
            return entry.clone();
        }
        let mut entries = self.entries.write().unwrap();
        entries
            .entry(id)
            .or_insert_with(|| Arc::new(PoolEntry::new()))
            .clone()
    }

    /// Drop the member's channel unconditionally. The next acquire rebuilds it.
    pub fn invalidate(&self, id: u64) {
        if self.entries.write().unwrap().remove(&id).is_some() {
            tracing::debug!(member = id, "channel invalidated");
        }
    }

    /// Record one failed use of the member's channel. Returns true when the
    /// consecutive-failure threshold was crossed and the channel was evicted.
    pub fn record_failure(&self, id: u64) -> bool {
        let entry = match self.entries.read().unwrap().get(&id) {
            Some(entry) => entry.clone(),
            None => return false,
        };
        let failures = entry.failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.failure_threshold {
            tracing::info!(member = id, failures, "failure threshold crossed, evicting channel");
            self.invalidate(id);
            true
        } else {
            false
        }
    }

    /// Reset the member's consecutive-failure counter after a successful use.
    pub fn record_success(&self, id: u64) {
        if let Some(entry) = self.entries.read().unwrap().get(&id) {
            entry.failures.store(0, Ordering::SeqCst);
        }
    }

    /// Evict channels for members no longer in the cluster.
    pub fn retain(&self, live: &[u64]) {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|id, _| live.contains(id));
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::info!(evicted, "evicted channels for removed members");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
