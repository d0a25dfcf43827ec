//! Cluster membership and leader tracking
//!
//! The registry is the single owned copy of "who is in the cluster and who do
//! we believe leads it". Membership is replaced wholesale on update; the
//! leader pointer moves on membership updates and on server redirects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// One node address in the cluster. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: u64,
    pub addr: String,
}

impl Member {
    pub fn new(id: u64, addr: impl Into<String>) -> Self {
        Self {
            id,
            addr: addr.into(),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    members: HashMap<u64, Member>,
    /// Invariant: if set, the id exists in `members`.
    leader: Option<u64>,
    version: u64,
}

/// Tracks known members and the believed leader.
///
/// Concurrent readers, single mutator: reads take the read lock, updates the
/// write lock. The round-robin cursor is a separate atomic so target picking
/// never contends with membership updates.
pub struct EndpointRegistry {
    state: RwLock<RegistryState>,
    cursor: AtomicUsize,
}

impl EndpointRegistry {
    pub fn new(members: Vec<Member>) -> Self {
        let registry = Self {
            state: RwLock::new(RegistryState::default()),
            cursor: AtomicUsize::new(0),
        };
        registry.update(members, None);
        registry
    }

    /// All known members, sorted by id for deterministic iteration.
    pub fn members(&self) -> Vec<Member> {
        let state = self.state.read().unwrap();
        let mut members: Vec<Member> = state.members.values().cloned().collect();
        members.sort_by_key(|m| m.id);
        members
    }

    pub fn member_ids(&self) -> Vec<u64> {
        let state = self.state.read().unwrap();
        let mut ids: Vec<u64> = state.members.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn get(&self, id: u64) -> Option<Member> {
        self.state.read().unwrap().members.get(&id).cloned()
    }

    pub fn leader(&self) -> Option<Member> {
        let state = self.state.read().unwrap();
        state.leader.and_then(|id| state.members.get(&id).cloned())
    }

    pub fn version(&self) -> u64 {
        self.state.read().unwrap().version
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the member set and optionally move the leader pointer.
    ///
    /// An empty member set is a silent no-op: the registry never drops below
    /// the previously known members. A leader hint naming an unknown member
    /// clears the pointer instead of breaking the invariant; an already-set
    /// leader is kept if it survived the membership change.
    pub fn update(&self, members: Vec<Member>, leader_hint: Option<u64>) {
        if members.is_empty() {
            tracing::warn!("ignoring membership update with empty member set");
            return;
        }

        let mut state = self.state.write().unwrap();
        state.members = members.into_iter().map(|m| (m.id, m)).collect();
        let candidate = leader_hint.or(state.leader);
        state.leader = candidate.filter(|id| state.members.contains_key(id));
        state.version += 1;
        tracing::debug!(
            members = state.members.len(),
            leader = ?state.leader,
            version = state.version,
            "membership updated"
        );
    }

    /// Move the leader pointer after a server redirect. Ignored (returns
    /// false) unless the id names a known member.
    pub fn set_leader(&self, id: u64) -> bool {
        let mut state = self.state.write().unwrap();
        if !state.members.contains_key(&id) {
            tracing::warn!(member = id, "redirect names unknown member, ignoring");
            return false;
        }
        if state.leader != Some(id) {
            state.leader = Some(id);
            state.version += 1;
            tracing::debug!(leader = id, "leader updated from redirect");
        }
        true
    }

    /// Resolve a leader hint as sent on the wire: a decimal member id, or a
    /// member address as fallback.
    pub fn resolve(&self, hint: &str) -> Option<u64> {
        let state = self.state.read().unwrap();
        if let Ok(id) = hint.parse::<u64>() {
            if state.members.contains_key(&id) {
                return Some(id);
            }
        }
        state
            .members
            .values()
            .find(|m| m.addr == hint)
            .map(|m| m.id)
    }

    /// Next member in round-robin order.
    pub fn next_round_robin(&self) -> Option<Member> {
        let members = self.members();
        if members.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % members.len();
        Some(members[idx].clone())
    }

    /// Initial target for a request: the leader if known, else round-robin.
    pub fn pick_initial(&self) -> Option<Member> {
        self.leader().or_else(|| self.next_round_robin())
    }
}
