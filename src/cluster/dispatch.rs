//! Request dispatch state machine
//!
//! One dispatch drives a single logical request through
//! `INIT → SENT → (SUCCESS | REDIRECT → SENT | RETRY → SENT | FAILED)`.
//! Redirects re-target the leader without consuming retry budget; transport
//! errors burn one attempt each and rotate to the next candidate member. The
//! caller's deadline is checked at every transition, and a cancellation token
//! interrupts an in-flight attempt promptly.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cluster::pool::ChannelPool;
use crate::cluster::registry::{EndpointRegistry, Member};
use crate::common::{ClientConfig, Error, Result};
use crate::rpc::Transport;

/// Dispatch states. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Init,
    Sent,
    Redirect,
    Retry,
    Success,
    Failed,
}

/// What one wire attempt produced, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Response,
    Redirect,
    Retryable,
    Fatal,
}

impl DispatchState {
    /// Transition out of `SENT`. `attempts` is the counter after the outcome
    /// has been accounted for; redirects never touch it.
    pub fn after_attempt(outcome: AttemptOutcome, attempts: u32, max_retries: u32) -> Self {
        match outcome {
            AttemptOutcome::Response => DispatchState::Success,
            AttemptOutcome::Redirect => DispatchState::Redirect,
            AttemptOutcome::Retryable if attempts < max_retries => DispatchState::Retry,
            AttemptOutcome::Retryable => DispatchState::Failed,
            AttemptOutcome::Fatal => DispatchState::Failed,
        }
    }
}

/// Per-call state: payload, current target, attempt counter, deadline.
pub struct PendingRequest<R> {
    pub request_id: Uuid,
    pub request: R,
    pub target: Member,
    pub attempts: u32,
    pub deadline: Instant,
}

/// Sends one logical request, handling redirect-to-leader and
/// retry-on-failure. Holds no per-call state; any number of dispatches may
/// run concurrently.
pub struct Dispatcher<T: Transport> {
    registry: Arc<EndpointRegistry>,
    pool: Arc<ChannelPool<T>>,
    transport: Arc<T>,
    max_retries: u32,
    call_deadline: Duration,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        pool: Arc<ChannelPool<T>>,
        transport: Arc<T>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            registry,
            pool,
            transport,
            max_retries: config.max_retries,
            call_deadline: config.call_deadline(),
        }
    }

    pub async fn dispatch(&self, request: T::Request) -> Result<T::Response> {
        self.dispatch_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Dispatch with an external cancellation token. Cancellation interrupts
    /// the in-flight attempt, not just the gaps between attempts.
    pub async fn dispatch_with_cancel(
        &self,
        request: T::Request,
        cancel: CancellationToken,
    ) -> Result<T::Response> {
        let target = self.registry.pick_initial().ok_or(Error::NoMembers)?;
        let mut pending = PendingRequest {
            request_id: Uuid::new_v4(),
            request,
            target,
            attempts: 0,
            deadline: Instant::now() + self.call_deadline,
        };
        let mut state = DispatchState::Init;

        loop {
            // Deadline is fatal at every transition, regardless of budget left.
            if Instant::now() >= pending.deadline {
                tracing::warn!(request_id = %pending.request_id, "call deadline exceeded");
                return Err(Error::DeadlineExceeded);
            }

            state = match state {
                DispatchState::Init | DispatchState::Redirect | DispatchState::Retry => {
                    DispatchState::Sent
                }
                DispatchState::Sent => {
                    let outcome = tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::debug!(request_id = %pending.request_id, "call cancelled");
                            return Err(Error::Cancelled);
                        }
                        res = tokio::time::timeout_at(pending.deadline, self.attempt(&pending)) => {
                            match res {
                                Err(_) => {
                                    tracing::warn!(request_id = %pending.request_id, "call deadline exceeded mid-attempt");
                                    return Err(Error::DeadlineExceeded);
                                }
                                Ok(result) => result,
                            }
                        }
                    };
                    match outcome {
                        Ok(response) => {
                            self.pool.record_success(pending.target.id);
                            tracing::debug!(
                                request_id = %pending.request_id,
                                member = pending.target.id,
                                attempts = pending.attempts,
                                "request succeeded"
                            );
                            return Ok(response);
                        }
                        Err(err) => self.settle_error(&mut pending, err)?,
                    }
                }
                DispatchState::Success | DispatchState::Failed => {
                    unreachable!("terminal states return directly")
                }
            };
        }
    }

    /// Map a failed attempt onto the state machine, mutating the pending
    /// request (target, attempts) along the way. Terminal errors propagate.
    fn settle_error(
        &self,
        pending: &mut PendingRequest<T::Request>,
        err: Error,
    ) -> Result<DispatchState> {
        let outcome = match &err {
            Error::Redirected { .. } => AttemptOutcome::Redirect,
            err if err.is_retryable() => AttemptOutcome::Retryable,
            _ => AttemptOutcome::Fatal,
        };
        if outcome == AttemptOutcome::Retryable {
            self.pool.record_failure(pending.target.id);
            pending.attempts += 1;
        }

        match DispatchState::after_attempt(outcome, pending.attempts, self.max_retries) {
            DispatchState::Redirect => {
                let Error::Redirected { leader } = err else {
                    unreachable!("redirect outcome implies a redirect error");
                };
                match self.registry.resolve(&leader) {
                    Some(id) => {
                        self.registry.set_leader(id);
                        if let Some(member) = self.registry.get(id) {
                            tracing::debug!(
                                request_id = %pending.request_id,
                                leader = id,
                                "following leader redirect"
                            );
                            pending.target = member;
                        }
                    }
                    None => {
                        tracing::warn!(
                            request_id = %pending.request_id,
                            hint = %leader,
                            "redirect names unknown member, rotating instead"
                        );
                        pending.target =
                            self.registry.next_round_robin().ok_or(Error::NoMembers)?;
                    }
                }
                Ok(DispatchState::Redirect)
            }
            DispatchState::Retry => {
                tracing::warn!(
                    request_id = %pending.request_id,
                    member = pending.target.id,
                    attempt = pending.attempts,
                    error = %err,
                    "attempt failed, rotating to next member"
                );
                pending.target = self.registry.next_round_robin().ok_or(Error::NoMembers)?;
                Ok(DispatchState::Retry)
            }
            DispatchState::Failed if outcome == AttemptOutcome::Retryable => {
                tracing::warn!(
                    request_id = %pending.request_id,
                    attempts = pending.attempts,
                    error = %err,
                    "retry budget exhausted"
                );
                Err(Error::Unreachable {
                    attempts: pending.attempts,
                })
            }
            DispatchState::Failed => {
                tracing::debug!(
                    request_id = %pending.request_id,
                    error = %err,
                    "request failed with non-retryable error"
                );
                Err(err)
            }
            state => unreachable!("attempt outcomes never settle into {state:?}"),
        }
    }

    async fn attempt(&self, pending: &PendingRequest<T::Request>) -> Result<T::Response> {
        let channel = self.pool.acquire(&pending.target).await?;
        self.transport
            .send(&channel, pending.request.clone())
            .await
    }
}
