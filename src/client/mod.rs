//! Cluster client facade
//!
//! One method per logical request kind. Each builds the request message,
//! hands it to the dispatcher, and unwraps the typed response. No retry or
//! redirect logic lives here; dispatch policy stays independently testable.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cluster::{ChannelPool, Dispatcher, EndpointRegistry, Member};
use crate::common::{normalize_endpoint, seed_member_id, ClientConfig, Error, Result};
use crate::proto;
use crate::rpc::{GrpcTransport, KvRequest, KvResponse, Transport};

pub struct Client<T>
where
    T: Transport<Request = KvRequest, Response = KvResponse>,
{
    registry: Arc<EndpointRegistry>,
    pool: Arc<ChannelPool<T>>,
    dispatcher: Dispatcher<T>,
}

impl Client<GrpcTransport> {
    /// Connect to the cluster over gRPC. Seeds the registry from the
    /// configured endpoints, then refreshes membership from the cluster
    /// itself; the seed endpoints stay in place if that first fetch fails.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = GrpcTransport::new(&config);
        let client = Self::with_transport(config, transport)?;
        if let Err(err) = client.sync_membership().await {
            tracing::warn!(error = %err, "initial membership fetch failed, keeping seed endpoints");
        }
        Ok(client)
    }
}

impl<T> Client<T>
where
    T: Transport<Request = KvRequest, Response = KvResponse>,
{
    /// Build a client over any transport. Used directly by tests; `connect`
    /// is the gRPC front door.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let members = config
            .endpoints
            .iter()
            .map(|endpoint| {
                let addr = normalize_endpoint(endpoint)?;
                Ok(Member::new(seed_member_id(&addr), addr))
            })
            .collect::<Result<Vec<Member>>>()?;

        let transport = Arc::new(transport);
        let registry = Arc::new(EndpointRegistry::new(members));
        let pool = Arc::new(ChannelPool::new(
            transport.clone(),
            config.channel_failure_threshold,
        ));
        let dispatcher = Dispatcher::new(registry.clone(), pool.clone(), transport, &config);

        Ok(Self {
            registry,
            pool,
            dispatcher,
        })
    }

    pub async fn put(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Result<proto::PutResponse> {
        let request = KvRequest::Put(proto::PutRequest {
            key: key.into(),
            value: value.into(),
            lease: 0,
            prev_kv: false,
        });
        match self.dispatcher.dispatch(request).await? {
            KvResponse::Put(resp) => Ok(resp),
            other => Err(Error::UnexpectedResponse(other.kind())),
        }
    }

    pub async fn get(&self, key: impl Into<Vec<u8>>) -> Result<proto::RangeResponse> {
        let request = KvRequest::Range(proto::RangeRequest {
            key: key.into(),
            range_end: Vec::new(),
            limit: 0,
        });
        match self.dispatcher.dispatch(request).await? {
            KvResponse::Range(resp) => Ok(resp),
            other => Err(Error::UnexpectedResponse(other.kind())),
        }
    }

    pub async fn delete(&self, key: impl Into<Vec<u8>>) -> Result<proto::DeleteRangeResponse> {
        let request = KvRequest::DeleteRange(proto::DeleteRangeRequest {
            key: key.into(),
            range_end: Vec::new(),
            prev_kv: false,
        });
        match self.dispatcher.dispatch(request).await? {
            KvResponse::DeleteRange(resp) => Ok(resp),
            other => Err(Error::UnexpectedResponse(other.kind())),
        }
    }

    /// Fetch the member list as reported by the cluster.
    pub async fn member_list(&self) -> Result<Vec<Member>> {
        let request = KvRequest::MemberList(proto::MemberListRequest {
            linearizable: false,
        });
        let resp = match self.dispatcher.dispatch(request).await? {
            KvResponse::MemberList(resp) => resp,
            other => return Err(Error::UnexpectedResponse(other.kind())),
        };

        let mut members = Vec::with_capacity(resp.members.len());
        for m in resp.members {
            match m.client_urls.first() {
                Some(url) => members.push(Member::new(m.id, normalize_endpoint(url)?)),
                None => {
                    tracing::warn!(member = m.id, "member reported no client urls, skipping")
                }
            }
        }
        Ok(members)
    }

    /// Refresh the registry from the cluster and proactively evict channels
    /// for members that are gone.
    pub async fn sync_membership(&self) -> Result<()> {
        let members = self.member_list().await?;
        self.registry.update(members, None);
        self.pool.retain(&self.registry.member_ids());
        Ok(())
    }

    /// Known members, registry view.
    pub fn members(&self) -> Vec<Member> {
        self.registry.members()
    }

    /// Believed leader, if any.
    pub fn leader(&self) -> Option<Member> {
        self.registry.leader()
    }

    /// Direct dispatcher access, for callers that need cancellation tokens
    /// or request kinds the facade does not wrap.
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Cancellable get, for callers racing a call against their own shutdown.
    pub async fn get_with_cancel(
        &self,
        key: impl Into<Vec<u8>>,
        cancel: CancellationToken,
    ) -> Result<proto::RangeResponse> {
        let request = KvRequest::Range(proto::RangeRequest {
            key: key.into(),
            range_end: Vec::new(),
            limit: 0,
        });
        match self.dispatcher.dispatch_with_cancel(request, cancel).await? {
            KvResponse::Range(resp) => Ok(resp),
            other => Err(Error::UnexpectedResponse(other.kind())),
        }
    }
}
