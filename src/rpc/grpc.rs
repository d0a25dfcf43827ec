//! gRPC transport over tonic channels
//!
//! One `tonic` channel per member, built with the connect-timeout and HTTP/2
//! keepalive knobs from [`ClientConfig`]. Unary calls go through
//! `tonic::client::Grpc` with a prost codec against the etcd-compatible
//! service paths, so no generated stubs are required.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

use crate::cluster::registry::Member;
use crate::common::{ClientConfig, Error, Result};
use crate::proto;
use crate::rpc::{KvRequest, KvResponse, Transport};

const KV_RANGE: &str = "/etcdserverpb.KV/Range";
const KV_PUT: &str = "/etcdserverpb.KV/Put";
const KV_DELETE_RANGE: &str = "/etcdserverpb.KV/DeleteRange";
const CLUSTER_MEMBER_LIST: &str = "/etcdserverpb.Cluster/MemberList";

#[derive(Debug, Clone)]
pub struct GrpcTransport {
    connect_timeout: std::time::Duration,
    keepalive_interval: Option<std::time::Duration>,
    keepalive_timeout: std::time::Duration,
    keepalive_while_idle: bool,
}

impl GrpcTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            keepalive_interval: config.keepalive_interval(),
            keepalive_timeout: config.keepalive_timeout(),
            keepalive_while_idle: config.keepalive_while_idle,
        }
    }

    fn endpoint(&self, addr: &str) -> Result<Endpoint> {
        let mut endpoint = Endpoint::from_shared(addr.to_string())
            .map_err(|e| Error::InvalidEndpoint(format!("{addr}: {e}")))?
            .connect_timeout(self.connect_timeout)
            .keep_alive_timeout(self.keepalive_timeout)
            .keep_alive_while_idle(self.keepalive_while_idle)
            .tcp_nodelay(true);
        if let Some(interval) = self.keepalive_interval {
            endpoint = endpoint.http2_keep_alive_interval(interval);
        }
        Ok(endpoint)
    }

    async fn unary<Req, Resp>(
        &self,
        channel: &Channel,
        path: &'static str,
        request: Req,
    ) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

        let codec: tonic::codec::ProstCodec<Req, Resp> = tonic::codec::ProstCodec::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await
            .map_err(Error::from_status)?;
        Ok(response.into_inner())
    }
}

#[async_trait::async_trait]
impl Transport for GrpcTransport {
    type Channel = Channel;
    type Request = KvRequest;
    type Response = KvResponse;

    async fn connect(&self, member: &Member) -> Result<Channel> {
        self.endpoint(&member.addr)?
            .connect()
            .await
            .map_err(|e| Error::ConnectionFailed(format!("{}: {e}", member.addr)))
    }

    async fn send(&self, channel: &Channel, request: KvRequest) -> Result<KvResponse> {
        match request {
            KvRequest::Range(req) => {
                let resp: proto::RangeResponse = self.unary(channel, KV_RANGE, req).await?;
                Ok(KvResponse::Range(resp))
            }
            KvRequest::Put(req) => {
                let resp: proto::PutResponse = self.unary(channel, KV_PUT, req).await?;
                Ok(KvResponse::Put(resp))
            }
            KvRequest::DeleteRange(req) => {
                let resp: proto::DeleteRangeResponse =
                    self.unary(channel, KV_DELETE_RANGE, req).await?;
                Ok(KvResponse::DeleteRange(resp))
            }
            KvRequest::MemberList(req) => {
                let resp: proto::MemberListResponse =
                    self.unary(channel, CLUSTER_MEMBER_LIST, req).await?;
                Ok(KvResponse::MemberList(resp))
            }
        }
    }
}
