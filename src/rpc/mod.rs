//! Transport abstraction and the request/response surface
//!
//! The dispatch core never touches the wire directly; it depends on the
//! [`Transport`] trait only. The production implementation is
//! [`grpc::GrpcTransport`]; tests substitute scripted transports.

pub mod grpc;

use crate::cluster::registry::Member;
use crate::common::Result;
use crate::proto;

pub use grpc::GrpcTransport;

/// Abstract wire capability: open a channel to a member, send one request.
///
/// `send` reports a leader redirect as [`crate::Error::Redirected`]; the
/// dispatcher consumes that signal and re-targets without burning retry
/// budget. Retryable failures are anything `Error::is_retryable` accepts.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    type Channel: Clone + Send + Sync + 'static;
    type Request: Clone + Send + 'static;
    type Response: Send + 'static;

    async fn connect(&self, member: &Member) -> Result<Self::Channel>;

    async fn send(&self, channel: &Self::Channel, request: Self::Request)
        -> Result<Self::Response>;
}

/// One logical request against the cluster's KV surface.
#[derive(Debug, Clone)]
pub enum KvRequest {
    Range(proto::RangeRequest),
    Put(proto::PutRequest),
    DeleteRange(proto::DeleteRangeRequest),
    MemberList(proto::MemberListRequest),
}

impl KvRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            KvRequest::Range(_) => "range",
            KvRequest::Put(_) => "put",
            KvRequest::DeleteRange(_) => "delete_range",
            KvRequest::MemberList(_) => "member_list",
        }
    }
}

#[derive(Debug, Clone)]
pub enum KvResponse {
    Range(proto::RangeResponse),
    Put(proto::PutResponse),
    DeleteRange(proto::DeleteRangeResponse),
    MemberList(proto::MemberListResponse),
}

impl KvResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            KvResponse::Range(_) => "range",
            KvResponse::Put(_) => "put",
            KvResponse::DeleteRange(_) => "delete_range",
            KvResponse::MemberList(_) => "member_list",
        }
    }
}
