//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rxline::cluster::{ChannelPool, Dispatcher, EndpointRegistry, Member};
use rxline::proto;
use rxline::{ClientConfig, Error, KvRequest, KvResponse, Result, Transport};

/// One scripted reaction to a send against a member. Members with an empty
/// (or exhausted) script answer `Ok`.
#[derive(Clone)]
pub enum Step {
    /// Respond with a default response matching the request kind.
    Ok,
    /// Not-leader rejection carrying a leader hint (member id or address).
    Redirect(String),
    /// Retryable failure.
    Unavailable,
    /// Sleep, then fail retryably. Models a member with a long timeout.
    Hang(Duration),
    /// Non-retryable server rejection.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct MockChannel {
    pub member_id: u64,
    pub channel_id: u64,
}

pub struct MockInner {
    scripts: Mutex<HashMap<u64, VecDeque<Step>>>,
    connects: Mutex<HashMap<u64, u32>>,
    sends: Mutex<Vec<u64>>,
    member_list: Mutex<Vec<proto::Member>>,
    connect_delay: Duration,
    next_channel: AtomicU64,
}

#[derive(Clone)]
pub struct MockTransport(pub Arc<MockInner>);

impl MockTransport {
    pub fn new() -> Self {
        Self::with_connect_delay(Duration::ZERO)
    }

    pub fn with_connect_delay(connect_delay: Duration) -> Self {
        Self(Arc::new(MockInner {
            scripts: Mutex::new(HashMap::new()),
            connects: Mutex::new(HashMap::new()),
            sends: Mutex::new(Vec::new()),
            member_list: Mutex::new(Vec::new()),
            connect_delay,
            next_channel: AtomicU64::new(1),
        }))
    }

    pub fn script(&self, member: u64, steps: Vec<Step>) {
        self.0
            .scripts
            .lock()
            .unwrap()
            .insert(member, steps.into());
    }

    /// What `MemberList` responses should report.
    pub fn set_member_list(&self, members: Vec<(u64, &str)>) {
        *self.0.member_list.lock().unwrap() = members
            .into_iter()
            .map(|(id, url)| proto::Member {
                id,
                name: format!("member-{id}"),
                peer_urls: vec![],
                client_urls: vec![url.to_string()],
            })
            .collect();
    }

    /// Member ids in send order.
    pub fn sends(&self) -> Vec<u64> {
        self.0.sends.lock().unwrap().clone()
    }

    pub fn connect_count(&self, member: u64) -> u32 {
        *self.0.connects.lock().unwrap().get(&member).unwrap_or(&0)
    }

    fn default_response(&self, request: &KvRequest) -> KvResponse {
        let header = Some(proto::ResponseHeader {
            cluster_id: 1,
            member_id: 0,
            revision: 1,
            raft_term: 1,
        });
        match request {
            KvRequest::Range(req) => KvResponse::Range(proto::RangeResponse {
                header,
                kvs: vec![proto::KeyValue {
                    key: req.key.clone(),
                    value: b"mock-value".to_vec(),
                    create_revision: 1,
                    mod_revision: 1,
                    version: 1,
                    lease: 0,
                }],
                more: false,
                count: 1,
            }),
            KvRequest::Put(_) => KvResponse::Put(proto::PutResponse {
                header,
                prev_kv: None,
            }),
            KvRequest::DeleteRange(_) => KvResponse::DeleteRange(proto::DeleteRangeResponse {
                header,
                deleted: 1,
                prev_kvs: vec![],
            }),
            KvRequest::MemberList(_) => KvResponse::MemberList(proto::MemberListResponse {
                header,
                members: self.0.member_list.lock().unwrap().clone(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    type Channel = MockChannel;
    type Request = KvRequest;
    type Response = KvResponse;

    async fn connect(&self, member: &Member) -> Result<MockChannel> {
        if !self.0.connect_delay.is_zero() {
            tokio::time::sleep(self.0.connect_delay).await;
        }
        *self
            .0
            .connects
            .lock()
            .unwrap()
            .entry(member.id)
            .or_insert(0) += 1;
        Ok(MockChannel {
            member_id: member.id,
            channel_id: self.0.next_channel.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn send(&self, channel: &MockChannel, request: KvRequest) -> Result<KvResponse> {
        self.0.sends.lock().unwrap().push(channel.member_id);
        let step = self
            .0
            .scripts
            .lock()
            .unwrap()
            .get_mut(&channel.member_id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Step::Ok);

        match step {
            Step::Ok => Ok(self.default_response(&request)),
            Step::Redirect(leader) => Err(Error::Redirected { leader }),
            Step::Unavailable => Err(Error::ConnectionFailed("mock: unavailable".into())),
            Step::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Err(Error::ConnectionFailed("mock: timed out".into()))
            }
            Step::Fatal => Err(Error::Grpc(tonic::Status::invalid_argument(
                "mock: rejected",
            ))),
        }
    }
}

/// Three-member harness: registry {1, 2, 3}, pool, dispatcher.
pub struct Harness {
    pub transport: MockTransport,
    pub registry: Arc<EndpointRegistry>,
    pub pool: Arc<ChannelPool<MockTransport>>,
    pub dispatcher: Dispatcher<MockTransport>,
}

pub fn three_member_harness(config: &ClientConfig, transport: MockTransport) -> Harness {
    let registry = Arc::new(EndpointRegistry::new(vec![
        Member::new(1, "http://a:2379"),
        Member::new(2, "http://b:2379"),
        Member::new(3, "http://c:2379"),
    ]));
    let shared = Arc::new(transport.clone());
    let pool = Arc::new(ChannelPool::new(
        shared.clone(),
        config.channel_failure_threshold,
    ));
    let dispatcher = Dispatcher::new(registry.clone(), pool.clone(), shared, config);
    Harness {
        transport,
        registry,
        pool,
        dispatcher,
    }
}

pub fn get_request(key: &str) -> KvRequest {
    KvRequest::Range(proto::RangeRequest {
        key: key.as_bytes().to_vec(),
        range_end: vec![],
        limit: 0,
    })
}
