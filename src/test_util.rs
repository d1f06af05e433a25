//! 테스트용 스크립트 기반 전송 계층

use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::checksum::validate;
use crate::context::ProtocolContext;
use crate::segment::{Segment, SegmentType};
use crate::transport::DatagramTransport;
use crate::{Config, TransferMode, SEGMENT_SIZE};

pub(crate) const SERVER_ADDR: &str = "10.0.0.1";
pub(crate) const SERVER_PORT: u16 = 20000;

pub(crate) fn server_addr() -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 1], SERVER_PORT))
}

/// 테스트용 설정 (짧은 타임아웃, 고정 시드)
pub(crate) fn test_config(mode: TransferMode) -> Config {
    Config {
        server_addr: SERVER_ADDR.to_string(),
        server_port: SERVER_PORT,
        transfer_mode: mode,
        timeout_ms: 50,
        max_retries: 3,
        output_name: "out.bin".to_string(),
        rng_seed: Some(1),
        ..Config::default()
    }
}

/// 입력과 전송 계층이 준비된 컨텍스트
pub(crate) fn context_with(
    config: &Config,
    transport: MockTransport,
    data: Vec<u8>,
) -> ProtocolContext<MockTransport> {
    let mut ctx = ProtocolContext::from_config(config);
    let size = data.len() as u64;
    ctx.set_input(Cursor::new(data), size);
    ctx.establish_transport_with(transport);
    ctx
}

/// 수신 시 돌려줄 응답
#[derive(Debug, Clone)]
pub(crate) enum MockReply {
    /// 마지막 데이터 세그먼트의 시퀀스를 서버 주소에서 ACK
    AckLast,
    /// 지정한 시퀀스를 서버 주소에서 ACK
    Ack { sq: u32 },
    /// 마지막 시퀀스를 다른 주소에서 ACK
    AckFrom { from: SocketAddr },
    /// 마지막 세그먼트 체크섬이 맞을 때만 ACK, 아니면 타임아웃
    AckIfValid,
    Raw { bytes: Vec<u8>, from: SocketAddr },
    Timeout,
    Error(io::ErrorKind),
}

#[derive(Debug, Default)]
struct MockInner {
    sent: Vec<(Vec<u8>, SocketAddr)>,
    script: VecDeque<MockReply>,
    fallback: Option<MockReply>,
    recv_timeout: Option<Duration>,
    reject_timeouts: bool,
    truncate_sends: bool,
}

impl MockInner {
    fn last_data_segment(&self) -> Option<Segment> {
        self.sent
            .iter()
            .rev()
            .filter(|(bytes, _)| bytes.len() == SEGMENT_SIZE)
            .find_map(|(bytes, _)| Segment::from_bytes(bytes).ok())
            .filter(|s| s.seg_type == SegmentType::Data)
    }
}

/// 송신 기록을 남기고 스크립트대로 응답하는 전송 계층
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    fn with_fallback(fallback: Option<MockReply>) -> Self {
        let transport = Self::default();
        transport.inner.lock().fallback = fallback;
        transport
    }

    /// 모든 세그먼트에 정상 ACK
    pub(crate) fn auto_ack() -> Self {
        Self::with_fallback(Some(MockReply::AckLast))
    }

    /// 체크섬이 맞는 세그먼트에만 ACK
    pub(crate) fn validating() -> Self {
        Self::with_fallback(Some(MockReply::AckIfValid))
    }

    /// 응답하지 않는 서버
    pub(crate) fn silent() -> Self {
        Self::with_fallback(None)
    }

    /// 스크립트 응답 후 침묵
    pub(crate) fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let transport = Self::silent();
        transport.inner.lock().script.extend(replies);
        transport
    }

    pub(crate) fn reject_timeouts(&self) {
        self.inner.lock().reject_timeouts = true;
    }

    pub(crate) fn truncate_sends(&self) {
        self.inner.lock().truncate_sends = true;
    }

    pub(crate) fn recv_timeout(&self) -> Option<Duration> {
        self.inner.lock().recv_timeout
    }

    pub(crate) fn sent_datagrams(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.inner.lock().sent.clone()
    }

    /// 송신된 데이터 세그먼트 (메타데이터 제외)
    pub(crate) fn sent_segments(&self) -> Vec<Segment> {
        self.inner
            .lock()
            .sent
            .iter()
            .filter(|(bytes, _)| bytes.len() == SEGMENT_SIZE)
            .filter_map(|(bytes, _)| Segment::from_bytes(bytes).ok())
            .collect()
    }
}

fn ack_bytes(sq: u32) -> Vec<u8> {
    Segment::ack(sq)
        .to_bytes()
        .map(|b| b.to_vec())
        .unwrap_or_default()
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::WouldBlock, "mock receive timed out")
}

#[async_trait]
impl DatagramTransport for MockTransport {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.sent.push((buf.to_vec(), target));
        if inner.truncate_sends {
            Ok(buf.len().saturating_sub(1))
        } else {
            Ok(buf.len())
        }
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut inner = self.inner.lock();
        let reply = match inner.script.pop_front() {
            Some(reply) => reply,
            None => inner.fallback.clone().ok_or_else(timed_out)?,
        };

        let last_sq = inner.last_data_segment().map(|s| s.sq).unwrap_or_default();
        let (bytes, from) = match reply {
            MockReply::AckLast => (ack_bytes(last_sq), server_addr()),
            MockReply::Ack { sq } => (ack_bytes(sq), server_addr()),
            MockReply::AckFrom { from } => (ack_bytes(last_sq), from),
            MockReply::AckIfValid => match inner.last_data_segment() {
                Some(s) if validate(&s.payload, s.checksum) => (ack_bytes(s.sq), server_addr()),
                _ => return Err(timed_out()),
            },
            MockReply::Raw { bytes, from } => (bytes, from),
            MockReply::Timeout => return Err(timed_out()),
            MockReply::Error(kind) => return Err(io::Error::new(kind, "mock receive error")),
        };

        // UDP처럼 버퍼보다 긴 데이터그램은 잘림
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Ok((len, from))
    }

    fn set_recv_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let mut inner = self.inner.lock();
        if inner.reject_timeouts {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "mock rejects timeouts"));
        }
        inner.recv_timeout = timeout.filter(|t| !t.is_zero());
        Ok(())
    }
}
