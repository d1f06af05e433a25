//! 데이터그램 전송 계층
//!
//! 프로토콜 엔진은 이 트레이트만 사용하므로 테스트에서 스크립트 기반 전송으로 교체 가능

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

/// 비신뢰 데이터그램 전송
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// 데이터그램 하나 전송, 전송된 바이트 수 반환
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// 데이터그램 하나 수신
    ///
    /// 수신 타임아웃이 설정되어 있고 만료되면 `ErrorKind::WouldBlock` 에러
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// 수신 타임아웃 설정 (None 또는 0이면 무한 대기)
    fn set_recv_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

/// 타임아웃으로 인한 수신 실패 여부 (재시도 가능한 유일한 에러)
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// tokio UDP 소켓 기반 전송
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    recv_timeout: Option<Duration>,
}

impl UdpTransport {
    /// 주어진 로컬 주소에 바인딩
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        debug!("UDP 소켓 바인딩: {}", socket.local_addr()?);

        Ok(Self {
            socket,
            recv_timeout: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn recv_timeout(&self) -> Option<Duration> {
        self.recv_timeout
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        match self.recv_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.socket.recv_from(buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::WouldBlock, "receive timed out"))?,
            None => self.socket.recv_from(buf).await,
        }
    }

    fn set_recv_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.recv_timeout = timeout.filter(|t| !t.is_zero());
        Ok(())
    }
}
