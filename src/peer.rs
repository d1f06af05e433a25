//! 서버 식별 정보와 검증
//!
//! ACK가 클라이언트가 처음 연락한 서버에서 왔는지 확인

use std::net::{Ipv4Addr, SocketAddr};

use crate::state::ProtoState;

/// IPv4 소켓 주소 구조체 크기 (sockaddr_in)
pub const SOCKADDR_IN_SIZE: usize = 16;

/// IPv6 소켓 주소 구조체 크기 (sockaddr_in6)
pub const SOCKADDR_IN6_SIZE: usize = 28;

/// 주소 패밀리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddrFamily {
    /// 아직 설정되지 않음
    #[default]
    Unspecified,
    Inet,
    Inet6,
}

/// 서버 식별 정보 (패밀리, 포트, 32비트 주소)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerIdentity {
    pub family: AddrFamily,
    pub port: u16,
    pub addr: Ipv4Addr,
}

impl Default for PeerIdentity {
    fn default() -> Self {
        Self {
            family: AddrFamily::Unspecified,
            port: 0,
            addr: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl PeerIdentity {
    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self {
            family: AddrFamily::Inet,
            port,
            addr,
        }
    }

    /// 수신한 소켓 주소에서 식별 정보 추출
    ///
    /// IPv6 주소는 IPv4-mapped가 아니면 UNSPECIFIED 주소로 기록
    pub fn from_socket_addr(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Self::new(*v4.ip(), v4.port()),
            SocketAddr::V6(v6) => Self {
                family: AddrFamily::Inet6,
                port: v6.port(),
                addr: v6.ip().to_ipv4_mapped().unwrap_or(Ipv4Addr::UNSPECIFIED),
            },
        }
    }

    /// 송신 대상 소켓 주소
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.addr, self.port))
    }
}

/// 소켓 주소 구조체 크기
pub fn sockaddr_size(addr: &SocketAddr) -> usize {
    match addr {
        SocketAddr::V4(_) => SOCKADDR_IN_SIZE,
        SocketAddr::V6(_) => SOCKADDR_IN6_SIZE,
    }
}

/// 서버 검증
///
/// 크기 → 포트 → 패밀리 → 주소 순서로 비교하여 첫 불일치의 실패 상태 반환.
/// 모두 같으면 `current`를 그대로 반환하므로 호출자는 호출 전 상태와 비교해야 함.
pub fn verify(
    expected: &PeerIdentity,
    expected_size: usize,
    current: ProtoState,
    observed: &PeerIdentity,
    observed_size: usize,
) -> ProtoState {
    if observed_size != expected_size {
        return ProtoState::BadServerSize;
    }

    if observed.port != expected.port {
        return ProtoState::BadServerPort;
    }

    if observed.family != expected.family {
        return ProtoState::BadServerFamily;
    }

    if observed.addr != expected.addr {
        return ProtoState::BadServerAddress;
    }

    current
}
