//! # RFT (Reliable File Transfer)
//!
//! UDP 기반 stop-and-wait ARQ 파일 전송 클라이언트
//!
//! ## 핵심 특징
//! - **Stop-and-wait**: 세그먼트 하나를 보내고 ACK를 받은 뒤에만 다음 세그먼트 전송
//! - **시퀀스 검증**: ACK는 방금 보낸 세그먼트의 시퀀스 번호를 그대로 돌려줘야 함
//! - **서버 검증**: 핸드쉐이크한 서버가 아닌 곳에서 온 응답은 거부
//! - **타임아웃 재전송**: 타임아웃 모드에서 ACK가 없으면 최대 재시도 횟수까지 재전송
//! - **손상 시뮬레이션**: 설정된 확률로 체크섬을 망가뜨려 재전송 경로 검증

pub mod checksum;
pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod peer;
pub mod reader;
pub mod segment;
pub mod sender;
pub mod state;
pub mod stats;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

pub use checksum::CorruptionOracle;
pub use config::{Config, TransferMode};
pub use context::ProtocolContext;
pub use error::{Error, Result};
pub use message::Metadata;
pub use peer::{AddrFamily, PeerIdentity};
pub use segment::{Segment, SegmentType};
pub use state::ProtoState;
pub use stats::TransferStats;
pub use transport::{DatagramTransport, UdpTransport};

/// 세그먼트 페이로드 용량 (바이트)
pub const PAYLOAD_SIZE: usize = 512;

/// 세그먼트 하나에 실리는 최대 파일 데이터 (바이트)
pub const MAX_FILE_DATA: usize = PAYLOAD_SIZE - 1;

/// 세그먼트 헤더 크기: type(4) + sq(4) + file_data(4) + checksum(4)
pub const SEGMENT_HEADER_SIZE: usize = 16;

/// 와이어 상의 세그먼트 전체 크기
pub const SEGMENT_SIZE: usize = SEGMENT_HEADER_SIZE + PAYLOAD_SIZE;

/// 메타데이터 파일 이름 필드 크기 (NUL 포함)
pub const MAX_FILENAME_SIZE: usize = 256;

/// 기본 ACK 대기 타임아웃 (밀리초)
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// 기본 최대 재시도 횟수
pub const DEFAULT_RETRIES: u32 = 3;
