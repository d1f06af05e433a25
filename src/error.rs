//! 에러 타입 정의

use thiserror::Error;

use crate::state::ProtoState;

/// RFT 클라이언트 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("직렬화 에러: {0}")]
    Serialization(#[from] bincode::Error),

    /// 전송을 중단시키는 프로토콜 실패
    #[error("프로토콜 실패: state={state}, at {location}")]
    Fatal { state: ProtoState, location: String },

    #[error("유효하지 않은 세그먼트 크기: expected {expected}, got {got}")]
    InvalidSegmentSize { expected: usize, got: usize },

    #[error("알 수 없는 세그먼트 타입: {0}")]
    InvalidSegmentType(u32),

    #[error("유효하지 않은 메타데이터: {0}")]
    InvalidMetadata(String),

    #[error("유효하지 않은 전송 모드: {0}")]
    InvalidTransferMode(String),

    #[error("유효하지 않은 설정: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// 프로토콜 실패라면 종료 상태 반환
    pub fn state(&self) -> Option<ProtoState> {
        match self {
            Error::Fatal { state, .. } => Some(*state),
            _ => None,
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
