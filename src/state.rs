//! 프로토콜 상태 정의

use std::fmt;

/// 프로토콜 상태
///
/// 제어 흐름 신호이자 로그 단위. `Init`만 초기 상태이고,
/// `Bad*`와 `ExceedRetry`는 전송을 중단시키는 실패 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtoState {
    #[default]
    Init,
    TransferReady,
    StartSend,
    DataSend,
    AckWait,
    AckReceived,
    NoAck,
    TransferComplete,
    EmptyFile,
    BadRead,
    BadSend,
    BadAck,
    BadAckSequence,
    BadSocketTimeout,
    ExceedRetry,
    BadServerSize,
    BadServerPort,
    BadServerFamily,
    BadServerAddress,
}

impl ProtoState {
    /// 로그에 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtoState::Init => "INIT",
            ProtoState::TransferReady => "TFR_READY",
            ProtoState::StartSend => "START_SEND",
            ProtoState::DataSend => "DATA_SEND",
            ProtoState::AckWait => "ACK_WAIT",
            ProtoState::AckReceived => "ACK_RECV",
            ProtoState::NoAck => "NO_ACK",
            ProtoState::TransferComplete => "TFR_COMPLETE",
            ProtoState::EmptyFile => "EMPTY_FILE",
            ProtoState::BadRead => "BAD_READ",
            ProtoState::BadSend => "BAD_SEND",
            ProtoState::BadAck => "BAD_ACK",
            ProtoState::BadAckSequence => "BAD_ACK_SQ",
            ProtoState::BadSocketTimeout => "BAD_SOCKTOUT",
            ProtoState::ExceedRetry => "EXCEED_RETRY",
            ProtoState::BadServerSize => "BAD_S_SIZE",
            ProtoState::BadServerPort => "BAD_S_PORT",
            ProtoState::BadServerFamily => "BAD_S_FAM",
            ProtoState::BadServerAddress => "BAD_S_ADDR",
        }
    }

    /// 전송을 중단시키는 실패 상태 여부
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProtoState::BadRead
                | ProtoState::BadSend
                | ProtoState::BadAck
                | ProtoState::BadAckSequence
                | ProtoState::BadSocketTimeout
                | ProtoState::ExceedRetry
                | ProtoState::BadServerSize
                | ProtoState::BadServerPort
                | ProtoState::BadServerFamily
                | ProtoState::BadServerAddress
        )
    }

    /// 성공 종료 상태 여부
    pub fn is_success(&self) -> bool {
        matches!(self, ProtoState::TransferComplete | ProtoState::EmptyFile)
    }

    /// 종료 상태 여부 (성공이든 실패든)
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_fatal()
    }
}

impl fmt::Display for ProtoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
