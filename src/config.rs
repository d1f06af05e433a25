//! 클라이언트 설정

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};

/// 전송 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// ACK를 무한정 기다림, 재전송 없음
    #[default]
    NoTimeout,

    /// ACK 대기에 타임아웃 적용, 최대 재시도까지 재전송
    WithTimeout,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::NoTimeout => "nt",
            TransferMode::WithTimeout => "wt",
        }
    }
}

impl FromStr for TransferMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nt" | "no-timeout" => Ok(TransferMode::NoTimeout),
            "wt" | "with-timeout" => Ok(TransferMode::WithTimeout),
            other => Err(Error::InvalidTransferMode(other.to_string())),
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFT 클라이언트 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 IPv4 주소 (텍스트)
    pub server_addr: String,

    /// 서버 포트
    pub server_port: u16,

    /// 전송 모드
    pub transfer_mode: TransferMode,

    /// ACK 대기 타임아웃 (밀리초)
    pub timeout_ms: u64,

    /// 세그먼트당 최대 재시도 횟수
    pub max_retries: u32,

    /// 체크섬 손상 확률 (0.0 ~ 1.0)
    /// 0.0이면 손상 없음
    pub loss_prob: f32,

    /// 전송할 로컬 파일
    pub input_path: Option<PathBuf>,

    /// 서버에 알려줄 출력 파일 이름
    pub output_name: String,

    /// 손상 RNG 시드 (None이면 엔트로피 사용)
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1".to_string(),
            server_port: 20000,
            transfer_mode: TransferMode::NoTimeout,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_RETRIES,
            loss_prob: 0.0,
            input_path: None,
            output_name: String::new(),
            rng_seed: None,
        }
    }
}

impl Config {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 손실이 많은 네트워크 시뮬레이션용 설정
    pub fn lossy_network(loss_prob: f32) -> Self {
        Self {
            transfer_mode: TransferMode::WithTimeout,
            timeout_ms: 500,
            max_retries: 10,
            loss_prob,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.loss_prob) {
            return Err(Error::InvalidConfig(format!(
                "loss_prob must be within 0.0..=1.0, got {}",
                self.loss_prob
            )));
        }

        if self.transfer_mode == TransferMode::WithTimeout && self.timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "timeout_ms must be positive in with-timeout mode".to_string(),
            ));
        }

        Ok(())
    }
}
