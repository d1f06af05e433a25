//! 프로토콜 컨텍스트
//!
//! 한 번의 전송에 필요한 모든 가변 상태 (전송 계층, 서버 주소, 세그먼트 버퍼,
//! 입력 파일, 카운터, 재시도 설정)를 단독 소유하는 세션 객체.
//! 실패 경로는 프로세스를 끝내지 않고 [`Error::Fatal`]을 돌려주며,
//! 호출자가 중단 여부를 결정.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

use crate::checksum::CorruptionOracle;
use crate::peer::{self, PeerIdentity, SOCKADDR_IN_SIZE};
use crate::segment::{Segment, SegmentType};
use crate::state::ProtoState;
use crate::stats::TransferStats;
use crate::transport::{DatagramTransport, UdpTransport};
use crate::{
    Config, Error, Result, TransferMode, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS, SEGMENT_SIZE,
};

/// 입력 데이터 소스
pub type InputSource = Box<dyn AsyncRead + Unpin + Send>;

/// 프로토콜 세션
pub struct ProtocolContext<T = UdpTransport> {
    /// 전송 계층 (None이면 아직 설정되지 않음)
    pub(crate) transport: Option<T>,

    /// 핸드쉐이크한 서버
    pub(crate) server: PeerIdentity,

    /// 서버 소켓 주소 구조체 크기 (초기화 후 불변)
    sockaddr_size: usize,

    /// 현재 상태
    pub(crate) state: ProtoState,

    /// 마지막 상태 변경 위치
    src_location: Option<&'static Location<'static>>,

    /// 세그먼트 크기
    pub(crate) seg_size: usize,

    /// 송신 데이터 세그먼트
    pub(crate) data: Segment,

    /// 수신 ACK 세그먼트
    pub(crate) ack: Segment,

    /// 입력 파일
    pub(crate) in_file: Option<InputSource>,

    /// 입력 끝 도달 여부
    pub(crate) at_eof: bool,

    /// 남은 전송 바이트
    pub(crate) tfr_bytes: u64,

    /// 전송한 세그먼트 수
    pub(crate) total_segments: u64,

    /// 전송한 파일 데이터 합계
    pub(crate) total_file_data: u64,

    /// 파일 크기
    pub(crate) fsize: u64,

    /// 서버측 출력 파일 이름
    pub(crate) out_fname: String,

    /// 서버 주소 (텍스트)
    server_addr: String,

    /// 서버 포트
    server_port: u16,

    /// 전송 모드
    pub(crate) tfr_mode: TransferMode,

    /// ACK 대기 타임아웃
    pub(crate) timeout: Duration,

    /// 현재 세그먼트 재시도 횟수
    pub(crate) curr_retry: u32,

    /// 최대 재시도 횟수
    pub(crate) max_retries: u32,

    /// 체크섬 손상 확률
    pub(crate) loss_prob: f32,

    /// 손상 결정기
    pub(crate) oracle: CorruptionOracle,

    /// 전송 통계
    pub(crate) stats: TransferStats,
}

impl<T> ProtocolContext<T> {
    /// 기본값으로 초기화된 새 컨텍스트
    pub fn new() -> Self {
        Self {
            transport: None,
            server: PeerIdentity::default(),
            sockaddr_size: SOCKADDR_IN_SIZE,
            state: ProtoState::Init,
            src_location: None,
            seg_size: SEGMENT_SIZE,
            data: Segment::new(SegmentType::Data),
            ack: Segment::new(SegmentType::Ack),
            in_file: None,
            at_eof: false,
            tfr_bytes: 0,
            total_segments: 0,
            total_file_data: 0,
            fsize: 0,
            out_fname: String::new(),
            server_addr: String::new(),
            server_port: 0,
            tfr_mode: TransferMode::NoTimeout,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            curr_retry: 0,
            max_retries: DEFAULT_RETRIES,
            loss_prob: 0.0,
            oracle: CorruptionOracle::new(),
            stats: TransferStats::new(),
        }
    }

    /// 설정을 적용한 새 컨텍스트
    pub fn from_config(config: &Config) -> Self {
        let oracle = match config.rng_seed {
            Some(seed) => CorruptionOracle::with_seed(seed),
            None => CorruptionOracle::new(),
        };

        Self {
            server_addr: config.server_addr.clone(),
            server_port: config.server_port,
            tfr_mode: config.transfer_mode,
            timeout: config.timeout(),
            max_retries: config.max_retries,
            loss_prob: config.loss_prob,
            out_fname: config.output_name.clone(),
            oracle,
            ..Self::new()
        }
    }

    /// 세그먼트 초기화 (데이터 또는 ACK)
    pub fn init_segment(&mut self, seg_type: SegmentType, payload_only: bool) {
        match seg_type {
            SegmentType::Data => self.data.reset(SegmentType::Data, payload_only),
            SegmentType::Ack => self.ack.reset(SegmentType::Ack, payload_only),
        }
    }

    /// 입력 파일 열기
    pub async fn open_input(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref()).await?;
        let size = file.metadata().await?.len();
        self.set_input(file, size);
        Ok(())
    }

    /// 임의의 입력 소스 설정
    pub fn set_input<R>(&mut self, reader: R, size: u64)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.in_file = Some(Box::new(reader));
        self.at_eof = false;
        self.fsize = size;
        self.tfr_bytes = size;
    }

    /// 상태 변경 후 로그 기록
    #[track_caller]
    pub fn set_and_log(&mut self, state: ProtoState) {
        self.state = state;
        self.src_location = Some(Location::caller());
        self.log_protocol();
    }

    /// 실패 처리
    ///
    /// 상태와 위치를 기록하고 에러 로그를 남긴 뒤 호출자가 전파할 에러 반환
    #[track_caller]
    pub fn fail(&mut self, state: ProtoState) -> Error {
        let location = Location::caller();
        self.state = state;
        self.src_location = Some(location);

        error!(
            state = %state,
            src = %location,
            sq = self.data.sq,
            tfr_bytes = self.tfr_bytes,
            curr_retry = self.curr_retry,
            "전송 중단: {}",
            state
        );

        Error::Fatal {
            state,
            location: location.to_string(),
        }
    }

    fn log_protocol(&self) {
        let src = self
            .src_location
            .map(|l| l.to_string())
            .unwrap_or_default();

        info!(
            state = %self.state,
            src = %src,
            sq = self.data.sq,
            file_data = self.data.file_data,
            tfr_bytes = self.tfr_bytes,
            total_segments = self.total_segments,
            total_file_data = self.total_file_data,
            curr_retry = self.curr_retry,
            "{}",
            self.state
        );
    }

    /// 수신 주소가 핸드쉐이크한 서버인지 검증
    ///
    /// 일치하면 현재 상태를 그대로 반환
    pub fn verify_server(&self, observed: &PeerIdentity, observed_size: usize) -> ProtoState {
        peer::verify(
            &self.server,
            self.sockaddr_size,
            self.state,
            observed,
            observed_size,
        )
    }

    pub fn state(&self) -> ProtoState {
        self.state
    }

    pub fn src_location(&self) -> Option<&'static Location<'static>> {
        self.src_location
    }

    pub fn server(&self) -> &PeerIdentity {
        &self.server
    }

    pub fn sockaddr_size(&self) -> usize {
        self.sockaddr_size
    }

    pub fn data_segment(&self) -> &Segment {
        &self.data
    }

    pub fn ack_segment(&self) -> &Segment {
        &self.ack
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub fn fsize(&self) -> u64 {
        self.fsize
    }

    pub fn tfr_bytes(&self) -> u64 {
        self.tfr_bytes
    }

    pub fn total_segments(&self) -> u64 {
        self.total_segments
    }

    pub fn total_file_data(&self) -> u64 {
        self.total_file_data
    }

    pub fn curr_retry(&self) -> u32 {
        self.curr_retry
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.tfr_mode
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }
}

impl<T: DatagramTransport> ProtocolContext<T> {
    /// 외부에서 만든 전송 계층으로 서버 설정
    ///
    /// 주소 파싱에 실패하면 전송 계층을 버리고 상태를 바꾸지 않음.
    /// 호출자는 [`has_transport`](Self::has_transport)로 결과 확인.
    pub fn establish_transport_with(&mut self, transport: T) {
        self.server = PeerIdentity::default();

        match self.server_addr.parse::<Ipv4Addr>() {
            Ok(addr) => {
                self.server = PeerIdentity::new(addr, self.server_port);
                self.transport = Some(transport);
                self.state = ProtoState::TransferReady;
                info!("Transport ready: server {}", self.server.socket_addr());
            }
            Err(e) => {
                warn!("서버 주소 파싱 실패: {:?} ({})", self.server_addr, e);
                drop(transport);
                self.transport = None;
            }
        }
    }

    /// 수신 타임아웃 적용
    pub fn apply_receive_timeout(&mut self) -> Result<()> {
        let timeout = self.timeout;
        let applied = match self.transport.as_mut() {
            Some(transport) => transport.set_recv_timeout(Some(timeout)),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport not established",
            )),
        };

        if let Err(e) = applied {
            warn!("수신 타임아웃 설정 실패: {}", e);
            return Err(self.fail(ProtoState::BadSocketTimeout));
        }

        Ok(())
    }
}

impl ProtocolContext<UdpTransport> {
    /// UDP 소켓 생성 후 서버 설정
    ///
    /// 소켓 생성 실패 시 전송 계층 없이 반환
    pub async fn establish_transport(&mut self) {
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));

        match UdpTransport::bind(bind_addr).await {
            Ok(transport) => self.establish_transport_with(transport),
            Err(e) => {
                warn!("UDP 소켓 생성 실패: {}", e);
                self.transport = None;
            }
        }
    }
}

impl<T> Default for ProtocolContext<T> {
    fn default() -> Self {
        Self::new()
    }
}
