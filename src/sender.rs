//! 송신 상태 머신
//!
//! - Stop-and-wait: 세그먼트 하나 전송 → ACK 수신 → 검증 → 다음 세그먼트
//! - 무타임아웃 모드: ACK를 무한정 기다리고 재전송 없음
//! - 타임아웃 모드: ACK가 없으면 최대 재시도 횟수까지 같은 세그먼트 재전송
//! - 메타데이터 핸드쉐이크: 실패해도 에러 대신 false 반환

use std::io;
use std::net::SocketAddr;

use tracing::{debug, info, warn};

use crate::checksum::checksum;
use crate::context::ProtocolContext;
use crate::message::{Metadata, METADATA_SIZE};
use crate::peer::{sockaddr_size, PeerIdentity};
use crate::segment::{Segment, SegmentType};
use crate::state::ProtoState;
use crate::transport::{is_timeout, DatagramTransport};
use crate::{Result, TransferMode, SEGMENT_SIZE};

/// 수신한 ACK 데이터그램 정보
#[derive(Debug)]
struct AckReply {
    /// 수신 바이트 수
    len: usize,

    /// 송신 주소
    from: SocketAddr,

    /// 세그먼트로 해석 가능했는지
    decoded: bool,
}

/// 한 번의 수신 결과
#[derive(Debug)]
enum RecvOutcome {
    Ack(AckReply),
    Timeout,
    Error(io::Error),
}

/// 세그먼트 하나의 재전송 단계
#[derive(Debug)]
enum ArqPhase {
    Sending,
    AwaitingAck,
    Retrying,
    Done(AckReply),
    Failed(io::Error),
}

impl<T: DatagramTransport> ProtocolContext<T> {
    /// 현재 데이터 세그먼트 전송
    ///
    /// 타임아웃 모드에서는 재시도 한도를 확인하고 손상 확률에 따라 체크섬을 망가뜨림
    pub async fn send_data(&mut self) -> Result<()> {
        let mut corrupt = false;

        if self.tfr_mode == TransferMode::WithTimeout {
            if self.curr_retry > self.max_retries {
                warn!(
                    "재시도 한도 초과: sq={}, retry={}/{}",
                    self.data.sq, self.curr_retry, self.max_retries
                );
                return Err(self.fail(ProtoState::ExceedRetry));
            }

            corrupt = self.oracle.should_corrupt(self.loss_prob);
        }

        self.data.checksum = checksum(&self.data.payload, corrupt);
        if corrupt {
            debug!("세그먼트 {} 체크섬 손상 (시뮬레이션)", self.data.sq);
        }

        self.set_and_log(ProtoState::DataSend);

        let bytes = match self.data.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("세그먼트 직렬화 실패: {}", e);
                return Err(self.fail(ProtoState::BadSend));
            }
        };

        let target = self.server.socket_addr();
        let sent = match self.transport.as_ref() {
            Some(transport) => transport.send_to(&bytes, target).await,
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport not established",
            )),
        };

        match sent {
            Ok(n) if n == self.seg_size => {
                self.stats.record_send(n, corrupt);
                Ok(())
            }
            Ok(n) => {
                warn!("부분 전송: {}/{} bytes", n, self.seg_size);
                Err(self.fail(ProtoState::BadSend))
            }
            Err(e) => {
                warn!("전송 실패: {}", e);
                Err(self.fail(ProtoState::BadSend))
            }
        }
    }

    /// 무타임아웃 모드 파일 전송
    ///
    /// 응답이 오지 않으면 영원히 대기
    pub async fn send_file_normal(&mut self) -> Result<ProtoState> {
        self.set_and_log(ProtoState::StartSend);

        while self.tfr_bytes > 0 {
            self.read_chunk().await?;

            self.state = ProtoState::DataSend;
            self.send_data().await?;
            self.record_segment();

            self.set_and_log(ProtoState::AckWait);

            let reply = match self.recv_ack().await {
                RecvOutcome::Ack(reply) => reply,
                RecvOutcome::Timeout => {
                    warn!("ACK 대기 중 타임아웃: sq={}", self.data.sq);
                    return Err(self.fail(ProtoState::BadAck));
                }
                RecvOutcome::Error(e) => {
                    warn!("ACK 수신 에러: {}", e);
                    return Err(self.fail(ProtoState::BadAck));
                }
            };

            self.validate_ack(&reply)?;
            self.complete_segment();
        }

        Ok(self.finish())
    }

    /// 타임아웃 모드 파일 전송
    pub async fn send_file_with_timeout(&mut self) -> Result<ProtoState> {
        self.apply_receive_timeout()?;
        self.set_and_log(ProtoState::StartSend);

        while self.tfr_bytes > 0 {
            self.read_chunk().await?;

            self.state = ProtoState::DataSend;
            self.curr_retry = 0;

            let reply = self.exchange_with_retry().await?;

            self.validate_ack(&reply)?;
            self.complete_segment();
        }

        Ok(self.finish())
    }

    /// 전송 모드에 맞춰 파일 전송
    pub async fn send_file(&mut self) -> Result<ProtoState> {
        match self.tfr_mode {
            TransferMode::NoTimeout => self.send_file_normal().await,
            TransferMode::WithTimeout => self.send_file_with_timeout().await,
        }
    }

    /// 메타데이터 (출력 파일 이름, 크기) 전송
    ///
    /// 전체 레코드를 보냈을 때만 true
    pub async fn send_metadata(&mut self) -> bool {
        let metadata = Metadata::new(&self.out_fname, self.fsize);
        let bytes = match metadata.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("메타데이터 직렬화 실패: {}", e);
                return false;
            }
        };

        let Some(transport) = self.transport.as_ref() else {
            warn!("메타데이터 전송 불가: 전송 계층 없음");
            return false;
        };

        match transport.send_to(&bytes, self.server.socket_addr()).await {
            Ok(n) if n == METADATA_SIZE => {
                info!("Metadata sent: name={:?}, size={}", metadata.name, metadata.size);
                true
            }
            Ok(n) => {
                warn!("메타데이터 부분 전송: {}/{} bytes", n, METADATA_SIZE);
                false
            }
            Err(e) => {
                warn!("메타데이터 전송 실패: {}", e);
                false
            }
        }
    }

    /// 한 세그먼트의 전송-대기-재전송 루프
    async fn exchange_with_retry(&mut self) -> Result<AckReply> {
        let mut phase = ArqPhase::Sending;

        loop {
            phase = match phase {
                ArqPhase::Sending => {
                    self.send_data().await?;
                    if self.curr_retry == 0 {
                        self.record_segment();
                    } else {
                        self.stats.record_retransmit();
                    }
                    self.set_and_log(ProtoState::AckWait);
                    ArqPhase::AwaitingAck
                }
                ArqPhase::AwaitingAck => match self.recv_ack().await {
                    RecvOutcome::Ack(reply) => ArqPhase::Done(reply),
                    RecvOutcome::Timeout => {
                        self.stats.record_timeout();
                        self.set_and_log(ProtoState::NoAck);
                        ArqPhase::Retrying
                    }
                    RecvOutcome::Error(e) => ArqPhase::Failed(e),
                },
                ArqPhase::Retrying => {
                    self.curr_retry += 1;
                    warn!(
                        "ACK 없음, 재전송: sq={}, retry={}/{}",
                        self.data.sq, self.curr_retry, self.max_retries
                    );
                    ArqPhase::Sending
                }
                ArqPhase::Done(reply) => return Ok(reply),
                ArqPhase::Failed(e) => {
                    warn!("ACK 수신 에러: {}", e);
                    return Err(self.fail(ProtoState::BadAck));
                }
            };
        }
    }

    /// ACK 세그먼트를 비우고 데이터그램 하나 수신
    async fn recv_ack(&mut self) -> RecvOutcome {
        self.init_segment(SegmentType::Ack, false);

        // 한 바이트 여유를 둬서 너무 큰 응답도 길이 불일치로 잡음
        let mut buf = [0u8; SEGMENT_SIZE + 1];
        let received = match self.transport.as_ref() {
            Some(transport) => transport.recv_from(&mut buf).await,
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport not established",
            )),
        };

        match received {
            Ok((len, from)) => {
                let mut decoded = false;
                if len == self.seg_size {
                    match Segment::from_bytes(&buf[..len]) {
                        Ok(segment) => {
                            self.ack = segment;
                            decoded = true;
                        }
                        Err(e) => debug!("ACK 해석 실패: {}", e),
                    }
                }
                RecvOutcome::Ack(AckReply { len, from, decoded })
            }
            Err(e) if is_timeout(&e) => RecvOutcome::Timeout,
            Err(e) => RecvOutcome::Error(e),
        }
    }

    /// 길이, 시퀀스, 서버 순서로 ACK 검증
    fn validate_ack(&mut self, reply: &AckReply) -> Result<()> {
        if reply.len != self.seg_size || !reply.decoded {
            warn!(
                "잘못된 ACK: {} bytes from {} (expected {})",
                reply.len, reply.from, self.seg_size
            );
            return Err(self.fail(ProtoState::BadAck));
        }

        if self.data.sq != self.ack.sq {
            warn!(
                "ACK 시퀀스 불일치: expected {}, got {}",
                self.data.sq, self.ack.sq
            );
            return Err(self.fail(ProtoState::BadAckSequence));
        }

        let before = self.state;
        let observed = PeerIdentity::from_socket_addr(&reply.from);
        let state = self.verify_server(&observed, sockaddr_size(&reply.from));
        if state != before {
            warn!("다른 서버의 응답 거부: {}", reply.from);
            return Err(self.fail(state));
        }

        Ok(())
    }

    /// 다음 청크를 읽고, 선언된 크기보다 입력이 짧으면 실패
    async fn read_chunk(&mut self) -> Result<()> {
        let bytes_read = self.read_data().await?;
        if bytes_read == 0 && self.tfr_bytes > 0 {
            warn!(
                "입력이 예상보다 짧음: {} bytes 남음",
                self.tfr_bytes
            );
            return Err(self.fail(ProtoState::BadRead));
        }
        Ok(())
    }

    fn record_segment(&mut self) {
        self.total_segments += 1;
        self.total_file_data += u64::from(self.data.file_data);
    }

    /// 검증된 ACK 처리 후 다음 시퀀스로
    fn complete_segment(&mut self) {
        self.set_and_log(ProtoState::AckReceived);
        self.stats.record_ack();
        self.data.sq = self.data.sq.wrapping_add(1);
    }

    fn finish(&mut self) -> ProtoState {
        let state = if self.fsize > 0 {
            ProtoState::TransferComplete
        } else {
            ProtoState::EmptyFile
        };
        self.set_and_log(state);
        info!("Transfer finished: {}", self.stats.summary());
        state
    }
}
