//! 전송 통계

use std::time::{Duration, Instant};

/// 전체 전송 통계
#[derive(Debug, Clone)]
pub struct TransferStats {
    /// 시작 시간
    pub start_time: Instant,

    /// ACK까지 받은 세그먼트 수
    pub acked_segments: u64,

    /// 송신한 데이터그램 수 (재전송 포함)
    pub datagrams_sent: u64,

    /// 송신한 바이트 (재전송 포함, 세그먼트 전체 크기 기준)
    pub bytes_sent: u64,

    /// 재전송 횟수
    pub retransmissions: u64,

    /// ACK 타임아웃 횟수
    pub timeouts: u64,

    /// 의도적으로 손상시킨 체크섬 수
    pub corrupted_checksums: u64,

    /// 마지막 ACK 시간
    pub last_ack_time: Option<Instant>,
}

impl TransferStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            acked_segments: 0,
            datagrams_sent: 0,
            bytes_sent: 0,
            retransmissions: 0,
            timeouts: 0,
            corrupted_checksums: 0,
            last_ack_time: None,
        }
    }

    /// 데이터그램 송신 기록
    pub fn record_send(&mut self, bytes: usize, corrupted: bool) {
        self.datagrams_sent += 1;
        self.bytes_sent += bytes as u64;
        if corrupted {
            self.corrupted_checksums += 1;
        }
    }

    /// 타임아웃 기록
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    /// 재전송 기록
    pub fn record_retransmit(&mut self) {
        self.retransmissions += 1;
    }

    /// ACK 기록
    pub fn record_ack(&mut self) {
        self.acked_segments += 1;
        self.last_ack_time = Some(Instant::now());
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 처리율 (bytes/sec)
    pub fn throughput(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.bytes_sent as f64 / elapsed
    }

    /// 재전송 비율
    pub fn retransmit_ratio(&self) -> f64 {
        if self.datagrams_sent == 0 {
            return 0.0;
        }
        self.retransmissions as f64 / self.datagrams_sent as f64
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Elapsed: {:.2}s | Segments: {} | Datagrams: {} | Bytes: {} | Throughput: {:.2} KB/s | Retransmits: {} ({:.1}%) | Timeouts: {} | Corrupted: {}",
            self.elapsed().as_secs_f64(),
            self.acked_segments,
            self.datagrams_sent,
            self.bytes_sent,
            self.throughput() / 1_000.0,
            self.retransmissions,
            self.retransmit_ratio() * 100.0,
            self.timeouts,
            self.corrupted_checksums,
        )
    }
}

impl Default for TransferStats {
    fn default() -> Self {
        Self::new()
    }
}
