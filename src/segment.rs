//! 세그먼트 정의
//!
//! - 데이터 세그먼트: 파일 조각 + 체크섬 + 시퀀스 번호
//! - ACK 세그먼트: 같은 모양, 페이로드는 사용하지 않음 (0으로 채움)
//!
//! 와이어 상에서 두 종류 모두 고정 크기 [`SEGMENT_SIZE`]

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, PAYLOAD_SIZE, SEGMENT_HEADER_SIZE, SEGMENT_SIZE};

/// 시퀀스 번호
pub type SequenceNumber = u32;

/// 세그먼트 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SegmentType {
    /// 파일 데이터
    Data = 1,

    /// 수신 확인
    Ack = 2,
}

impl TryFrom<u32> for SegmentType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(SegmentType::Data),
            2 => Ok(SegmentType::Ack),
            other => Err(Error::InvalidSegmentType(other)),
        }
    }
}

/// 세그먼트 헤더 (bincode 고정 폭 리틀 엔디안, 16바이트)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct SegmentHeader {
    seg_type: u32,
    sq: SequenceNumber,
    file_data: u32,
    checksum: u32,
}

/// 고정 크기 세그먼트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 세그먼트 타입
    pub seg_type: SegmentType,

    /// 시퀀스 번호
    pub sq: SequenceNumber,

    /// 페이로드 중 유효한 파일 데이터 길이
    pub file_data: u32,

    /// 페이로드 체크섬
    pub checksum: u32,

    /// 페이로드 (나머지는 0으로 채움)
    pub payload: [u8; PAYLOAD_SIZE],
}

impl Segment {
    /// 0으로 초기화된 새 세그먼트
    pub fn new(seg_type: SegmentType) -> Self {
        Self {
            seg_type,
            sq: 0,
            file_data: 0,
            checksum: 0,
            payload: [0u8; PAYLOAD_SIZE],
        }
    }

    /// ACK 세그먼트 생성
    pub fn ack(sq: SequenceNumber) -> Self {
        Self {
            sq,
            ..Self::new(SegmentType::Ack)
        }
    }

    /// 세그먼트 초기화
    ///
    /// `payload_only`가 true면 페이로드만 0으로 채우고 타입, 시퀀스, 체크섬,
    /// 길이는 유지. false면 전체를 0으로 채우고 타입을 `seg_type`으로 설정.
    pub fn reset(&mut self, seg_type: SegmentType, payload_only: bool) {
        if payload_only {
            self.payload.fill(0);
        } else {
            *self = Self::new(seg_type);
        }
    }

    /// 유효한 파일 데이터
    pub fn data(&self) -> &[u8] {
        let len = (self.file_data as usize).min(PAYLOAD_SIZE);
        &self.payload[..len]
    }

    /// 세그먼트를 바이트로 직렬화 (항상 SEGMENT_SIZE)
    pub fn to_bytes(&self) -> Result<Bytes> {
        let header = SegmentHeader {
            seg_type: self.seg_type as u32,
            sq: self.sq,
            file_data: self.file_data,
            checksum: self.checksum,
        };
        let header_bytes = bincode::serialize(&header)?;
        debug_assert_eq!(header_bytes.len(), SEGMENT_HEADER_SIZE);

        let mut buf = BytesMut::with_capacity(SEGMENT_SIZE);
        buf.put_slice(&header_bytes);
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }

    /// 바이트에서 세그먼트 역직렬화
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SEGMENT_SIZE {
            return Err(Error::InvalidSegmentSize {
                expected: SEGMENT_SIZE,
                got: bytes.len(),
            });
        }

        let header: SegmentHeader = bincode::deserialize(&bytes[..SEGMENT_HEADER_SIZE])?;
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&bytes[SEGMENT_HEADER_SIZE..]);

        Ok(Self {
            seg_type: SegmentType::try_from(header.seg_type)?,
            sq: header.sq,
            file_data: header.file_data,
            checksum: header.checksum,
            payload,
        })
    }
}
