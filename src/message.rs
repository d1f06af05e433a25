//! 메타데이터 메시지 정의
//!
//! 세그먼트 루프 시작 전에 한 번만 보내는 (파일 이름, 파일 크기) 레코드

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result, MAX_FILENAME_SIZE};

/// 와이어 상의 메타데이터 크기: name(256) + size(8)
pub const METADATA_SIZE: usize = MAX_FILENAME_SIZE + 8;

/// 메타데이터 레코드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// 서버측 출력 파일 이름
    pub name: String,

    /// 파일 크기 (바이트)
    pub size: u64,
}

impl Metadata {
    /// 새 메타데이터 생성
    ///
    /// 이름은 NUL 종료가 들어갈 자리를 남기고 잘림 (UTF-8 경계 유지)
    pub fn new(name: &str, size: u64) -> Self {
        let mut end = name.len().min(MAX_FILENAME_SIZE - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        Self {
            name: name[..end].to_string(),
            size,
        }
    }

    /// 바이트로 직렬화 (항상 METADATA_SIZE)
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut name = [0u8; MAX_FILENAME_SIZE];
        let len = self.name.len().min(MAX_FILENAME_SIZE - 1);
        name[..len].copy_from_slice(&self.name.as_bytes()[..len]);

        let mut buf = BytesMut::with_capacity(METADATA_SIZE);
        buf.put_slice(&name);
        buf.put_slice(&bincode::serialize(&self.size)?);
        Ok(buf.freeze())
    }

    /// 바이트에서 역직렬화
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != METADATA_SIZE {
            return Err(Error::InvalidMetadata(format!(
                "expected {} bytes, got {}",
                METADATA_SIZE,
                bytes.len()
            )));
        }

        let name_field = &bytes[..MAX_FILENAME_SIZE];
        let end = name_field
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::InvalidMetadata("file name is not NUL-terminated".into()))?;
        let name = std::str::from_utf8(&name_field[..end])
            .map_err(|e| Error::InvalidMetadata(format!("file name is not UTF-8: {}", e)))?
            .to_string();
        let size: u64 = bincode::deserialize(&bytes[MAX_FILENAME_SIZE..])?;

        Ok(Self { name, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_layout() {
        let metadata = Metadata::new("out.bin", 1022);
        let bytes = metadata.to_bytes().unwrap();

        assert_eq!(bytes.len(), METADATA_SIZE);
        assert_eq!(&bytes[..7], b"out.bin");
        assert_eq!(bytes[7], 0);
        assert_eq!(&bytes[MAX_FILENAME_SIZE..], &1022u64.to_le_bytes());
        assert_eq!(Metadata::from_bytes(&bytes).unwrap(), metadata);
    }

    #[test]
    fn test_long_name_is_truncated_and_terminated() {
        let long_name = "가".repeat(200);
        let metadata = Metadata::new(&long_name, 5);

        assert!(metadata.name.len() < MAX_FILENAME_SIZE);
        let bytes = metadata.to_bytes().unwrap();
        let restored = Metadata::from_bytes(&bytes).unwrap();
        assert_eq!(restored.name, metadata.name);
        assert_eq!(restored.size, 5);
    }

    #[test]
    fn test_from_bytes_rejects_bad_input() {
        assert!(matches!(
            Metadata::from_bytes(&[0u8; METADATA_SIZE - 1]),
            Err(Error::InvalidMetadata(_))
        ));

        let unterminated = [b'a'; METADATA_SIZE];
        assert!(matches!(
            Metadata::from_bytes(&unterminated),
            Err(Error::InvalidMetadata(_))
        ));

        let mut bad_utf8 = [0u8; METADATA_SIZE];
        bad_utf8[0] = 0xFF;
        assert!(matches!(
            Metadata::from_bytes(&bad_utf8),
            Err(Error::InvalidMetadata(_))
        ));
    }
}
