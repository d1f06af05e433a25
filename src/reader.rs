//! 입력 파일 읽기
//!
//! 데이터 세그먼트 페이로드에 최대 `MAX_FILE_DATA` 바이트씩 채움

use std::io;

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::context::ProtocolContext;
use crate::segment::SegmentType;
use crate::state::ProtoState;
use crate::{Result, MAX_FILE_DATA};

impl<T> ProtocolContext<T> {
    /// 다음 청크를 데이터 세그먼트로 읽기
    ///
    /// 페이로드를 0으로 채운 뒤 입력 끝이 아니면 최대 `MAX_FILE_DATA` 바이트(남은 바이트 이하)를 읽고
    /// 읽은 만큼 `file_data`에 기록, 남은 바이트에서 차감. 입력 끝에서는 0바이트.
    pub async fn read_data(&mut self) -> Result<usize> {
        if self.in_file.is_none() {
            warn!("입력 파일이 열려 있지 않음");
            return Err(self.fail(ProtoState::BadRead));
        }

        self.init_segment(SegmentType::Data, true);

        // 선언된 크기를 넘는 입력은 읽지 않음
        let want = MAX_FILE_DATA.min(usize::try_from(self.tfr_bytes).unwrap_or(MAX_FILE_DATA));
        let mut bytes_read = 0;
        let mut read_error: Option<io::Error> = None;

        if let Some(reader) = self.in_file.as_mut() {
            while !self.at_eof && bytes_read < want {
                match reader.read(&mut self.data.payload[bytes_read..want]).await {
                    Ok(0) => self.at_eof = true,
                    Ok(n) => bytes_read += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        read_error = Some(e);
                        break;
                    }
                }
            }
        }

        if let Some(e) = read_error {
            warn!("입력 파일 읽기 실패: {}", e);
            return Err(self.fail(ProtoState::BadRead));
        }

        self.data.file_data = bytes_read as u32;
        self.tfr_bytes -= bytes_read as u64;

        debug!(
            "청크 읽기: sq={}, {} bytes, 남은 {} bytes",
            self.data.sq, bytes_read, self.tfr_bytes
        );

        Ok(bytes_read)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::{AsyncRead, ReadBuf};

    use super::*;
    use crate::test_util::MockTransport;
    use crate::PAYLOAD_SIZE;

    /// 한 번에 몇 바이트씩만 돌려주는 입력
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let end = (self.pos + self.step)
                .min(self.data.len())
                .min(self.pos + buf.remaining());
            let chunk = self.data[self.pos..end].to_vec();
            buf.put_slice(&chunk);
            self.pos = end;
            Poll::Ready(Ok(()))
        }
    }

    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk on fire")))
        }
    }

    #[tokio::test]
    async fn test_read_full_and_short_chunks() {
        let data: Vec<u8> = (0..600).map(|i| (i % 251) as u8).collect();
        let mut ctx = ProtocolContext::<MockTransport>::new();
        ctx.set_input(Cursor::new(data.clone()), data.len() as u64);

        assert_eq!(ctx.read_data().await.unwrap(), MAX_FILE_DATA);
        assert_eq!(ctx.data.file_data as usize, MAX_FILE_DATA);
        assert_eq!(ctx.data.data(), &data[..MAX_FILE_DATA]);
        assert_eq!(ctx.tfr_bytes(), 600 - MAX_FILE_DATA as u64);

        // 이전 청크 내용이 남아있지 않아야 함
        assert_eq!(ctx.read_data().await.unwrap(), 600 - MAX_FILE_DATA);
        assert_eq!(ctx.data.data(), &data[MAX_FILE_DATA..]);
        assert!(ctx.data.payload[600 - MAX_FILE_DATA..].iter().all(|&b| b == 0));
        assert_eq!(ctx.tfr_bytes(), 0);

        assert_eq!(ctx.read_data().await.unwrap(), 0);
        assert_eq!(ctx.data.file_data, 0);
        assert!(ctx.data.payload.iter().all(|&b| b == 0));
        assert_eq!(ctx.tfr_bytes(), 0);
    }

    #[tokio::test]
    async fn test_last_payload_byte_stays_zero() {
        let data = vec![0xAAu8; PAYLOAD_SIZE * 2];
        let mut ctx = ProtocolContext::<MockTransport>::new();
        ctx.set_input(Cursor::new(data), (PAYLOAD_SIZE * 2) as u64);

        ctx.read_data().await.unwrap();
        assert_eq!(ctx.data.payload[PAYLOAD_SIZE - 1], 0);
    }

    #[tokio::test]
    async fn test_short_reads_fill_chunk() {
        let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        let mut ctx = ProtocolContext::<MockTransport>::new();
        ctx.set_input(
            Trickle {
                data: data.clone(),
                pos: 0,
                step: 7,
            },
            data.len() as u64,
        );

        assert_eq!(ctx.read_data().await.unwrap(), MAX_FILE_DATA);
        assert_eq!(ctx.data.data(), &data[..MAX_FILE_DATA]);
    }

    #[tokio::test]
    async fn test_read_stops_at_declared_size() {
        let mut ctx = ProtocolContext::<MockTransport>::new();
        ctx.set_input(Cursor::new(vec![7u8; 1000]), 10);

        assert_eq!(ctx.read_data().await.unwrap(), 10);
        assert_eq!(ctx.data.file_data, 10);
        assert!(ctx.data.payload[10..].iter().all(|&b| b == 0));
        assert_eq!(ctx.tfr_bytes(), 0);

        assert_eq!(ctx.read_data().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_input_is_bad_read() {
        let mut ctx = ProtocolContext::<MockTransport>::new();
        let err = ctx.read_data().await.unwrap_err();
        assert_eq!(err.state(), Some(ProtoState::BadRead));
    }

    #[tokio::test]
    async fn test_read_error_is_bad_read() {
        let mut ctx = ProtocolContext::<MockTransport>::new();
        ctx.set_input(Broken, 10);
        let err = ctx.read_data().await.unwrap_err();
        assert_eq!(err.state(), Some(ProtoState::BadRead));
        assert_eq!(ctx.state(), ProtoState::BadRead);
    }
}
