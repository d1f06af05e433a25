//! RFT 클라이언트 - Reliable File Transfer
//!
//! Stop-and-wait ARQ 파일 전송 클라이언트
//! - 세그먼트마다 ACK를 받아야 다음 세그먼트 전송
//! - 타임아웃 모드에서 ACK가 없으면 재전송, 체크섬 손상 시뮬레이션 지원
//!
//! 사용법:
//!   cargo run --release --bin rft-client -- [OPTIONS]
//!
//! 예시:
//!   # 기본 전송 (무타임아웃)
//!   cargo run --release --bin rft-client -- -s 127.0.0.1 -p 20000 -i data.bin -o received.bin
//!
//!   # 타임아웃 모드 + 30% 손상
//!   cargo run --release --bin rft-client -- -i data.bin -o out.bin -m wt -t 1000 -r 5 -l 0.3

use std::path::PathBuf;

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use rft::{Config, ProtoState, ProtocolContext};

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" | "-s" => {
                if i + 1 < args.len() {
                    config.server_addr = args[i + 1].clone();
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    config.server_port = args[i + 1].parse().expect("유효한 포트 필요");
                    i += 1;
                }
            }
            "--mode" | "-m" => {
                if i + 1 < args.len() {
                    config.transfer_mode = args[i + 1].parse().expect("nt 또는 wt 필요");
                    i += 1;
                }
            }
            "--timeout" | "-t" => {
                if i + 1 < args.len() {
                    config.timeout_ms = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--retries" | "-r" => {
                if i + 1 < args.len() {
                    config.max_retries = args[i + 1].parse().expect("유효한 숫자 필요");
                    i += 1;
                }
            }
            "--loss" | "-l" => {
                if i + 1 < args.len() {
                    config.loss_prob = args[i + 1].parse().expect("0.0 ~ 1.0 확률 필요");
                    i += 1;
                }
            }
            "--input" | "-i" => {
                if i + 1 < args.len() {
                    config.input_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--output" | "-o" => {
                if i + 1 < args.len() {
                    config.output_name = args[i + 1].clone();
                    i += 1;
                }
            }
            "--seed" => {
                if i + 1 < args.len() {
                    config.rng_seed = Some(args[i + 1].parse().expect("유효한 숫자 필요"));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"RFT Client - Reliable File Transfer 클라이언트

UDP 기반 stop-and-wait ARQ 파일 전송
- 세그먼트마다 시퀀스 번호가 맞는 ACK를 받아야 다음 세그먼트 전송
- 타임아웃 모드에서 ACK가 없으면 최대 재시도 횟수까지 재전송

사용법:
  cargo run --release --bin rft-client -- [OPTIONS]

옵션:
  -s, --server <ADDR>    서버 IPv4 주소 (기본: 127.0.0.1)
  -p, --port <PORT>      서버 포트 (기본: 20000)
  -m, --mode <MODE>      전송 모드: nt (무타임아웃) 또는 wt (타임아웃) (기본: nt)
  -t, --timeout <MS>     ACK 대기 타임아웃 밀리초 (기본: 2000)
  -r, --retries <N>      세그먼트당 최대 재시도 횟수 (기본: 3)
  -l, --loss <PROB>      체크섬 손상 확률 0.0 ~ 1.0, wt 모드 전용 (기본: 0.0)
  -i, --input <PATH>     전송할 파일
  -o, --output <NAME>    서버에 저장될 파일 이름
  --seed <N>             손상 RNG 시드
  -h, --help             이 도움말 출력
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 설정
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = parse_args();
    config.validate()?;

    let input_path = config.input_path.clone().ok_or("입력 파일 필요 (--input)")?;
    if config.output_name.is_empty() {
        return Err("출력 파일 이름 필요 (--output)".into());
    }

    info!("RFT Client starting...");
    info!("Server: {}:{}", config.server_addr, config.server_port);
    info!("Mode: {}", config.transfer_mode);

    let mut ctx: ProtocolContext = ProtocolContext::from_config(&config);
    ctx.open_input(&input_path).await?;
    info!("Input: {:?} ({} bytes)", input_path, ctx.fsize());

    ctx.establish_transport().await;
    if !ctx.has_transport() {
        error!("UDP 소켓 설정 실패");
        std::process::exit(1);
    }

    if !ctx.send_metadata().await {
        error!("메타데이터 전송 실패");
        std::process::exit(1);
    }

    match ctx.send_file().await {
        Ok(state) => {
            info!("Transfer result: {}", state);
            info!("  Segments: {}", ctx.total_segments());
            info!("  File data: {} bytes", ctx.total_file_data());
            info!("  {}", ctx.stats().summary());
            if state == ProtoState::EmptyFile {
                info!("  입력 파일이 비어 있음, 메타데이터만 전송");
            }
            Ok(())
        }
        Err(e) => {
            error!("Transfer failed: {}", e);
            info!("  {}", ctx.stats().summary());
            std::process::exit(1);
        }
    }
}
