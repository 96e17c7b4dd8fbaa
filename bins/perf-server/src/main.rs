//! SCTP performance server.
//!
//! Speaks a simple framed protocol over SCTP messages:
//! `{kind:u8, length:u32 big-endian, payload}` with kinds DATA=1,
//! STOP=2, RESULT=3. In rtt mode every DATA frame is echoed; in
//! throughput mode DATA frames are counted until a STOP arrives, then a
//! single RESULT frame reports the totals.

use std::time::{Duration, Instant};

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use clap::{Parser, ValueEnum};
use sctpx::{listen, resolve_addr, EventMask, InitOptions, SendInfo};
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_secs(20);

const FRAME_DATA: u8 = 1;
const FRAME_STOP: u8 = 2;
const FRAME_RESULT: u8 = 3;

/// ASCII "PRF1".
const PERF_PPID: u32 = 0x5052_4631;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Rtt,
    Throughput,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Mode::Rtt => "rtt",
            Mode::Throughput => "throughput",
        }
    }
}

#[derive(Parser)]
#[command(name = "sctpx-perf-server", about = "SCTP performance measurement server")]
struct Cli {
    /// Host to bind.
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(default_value_t = 19100)]
    port: u16,

    /// Measurement mode.
    #[arg(value_enum, default_value = "rtt")]
    mode: Mode,

    /// Expected number of DATA frames.
    #[arg(default_value_t = 200)]
    iterations: usize,

    /// Expected payload size in bytes.
    #[arg(default_value_t = 256)]
    size: usize,
}

fn encode_frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = BytesMut::with_capacity(5 + payload.len());
    out.put_u8(kind);
    out.put_u32(payload.len() as u32);
    out.put_slice(payload);
    out.to_vec()
}

fn decode_frame(frame: &[u8]) -> anyhow::Result<(u8, &[u8])> {
    anyhow::ensure!(frame.len() >= 5, "short frame");
    let size = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]) as usize;
    anyhow::ensure!(
        frame.len() == 5 + size,
        "frame length mismatch: got={} want={}",
        frame.len() - 5,
        size
    );
    Ok((frame[0], &frame[5..]))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    anyhow::ensure!(cli.iterations > 0, "iterations must be positive");
    anyhow::ensure!(cli.size > 0, "payload size must be positive");

    let laddr = resolve_addr("sctp4", &format!("{}:{}", cli.host, cli.port))
        .await
        .context("resolve listen address")?;
    let conn = listen("sctp4", Some(&laddr)).context("listen")?;
    conn.set_init_options(&InitOptions {
        num_ostreams: 8,
        max_instreams: 8,
        ..Default::default()
    })
    .context("init options")?;
    conn.subscribe_events(&EventMask {
        association: true,
        shutdown: true,
        data_io: true,
        ..Default::default()
    })
    .context("subscribe events")?;

    println!(
        "PERF_SERVER_READY mode={} bind={}:{} iterations={} size={}",
        cli.mode.name(),
        cli.host,
        cli.port,
        cli.iterations,
        cli.size
    );

    let mut buf = vec![0u8; cli.size + 4096];
    let mut started: Option<Instant> = None;
    let mut messages = 0usize;
    let mut bytes_total = 0usize;

    loop {
        let msg = timeout(READ_TIMEOUT, conn.recv_msg(&mut buf))
            .await
            .context("read timed out")??;
        if msg.is_notification() {
            continue;
        }

        let (kind, payload) = decode_frame(&buf[..msg.len])?;
        let reply_info = SendInfo {
            stream: msg.info.map(|i| i.stream).unwrap_or(0),
            ppid: msg.info.map(|i| i.ppid).unwrap_or(PERF_PPID),
            ..Default::default()
        };

        match cli.mode {
            Mode::Rtt => {
                anyhow::ensure!(kind == FRAME_DATA, "unexpected frame type in rtt: {kind}");
                let start = *started.get_or_insert_with(Instant::now);
                messages += 1;
                bytes_total += payload.len();

                let echo = encode_frame(FRAME_DATA, payload);
                conn.send_msg(&echo, msg.from.as_ref(), Some(&reply_info))
                    .await
                    .context("echo")?;

                if messages >= cli.iterations {
                    let elapsed = start.elapsed().as_secs_f64();
                    println!(
                        "PERF_SERVER_DONE mode=rtt messages={messages} bytes={bytes_total} seconds={elapsed:.6}"
                    );
                    return Ok(());
                }
            }
            Mode::Throughput => {
                if kind == FRAME_DATA {
                    started.get_or_insert_with(Instant::now);
                    messages += 1;
                    bytes_total += payload.len();
                    continue;
                }
                anyhow::ensure!(
                    kind == FRAME_STOP,
                    "unexpected frame type in throughput: {kind}"
                );
                let elapsed = started
                    .map(|s| s.elapsed().as_secs_f64())
                    .unwrap_or_default();
                let result =
                    format!("messages={messages} bytes={bytes_total} seconds={elapsed:.6}");
                conn.send_msg(
                    &encode_frame(FRAME_RESULT, result.as_bytes()),
                    msg.from.as_ref(),
                    Some(&reply_info),
                )
                .await
                .context("send result")?;
                println!(
                    "PERF_SERVER_DONE mode=throughput messages={messages} bytes={bytes_total} seconds={elapsed:.6}"
                );
                return Ok(());
            }
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();
}
