//! SCTP performance client.
//!
//! Drives the framed protocol spoken by `sctpx-perf-server`: DATA frames
//! echoed back in rtt mode, or a stream of DATA frames closed by STOP and
//! answered with one RESULT frame in throughput mode. Results come out as
//! a single `PERF_CLIENT_RESULT` record.

use std::time::{Duration, Instant};

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use clap::{Parser, ValueEnum};
use sctpx::{dial, resolve_addr, SctpConn, SendInfo};
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

#[derive(Parser)]
#[command(name = "sctpx-perf-client", about = "SCTP performance measurement client")]
struct Cli {
    /// Server host.
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(default_value_t = 19100)]
    port: u16,

    /// Measurement mode.
    #[arg(value_enum, default_value = "rtt")]
    mode: Mode,

    /// Number of DATA frames to send.
    #[arg(default_value_t = 200)]
    iterations: usize,

    /// Payload size in bytes.
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

/// Receive the next user frame, skipping stack notifications.
async fn recv_user_frame(conn: &SctpConn, buf: &mut [u8]) -> anyhow::Result<(u8, usize)> {
    loop {
        let msg = timeout(READ_TIMEOUT, conn.recv_msg(buf))
            .await
            .context("read timed out")??;
        if msg.is_notification() {
            continue;
        }
        anyhow::ensure!(msg.len > 0, "peer closed");
        let (kind, payload) = decode_frame(&buf[..msg.len])?;
        return Ok((kind, payload.len()));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    anyhow::ensure!(cli.iterations > 0, "iterations must be positive");
    anyhow::ensure!(cli.size > 0, "payload size must be positive");

    let raddr = resolve_addr("sctp4", &format!("{}:{}", cli.host, cli.port))
        .await
        .context("resolve server address")?;
    let conn = dial("sctp4", None, &raddr).context("dial")?;
    conn.set_nodelay(true).context("nodelay")?;

    let payload = vec![b'x'; cli.size];
    let info = SendInfo {
        ppid: PERF_PPID,
        ..Default::default()
    };
    let mut buf = vec![0u8; cli.size + 4096];

    let start = Instant::now();
    match cli.mode {
        Mode::Rtt => {
            for _ in 0..cli.iterations {
                conn.send_msg(&encode_frame(FRAME_DATA, &payload), None, Some(&info))
                    .await
                    .context("send")?;
                let (kind, size) = recv_user_frame(&conn, &mut buf).await?;
                anyhow::ensure!(
                    kind == FRAME_DATA,
                    "unexpected frame type in rtt response: {kind}"
                );
                anyhow::ensure!(
                    size == cli.size,
                    "unexpected payload size in rtt response: {size}"
                );
            }
            let elapsed = start.elapsed().as_secs_f64();
            let rtt_us = (elapsed / cli.iterations as f64) * 1_000_000.0;
            println!(
                "PERF_CLIENT_RESULT mode=rtt iterations={} size={} elapsed_s={:.6} rtt_us_avg={:.3} throughput_mbps=0.000",
                cli.iterations, cli.size, elapsed, rtt_us
            );
        }
        Mode::Throughput => {
            for _ in 0..cli.iterations {
                conn.send_msg(&encode_frame(FRAME_DATA, &payload), None, Some(&info))
                    .await
                    .context("send")?;
            }
            conn.send_msg(&encode_frame(FRAME_STOP, &[]), None, Some(&info))
                .await
                .context("send stop")?;
            let (kind, _) = recv_user_frame(&conn, &mut buf).await?;
            anyhow::ensure!(
                kind == FRAME_RESULT,
                "unexpected frame type in throughput response: {kind}"
            );
            let elapsed = start.elapsed().as_secs_f64();
            let throughput_mbps =
                ((cli.iterations * cli.size) as f64 * 8.0) / elapsed / 1_000_000.0;
            println!(
                "PERF_CLIENT_RESULT mode=throughput iterations={} size={} elapsed_s={:.6} rtt_us_avg=0.000 throughput_mbps={:.3}",
                cli.iterations, cli.size, elapsed, throughput_mbps
            );
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();
}
