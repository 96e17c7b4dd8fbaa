//! SCTP interop client: sends one message with per-message metadata and
//! reports what it sent.

use anyhow::Context;
use clap::Parser;
use sctpx::{dial, resolve_addr, SendInfo};

#[derive(Parser)]
#[command(name = "sctpx-client", about = "SCTP interop test client")]
struct Cli {
    /// Server host.
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(default_value_t = 19001)]
    port: u16,

    /// Message payload.
    #[arg(default_value = "hello-from-sctpx")]
    payload: String,

    /// Stream id to send on.
    #[arg(default_value_t = 2)]
    stream: u16,

    /// Payload protocol identifier.
    #[arg(default_value_t = 7)]
    ppid: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let raddr = resolve_addr("sctp4", &format!("{}:{}", cli.host, cli.port))
        .await
        .context("resolve server address")?;
    let conn = dial("sctp4", None, &raddr).context("dial")?;
    conn.set_nodelay(true).context("nodelay")?;

    let info = SendInfo {
        stream: cli.stream,
        ppid: cli.ppid,
        ..Default::default()
    };
    conn.send_msg(cli.payload.as_bytes(), None, Some(&info))
        .await
        .context("send")?;

    println!(
        "CLIENT_SENT stream={} ppid={} payload={}",
        cli.stream, cli.ppid, cli.payload
    );
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
