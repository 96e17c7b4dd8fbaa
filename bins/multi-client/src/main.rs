//! Multi-homed SCTP interop client: dials a set of peer addresses and
//! sends a payload across the association.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sctpx::{dial_multi, resolve_multi_addr, SendInfo};

#[derive(Parser)]
#[command(name = "sctpx-multi-client", about = "Multi-homed SCTP interop test client")]
struct Cli {
    /// Comma-separated peer hosts.
    #[arg(default_value = "127.0.0.1,127.0.0.2")]
    hosts: String,

    /// Peer port shared by every host.
    #[arg(default_value_t = 19002)]
    port: u16,

    /// Message payload.
    #[arg(default_value = "multi-homed-hello")]
    payload: String,

    /// Stream id to send on.
    #[arg(default_value_t = 6)]
    stream: u16,

    /// Payload protocol identifier.
    #[arg(default_value_t = 404)]
    ppid: u32,
}

fn parse_hosts(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let hosts = parse_hosts(&cli.hosts);
    anyhow::ensure!(!hosts.is_empty(), "no hosts given");
    let addresses: Vec<String> = hosts
        .iter()
        .map(|h| format!("{}:{}", h, cli.port))
        .collect();

    let raddr = resolve_multi_addr("sctp4", &addresses)
        .await
        .context("resolve peer addresses")?;
    let conn = dial_multi("sctp4", None, &raddr).context("dial multi")?;

    let info = SendInfo {
        stream: cli.stream,
        ppid: cli.ppid,
        ..Default::default()
    };
    // With more than two peer addresses the first path is presumed down;
    // a few spaced sends make failover deterministic while connectx is
    // still converging.
    let writes = if hosts.len() > 2 { 3 } else { 1 };
    for i in 0..writes {
        conn.send_msg(cli.payload.as_bytes(), None, Some(&info))
            .await
            .context("send")?;
        if writes > 1 && i != writes - 1 {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    }

    println!(
        "MULTI_CLIENT_SENT stream={} ppid={} payload={}",
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
