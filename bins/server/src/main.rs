//! SCTP interop server: waits for one user message and reports it as a
//! single `KEY=value` record for test harnesses.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sctpx::{listen, resolve_addr, EventMask, InitOptions};
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Parser)]
#[command(name = "sctpx-server", about = "SCTP interop test server")]
struct Cli {
    /// Host to bind.
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(default_value_t = 19000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

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

    let mut buf = vec![0u8; 4096];
    loop {
        let msg = timeout(READ_TIMEOUT, conn.recv_msg(&mut buf))
            .await
            .context("read timed out")??;
        if msg.is_notification() {
            println!("SERVER_NOTIFY flags={}", msg.flags);
            continue;
        }
        let (stream, ppid) = msg
            .info
            .map(|i| (i64::from(i.stream), i.ppid))
            .unwrap_or((-1, 0));
        println!(
            "SERVER_RECV stream={} ppid={} payload={}",
            stream,
            ppid,
            String::from_utf8_lossy(&buf[..msg.len])
        );
        return Ok(());
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
