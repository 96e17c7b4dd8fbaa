//! Multi-homed SCTP interop server: listens on several loopback
//! addresses and reports the first user message received.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sctpx::{listen_multi, resolve_multi_addr, EventMask, InitOptions};
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Parser)]
#[command(name = "sctpx-multi-server", about = "Multi-homed SCTP interop test server")]
struct Cli {
    /// Comma-separated hosts to bind.
    #[arg(default_value = "127.0.0.1,127.0.0.2")]
    hosts: String,

    /// Port to bind on every host.
    #[arg(default_value_t = 19002)]
    port: u16,
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

    let laddr = resolve_multi_addr("sctp4", &addresses)
        .await
        .context("resolve listen addresses")?;
    let conn = listen_multi("sctp4", Some(&laddr)).context("listen multi")?;
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
            println!("MULTI_SERVER_NOTIFY flags={}", msg.flags);
            continue;
        }
        let (stream, ppid) = msg
            .info
            .map(|i| (i64::from(i.stream), i.ppid))
            .unwrap_or((-1, 0));
        println!(
            "MULTI_SERVER_RECV stream={} ppid={} payload={}",
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

#[cfg(test)]
mod tests {
    use super::parse_hosts;

    #[test]
    fn test_parse_hosts() {
        assert_eq!(
            parse_hosts("127.0.0.1,127.0.0.2"),
            vec!["127.0.0.1", "127.0.0.2"]
        );
        assert_eq!(parse_hosts(" a , b ,, c "), vec!["a", "b", "c"]);
        assert!(parse_hosts("").is_empty());
    }
}
