//! Multi-homed scenarios over the 127/8 loopback range: bindx address
//! surfacing, connectx associations, and the default-peer fallback.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use sctpx::{
    dial_multi, listen_multi, listen_multi_init, EventMask, InitOptions, SctpAddr, SctpConn,
    SctpMultiAddr, SendInfo,
};

use crate::common::recv_user_msg;

fn lo(host: u8, port: u16) -> SctpAddr {
    SctpAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, host)), port)
}

fn multi(entries: &[(u8, u16)]) -> SctpMultiAddr {
    SctpMultiAddr::new(entries.iter().map(|&(h, p)| lo(h, p)).collect())
}

fn multi_listener() -> SctpConn {
    let srv = listen_multi_init(
        "sctp4",
        Some(&multi(&[(1, 0), (2, 0)])),
        &InitOptions {
            num_ostreams: 8,
            max_instreams: 8,
            ..Default::default()
        },
    )
    .expect("listen multi");
    srv.subscribe_events(&EventMask {
        association: true,
        shutdown: true,
        data_io: true,
        ..Default::default()
    })
    .expect("subscribe");
    srv
}

#[tokio::test]
async fn multi_listen_surfaces_extra_addresses() {
    require_sctp!();

    let srv = listen_multi("sctp4", Some(&multi(&[(1, 0), (2, 0)]))).expect("listen multi");
    let locals = srv.local_addrs().expect("local addrs");

    let port = locals[0].port;
    assert_ne!(port, 0, "first entry must carry the bound port");
    assert!(locals.iter().all(|a| a.port == port));
    assert!(
        locals
            .iter()
            .any(|a| a.ip == Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)))),
        "second bound address missing from {locals:?}"
    );
}

#[tokio::test]
async fn multi_dial_reaches_multi_listener() {
    require_sctp!();

    let srv = multi_listener();
    let port = srv.local_addrs().expect("local addrs")[0].port;

    let raddr = multi(&[(1, port), (2, port)]);
    let cli = dial_multi("sctp4", None, &raddr).expect("dial multi");

    // The stored peer vector is returned in full and in order.
    assert_eq!(cli.peer_addrs().expect("peer addrs"), raddr.addrs);
    // Both peers known: the default destination is the non-primary one.
    assert_eq!(cli.remote_addr(), Some(&raddr.addrs[1]));
    assert!(cli.assoc_id().is_some());

    let payload = b"sctp-multi-remote";
    let info = SendInfo {
        stream: 1,
        ppid: 11,
        ..Default::default()
    };
    cli.send_msg(payload, None, Some(&info)).await.expect("send");

    let mut buf = vec![0u8; 256];
    let msg = recv_user_msg(&srv, &mut buf).await;
    assert_eq!(&buf[..msg.len], payload);
    let info = msg.info.expect("SCTP_RCVINFO missing");
    assert_eq!(info.stream, 1);
    assert_eq!(info.ppid, 11);
}

#[tokio::test]
async fn multi_dial_falls_back_past_unavailable_primary() {
    require_sctp!();

    let srv = multi_listener();
    let port = srv.local_addrs().expect("local addrs")[0].port;

    // 127.0.0.3 is not bound by the listener; the association must come
    // up over the remaining addresses.
    let raddr = multi(&[(3, port), (1, port), (2, port)]);
    let cli = dial_multi("sctp4", None, &raddr).expect("dial multi");
    assert_eq!(cli.remote_addr(), Some(&raddr.addrs[1]));

    // A few spaced writes make failover deterministic while the dead
    // primary path is still converging.
    let payload = b"sctp-multi-fallback";
    let info = SendInfo {
        stream: 3,
        ppid: 77,
        ..Default::default()
    };
    for i in 0..3 {
        cli.send_msg(payload, None, Some(&info)).await.expect("send");
        if i != 2 {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    }

    let mut buf = vec![0u8; 256];
    loop {
        let msg = recv_user_msg(&srv, &mut buf).await;
        if &buf[..msg.len] == payload {
            let info = msg.info.expect("SCTP_RCVINFO missing");
            assert_eq!(info.stream, 3);
            assert_eq!(info.ppid, 77);
            break;
        }
    }
}

#[tokio::test]
async fn multi_dial_patches_zero_ports_on_extra_locals() {
    require_sctp!();

    let srv = multi_listener();
    let port = srv.local_addrs().expect("local addrs")[0].port;

    let laddr = multi(&[(1, 0), (2, 0)]);
    let raddr = multi(&[(1, port), (2, port)]);
    let cli = dial_multi("sctp4", Some(&laddr), &raddr).expect("dial multi");

    let locals = cli.local_addrs().expect("local addrs");
    assert_eq!(locals.len(), 2);
    let bound = locals[0].port;
    assert_ne!(bound, 0);
    assert!(locals.iter().all(|a| a.port == bound));

    cli.send_msg(b"multi-local-bind", None, None)
        .await
        .expect("send");
    let mut buf = vec![0u8; 256];
    let msg = recv_user_msg(&srv, &mut buf).await;
    assert_eq!(&buf[..msg.len], b"multi-local-bind");
}
