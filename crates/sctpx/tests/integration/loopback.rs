//! Single-homed loopback scenarios: metadata round trips, notification
//! skipping, and message boundary preservation.

use std::net::{IpAddr, Ipv4Addr};

use sctpx::{dial, listen, Error, EventMask, InitOptions, SctpAddr, SendInfo};

use crate::common::recv_user_msg;

fn loopback(port: u16) -> SctpAddr {
    SctpAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

fn server_options() -> (InitOptions, EventMask) {
    (
        InitOptions {
            num_ostreams: 8,
            max_instreams: 8,
            ..Default::default()
        },
        EventMask {
            association: true,
            shutdown: true,
            data_io: true,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn loopback_read_write_with_metadata() {
    require_sctp!();

    let (init, events) = server_options();
    let srv = listen("sctp4", Some(&loopback(0))).expect("listen");
    srv.set_init_options(&init).expect("init options");
    srv.subscribe_events(&events).expect("subscribe");

    let saddr = srv.local_addr().expect("server local addr");
    assert_ne!(saddr.port, 0);

    let cli = dial("sctp4", None, &saddr).expect("dial");
    cli.set_nodelay(true).expect("nodelay");

    let payload = b"sctp-loopback-test";
    let info = SendInfo {
        stream: 2,
        ppid: 42,
        ..Default::default()
    };
    let sent = cli.send_msg(payload, None, Some(&info)).await.expect("send");
    assert_eq!(sent, payload.len());

    let mut buf = vec![0u8; 256];
    let msg = recv_user_msg(&srv, &mut buf).await;
    assert_eq!(&buf[..msg.len], payload);
    assert!(msg.from.is_some(), "kernel source address missing");
    let info = msg.info.expect("SCTP_RCVINFO missing");
    assert_eq!(info.stream, 2);
    assert_eq!(info.ppid, 42);
}

#[tokio::test]
async fn dial_stores_peer_and_local_vectors() {
    require_sctp!();

    let srv = listen("sctp4", Some(&loopback(0))).expect("listen");
    let saddr = srv.local_addr().expect("server local addr");

    let cli = dial("sctp4", None, &saddr).expect("dial");
    let peers = cli.peer_addrs().expect("peer addrs");
    assert_eq!(peers, vec![saddr.clone()]);
    assert_eq!(cli.remote_addr(), Some(&saddr));
    assert_eq!(cli.local_addrs().expect("local addrs").len(), 1);
}

#[tokio::test]
async fn message_boundaries_survive_framed_payloads() {
    require_sctp!();

    let (init, events) = server_options();
    let srv = listen("sctp4", Some(&loopback(0))).expect("listen");
    srv.set_init_options(&init).expect("init options");
    srv.subscribe_events(&events).expect("subscribe");
    let saddr = srv.local_addr().expect("server local addr");

    let cli = dial("sctp4", None, &saddr).expect("dial");

    // A length-prefixed frame must arrive in one read with its length
    // intact; SEQPACKET may not split or merge messages.
    let body = vec![b'x'; 512];
    let mut frame = Vec::with_capacity(5 + body.len());
    frame.push(1u8);
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);

    for _ in 0..3 {
        cli.send_msg(&frame, None, None).await.expect("send frame");
    }

    // Server echoes each frame back to its source, as an echo server
    // would; both directions must preserve the frame intact.
    let mut buf = vec![0u8; 4096];
    for _ in 0..3 {
        let msg = recv_user_msg(&srv, &mut buf).await;
        assert_eq!(msg.len, frame.len());
        assert_eq!(buf[0], 1);
        let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        assert_eq!(len, body.len());
        srv.send_msg(&buf[..msg.len], msg.from.as_ref(), None)
            .await
            .expect("echo frame");
    }

    let mut echo_buf = vec![0u8; 4096];
    for _ in 0..3 {
        let msg = recv_user_msg(&cli, &mut echo_buf).await;
        assert_eq!(&echo_buf[..msg.len], &frame[..]);
    }
}

#[tokio::test]
async fn write_without_destination_fails_on_listener() {
    require_sctp!();

    // A listener has no default peer, so an unaddressed send cannot pick
    // a destination.
    let srv = listen("sctp4", Some(&loopback(0))).expect("listen");
    let err = srv.send_msg(b"x", None, None).await.unwrap_err();
    assert!(matches!(err.root_cause(), Error::MissingAddress));
}
