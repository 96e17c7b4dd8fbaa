//! Ancillary-data codec for per-message SCTP metadata.
//!
//! Mirrors the kernel's `struct cmsghdr`, `struct sctp_sndinfo` and
//! `struct sctp_rcvinfo` byte for byte: native endianness, explicit
//! padding, no reliance on compiler-inserted padding. The alignment and
//! length helpers reproduce the kernel's CMSG_* macros and are checked
//! against libc in the tests.

use std::mem;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::sctp::error::{Error, Result};
use crate::sctp::types::{RecvInfo, SendInfo};

/// Ancillary message types at level IPPROTO_SCTP.
const SCTP_CMSG_SNDINFO: i32 = 2;
const SCTP_CMSG_RCVINFO: i32 = 3;

/// Control messages are aligned to the platform word, as the kernel does.
const CMSG_ALIGNTO: usize = mem::size_of::<usize>();

const fn cmsg_align(len: usize) -> usize {
    (len + CMSG_ALIGNTO - 1) & !(CMSG_ALIGNTO - 1)
}

/// Header plus unpadded data (CMSG_LEN).
const fn cmsg_len(data_len: usize) -> usize {
    cmsg_align(mem::size_of::<RawCmsgHdr>()) + data_len
}

/// Header plus padded data (CMSG_SPACE).
const fn cmsg_space(data_len: usize) -> usize {
    cmsg_align(cmsg_len(data_len))
}

/// Size of the ancillary buffer handed to `recvmsg`: exactly one RCVINFO.
pub(crate) const fn recv_buffer_size() -> usize {
    cmsg_space(mem::size_of::<RawRecvInfo>())
}

/// Mirror of `struct cmsghdr`.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawCmsgHdr {
    len: usize,
    level: i32,
    kind: i32,
}

/// Mirror of `struct sctp_sndinfo`.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawSendInfo {
    stream: u16,
    flags: u16,
    ppid: u32,
    context: u32,
    assoc_id: i32,
}

/// Mirror of `struct sctp_rcvinfo`, including the reserved field after
/// the flags word.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RawRecvInfo {
    stream: u16,
    ssn: u16,
    flags: u16,
    reserved: u16,
    ppid: u32,
    tsn: u32,
    cum_tsn: u32,
    context: u32,
    assoc_id: i32,
}

/// Marshal optional send metadata into a `sendmsg` control buffer.
///
/// An empty result instructs the sender to omit ancillary data.
pub(crate) fn marshal_send_info(info: Option<&SendInfo>) -> Vec<u8> {
    let Some(info) = info else {
        return Vec::new();
    };
    let data_len = mem::size_of::<RawSendInfo>();
    let hdr = RawCmsgHdr {
        len: cmsg_len(data_len),
        level: libc::IPPROTO_SCTP,
        kind: SCTP_CMSG_SNDINFO,
    };
    let raw = RawSendInfo {
        stream: info.stream,
        flags: info.flags,
        ppid: info.ppid,
        context: info.context,
        assoc_id: info.assoc_id,
    };
    let mut buf = vec![0u8; cmsg_space(data_len)];
    buf[..mem::size_of::<RawCmsgHdr>()].copy_from_slice(hdr.as_bytes());
    let off = cmsg_align(mem::size_of::<RawCmsgHdr>());
    buf[off..off + data_len].copy_from_slice(raw.as_bytes());
    buf
}

/// Find and decode the first SCTP_RCVINFO control message in `oob`.
///
/// Unrelated control messages are skipped. Absence is not an error; a
/// truncated RCVINFO chunk is.
pub(crate) fn parse_recv_info(oob: &[u8]) -> Result<Option<RecvInfo>> {
    let hdr_size = mem::size_of::<RawCmsgHdr>();
    let mut rest = oob;
    while rest.len() >= hdr_size {
        let Ok((hdr, _)) = RawCmsgHdr::read_from_prefix(rest) else {
            break;
        };
        if hdr.len < hdr_size {
            break;
        }
        if hdr.level == libc::IPPROTO_SCTP && hdr.kind == SCTP_CMSG_RCVINFO {
            let want = mem::size_of::<RawRecvInfo>();
            let data_off = cmsg_align(hdr_size).min(rest.len());
            let data_end = hdr.len.min(rest.len());
            let data = &rest[data_off.min(data_end)..data_end];
            let Ok((raw, _)) = RawRecvInfo::read_from_prefix(data) else {
                return Err(Error::ShortControlMessage {
                    expected: want,
                    actual: data.len(),
                });
            };
            return Ok(Some(RecvInfo {
                stream: raw.stream,
                ssn: raw.ssn,
                flags: raw.flags,
                ppid: raw.ppid,
                tsn: raw.tsn,
                cum_tsn: raw.cum_tsn,
                context: raw.context,
                assoc_id: raw.assoc_id,
            }));
        }
        let advance = cmsg_align(hdr.len);
        if advance >= rest.len() {
            break;
        }
        rest = &rest[advance..];
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an ancillary chunk the way the kernel would deliver one.
    fn encode_chunk(level: i32, kind: i32, data: &[u8]) -> Vec<u8> {
        let hdr = RawCmsgHdr {
            len: cmsg_len(data.len()),
            level,
            kind,
        };
        let mut buf = vec![0u8; cmsg_space(data.len())];
        buf[..mem::size_of::<RawCmsgHdr>()].copy_from_slice(hdr.as_bytes());
        let off = cmsg_align(mem::size_of::<RawCmsgHdr>());
        buf[off..off + data.len()].copy_from_slice(data);
        buf
    }

    fn encode_rcv_info(raw: &RawRecvInfo) -> Vec<u8> {
        encode_chunk(libc::IPPROTO_SCTP, SCTP_CMSG_RCVINFO, raw.as_bytes())
    }

    #[test]
    fn test_struct_sizes_match_kernel() {
        assert_eq!(mem::size_of::<RawSendInfo>(), 16);
        assert_eq!(mem::size_of::<RawRecvInfo>(), 28);
        assert_eq!(
            mem::size_of::<RawCmsgHdr>(),
            mem::size_of::<libc::cmsghdr>()
        );
    }

    #[test]
    fn test_cmsg_helpers_match_libc() {
        for data_len in [0usize, 1, 7, 16, 28, 100] {
            assert_eq!(cmsg_len(data_len), unsafe {
                libc::CMSG_LEN(data_len as u32) as usize
            });
            assert_eq!(cmsg_space(data_len), unsafe {
                libc::CMSG_SPACE(data_len as u32) as usize
            });
        }
    }

    #[test]
    fn test_marshal_absent_is_empty() {
        assert!(marshal_send_info(None).is_empty());
    }

    #[test]
    fn test_marshal_layout() {
        let info = SendInfo {
            stream: 2,
            flags: 0,
            ppid: 42,
            context: 7,
            assoc_id: 5,
        };
        let buf = marshal_send_info(Some(&info));
        assert_eq!(buf.len(), cmsg_space(mem::size_of::<RawSendInfo>()));

        let (hdr, _) = RawCmsgHdr::read_from_prefix(&buf[..]).unwrap();
        assert_eq!(hdr.len, cmsg_len(mem::size_of::<RawSendInfo>()));
        assert_eq!(hdr.level, libc::IPPROTO_SCTP);
        assert_eq!(hdr.kind, SCTP_CMSG_SNDINFO);

        let off = cmsg_align(mem::size_of::<RawCmsgHdr>());
        let (raw, _) = RawSendInfo::read_from_prefix(&buf[off..]).unwrap();
        assert_eq!(raw.stream, 2);
        assert_eq!(raw.ppid, 42);
        assert_eq!(raw.context, 7);
        assert_eq!(raw.assoc_id, 5);
    }

    #[test]
    fn test_send_and_recv_layouts_agree() {
        // The fields both directions share sit at the same offsets in the
        // kernel structs only for stream/flags; cross-check through the
        // public types instead: marshal a send, rebuild the matching
        // receive chunk, and compare the intersection.
        let snd = SendInfo {
            stream: 9,
            flags: 3,
            ppid: 0x5052_4631,
            context: 11,
            assoc_id: 21,
        };
        let raw = RawRecvInfo {
            stream: snd.stream,
            ssn: 0,
            flags: snd.flags,
            reserved: 0,
            ppid: snd.ppid,
            tsn: 0,
            cum_tsn: 0,
            context: snd.context,
            assoc_id: snd.assoc_id,
        };
        let parsed = parse_recv_info(&encode_rcv_info(&raw)).unwrap().unwrap();
        assert_eq!(parsed.stream, snd.stream);
        assert_eq!(parsed.flags, snd.flags);
        assert_eq!(parsed.ppid, snd.ppid);
        assert_eq!(parsed.context, snd.context);
        assert_eq!(parsed.assoc_id, snd.assoc_id);
    }

    #[test]
    fn test_parse_skips_unrelated_control_messages() {
        let mut buf = encode_chunk(libc::SOL_SOCKET, libc::SCM_RIGHTS, &[0, 1, 2, 3]);
        let raw = RawRecvInfo {
            stream: 4,
            ssn: 1,
            flags: 0,
            reserved: 0,
            ppid: 99,
            tsn: 1000,
            cum_tsn: 999,
            context: 0,
            assoc_id: 3,
        };
        buf.extend_from_slice(&encode_rcv_info(&raw));

        let parsed = parse_recv_info(&buf).unwrap().unwrap();
        assert_eq!(parsed.stream, 4);
        assert_eq!(parsed.ssn, 1);
        assert_eq!(parsed.ppid, 99);
        assert_eq!(parsed.tsn, 1000);
        assert_eq!(parsed.cum_tsn, 999);
    }

    #[test]
    fn test_parse_absent_is_none() {
        assert!(parse_recv_info(&[]).unwrap().is_none());
        let unrelated = encode_chunk(libc::SOL_SOCKET, libc::SCM_RIGHTS, &[0; 4]);
        assert!(parse_recv_info(&unrelated).unwrap().is_none());
    }

    #[test]
    fn test_parse_truncated_rcv_info_is_error() {
        let raw = RawRecvInfo {
            stream: 1,
            ssn: 0,
            flags: 0,
            reserved: 0,
            ppid: 0,
            tsn: 0,
            cum_tsn: 0,
            context: 0,
            assoc_id: 0,
        };
        let mut buf = encode_rcv_info(&raw);
        // Chop the chunk mid-struct and fix the header to claim the
        // shorter length, as a truncating kernel would.
        buf.truncate(cmsg_len(12));
        let hdr = RawCmsgHdr {
            len: cmsg_len(12),
            level: libc::IPPROTO_SCTP,
            kind: SCTP_CMSG_RCVINFO,
        };
        buf[..mem::size_of::<RawCmsgHdr>()].copy_from_slice(hdr.as_bytes());

        let err = parse_recv_info(&buf).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortControlMessage {
                expected: 28,
                actual: 12
            }
        ));
    }
}
