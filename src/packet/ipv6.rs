use std::net::{IpAddr, Ipv6Addr};

use super::IpPacket;

const HEADER_LEN: usize = 40;

/// Parses the fixed IPv6 header (RFC 8200). Extension headers are not
/// walked: `protocol` is whatever Next Header names.
pub fn parse_ipv6(payload: &[u8]) -> Option<IpPacket<'_>> {
    if payload.len() < HEADER_LEN || payload[0] >> 4 != 6 {
        return None;
    }

    let mut src = [0u8; 16];
    let mut dst = [0u8; 16];
    src.copy_from_slice(&payload[8..24]);
    dst.copy_from_slice(&payload[24..40]);

    let payload_len = u16::from_be_bytes([payload[4], payload[5]]) as usize;
    let end = (HEADER_LEN + payload_len).min(payload.len());

    Some(IpPacket {
        src: IpAddr::V6(Ipv6Addr::from(src)),
        dst: IpAddr::V6(Ipv6Addr::from(dst)),
        protocol: payload[6],
        payload: &payload[HEADER_LEN..end],
    })
}
