use std::net::{IpAddr, Ipv4Addr};

use super::IpPacket;

const MIN_HEADER_LEN: usize = 20;

/// Parses an IPv4 header (RFC 791) and bounds the payload by Total Length so
/// Ethernet padding is not mistaken for transport bytes.
///
/// Non-initial fragments carry no transport header and are rejected.
pub fn parse_ipv4(payload: &[u8]) -> Option<IpPacket<'_>> {
    if payload.len() < MIN_HEADER_LEN || payload[0] >> 4 != 4 {
        return None;
    }

    let ihl = payload[0] & 0x0F;
    let ip_header_len = (ihl as usize) * 4;
    let total_len = u16::from_be_bytes([payload[2], payload[3]]) as usize;

    if ip_header_len < MIN_HEADER_LEN || total_len < ip_header_len {
        return None;
    }
    if payload.len() < ip_header_len {
        return None;
    }

    let fragment_offset = u16::from_be_bytes([payload[6], payload[7]]) & 0x1FFF;
    if fragment_offset != 0 {
        return None;
    }

    let src = Ipv4Addr::new(payload[12], payload[13], payload[14], payload[15]);
    let dst = Ipv4Addr::new(payload[16], payload[17], payload[18], payload[19]);
    let end = total_len.min(payload.len());

    Some(IpPacket {
        src: IpAddr::V4(src),
        dst: IpAddr::V4(dst),
        protocol: payload[9],
        payload: &payload[ip_header_len..end],
    })
}
