pub const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct UdpDatagram<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

/// Parses a UDP header (RFC 768). The payload is bounded by the Length field
/// when it is smaller than what was captured.
pub fn parse_udp(segment: &[u8]) -> Option<UdpDatagram<'_>> {
    if segment.len() < UDP_HEADER_LEN {
        return None;
    }

    let src_port = u16::from_be_bytes([segment[0], segment[1]]);
    let dst_port = u16::from_be_bytes([segment[2], segment[3]]);
    let length = u16::from_be_bytes([segment[4], segment[5]]) as usize; // header + data

    if length < UDP_HEADER_LEN {
        return None;
    }
    let end = length.min(segment.len());

    Some(UdpDatagram {
        src_port,
        dst_port,
        payload: &segment[UDP_HEADER_LEN..end],
    })
}
