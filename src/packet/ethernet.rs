pub const ETHERNET_HEADER_LEN: usize = 14;
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// An Ethernet II frame split into its EtherType and payload.
#[derive(Debug, Clone, Copy)]
pub struct EthernetFrame<'a> {
    pub ethertype: u16,
    pub payload: &'a [u8],
}

/// Entry point for Ethernet-framed captures.
///
/// Layout: destination MAC (6), source MAC (6), EtherType (2), payload.
pub fn parse_ethernet(data: &[u8]) -> Option<EthernetFrame<'_>> {
    if data.len() < ETHERNET_HEADER_LEN {
        return None;
    }

    Some(EthernetFrame {
        ethertype: u16::from_be_bytes([data[12], data[13]]),
        payload: &data[ETHERNET_HEADER_LEN..],
    })
}
