pub mod dns;
mod ethernet;
mod ipv4;
mod ipv6;
mod udp;

use std::net::{IpAddr, SocketAddr};

use ethernet::{parse_ethernet, ETHERTYPE_IPV4, ETHERTYPE_IPV6};
use ipv4::parse_ipv4;
use ipv6::parse_ipv6;
use udp::parse_udp;

pub const DNS_PORT: u16 = 53;

/// Kernel-level capture filter installed on every device.
pub const CAPTURE_FILTER: &str = "udp and port 53";

const IPPROTO_UDP: u8 = 17;

/// Network layer view shared by IPv4 and IPv6.
#[derive(Debug, Clone, Copy)]
pub struct IpPacket<'a> {
    pub src: IpAddr,
    pub dst: IpAddr,
    pub protocol: u8,
    pub payload: &'a [u8],
}

/// A UDP payload that may hold a DNS message, with the server it was
/// exchanged with.
#[derive(Debug, Clone, Copy)]
pub struct DnsCandidate<'a> {
    pub server: SocketAddr,
    pub payload: &'a [u8],
}

/// Ethernet -> IPv4/IPv6 -> UDP demultiplexer with an optional server filter.
#[derive(Debug, Clone, Default)]
pub struct Demux {
    server: Option<SocketAddr>,
}

impl Demux {
    /// `server` keeps only traffic exchanged with `<server>:53`.
    pub fn new(server: Option<IpAddr>) -> Self {
        Self {
            server: server.map(|ip| SocketAddr::new(ip, DNS_PORT)),
        }
    }

    pub fn demux<'a>(&self, frame: &'a [u8]) -> Option<DnsCandidate<'a>> {
        let eth = parse_ethernet(frame)?;

        let ip = match eth.ethertype {
            ETHERTYPE_IPV4 => parse_ipv4(eth.payload)?,
            ETHERTYPE_IPV6 => parse_ipv6(eth.payload)?,
            _ => return None,
        };

        if ip.protocol != IPPROTO_UDP {
            return None;
        }

        let udp = parse_udp(ip.payload)?;
        let server = server_endpoint(ip.src, udp.src_port, ip.dst, udp.dst_port);

        if let Some(wanted) = self.server
            && server != wanted
        {
            return None;
        }

        Some(DnsCandidate {
            server,
            payload: udp.payload,
        })
    }
}

/// Infers the DNS server side of a datagram: a source port of 53 marks a
/// response and the source is the server, anything else is treated as sent
/// to the server.
pub fn server_endpoint(src: IpAddr, src_port: u16, dst: IpAddr, dst_port: u16) -> SocketAddr {
    if src_port == DNS_PORT {
        SocketAddr::new(src, src_port)
    } else {
        SocketAddr::new(dst, dst_port)
    }
}
