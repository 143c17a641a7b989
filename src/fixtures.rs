//! Hand-built wire data and in-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::net::{Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};

use crate::capture::{CaptureError, Frame, FrameSource};
use crate::core::record::EnrichedRecord;
use crate::packet::dns;
use crate::ui::RecordSink;

pub const CLIENT: [u8; 4] = [192, 168, 1, 20];
pub const RESOLVER: [u8; 4] = [1, 1, 1, 1];
const CLIENT_PORT: u16 = 40000;

/// Uncompressed wire encoding of a dotted name.
pub fn name(dotted: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in dotted.split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

/// Compression pointer to `offset`.
pub fn pointer(offset: u16) -> Vec<u8> {
    (0xC000 | offset).to_be_bytes().to_vec()
}

/// A class IN resource record with a pre-encoded owner.
pub fn record(owner: Vec<u8>, rtype: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
    let mut out = owner;
    out.extend_from_slice(&rtype.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&ttl.to_be_bytes());
    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    out.extend_from_slice(rdata);
    out
}

pub struct MessageBuilder {
    id: u16,
    flags: u16,
    questions: Vec<Vec<u8>>,
    answers: Vec<Vec<u8>>,
    authorities: Vec<Vec<u8>>,
    additionals: Vec<Vec<u8>>,
}

impl MessageBuilder {
    fn new(id: u16, flags: u16) -> Self {
        Self {
            id,
            flags,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Standard query with RD set.
    pub fn query(id: u16) -> Self {
        Self::new(id, 0x0100)
    }

    /// Standard response with RD and RA set, NOERROR.
    pub fn response(id: u16) -> Self {
        Self::new(id, 0x8180)
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn question(mut self, qname: &str, qtype: u16) -> Self {
        let mut q = name(qname);
        q.extend_from_slice(&qtype.to_be_bytes());
        q.extend_from_slice(&1u16.to_be_bytes());
        self.questions.push(q);
        self
    }

    pub fn answer(self, owner: &str, rtype: u16, ttl: u32, rdata: Vec<u8>) -> Self {
        self.answer_raw(record(name(owner), rtype, ttl, &rdata))
    }

    pub fn answer_raw(mut self, raw: Vec<u8>) -> Self {
        self.answers.push(raw);
        self
    }

    pub fn authority(mut self, owner: &str, rtype: u16, ttl: u32, rdata: Vec<u8>) -> Self {
        self.authorities.push(record(name(owner), rtype, ttl, &rdata));
        self
    }

    pub fn additional(self, owner: &str, rtype: u16, ttl: u32, rdata: Vec<u8>) -> Self {
        self.additional_raw(record(name(owner), rtype, ttl, &rdata))
    }

    pub fn additional_raw(mut self, raw: Vec<u8>) -> Self {
        self.additionals.push(raw);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        for field in [
            self.id,
            self.flags,
            self.questions.len() as u16,
            self.answers.len() as u16,
            self.authorities.len() as u16,
            self.additionals.len() as u16,
        ] {
            out.extend_from_slice(&field.to_be_bytes());
        }
        for part in self
            .questions
            .iter()
            .chain(&self.answers)
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            out.extend_from_slice(part);
        }
        out
    }
}

fn ethernet(ethertype: u16, l3: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x02, 0, 0, 0, 0, 0x01, 0x02, 0, 0, 0, 0, 0x02];
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(l3);
    frame
}

fn udp(sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
    let mut seg = Vec::with_capacity(8 + payload.len());
    seg.extend_from_slice(&sport.to_be_bytes());
    seg.extend_from_slice(&dport.to_be_bytes());
    seg.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
    seg.extend_from_slice(&[0, 0]);
    seg.extend_from_slice(payload);
    seg
}

/// Ethernet + IPv4 (no options) around an arbitrary layer 4 payload.
pub fn ipv4_frame(protocol: u8, src: [u8; 4], dst: [u8; 4], l4: &[u8]) -> Vec<u8> {
    let total = (20 + l4.len()) as u16;
    let mut ip = vec![0x45, 0];
    ip.extend_from_slice(&total.to_be_bytes());
    ip.extend_from_slice(&[0, 0, 0x40, 0x00, 64, protocol, 0, 0]);
    ip.extend_from_slice(&src);
    ip.extend_from_slice(&dst);
    ip.extend_from_slice(l4);
    ethernet(0x0800, &ip)
}

pub fn udp_v4_frame(src: [u8; 4], sport: u16, dst: [u8; 4], dport: u16, payload: &[u8]) -> Vec<u8> {
    ipv4_frame(17, src, dst, &udp(sport, dport, payload))
}

pub fn udp_v6_frame(
    src: Ipv6Addr,
    sport: u16,
    dst: Ipv6Addr,
    dport: u16,
    payload: &[u8],
) -> Vec<u8> {
    let seg = udp(sport, dport, payload);
    let mut ip = vec![0x60, 0, 0, 0];
    ip.extend_from_slice(&(seg.len() as u16).to_be_bytes());
    ip.extend_from_slice(&[17, 64]);
    ip.extend_from_slice(&src.octets());
    ip.extend_from_slice(&dst.octets());
    ip.extend_from_slice(&seg);
    ethernet(0x86DD, &ip)
}

/// Client -> resolver query frame.
pub fn dns_query_frame(id: u16, qname: &str, qtype: u16) -> Vec<u8> {
    let payload = MessageBuilder::query(id).question(qname, qtype).build();
    udp_v4_frame(CLIENT, CLIENT_PORT, RESOLVER, 53, &payload)
}

/// Resolver -> client response frame with a single A answer.
pub fn dns_response_frame(id: u16, qname: &str, qtype: u16) -> Vec<u8> {
    udp_v4_frame(RESOLVER, 53, CLIENT, CLIENT_PORT, &response_payload(id, qname, qtype))
}

fn response_payload(id: u16, qname: &str, qtype: u16) -> Vec<u8> {
    MessageBuilder::response(id)
        .question(qname, qtype)
        .answer(qname, 1, 300, vec![93, 184, 216, 34])
        .build()
}

/// A matched response as the pipeline would build it, 12.345ms after the
/// query.
pub fn enriched_record(device: &str, server: &str, qname: &str, qtype: u16) -> EnrichedRecord {
    let payload = response_payload(0x2a, qname, qtype);
    let sent = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    EnrichedRecord {
        when: DateTime::<Local>::from(sent),
        size: payload.len(),
        elapsed: Duration::from_micros(12_345),
        device: device.to_string(),
        server: server.parse::<SocketAddr>().unwrap(),
        message: dns::decode(&payload).unwrap(),
    }
}

/// Replays a fixed list of frames, then reports the capture closed (or keeps
/// timing out when idle).
pub struct ReplaySource {
    frames: VecDeque<(Vec<u8>, SystemTime)>,
    current: Option<(Vec<u8>, SystemTime)>,
    idle_when_drained: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<(Vec<u8>, SystemTime)>) -> Self {
        Self {
            frames: frames.into(),
            current: None,
            idle_when_drained: false,
        }
    }

    /// A source that never delivers anything and never closes.
    pub fn idle() -> Self {
        Self {
            frames: VecDeque::new(),
            current: None,
            idle_when_drained: true,
        }
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<Frame<'_>>, CaptureError> {
        match self.frames.pop_front() {
            Some(next) => {
                let (data, timestamp) = self.current.insert(next);
                Ok(Some(Frame {
                    data: data.as_slice(),
                    timestamp: *timestamp,
                }))
            }
            None if self.idle_when_drained => Ok(None),
            None => Err(CaptureError::Closed),
        }
    }
}

/// Keeps everything handed to it, passed or not.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(EnrichedRecord, bool)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<(EnrichedRecord, bool)> {
        self.records.lock().unwrap().clone()
    }
}

impl RecordSink for RecordingSink {
    fn consume(&self, record: EnrichedRecord, passed: bool) {
        self.records.lock().unwrap().push((record, passed));
    }
}
