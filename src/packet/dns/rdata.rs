use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Serialize, Serializer};

use super::reader::Reader;
use super::types::RecordType;
use super::DecodeError;

/// Payload of the record types that are surfaced to callers.
///
/// Everything else is skipped during decoding and never reaches a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ns(String),
    Ptr(String),
    Mx { preference: u16, exchange: String },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(addr) => write!(f, "{addr}"),
            RData::Aaaa(addr) => write!(f, "{addr}"),
            RData::Cname(name) | RData::Ns(name) | RData::Ptr(name) => f.write_str(name),
            RData::Mx { exchange, .. } => f.write_str(exchange),
            RData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{target}:{port}/W:{weight}/P:{priority}"),
        }
    }
}

impl Serialize for RData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decodes one RDATA of `len` bytes starting at the reader's cursor.
pub type RDataDecoder = fn(&mut Reader<'_>, usize) -> Result<RData, DecodeError>;

/// Wire type to payload decoder. `None` means "consume and drop".
pub fn decoder_for(rtype: RecordType) -> Option<RDataDecoder> {
    let decoder: RDataDecoder = match rtype {
        RecordType::A => decode_a,
        RecordType::Aaaa => decode_aaaa,
        RecordType::Cname => decode_cname,
        RecordType::Ns => decode_ns,
        RecordType::Ptr => decode_ptr,
        RecordType::Mx => decode_mx,
        RecordType::Srv => decode_srv,
        _ => return None,
    };
    Some(decoder)
}

fn expect_len(rtype: RecordType, expected: usize, actual: usize) -> Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::RdataLength {
            rtype,
            expected,
            actual,
        })
    }
}

fn decode_a(reader: &mut Reader<'_>, len: usize) -> Result<RData, DecodeError> {
    expect_len(RecordType::A, 4, len)?;
    let b = reader.read_bytes(4)?;
    Ok(RData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3])))
}

fn decode_aaaa(reader: &mut Reader<'_>, len: usize) -> Result<RData, DecodeError> {
    expect_len(RecordType::Aaaa, 16, len)?;
    let mut octets = [0u8; 16];
    octets.copy_from_slice(reader.read_bytes(16)?);
    Ok(RData::Aaaa(Ipv6Addr::from(octets)))
}

fn decode_cname(reader: &mut Reader<'_>, _len: usize) -> Result<RData, DecodeError> {
    reader.read_name().map(RData::Cname)
}

fn decode_ns(reader: &mut Reader<'_>, _len: usize) -> Result<RData, DecodeError> {
    reader.read_name().map(RData::Ns)
}

fn decode_ptr(reader: &mut Reader<'_>, _len: usize) -> Result<RData, DecodeError> {
    reader.read_name().map(RData::Ptr)
}

fn decode_mx(reader: &mut Reader<'_>, _len: usize) -> Result<RData, DecodeError> {
    let preference = reader.read_u16()?;
    let exchange = reader.read_name()?;
    Ok(RData::Mx {
        preference,
        exchange,
    })
}

fn decode_srv(reader: &mut Reader<'_>, _len: usize) -> Result<RData, DecodeError> {
    let priority = reader.read_u16()?;
    let weight = reader.read_u16()?;
    let port = reader.read_u16()?;
    let target = reader.read_name()?;
    Ok(RData::Srv {
        priority,
        weight,
        port,
        target,
    })
}
