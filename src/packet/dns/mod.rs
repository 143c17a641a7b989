//! DNS wire-format decoding (RFC 1035 4.1).
//!
//! ```text
//!     +---------------------+
//!     |        Header       |
//!     +---------------------+
//!     |       Question      | the question for the name server
//!     +---------------------+
//!     |        Answer       | RRs answering the question
//!     +---------------------+
//!     |      Authority      | RRs pointing toward an authority
//!     +---------------------+
//!     |      Additional     | RRs holding additional information
//!     +---------------------+
//! ```

mod rdata;
mod reader;
mod types;

pub use rdata::RData;
pub use types::{Class, OpCode, RecordType, ResponseCode};

use serde::Serialize;
use thiserror::Error;

use reader::Reader;

pub const HEADER_LEN: usize = 12;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message too short for header ({0} bytes)")]
    ShortHeader(usize),

    #[error("unexpected end of message at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("message carries no question")]
    NoQuestion,

    #[error("invalid label type 0x{kind:02x} at offset {offset}")]
    InvalidLabel { kind: u8, offset: usize },

    #[error("too many compression pointers")]
    PointerLoop,

    #[error("compression pointer to offset {0} is out of bounds")]
    BadPointer(usize),

    #[error("domain name exceeds 255 bytes")]
    NameTooLong,

    #[error("{rtype} rdata is {actual} bytes, expected {expected}")]
    RdataLength {
        rtype: RecordType,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub id: u16,
    #[serde(skip)]
    pub response: bool,
    pub opcode: OpCode,
    #[serde(rename = "status")]
    pub rcode: ResponseCode,
}

impl Header {
    fn from_wire(id: u16, flags: u16) -> Self {
        Self {
            id,
            response: flags & 0x8000 != 0,
            opcode: OpCode::from(((flags >> 11) & 0x0F) as u8),
            rcode: ResponseCode::from((flags & 0x0F) as u8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub name: String,
    #[serde(rename = "type")]
    pub qtype: RecordType,
}

/// One resource record of a recognised type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: RecordType,
    pub class: Class,
    /// Present for answer records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(rename = "record")]
    pub data: RData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub header: Header,
    pub question: Question,
    #[serde(rename = "answer")]
    pub answers: Vec<Record>,
    #[serde(rename = "authority")]
    pub authorities: Vec<Record>,
    #[serde(rename = "additional")]
    pub additionals: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Answer,
    Authority,
    Additional,
}

/// Decodes a UDP DNS payload.
///
/// Only the first question is kept. Records whose type has no decoder are
/// consumed and left out of their section; any structural fault fails the
/// whole message.
pub fn decode(payload: &[u8]) -> Result<Message, DecodeError> {
    if payload.len() < HEADER_LEN {
        return Err(DecodeError::ShortHeader(payload.len()));
    }

    let mut reader = Reader::new(payload);
    let id = reader.read_u16()?;
    let flags = reader.read_u16()?;
    let qdcount = reader.read_u16()?;
    let ancount = reader.read_u16()?;
    let nscount = reader.read_u16()?;
    let arcount = reader.read_u16()?;

    let header = Header::from_wire(id, flags);
    let question = decode_questions(&mut reader, qdcount)?;
    let answers = decode_section(&mut reader, ancount, Section::Answer)?;
    let authorities = decode_section(&mut reader, nscount, Section::Authority)?;
    let additionals = decode_section(&mut reader, arcount, Section::Additional)?;

    Ok(Message {
        header,
        question,
        answers,
        authorities,
        additionals,
    })
}

fn decode_questions(reader: &mut Reader<'_>, count: u16) -> Result<Question, DecodeError> {
    let mut first = None;

    for _ in 0..count {
        let name = reader.read_name()?;
        let qtype = RecordType::from(reader.read_u16()?);
        let _qclass = reader.read_u16()?;
        first.get_or_insert(Question { name, qtype });
    }

    first.ok_or(DecodeError::NoQuestion)
}

fn decode_section(
    reader: &mut Reader<'_>,
    count: u16,
    section: Section,
) -> Result<Vec<Record>, DecodeError> {
    let mut records = Vec::new();
    for _ in 0..count {
        if let Some(record) = decode_record(reader, section)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn decode_record(
    reader: &mut Reader<'_>,
    section: Section,
) -> Result<Option<Record>, DecodeError> {
    let name = reader.read_name()?;
    let rtype = RecordType::from(reader.read_u16()?);
    let class = Class::from(reader.read_u16()?);
    let ttl = reader.read_u32()?;
    let rdlength = reader.read_u16()? as usize;

    let start = reader.position();
    let end = start + rdlength;
    if end > reader.len() {
        return Err(DecodeError::UnexpectedEnd { offset: start });
    }

    let Some(decode_rdata) = rdata::decoder_for(rtype) else {
        reader.seek(end)?;
        return Ok(None);
    };

    let data = decode_rdata(reader, rdlength)?;
    let consumed = reader.position() - start;
    if consumed > rdlength {
        return Err(DecodeError::RdataLength {
            rtype,
            expected: rdlength,
            actual: consumed,
        });
    }
    reader.seek(end)?;

    Ok(Some(Record {
        name,
        rtype,
        class,
        ttl: (section == Section::Answer).then_some(ttl),
        data,
    }))
}
