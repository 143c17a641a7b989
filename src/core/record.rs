use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use crate::packet::dns::Message;

/// A decoded response paired with its query, as handed to the output side.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecord {
    /// When the matching query was captured.
    #[serde(rename = "time")]
    pub when: DateTime<Local>,
    /// DNS payload size of the response in bytes.
    pub size: usize,
    #[serde(rename = "duration", serialize_with = "duration_nanos")]
    pub elapsed: Duration,
    pub device: String,
    pub server: SocketAddr,
    pub message: Message,
}

fn duration_nanos<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}
