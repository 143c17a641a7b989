use std::net::{IpAddr, SocketAddr};

use crate::core::record::EnrichedRecord;
use crate::packet::DNS_PORT;

/// Content filter deciding whether a matched response is shown.
///
/// Every configured criterion must match; with none configured everything
/// passes.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    server: Option<SocketAddr>,
    qtype: Option<String>,
}

impl RecordFilter {
    pub fn new(server: Option<IpAddr>, qtype: Option<String>) -> Self {
        Self {
            server: server.map(|ip| SocketAddr::new(ip, DNS_PORT)),
            qtype,
        }
    }

    pub fn pass(&self, record: &EnrichedRecord) -> bool {
        if let Some(server) = self.server
            && record.server != server
        {
            return false;
        }

        if let Some(qtype) = &self.qtype
            && record.message.question.qtype.to_string() != *qtype
        {
            return false;
        }

        true
    }
}
