use super::{FormatError, Formatter};
use crate::core::record::EnrichedRecord;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, record: &EnrichedRecord) -> Result<String, FormatError> {
        Ok(serde_json::to_string(record)?)
    }
}
