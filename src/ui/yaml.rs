use super::{FormatError, Formatter};
use crate::core::record::EnrichedRecord;

/// Each record as its own document in a YAML stream.
pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn format(&self, record: &EnrichedRecord) -> Result<String, FormatError> {
        let body = serde_yaml::to_string(record)?;
        Ok(format!("---\n{}", body.trim_end()))
    }
}
