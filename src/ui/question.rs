use super::{format_duration, FormatError, Formatter};
use crate::core::record::EnrichedRecord;

/// One line per response: device, server, question, type, duration.
pub struct QuestionFormatter {
    device_width: usize,
}

impl QuestionFormatter {
    pub fn new(device_width: usize) -> Self {
        Self { device_width }
    }
}

impl Formatter for QuestionFormatter {
    fn format(&self, record: &EnrichedRecord) -> Result<String, FormatError> {
        let question = &record.message.question;
        Ok(format!(
            "{:>width$}\t{:>21}\t{}\t{:>5}\t{}",
            record.device,
            record.server.to_string(),
            question.name,
            question.qtype.to_string(),
            format_duration(record.elapsed),
            width = self.device_width,
        ))
    }
}
