use std::fmt::Write;

use chrono::SecondsFormat;
use crossterm::style::{style, Color, Stylize};

use super::{format_duration, FormatError, Formatter};
use crate::core::record::EnrichedRecord;
use crate::packet::dns::{Record, ResponseCode};

const SEPARATOR: &str = "--------------------";

/// Multi-line rendering modelled on dig's output.
pub struct VerboseFormatter {
    color: bool,
}

impl VerboseFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn write_section(&self, out: &mut String, title: &str, records: &[Record]) {
        let heading = format!(";; {title} Section:");
        if records.is_empty() {
            let _ = writeln!(out, "\n{} <empty>", self.paint(&heading, Color::DarkGrey));
            return;
        }

        let _ = writeln!(out, "\n{}", self.paint(&heading, Color::Yellow));
        for record in records {
            let _ = match record.ttl {
                Some(ttl) => writeln!(
                    out,
                    "{}\t{ttl}\t{}\t{}\t{}",
                    record.name, record.class, record.rtype, record.data
                ),
                None => writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    record.name, record.class, record.rtype, record.data
                ),
            };
        }
    }
}

impl Formatter for VerboseFormatter {
    fn format(&self, record: &EnrichedRecord) -> Result<String, FormatError> {
        let header = &record.message.header;
        let status_color = if header.rcode == ResponseCode::NoError {
            Color::Green
        } else {
            Color::Red
        };

        let mut out = String::new();
        let _ = writeln!(out, "{SEPARATOR}");
        let _ = writeln!(
            out,
            "; <{}>@{}, ID: {}, OpCode: {}, Status: {}",
            self.paint(&record.device, Color::Cyan),
            self.paint(&record.server.to_string(), Color::Cyan),
            header.id,
            header.opcode,
            self.paint(&header.rcode.to_string(), status_color),
        );
        let _ = writeln!(
            out,
            ";; When: {}",
            record.when.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let _ = writeln!(out, ";; Query Time: {}", format_duration(record.elapsed).trim_start());
        let _ = writeln!(out, ";; Msg Size: {}B", record.size);

        let question = &record.message.question;
        let _ = writeln!(out, "\n{}", self.paint(";; Question Section:", Color::Yellow));
        let _ = writeln!(out, "{}\t{}", question.name, question.qtype);

        self.write_section(&mut out, "Answer", &record.message.answers);
        self.write_section(&mut out, "Authority", &record.message.authorities);
        self.write_section(&mut out, "Additional", &record.message.additionals);

        let end = out.trim_end().len();
        out.truncate(end);
        Ok(out)
    } // format
}
