mod filter;
mod json;
mod question;
mod verbose;
mod yaml;

pub use filter::RecordFilter;

use std::io::{self, Write};
use std::time::Duration;

use clap::ValueEnum;
use log::warn;
use thiserror::Error;

use crate::core::record::EnrichedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// dig-like block per response
    #[value(alias = "v")]
    Verbose,
    /// one JSON object per line
    #[value(alias = "j")]
    Json,
    /// one YAML document per response
    #[value(alias = "y")]
    Yaml,
    /// one short line per response
    #[value(alias = "q")]
    Question,
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to encode record as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode record as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Turns a record into the text printed for it.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &EnrichedRecord) -> Result<String, FormatError>;
}

pub fn formatter(format: OutputFormat, color: bool, device_width: usize) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Verbose => Box::new(verbose::VerboseFormatter::new(color)),
        OutputFormat::Json => Box::new(json::JsonFormatter),
        OutputFormat::Yaml => Box::new(yaml::YamlFormatter),
        OutputFormat::Question => Box::new(question::QuestionFormatter::new(device_width)),
    }
}

/// Receives every matched response together with the filter decision.
pub trait RecordSink: Send + Sync {
    fn consume(&self, record: EnrichedRecord, passed: bool);
}

/// Prints passed records to stdout, one formatted entry at a time.
pub struct StdoutSink {
    formatter: Box<dyn Formatter>,
}

impl StdoutSink {
    pub fn new(formatter: Box<dyn Formatter>) -> Self {
        Self { formatter }
    }

    /// Formatted text for a record, or `None` when it cannot be encoded.
    fn render(&self, record: &EnrichedRecord) -> Option<String> {
        match self.formatter.format(record) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("{}: skipping response {}: {err}", record.device, record.message.header.id);
                None
            }
        }
    }
}

impl RecordSink for StdoutSink {
    fn consume(&self, record: EnrichedRecord, passed: bool) {
        if !passed {
            return;
        }

        let Some(text) = self.render(&record) else {
            return;
        };
        // Lock per entry so listeners never interleave within one block.
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{text}");
    }
}

/// Renders a duration with three decimals in the largest unit that keeps
/// the value at or above one, right-aligned to a fixed width.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos() as f64;
    let (value, unit) = if nanos >= 1e9 {
        (nanos / 1e9, "s")
    } else if nanos >= 1e6 {
        (nanos / 1e6, "ms")
    } else if nanos >= 1e3 {
        (nanos / 1e3, "µs")
    } else {
        (nanos, "ns")
    };
    format!("{value:>8.3}{unit}")
}
