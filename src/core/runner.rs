use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, warn};

use crate::capture::{CaptureError, Frame, FrameSource};
use crate::core::correlator::{CorrelationKey, Correlator};
use crate::core::record::EnrichedRecord;
use crate::packet::{dns, Demux};
use crate::ui::{RecordFilter, RecordSink};

/// Back-off after a transient read failure.
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// What happened to a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not UDP DNS traffic, or excluded by the server filter.
    Ignored,
    /// Looked like DNS but failed to decode.
    Malformed,
    Query,
    /// A response with no remembered query.
    Unmatched,
    Rendered,
    Suppressed,
}

/// Per-frame processing shared by every listener.
pub struct Pipeline {
    demux: Demux,
    filter: RecordFilter,
    correlator: Arc<Correlator>,
    sink: Arc<dyn RecordSink>,
}

impl Pipeline {
    pub fn new(
        demux: Demux,
        filter: RecordFilter,
        correlator: Arc<Correlator>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            demux,
            filter,
            correlator,
            sink,
        }
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn handle_frame(&self, device: &Arc<str>, frame: &Frame<'_>) -> FrameOutcome {
        let Some(candidate) = self.demux.demux(frame.data) else {
            return FrameOutcome::Ignored;
        };

        let Ok(message) = dns::decode(candidate.payload) else {
            return FrameOutcome::Malformed;
        };

        let key = CorrelationKey::new(device, message.header.id);

        if !message.header.response {
            self.correlator.observe(key, frame.timestamp);
            return FrameOutcome::Query;
        }

        let Some(sent) = self.correlator.resolve(&key) else {
            return FrameOutcome::Unmatched;
        };

        let record = EnrichedRecord {
            when: DateTime::<Local>::from(sent),
            size: candidate.payload.len(),
            elapsed: Correlator::elapsed(sent, frame.timestamp),
            device: device.to_string(),
            server: candidate.server,
            message,
        };

        let passed = self.filter.pass(&record);
        self.correlator.record_response(passed);
        self.sink.consume(record, passed);

        if passed {
            FrameOutcome::Rendered
        } else {
            FrameOutcome::Suppressed
        }
    } // handle_frame
}

/// Pulls frames from `source` until `running` is cleared or the source
/// closes. The source is dropped on return.
pub fn run_listener<S: FrameSource>(
    device: Arc<str>,
    mut source: S,
    pipeline: &Pipeline,
    running: &AtomicBool,
) {
    debug!("{device}: listener started");

    while running.load(Ordering::SeqCst) {
        match source.next_frame() {
            Ok(Some(frame)) => {
                pipeline.handle_frame(&device, &frame);
            }
            Ok(None) => thread::yield_now(),
            Err(CaptureError::Closed) => {
                debug!("{device}: capture closed");
                break;
            }
            Err(err) => {
                warn!("{device}: {err}");
                thread::sleep(READ_RETRY_DELAY);
            }
        }
    }

    debug!("{device}: listener stopped");
} // run_listener
