use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use log::{error, info};
use thiserror::Error;

use crate::capture::FrameSource;
use crate::core::correlator::StatsSnapshot;
use crate::core::runner::{run_listener, Pipeline};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no capture device to listen on")]
    NoDevices,

    #[error("failed to start listener for {device}")]
    Spawn {
        device: String,
        #[source]
        source: io::Error,
    },
}

/// One listener thread per capture device, all sharing a pipeline and a
/// running flag.
pub struct CaptureEngine {
    pipeline: Arc<Pipeline>,
    listeners: Vec<(String, JoinHandle<()>)>,
}

impl CaptureEngine {
    /// Spawns a listener for each `(device, source)` pair.
    ///
    /// If any listener fails to start, the ones already spawned are stopped
    /// and joined before the error is returned.
    pub fn start<S>(
        sources: Vec<(String, S)>,
        pipeline: Pipeline,
        running: Arc<AtomicBool>,
    ) -> Result<Self, EngineError>
    where
        S: FrameSource + Send + 'static,
    {
        if sources.is_empty() {
            return Err(EngineError::NoDevices);
        }

        let pipeline = Arc::new(pipeline);
        let mut listeners = Vec::with_capacity(sources.len());

        for (device, source) in sources {
            let name: Arc<str> = Arc::from(device.as_str());
            let pipeline_ref = Arc::clone(&pipeline);
            let running_ref = Arc::clone(&running);

            let spawned = thread::Builder::new()
                .name(format!("capture-{device}"))
                .spawn(move || run_listener(name, source, &pipeline_ref, &running_ref));

            match spawned {
                Ok(handle) => listeners.push((device, handle)),
                Err(source) => {
                    stop_listeners(&running, listeners);
                    return Err(EngineError::Spawn { device, source });
                }
            }
        }

        info!("listening on {} device(s)", listeners.len());
        Ok(Self {
            pipeline,
            listeners,
        })
    } // start

    /// Blocks until every listener has exited and returns the final counters.
    pub fn wait(self) -> StatsSnapshot {
        join_listeners(self.listeners);
        self.pipeline.correlator().stats()
    }
}

/// Clears `running` and waits for every listener to release its source.
fn stop_listeners(running: &AtomicBool, listeners: Vec<(String, JoinHandle<()>)>) {
    running.store(false, Ordering::SeqCst);
    join_listeners(listeners);
}

fn join_listeners(listeners: Vec<(String, JoinHandle<()>)>) {
    for (device, handle) in listeners {
        if handle.join().is_err() {
            error!("listener for {device} panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::correlator::Correlator;
    use crate::fixtures::{self, RecordingSink, ReplaySource};
    use crate::packet::Demux;
    use crate::ui::RecordFilter;
    use std::num::NonZeroUsize;
    use std::sync::atomic::AtomicU64;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn at(millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(millis)
    }

    fn pipeline(sink: Arc<RecordingSink>) -> Pipeline {
        let correlator = Arc::new(Correlator::new(NonZeroUsize::new(16).unwrap()));
        Pipeline::new(Demux::default(), RecordFilter::default(), correlator, sink)
    }

    #[test]
    fn listeners_run_per_device_and_stats_aggregate() {
        let sink = RecordingSink::new();
        let sources = vec![
            (
                "eth0".to_string(),
                ReplaySource::new(vec![
                    (fixtures::dns_query_frame(1, "a.example", 1), at(0)),
                    (fixtures::dns_response_frame(1, "a.example", 1), at(4)),
                ]),
            ),
            (
                "wlan0".to_string(),
                ReplaySource::new(vec![
                    (fixtures::dns_query_frame(1, "b.example", 28), at(0)),
                    (fixtures::dns_query_frame(2, "c.example", 1), at(1)),
                ]),
            ),
        ];

        let running = Arc::new(AtomicBool::new(true));
        let engine = CaptureEngine::start(sources, pipeline(sink.clone()), running).unwrap();
        let stats = engine.wait();

        assert_eq!(stats.queries_observed, 3);
        assert_eq!(stats.responses_rendered, 1);
        assert_eq!(stats.missing(), 2);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0.device, "eth0");
    }

    #[test]
    fn clearing_running_stops_every_listener() {
        let sink = RecordingSink::new();
        let sources = vec![
            ("eth0".to_string(), ReplaySource::idle()),
            ("eth1".to_string(), ReplaySource::idle()),
        ];

        let running = Arc::new(AtomicBool::new(true));
        let engine =
            CaptureEngine::start(sources, pipeline(sink), Arc::clone(&running)).unwrap();

        thread::sleep(Duration::from_millis(20));
        running.store(false, Ordering::SeqCst);

        assert_eq!(engine.wait(), StatsSnapshot::default());
    }

    #[test]
    fn stopping_listeners_waits_for_them_to_exit() {
        let sink = RecordingSink::new();
        let pipeline = Arc::new(pipeline(sink));
        let running = Arc::new(AtomicBool::new(true));
        let exited = Arc::new(AtomicU64::new(0));

        let listeners = ["eth0", "eth1"]
            .into_iter()
            .map(|device| {
                let pipeline = Arc::clone(&pipeline);
                let running = Arc::clone(&running);
                let exited = Arc::clone(&exited);
                let handle = thread::spawn(move || {
                    run_listener(Arc::from(device), ReplaySource::idle(), &pipeline, &running);
                    exited.fetch_add(1, Ordering::SeqCst);
                });
                (device.to_string(), handle)
            })
            .collect();

        stop_listeners(&running, listeners);

        assert!(!running.load(Ordering::SeqCst));
        assert_eq!(exited.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_source_list_is_rejected() {
        let sources: Vec<(String, ReplaySource)> = Vec::new();
        let result = CaptureEngine::start(
            sources,
            pipeline(RecordingSink::new()),
            Arc::new(AtomicBool::new(true)),
        );
        assert!(matches!(result, Err(EngineError::NoDevices)));
    }
}
