mod capture;
mod cli;
mod config;
mod core;
#[cfg(test)]
mod fixtures;
mod packet;
mod ui;

use std::process;
use std::sync::{atomic::AtomicBool, Arc};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use crate::capture::{list_devices, open_all, select_devices};
use crate::cli::CliArgs;
use crate::config::Config;
use crate::core::capture_loop::CaptureEngine;
use crate::core::correlator::Correlator;
use crate::core::runner::Pipeline;
use crate::core::signal::setup_ctrlc_handler;
use crate::core::summary::print_stats_summary;
use crate::packet::Demux;
use crate::ui::{formatter, RecordFilter, StdoutSink};

fn main() {
    let args = CliArgs::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level))
        .format_timestamp_millis()
        .init();

    if let Err(err) = run(&args) {
        eprintln!("Start dnsniff failed: {err:#}");
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> anyhow::Result<()> {
    let config = Config::from_args(args)?;

    let available = list_devices()?;

    if config.list_devices {
        for name in available {
            println!("{name}");
        }
        return Ok(());
    }

    let selected = select_devices(available, &config.devices);
    let sources = open_all(&selected)?;
    info!("capturing on {}", selected.join(", "));
    info!(
        "server filter: {:?}, type filter: {:?}, output: {:?}, cache capacity: {}",
        config.server, config.qtype, config.format, config.cache_capacity
    );

    let device_width = selected.iter().map(String::len).max().unwrap_or(0);
    let sink = StdoutSink::new(formatter(config.format, config.color, device_width));
    let correlator = Arc::new(Correlator::new(config.cache_capacity));
    let pipeline = Pipeline::new(
        Demux::new(config.server),
        RecordFilter::new(config.server, config.qtype.clone()),
        correlator,
        Arc::new(sink),
    );

    let running = Arc::new(AtomicBool::new(true));
    setup_ctrlc_handler(Arc::clone(&running)).context("failed to install signal handler")?;

    let engine = CaptureEngine::start(sources, pipeline, running)?;
    let stats = engine.wait();
    print_stats_summary(&stats);

    Ok(())
} // run
