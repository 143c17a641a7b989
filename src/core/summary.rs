use std::io::{self, Write};

use crate::core::correlator::StatsSnapshot;

pub fn format_summary(stats: &StatsSnapshot) -> String {
    format!(
        "\n{} queries captured\n{} queries dropped by filter\n{} queries no response",
        stats.queries_observed,
        stats.responses_suppressed,
        stats.missing()
    )
}

/// Writes the end-of-run counters to stderr.
pub fn print_stats_summary(stats: &StatsSnapshot) {
    let mut err = io::stderr().lock();
    let _ = writeln!(err, "{}", format_summary(stats));
    let _ = err.flush();
}
