use clap::Parser;

use crate::core::correlator::DEFAULT_CAPACITY;
use crate::ui::OutputFormat;

/// dnsniff - watch DNS lookups on the wire
#[derive(Parser, Debug)]
#[command(
    name = "dnsniff",
    version,
    about = "Passively pairs DNS queries with their responses and shows how long each took",
    after_help = "Examples:\n  dnsniff -l\n  dnsniff -s 8.8.8.8 -o j -d '^lo0$'"
)]
pub struct CliArgs {
    /// List capture device names and exit.
    #[arg(short, long)]
    pub list: bool,

    /// Capture on this device only (repeatable). Takes precedence over --devices.
    #[arg(short, long = "interface", value_name = "NAME")]
    pub interfaces: Vec<String>,

    /// Regex selecting the devices to capture on. Defaults to every device.
    #[arg(short, long, value_name = "REGEX")]
    pub devices: Option<String>,

    /// Only show exchanges with this DNS server address.
    #[arg(short, long, value_name = "IP")]
    pub server: Option<String>,

    /// Only show answers to this query type (A, AAAA, CNAME, ...).
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub qtype: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Verbose)]
    pub output_format: OutputFormat,

    /// Number of in-flight queries remembered for matching.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CAPACITY)]
    pub cache_size: usize,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error). RUST_LOG wins when set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
