use std::net::IpAddr;
use std::num::NonZeroUsize;

use crossterm::tty::IsTty;
use regex::Regex;
use thiserror::Error;

use crate::cli::CliArgs;
use crate::ui::OutputFormat;

/// Linux pseudo-device capturing on all interfaces with a cooked link layer.
const ANY_DEVICE: &str = "any";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid device pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid server address: {0}")]
    InvalidServer(String),

    #[error("cache size must be greater than zero")]
    ZeroCacheSize,
}

#[derive(Debug, Clone)]
pub enum DeviceSelection {
    All,
    Pattern(Regex),
    Named(Vec<String>),
}

impl DeviceSelection {
    pub fn matches(&self, device: &str) -> bool {
        match self {
            DeviceSelection::All => device != ANY_DEVICE,
            DeviceSelection::Pattern(re) => re.is_match(device),
            DeviceSelection::Named(names) => names.iter().any(|n| n == device),
        }
    }
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub list_devices: bool,
    pub devices: DeviceSelection,
    pub server: Option<IpAddr>,
    pub qtype: Option<String>,
    pub format: OutputFormat,
    pub color: bool,
    pub cache_capacity: NonZeroUsize,
}

impl Config {
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let devices = if !args.interfaces.is_empty() {
            DeviceSelection::Named(args.interfaces.clone())
        } else if let Some(pattern) = &args.devices {
            DeviceSelection::Pattern(Regex::new(pattern)?)
        } else {
            DeviceSelection::All
        };

        let server = args
            .server
            .as_deref()
            .map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidServer(s.to_string()))
            })
            .transpose()?;

        let cache_capacity =
            NonZeroUsize::new(args.cache_size).ok_or(ConfigError::ZeroCacheSize)?;

        Ok(Self {
            list_devices: args.list,
            devices,
            server,
            qtype: args.qtype.clone().filter(|t| !t.is_empty()),
            format: args.output_format,
            color: !args.no_color && std::io::stdout().is_tty(),
            cache_capacity,
        })
    }
}
