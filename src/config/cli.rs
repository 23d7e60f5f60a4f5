//! Command line flags.
//!
//! Each flag can also be given through a `KFRS_*` environment variable; a flag
//! on the command line wins over the variable, and both win over the config
//! file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{LogFormat, RedirectConfig};

#[derive(Parser, Debug, Default)]
#[command(name = "kfrs")]
#[command(about = "KF HTTP Redirect Server")]
#[command(
    long_about = "Serves the .uz2 redirect files used by Killing Floor dedicated servers, banning clients that request too fast."
)]
pub struct Args {
    /// Optional TOML configuration file
    #[arg(long, env = "KFRS_CONFIG")]
    pub config: Option<PathBuf>,

    /// IP/Host to bind to
    #[arg(long, env = "KFRS_HOST")]
    pub host: Option<String>,

    /// TCP port to listen on
    #[arg(long, env = "KFRS_PORT")]
    pub port: Option<u16>,

    /// Directory to serve
    #[arg(long, env = "KFRS_SERVE_DIR")]
    pub serve_dir: Option<PathBuf>,

    /// Max requests per IP/minute
    #[arg(long, env = "KFRS_MAX_REQUESTS")]
    pub max_requests: Option<u32>,

    /// Ban duration (in minutes)
    #[arg(long, env = "KFRS_BAN_TIME")]
    pub ban_time: Option<u32>,

    /// Enable log file output
    #[arg(long, env = "KFRS_LOG_TO_FILE", num_args = 0..=1, default_missing_value = "true")]
    pub log_to_file: Option<bool>,

    /// Set the log level (debug, info, warn, error)
    #[arg(long, env = "KFRS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Specify the log file path
    #[arg(long, env = "KFRS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Specify the log format (text or json)
    #[arg(long, env = "KFRS_LOG_FILE_FORMAT")]
    pub log_file_format: Option<LogFormat>,

    /// Set the maximum log file size in MB
    #[arg(long, env = "KFRS_LOG_MAX_SIZE")]
    pub log_max_size: Option<u64>,

    /// Set the maximum number of backup log files to keep
    #[arg(long, env = "KFRS_LOG_MAX_BACKUPS")]
    pub log_max_backups: Option<u32>,

    /// Set the maximum number of days to retain old log files
    #[arg(long, env = "KFRS_LOG_MAX_AGE")]
    pub log_max_age: Option<u32>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "KFRS_METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl Args {
    /// Overlay every flag that was set onto `config`.
    pub fn apply(&self, config: &mut RedirectConfig) {
        let server = &mut config.server;
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(dir) = &self.serve_dir {
            server.serve_dir = dir.clone();
        }
        if let Some(max) = self.max_requests {
            server.max_requests = max;
        }
        if let Some(ban) = self.ban_time {
            server.ban_time = ban;
        }

        let logging = &mut config.logging;
        if let Some(to_file) = self.log_to_file {
            logging.to_file = to_file;
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = file.clone();
        }
        if let Some(format) = self.log_file_format {
            logging.file_format = format;
        }
        if let Some(size) = self.log_max_size {
            logging.max_size = size;
        }
        if let Some(backups) = self.log_max_backups {
            logging.max_backups = backups;
        }
        if let Some(age) = self.log_max_age {
            logging.max_age = age;
        }

        if let Some(address) = &self.metrics_address {
            config.metrics.enabled = true;
            config.metrics.address = address.clone();
        }
    }
}
