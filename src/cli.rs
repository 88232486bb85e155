use clap::Parser;
use std::path::PathBuf;

/// tempfaderd: temperature driven PWM fader daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML config file path (default: searched in standard locations)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Detach from the terminal and run in the background
    #[arg(short = 'd', long = "daemonize", default_value = "false")]
    pub daemonize: bool,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    pub verbose: bool,

    /// Load the configuration, print the resolved faders as JSON and exit
    #[arg(long = "check", default_value = "false")]
    pub check: bool,
}
