//! Command-line argument parsing for the `ipb-bridge` demo binary.

use clap::{
    builder::styling::{AnsiColor, Styles},
    Parser,
};
use std::path::PathBuf;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Yellow.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Industrial protocol bridge demo: wires a console source through the
/// rule engine and scheduler to a console sink, using the routes in the
/// given configuration file (or a single catch-all route if none is
/// given).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, styles = styles())]
pub struct Args {
    /// Path to a BridgeConfig JSON document. If omitted, a default
    /// configuration with a single catch-all route to the console sink
    /// is used.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Overrides the configured (or default) instance id.
    #[arg(long)]
    pub instance_id: Option<String>,

    /// Silence user-facing informational output on stdout; diagnostics
    /// still go to stderr.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Increase diagnostic log verbosity on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write detailed logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_no_arguments() {
        let args = Args::parse_from(["ipb-bridge"]);
        assert!(args.config.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn parses_config_path_and_verbosity() {
        let args = Args::parse_from(["ipb-bridge", "-c", "bridge.json", "-vv"]);
        assert_eq!(args.config, Some(PathBuf::from("bridge.json")));
        assert_eq!(args.verbose, 2);
    }
}
