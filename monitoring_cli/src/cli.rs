//! Command-line flags

use clap::Parser;
use std::path::PathBuf;

/// Runs major and minor checks for an OpenShift worker, master or storage
/// node and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "openshift-monitoring-cli")]
#[command(about = "This cli tool runs monitoring checks for OpenShift installations.", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Print pretty json output
    #[arg(short, long)]
    pub pretty: bool,

    /// Print debug messages
    #[arg(short, long)]
    pub debug: bool,

    /// Configuration file (defaults to ./config.* or config.* next to the binary)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["openshift-monitoring-cli", "-p", "--debug"]);
        assert!(cli.pretty);
        assert!(cli.debug);
        assert!(cli.config.is_none());

        let cli = Cli::parse_from(["openshift-monitoring-cli", "--config", "/etc/monitoring/config.yml"]);
        assert!(!cli.pretty);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/monitoring/config.yml")));
    }
}
