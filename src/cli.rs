use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Per-node CPU and memory requests against allocatable capacity.
#[derive(Debug, Parser)]
#[command(name = "node-requests", version)]
pub struct Args {
    /// Kubeconfig file to load instead of the default resolution
    #[arg(long, env = "NODE_REQUESTS_KUBECONFIG", value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, env = "NODE_REQUESTS_CONTEXT")]
    pub context: Option<String>,

    /// Report format written to stdout
    #[arg(short, long, env = "NODE_REQUESTS_OUTPUT", value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Show the requests of every pod under its node
    #[arg(long)]
    pub pods: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["node-requests"]).unwrap();
        assert_eq!(args.output, OutputFormat::Text);
        assert!(!args.pods);
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn json_with_context() {
        let args = Args::try_parse_from([
            "node-requests",
            "--context",
            "staging",
            "-o",
            "json",
            "--pods",
        ])
        .unwrap();
        assert_eq!(args.context.as_deref(), Some("staging"));
        assert_eq!(args.output, OutputFormat::Json);
        assert!(args.pods);
    }

    #[test]
    fn output_flag_is_documented() {
        use clap::CommandFactory;

        let command = Args::command();
        let output = command
            .get_arguments()
            .find(|arg| arg.get_id() == "output")
            .unwrap();
        assert!(output.get_help().is_some());
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Args::try_parse_from(["node-requests", "--output", "yaml"]).is_err());
    }
}
