//! Command-line argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "archive-retag")]
#[command(about = "List and rewrite repository tags inside Docker image archives")]
#[command(version)]
pub struct Args {
    /// Verbose output
    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Quiet output
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        conflicts_with = "verbose",
        help = "Only print errors"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the repository:tag labels of an archive, one per line
    Tags {
        /// Path to the image archive (plain or gzip compressed tar)
        archive: String,
    },
    /// Copy an archive while rewriting the repository part of its tags
    Retag {
        #[arg(
            long = "input",
            short = 'i',
            default_value = "-",
            help = "Input archive, '-' for stdin"
        )]
        input: String,

        #[arg(
            long = "output",
            short = 'o',
            default_value = "-",
            help = "Output archive, '-' for stdout"
        )]
        output: String,

        #[arg(
            long = "replace",
            short = 'r',
            value_name = "FROM=TO",
            help = "Replace a leading repository prefix (repeatable, applied in order)"
        )]
        replace: Vec<String>,

        #[arg(
            long = "strip-suffix",
            value_name = "SUFFIX",
            allow_hyphen_values = true,
            help = "Drop a trailing suffix such as -amd64 from repository names"
        )]
        strip_suffix: Option<String>,

        #[arg(
            long = "kubeadm-version",
            value_name = "VERSION",
            help = "Known kubeadm version; 1.22+ moves k8s.gcr.io images to registry.k8s.io"
        )]
        kubeadm_version: Option<String>,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Tags { archive } => {
                if !std::path::Path::new(archive).exists() {
                    return Err(format!("File does not exist: {}", archive));
                }
            }
            Command::Retag { input, output, .. } => {
                if input != "-" && !std::path::Path::new(input).exists() {
                    return Err(format!("File does not exist: {}", input));
                }
                if input != "-" && input == output {
                    return Err("Input and output must differ; in-place editing is not supported"
                        .to_string());
                }
            }
        }
        Ok(())
    }
}
