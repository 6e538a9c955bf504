use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(author, version, about = "Media transformation engine with local and remote backends")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the processing service (/health, /process, /batch, /public)
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Apply operations to a source and print the job result as JSON
    Run {
        /// URL of the source media
        #[arg(short, long)]
        source: String,

        /// Operation as JSON: {"type": "trimVideo", "parameters": {...}, "order": 0}
        #[arg(long = "op", required = true)]
        ops: Vec<String>,

        /// Original file name of the source (used for the output extension)
        #[arg(long)]
        name: Option<String>,

        /// Content type of the source
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Apply a named style to a source and print the job result as JSON
    Style {
        /// URL of the source media
        #[arg(short, long)]
        source: String,

        /// Style id (see `clipforge styles`)
        style: String,
    },

    /// List supported operations and their parameters
    Operations {
        /// Only show this operation (wire name, e.g. trimVideo)
        name: Option<String>,
    },

    /// List named style presets
    Styles,

    /// Resolve the local media engine and probe the remote service
    CheckEngine,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
