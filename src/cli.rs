use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fittrack")]
#[command(about = "FitTrack API client CLI", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (overrides FITTRACK_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the diagnostic log buffer as JSON when the command finishes
    #[arg(long, global = true)]
    pub export_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the API liveness endpoint
    Health,
    /// GET a path relative to the base URL and print the JSON response
    Get(GetArgs),
    /// Upload a file as multipart form data
    Upload(UploadArgs),
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Path relative to the API base URL, e.g. /workouts
    pub path: String,

    /// Query parameters as key=value
    #[arg(long = "query", short = 'q', value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Path relative to the API base URL, e.g. /uploads
    pub path: String,

    /// Local file to send
    pub file: PathBuf,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}
