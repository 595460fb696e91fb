use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::app_config::LogLevel;
use crate::domain::entities::{ImageSize, RequestLevel};
use crate::infrastructure::uri::UnmatchedUriPolicy;

#[derive(Debug, Parser)]
#[command(
    name = "sketch",
    version,
    about = "Resolve image URIs and run them through the load pipeline",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Disk cache directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Directory `asset://` names resolve under.
    #[arg(long, value_name = "DIR", global = true)]
    pub asset_root: Option<PathBuf>,

    /// Directory `drawable://` ids resolve under.
    #[arg(long, value_name = "DIR", global = true)]
    pub drawable_root: Option<PathBuf>,

    /// Handling of URIs no model accepts.
    #[arg(long, value_enum, global = true)]
    pub unmatched: Option<UnmatchedUriPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show how each URI resolves.
    Resolve {
        /// URIs to resolve.
        #[arg(required = true)]
        uris: Vec<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Load each URI through memory, disk and network.
    Load {
        /// URIs to load.
        #[arg(required = true)]
        uris: Vec<String>,

        /// Target width in pixels.
        #[arg(long)]
        width: Option<u32>,

        /// Target height in pixels.
        #[arg(long)]
        height: Option<u32>,

        /// Write decoded images as PNG into this directory.
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// How far down the source chain to go.
        #[arg(long, value_enum)]
        level: Option<LevelArg>,

        /// Do not persist downloads.
        #[arg(long)]
        no_disk_cache: bool,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config {
        /// Store it in the config file instead, including any flag overrides.
        #[arg(long)]
        write: bool,
    },
}

impl Command {
    /// Target size from `--width`/`--height`; a missing side copies the other.
    #[must_use]
    pub fn target_size(&self) -> Option<ImageSize> {
        match self {
            Self::Load { width, height, .. } => match (width, height) {
                (Some(w), Some(h)) => Some(ImageSize::new(*w, *h)),
                (Some(side), None) | (None, Some(side)) => Some(ImageSize::new(*side, *side)),
                (None, None) => None,
            },
            Self::Resolve { .. } | Self::Config { .. } => None,
        }
    }
}

/// CLI spelling of [`RequestLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    /// Memory, disk and network.
    Net,
    /// Skip network downloads.
    Local,
    /// Memory cache only.
    Memory,
}

impl From<LevelArg> for RequestLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Net => Self::Net,
            LevelArg::Local => Self::Local,
            LevelArg::Memory => Self::Memory,
        }
    }
}
