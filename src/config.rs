use clap::Parser;
use std::path::PathBuf;

/// Tag-by-tag dump of an FLV stream's headers and metadata
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// FLV file to dump
    pub input: PathBuf,
}

impl Config {
    /// Load configuration from CLI args
    pub fn load() -> Self {
        Config::parse()
    }
}
