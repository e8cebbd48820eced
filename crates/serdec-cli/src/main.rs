mod commands;
mod styles;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serdec_core::config::DecoderConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "serdec", about = "SER video inspection tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Decoder config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bit depth to use instead of the header's (8-16)
    #[arg(long, global = true)]
    bit_depth: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show SER header, layout and timing
    Info(commands::info::InfoArgs),
    /// Decode every frame and report sample range
    Scan(commands::scan::ScanArgs),
    /// Print or save the default decoder config
    Config(commands::config::ConfigArgs),
}

impl Cli {
    fn decoder_config(&self) -> Result<DecoderConfig> {
        let mut config = match &self.config {
            Some(path) => DecoderConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DecoderConfig::default(),
        };
        if self.bit_depth.is_some() {
            config.bit_depth_hint = self.bit_depth;
            config.validate()?;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args, &cli.decoder_config()?),
        Commands::Scan(args) => commands::scan::run(args, &cli.decoder_config()?),
        Commands::Config(args) => commands::config::run(args),
    }
}
