//! natschart CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// natschart - render and check the NATS Helm chart
#[derive(Parser, Debug)]
#[command(name = "natschart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the chart and list every tracked resource
    Render(commands::render::RenderArgs),
    /// Render the chart and compare it against an expected bundle
    Check(commands::check::CheckArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Render(args) => commands::render::run(args),
            Commands::Check(args) => commands::check::run(args),
        }
    }
}
