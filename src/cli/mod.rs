//! CLI module for the QA gateway

pub mod serve;

use clap::{Parser, Subcommand};

/// QA Gateway - cost-optimizing layer for an LLM-backed Q&A service
#[derive(Parser)]
#[command(name = "qa-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
