//! CLI module for the QuizHub cache service
//!
//! - `serve`: run the HTTP server (default)
//! - `cache`: operate on the configured cache store directly

pub mod cache;
pub mod serve;

use clap::{Parser, Subcommand};

/// QuizHub cache service - quiz platform API behind a response cache
#[derive(Parser)]
#[command(name = "quizhub-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server (default)
    Serve(serve::ServeArgs),

    /// Flush or invalidate the cache without starting the server
    Cache(cache::CacheArgs),
}
