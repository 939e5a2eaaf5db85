//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrivener - story-writing workflows over a local LLM server
#[derive(Parser, Debug)]
#[command(name = "scrivener")]
#[command(about = "Story-writing workflows over a local LLM server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered above the standard locations
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the whole workflow: characters, outline, validated chapters
    Write(WriteArgs),

    /// Stream a one-shot story
    Generate(GenerateArgs),

    /// List models installed on the server
    Models,

    /// Check that the server is reachable and has the configured model
    Health,

    /// Print story ideas to start from
    Suggestions {
        /// Print the list as one JSON object
        #[arg(long)]
        json: bool,
    },
}

/// Arguments of `scrivener write`
#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Story idea
    #[arg(short, long)]
    pub prompt: String,

    /// Number of chapters to outline; the model decides when absent
    #[arg(long)]
    pub chapters: Option<u32>,

    /// Minimum validation score in [0, 1]
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature in [0, 2]
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff in [0, 1]
    #[arg(long)]
    pub top_p: Option<f32>,

    /// Extra guidance added to every stage prompt
    #[arg(long)]
    pub instructions: Option<String>,

    /// How progress events are printed
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,

    /// Write the finished manuscript as Markdown
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `scrivener generate`
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Story request
    #[arg(short, long)]
    pub prompt: String,

    /// File holding a story to continue
    #[arg(long)]
    pub continue_from: Option<PathBuf>,

    /// System prompt replacing the default storyteller instructions
    #[arg(long)]
    pub system: Option<String>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature in [0, 2]
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff in [0, 1]
    #[arg(long)]
    pub top_p: Option<f32>,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable progress lines
    Human,
    /// One JSON event per line
    Ndjson,
    /// Server-sent-event frames
    Sse,
}
