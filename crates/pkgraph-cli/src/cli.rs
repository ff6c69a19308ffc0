//! CLI argument definitions for pkgraph.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in the
//! [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pkgraph",
    version,
    about = "Inspect package layouts and resolve their dependency graphs",
    long_about = "pkgraph discovers the modules of a package from its directory layout \
                  and resolves the versioned dependencies declared in Package.toml \
                  into a validated package graph."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Package directory (defaults to the current directory)
    #[arg(short = 'C', long = "package-path", global = true, value_name = "DIR")]
    pub package_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the modules and products discovered in a package
    Describe {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Leave test modules out
        #[arg(long)]
        skip_tests: bool,
    },

    /// Resolve dependencies and print the package graph
    Resolve {
        /// Maximum tree depth
        #[arg(long)]
        depth: Option<usize>,
        /// Explain why a dependency is included
        #[arg(long)]
        why: Option<String>,
        /// Directory relative dependency locations are resolved against
        #[arg(long, value_name = "DIR")]
        mirror: Option<PathBuf>,
        /// Checkout cache directory (overrides the configured one)
        #[arg(long, value_name = "DIR", env = "PKGRAPH_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
