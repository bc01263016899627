// src/cli/mod.rs
// CLI module for nixfuzz commands

use crate::generator::OptionAxis;
use crate::harness::TestGroup;
use crate::manager::TestStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod check;
pub mod classify;
pub mod generate;
pub mod run;
pub mod variants;

pub use check::run_check;
pub use classify::run_classify;
pub use generate::run_generate;
pub use run::run_session;
pub use variants::run_variants;

#[derive(Parser)]
#[command(name = "nixfuzz")]
#[command(about = "Fuzz-validation harness for generated NixOS configurations")]
#[command(version)]
pub struct Cli {
    /// Config file (default: ./nixfuzz.toml, then ~/.nixfuzz/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a test session against NIXOS_CONFIG_DIR
    Run(RunArgs),

    /// Print the rendered configuration for one variant
    Generate {
        /// Option assignment, e.g. desktop=gnome (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Feature flag, e.g. enableSteam=true (repeatable)
        #[arg(long = "override", value_name = "FLAG=BOOL")]
        overrides: Vec<String>,

        /// Start from a random variant
        #[arg(long)]
        random: bool,

        /// Seed for --random
        #[arg(long, requires = "random")]
        seed: Option<u64>,
    },

    /// List constraint-valid combinations as JSON lines
    Variants {
        /// Axes to combine (default: systemType,desktop,audio)
        #[arg(long, value_delimiter = ',')]
        axes: Vec<OptionAxis>,

        /// Stop after this many combinations
        #[arg(long)]
        max_combinations: Option<usize>,
    },

    /// Classify diagnostic text and print it as JSON
    Classify {
        /// File with diagnostic output (default: stdin)
        #[arg(index = 1)]
        input: Option<PathBuf>,

        /// Test name to attribute the error to
        #[arg(long, default_value = "cli")]
        test_name: String,
    },

    /// Verify the base configuration directory and settings
    Check,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Run the builder after validation (full) or not (validate-only)
    #[arg(long, value_enum)]
    pub test_strategy: Option<TestStrategy>,

    /// Number of random variants to exercise
    #[arg(long)]
    pub random_tests: Option<usize>,

    /// Seed for reproducible random variants
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only run these groups (repeatable)
    #[arg(long = "group", value_enum)]
    pub groups: Vec<TestGroup>,

    /// Add a combination test per valid assignment of these axes
    #[arg(long, value_delimiter = ',')]
    pub matrix: Vec<OptionAxis>,

    /// Cap on matrix combinations
    #[arg(long)]
    pub max_combinations: Option<usize>,

    /// Per-call timeout in seconds for evaluate and build
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print one line per finished test
    #[arg(long)]
    pub show_progress: bool,
}
