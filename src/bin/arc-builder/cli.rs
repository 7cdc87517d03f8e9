//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// arc-builder - Build deployable bundles of ARC web components
#[derive(Parser)]
#[command(name = "arc-builder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the components bundle
    Build(BuildArgs),

    /// Validate build options without building
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Build options. Flags override values read from `--options`.
#[derive(Args, Clone, Debug, Default)]
pub struct OptionArgs {
    /// Read build options from a JSON or TOML file
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Component from the advanced-rest-client scope (repeatable)
    #[arg(long = "component", value_name = "REF")]
    pub components: Vec<String>,

    /// Component from any scope, e.g. `PolymerElements/paper-input#^2.0.0` (repeatable)
    #[arg(long = "extra", value_name = "REF")]
    pub extras: Vec<String>,

    /// Theme file copied into the build
    #[arg(long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Bundle sources for production
    #[arg(long)]
    pub bundle: bool,

    /// Generate framework wrappers
    #[arg(long)]
    pub wrapper: bool,

    /// Only wrap this component (repeatable)
    #[arg(long = "wrapper-component", value_name = "NAME")]
    pub wrapper_components: Vec<String>,

    /// Bundle generated wrappers into a single file
    #[arg(long)]
    pub bundle_wrapper: bool,

    /// Output directory [default: build]
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
