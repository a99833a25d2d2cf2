use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::colors::{ColorMode, Colors, ThemeMode};

#[derive(Parser, Debug)]
#[command(name = "dbsg")]
#[command(author, version, about = "Stored routine stub generator", styles = Colors::clap_styles())]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Control color output
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub color: ColorMode,

  /// Terminal theme (dark or light background)
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub theme: ThemeMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// List every routine found in an introspection dump
  List {
    /// Path to the introspection dump (JSON)
    #[arg(short, long, value_name = "FILE", default_value = "introspection.json")]
    input: PathBuf,
  },
  /// Generate stubs from an introspection dump
  Generate(GenerateCommand),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
  /// Configuration file (defaults to $DBSG_CONF, then ./dbsg.toml)
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Path to the introspection dump (JSON)
  #[arg(short, long, value_name = "FILE", default_value = "introspection.json")]
  pub input: PathBuf,

  /// Directory artifacts are written under, overrides `path` from the configuration
  #[arg(short, long, value_name = "DIR")]
  pub output: Option<PathBuf>,

  /// Plugins to run (comma-separated), overrides `plugins` from the configuration
  #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
  pub plugins: Option<Vec<String>>,

  /// Abbreviation files (comma-separated), override `abbreviation_files` from the configuration
  #[arg(short, long, value_name = "FILES", value_delimiter = ',')]
  pub abbreviation_files: Option<Vec<PathBuf>>,

  /// Enable verbose output with detailed progress information
  #[arg(short, long, default_value_t = false)]
  pub verbose: bool,

  /// Suppress non-essential output (errors only)
  #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
  pub quiet: bool,
}

impl Cli {
  pub fn is_verbose(&self) -> bool {
    matches!(&self.command, Commands::Generate(command) if command.verbose)
  }
}
