use std::{
  io::Write,
  path::{Component, Path, PathBuf},
};

use anyhow::Context;
use chrono::{Local, Timelike};
use crossterm::style::Stylize;

use crate::{
  config::Config,
  generator::{
    metrics::GenerationStats,
    orchestrator::GeneratedOutput,
    plugins::Artifact,
  },
  introspection::Introspection,
  ui::{Colors, GenerateCommand},
};

fn format_timestamp() -> String {
  let now = Local::now();
  format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second())
}

/// A `generate` invocation: the loaded configuration with command line
/// overrides applied.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
  pub input: PathBuf,
  pub config: Config,
  pub verbose: bool,
  pub quiet: bool,
}

impl GenerateConfig {
  pub async fn from_command(command: GenerateCommand) -> anyhow::Result<Self> {
    let config = Config::load(command.config.as_deref()).await?;
    Self::with_overrides(command, config)
  }

  fn with_overrides(command: GenerateCommand, mut config: Config) -> anyhow::Result<Self> {
    let GenerateCommand {
      config: _,
      input,
      output,
      plugins,
      abbreviation_files,
      verbose,
      quiet,
    } = command;

    if let Some(output) = output {
      config.path = output;
    }
    if let Some(plugins) = plugins {
      config.plugins = plugins;
    }
    if let Some(files) = abbreviation_files {
      config.abbreviation_files = files;
    }
    config.validate().context("Invalid command line overrides")?;

    Ok(Self {
      input,
      config,
      verbose,
      quiet,
    })
  }

  fn output(&self) -> &Path {
    &self.config.path
  }
}

/// Writes every artifact below `root`, creating directories as needed.
///
/// Artifact paths are hints from plugins and must stay relative to `root`.
async fn write_artifacts<'a>(root: &Path, artifacts: impl IntoIterator<Item = &'a Artifact>) -> anyhow::Result<usize> {
  let mut written = 0;
  for artifact in artifacts {
    let relative = &artifact.path;
    if relative.as_os_str().is_empty() || !relative.components().all(|part| matches!(part, Component::Normal(_))) {
      anyhow::bail!("Refusing to write artifact outside the output directory: {}", relative.display());
    }

    let path = root.join(relative);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(&path, &artifact.content)
      .await
      .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
    written += 1;
  }
  Ok(written)
}

struct GenerateLogger<'a> {
  config: &'a GenerateConfig,
  colors: &'a Colors,
}

impl<'a> GenerateLogger<'a> {
  fn new(config: &'a GenerateConfig, colors: &'a Colors) -> Self {
    Self { config, colors }
  }

  fn info(&self, message: &str) {
    if !self.config.quiet {
      println!("{} {message}", format_timestamp().with(self.colors.timestamp()));
    }
  }

  fn stat(&self, label: &str, value: String) {
    if !self.config.quiet {
      println!(
        "           {:<25} {}",
        label.with(self.colors.label()),
        value.with(self.colors.value())
      );
    }
  }

  fn log_loading(&self) {
    self.info(
      &format!("Loading introspection dump from: {}", self.config.input.display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_generating(&self) {
    let message = format!("Running plugins: {}", self.config.config.plugins.join(", "));
    self.info(&message.with(self.colors.primary()).to_string());
  }

  fn print_statistics(&self, output: &GeneratedOutput) {
    if self.config.quiet {
      return;
    }

    let stats = &output.stats;
    self.stat("Databases built:", stats.databases_built.to_string());
    if self.config.verbose {
      for database in &output.databases {
        self.stat("", format!("{} ({} schemes)", database.name, database.schemes.len()));
      }
    }
    self.stat("", format!("{} schemes", stats.schemes_built));
    self.stat("", format!("{} packages", stats.packages_built));
    self.stat(
      "",
      format!(
        "{} routines in {} overload sets",
        stats.routines_built, stats.overload_sets_built
      ),
    );
    self.stat("", format!("{} arguments", stats.arguments_built));
    self.stat("Artifacts rendered:", stats.total_artifacts().to_string());
    if self.config.verbose {
      for (plugin, count) in &stats.artifacts_rendered {
        self.stat("", format!("{count} by {plugin}"));
      }
    }
    if !stats.warnings.is_empty() {
      self.stat("Warnings:", stats.warnings.len().to_string());
    }
  }

  /// Skipped output is always shown; degraded output only with `--verbose`.
  fn print_warnings(&self, stats: &GenerationStats) {
    if stats.warnings.is_empty() || self.config.quiet {
      return;
    }
    if let Err(error) = self.write_warnings(&mut std::io::stderr().lock(), stats) {
      tracing::debug!(%error, "failed to print warnings");
    }
  }

  /// The separator and every warning go to one stream so redirection keeps them together.
  fn write_warnings(&self, out: &mut impl Write, stats: &GenerationStats) -> std::io::Result<()> {
    let mut printed_header = false;
    for warning in &stats.warnings {
      if !(warning.is_skipped_item() || self.config.verbose) {
        continue;
      }

      if !printed_header {
        writeln!(out)?;
        printed_header = true;
      }

      let (label, color) = if warning.is_skipped_item() {
        ("Skipped:", self.colors.accent())
      } else {
        ("Warning:", self.colors.warning())
      };
      writeln!(out, "{} {}", label.with(color), warning.to_string().with(self.colors.primary()))?;
    }
    Ok(())
  }

  fn log_writing(&self) {
    self.info(
      &format!("Writing to: {}", self.config.output().display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_success(&self, written: usize) {
    if !self.config.quiet {
      println!();
      println!(
        "{} {}",
        format_timestamp().with(self.colors.timestamp()),
        format!("Successfully wrote {written} artifacts").with(self.colors.success())
      );
    }
  }
}

pub async fn generate_code(config: GenerateConfig, colors: &Colors) -> anyhow::Result<()> {
  let logger = GenerateLogger::new(&config, colors);

  logger.log_loading();
  let dump = Introspection::load(&config.input).await?;
  let abbreviations = config.config.abbreviation_table().await?;

  logger.log_generating();
  let output = config
    .config
    .orchestrator(abbreviations)
    .run(&dump)
    .inspect_err(|error| tracing::error!(entity = error.entity(), "generation aborted"))
    .context("Generation aborted, nothing was written")?;
  logger.print_statistics(&output);

  logger.log_writing();
  let written = write_artifacts(config.output(), output.artifacts.iter().map(|(_, artifact)| artifact)).await?;

  logger.print_warnings(&output.stats);
  logger.log_success(written);
  Ok(())
}
