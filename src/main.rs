use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use noita_recap::{
    archive,
    config::{Config, ConfigStore, FileConfigStore},
    report::Report,
    scanner, Scope,
};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

/// yearly recap of noita play sessions
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Reads the per-session stats the game writes to its save folder and prints a yearly recap: totals, records, streaks, radar scores and badges."
)]
pub struct Cli {
    /// directory holding <timestamp>_stats.xml files (default: the game's save folder)
    dir: Option<PathBuf>,

    /// year to report on, or "all"
    #[clap(short = 'y', long)]
    year: Option<Scope>,

    /// output format
    #[clap(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// write the report here instead of stdout
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// also write one CSV row per ingested session
    #[clap(long)]
    sessions_csv: Option<PathBuf>,

    /// number of sessions read concurrently
    #[clap(short = 'b', long)]
    batch_size: Option<usize>,

    /// only count session files per year and exit
    #[clap(long)]
    list_years: bool,

    /// persist the effective directory, year and batch size as defaults
    #[clap(long)]
    save_config: bool,

    /// config file to use instead of the platform default
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Command-line flags win over stored defaults.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.dir {
            config.stats_dir = Some(dir.clone());
        }
        if let Some(year) = self.year {
            config.year = year;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }
}

async fn list_years(dir: &Path) -> Result<()> {
    let years = scanner::prescan_years(dir)
        .await
        .with_context(|| format!("failed to scan {}", dir.display()))?;
    println!("all ({})", years.values().sum::<usize>());
    for (year, count) in years.iter().rev() {
        println!("{year} ({count})");
    }
    Ok(())
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write report to {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = cli.config_store();
    let config = cli.apply(store.load());
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("failed to save config to {}", store.path().display()))?;
        log::info!("saved config to {}", store.path().display());
    }

    let dir = config
        .resolve_stats_dir()
        .context("no session directory given and no default save location found")?;

    if cli.list_years {
        return list_years(&dir).await;
    }

    let aggregate = scanner::scan_directory(&dir, config.scan_options(), |_, _| {})
        .await
        .with_context(|| format!("failed to scan {}", dir.display()))?;

    if let Some(path) = &cli.sessions_csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        archive::write_session_log(&aggregate.session_log, BufWriter::new(file))
            .with_context(|| format!("failed to write session log to {}", path.display()))?;
    }

    let report = Report::assemble(&aggregate);
    let rendered = match cli.format {
        OutputFormat::Text => archive::render(&report).context("failed to render archive")?,
        OutputFormat::Json => report.to_json().context("failed to serialize report")?,
    };
    write_output(cli.output.as_deref(), &rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["noita-recap"]).unwrap();
        assert_eq!(cli.dir, None);
        assert_eq!(cli.year, None);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.list_years);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_year_and_format() {
        let cli =
            Cli::try_parse_from(["noita-recap", "sessions", "-y", "2025", "-f", "json"]).unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("sessions")));
        assert_eq!(cli.year, Some(Scope::Year(2025)));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_rejects_bad_year() {
        assert!(Cli::try_parse_from(["noita-recap", "--year", "last"]).is_err());
        assert!(Cli::try_parse_from(["noita-recap", "--year", "all"]).is_ok());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from(["noita-recap", "/data", "--batch-size", "8"]).unwrap();
        let stored = Config {
            year: Scope::Year(2024),
            ..Config::default()
        };
        let merged = cli.apply(stored);
        assert_eq!(merged.stats_dir, Some(PathBuf::from("/data")));
        assert_eq!(merged.batch_size, 8);
        assert_eq!(merged.year, Scope::Year(2024));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "Json");
    }
}
