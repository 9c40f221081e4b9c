//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use gpulens_core::dashboard::{Dashboard, LoadedDataset, Outcome, SectionReport, build_dashboard};
use gpulens_core::histogram::bin_edges;
use gpulens_core::{AppState, GpulensConfig, Percentile};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Handle a CLI subcommand.
///
/// `config_file`, when set, replaces the workspace and user configuration files.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let source = ConfigSource {
        workspace,
        file: config_file,
    };
    match command {
        Commands::Serve { host, port } => handle_serve(host, port, source).await,
        Commands::Analyze {
            file,
            percentile,
            json,
        } => {
            let output = handle_analyze(&file, percentile, json, source)?;
            print!("{output}");
            Ok(())
        }
        Commands::Config { action } => handle_config(action, source),
    }
}

/// Where configuration is read from.
#[derive(Debug, Clone, Copy)]
struct ConfigSource<'a> {
    workspace: &'a Path,
    file: Option<&'a Path>,
}

impl ConfigSource<'_> {
    fn load(&self) -> anyhow::Result<GpulensConfig> {
        let loaded = match self.file {
            Some(path) => gpulens_core::config::load_config_file(path),
            None => gpulens_core::config::load_config(Some(self.workspace), None),
        };
        loaded.map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// File written by `config init`.
    fn init_path(&self) -> PathBuf {
        match self.file {
            Some(path) => path.to_path_buf(),
            None => gpulens_core::config::workspace_config_path(self.workspace),
        }
    }
}

async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    source: ConfigSource<'_>,
) -> anyhow::Result<()> {
    let mut config = source.load()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    println!(
        "gpulens dashboard at http://{}:{}/",
        config.server.host, config.server.port
    );
    gpulens_core::run_dashboard(AppState::new(config).shared()).await?;
    Ok(())
}

/// Analyze `file` and return the rendered report.
fn handle_analyze(
    file: &Path,
    percentile: Option<i64>,
    json: bool,
    source: ConfigSource<'_>,
) -> anyhow::Result<String> {
    let config = source.load()?;
    let percentile = Percentile::new(
        percentile.unwrap_or(i64::from(config.analysis.default_percentile)),
    )?;

    let raw = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let dataset = LoadedDataset::from_bytes(name, &raw)
        .map_err(|e| anyhow::anyhow!("CSV file could not be read: {}", e))?;
    let dashboard = build_dashboard(&dataset.table, percentile);

    if json {
        let value = serde_json::json!({
            "file": dataset.name,
            "report": dataset.report,
            "dashboard": dashboard,
        });
        Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
    } else {
        Ok(render_text(&dataset, &dashboard))
    }
}

/// Plain-text rendering of a dashboard.
fn render_text(dataset: &LoadedDataset, dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} rows ({} skipped), percentile {}",
        dataset.name, dashboard.rows, dataset.report.rows_skipped, dashboard.percentile
    );
    for warning in &dashboard.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    match &dashboard.timeline {
        Outcome::Ready(timeline) => {
            let _ = writeln!(out, "{}", timeline.duration_label);
        }
        Outcome::Failed { message } => {
            let _ = writeln!(out, "timeline unavailable: {message}");
        }
    }
    for section in &dashboard.sections {
        out.push('\n');
        render_section_text(&mut out, section);
    }
    out
}

fn render_section_text(out: &mut String, section: &SectionReport) {
    let _ = writeln!(out, "== {} ==", section.heading);

    if section.histogram.is_empty() {
        let _ = writeln!(out, "  no samples in [0, 100] for {}", section.histogram.column);
    } else {
        for (idx, bin) in section.histogram.bins.iter().enumerate() {
            let (lo, hi) = bin_edges(idx);
            let _ = writeln!(out, "  {:>3}-{:<3} {:>6.2}%", lo, hi, bin.value);
        }
    }

    for (pos, table) in section.tables.iter().enumerate() {
        if pos == 1 {
            if let Some(capacity) = &section.capacity {
                let _ = writeln!(out, "  {capacity}");
            }
        }
        match table {
            Outcome::Ready(summary) => {
                let width = summary.rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
                for row in &summary.rows {
                    let _ = writeln!(out, "  {:<width$}  {}", row.label, row.value);
                }
            }
            Outcome::Failed { message } => {
                let _ = writeln!(out, "  error: {message}");
            }
        }
    }
}

fn handle_config(action: ConfigAction, source: ConfigSource<'_>) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = source.init_path();
            if let Some(config_dir) = config_path.parent() {
                std::fs::create_dir_all(config_dir)?;
            }

            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&GpulensConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = source.load()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPORT: &str = "Time (s),CPU (%),Mem (%),Mem Total (MB),Mem Used (MB),GPU0 (%)\n\
                          0,10,50,16384,8192,20\n\
                          1,20,50,16384,8192,40\n\
                          2,30,50,16384,8192,60\n\
                          3,40,50,16384,8192,80\n";

    fn in_workspace(dir: &TempDir) -> ConfigSource<'_> {
        ConfigSource {
            workspace: dir.path(),
            file: None,
        }
    }

    fn write_export(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("run.csv");
        std::fs::write(&path, EXPORT).unwrap();
        path
    }

    #[tokio::test]
    async fn test_config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();

        let command = Commands::Config {
            action: ConfigAction::Init,
        };
        handle_command(command, workspace, None).await.unwrap();

        let config_path = workspace.join(".gpulens").join("config.toml");
        assert!(config_path.exists());

        let content = std::fs::read_to_string(&config_path).unwrap();
        let parsed: GpulensConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.server.port, 8501);
        assert_eq!(parsed.analysis.default_percentile, 95);
    }

    #[tokio::test]
    async fn test_config_init_idempotent() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path();
        let config_path = workspace.join(".gpulens").join("config.toml");

        handle_command(
            Commands::Config {
                action: ConfigAction::Init,
            },
            workspace,
            None,
        )
        .await
        .unwrap();
        std::fs::write(&config_path, "[server]\nport = 9100\n").unwrap();

        handle_command(
            Commands::Config {
                action: ConfigAction::Init,
            },
            workspace,
            None,
        )
        .await
        .unwrap();
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("9100"));
    }

    #[test]
    fn test_analyze_text_report() {
        let dir = TempDir::new().unwrap();
        let file = write_export(&dir);
        let out = handle_analyze(&file, Some(50), false, in_workspace(&dir)).unwrap();

        assert!(out.starts_with("run.csv: 4 rows (0 skipped), percentile 50"));
        assert!(out.contains("Duration 00:00:03 (h/m/s)"));
        assert!(out.contains("== CPU Analysis =="));
        assert!(out.contains("CPU Median:"));
        assert!(out.contains("CPU 50th Percentile:"));
        assert!(out.contains("Total Memory Available: 16384 MB / 16 GB"));
        assert!(out.contains("error: Column not found: GPU0 Encode (%)"));
    }

    #[test]
    fn test_analyze_json_report() {
        let dir = TempDir::new().unwrap();
        let file = write_export(&dir);
        let out = handle_analyze(&file, None, true, in_workspace(&dir)).unwrap();

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["file"], "run.csv");
        assert_eq!(json["report"]["rows_kept"], 4);
        assert_eq!(json["dashboard"]["percentile"], 95);
        assert_eq!(json["dashboard"]["sections"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_analyze_rejects_bad_percentile() {
        let dir = TempDir::new().unwrap();
        let file = write_export(&dir);
        let err = handle_analyze(&file, Some(-1), false, in_workspace(&dir)).unwrap_err();
        assert!(err.to_string().contains("outside [0, 100]"));
    }

    #[test]
    fn test_analyze_with_config_file() {
        let dir = TempDir::new().unwrap();
        let file = write_export(&dir);
        let config_file = dir.path().join("ci.toml");
        std::fs::write(&config_file, "[analysis]\ndefault_percentile = 90\n").unwrap();

        let source = ConfigSource {
            workspace: dir.path(),
            file: Some(&config_file),
        };
        let out = handle_analyze(&file, None, false, source).unwrap();
        assert!(out.starts_with("run.csv: 4 rows (0 skipped), percentile 90"));
        assert!(out.contains("CPU 90th Percentile:"));
    }

    #[test]
    fn test_analyze_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let file = write_export(&dir);
        let config_file = dir.path().join("absent.toml");
        let source = ConfigSource {
            workspace: dir.path(),
            file: Some(&config_file),
        };
        let err = handle_analyze(&file, None, false, source).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
    }

    #[tokio::test]
    async fn test_config_init_at_explicit_path() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("conf").join("gpulens.toml");

        handle_command(
            Commands::Config {
                action: ConfigAction::Init,
            },
            dir.path(),
            Some(&config_file),
        )
        .await
        .unwrap();

        assert!(config_file.exists());
        assert!(!dir.path().join(".gpulens").exists());
        let config = gpulens_core::config::load_config_file(&config_file).unwrap();
        assert_eq!(config.analysis.default_percentile, 95);
    }

    #[test]
    fn test_analyze_binary_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("capture.bin");
        std::fs::write(&file, [0x89u8, b'P', b'N', b'G', 0x00, 0x01]).unwrap();
        let err = handle_analyze(&file, None, false, in_workspace(&dir)).unwrap_err();
        assert!(err.to_string().starts_with("CSV file could not be read"));
    }
}
