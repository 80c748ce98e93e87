//! Commands behind the `xd` binary.
//!
//! Each command reads its input files, runs the library pipeline and returns
//! the text to print; `main` only handles process concerns.

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xd_core::{DomNode, LintSeverity, XdConfig};
use xd_import::{ImportOutcome, InMemoryHost, UiMessage, handle_message};
use xd_proto::{FileStore, LinkGraph, LinkStore};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] xd_core::ConfigError),
    #[error(transparent)]
    Dom(#[from] xd_core::DomError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] xd_proto::StoreError),
    #[error("invalid font `{0}`, expected FAMILY:STYLE")]
    Font(String),
}

#[derive(Debug, Parser)]
#[command(name = "xd")]
#[command(about = "Design interchange for generated UI screens")]
pub struct Cli {
    /// TOML file overriding heuristic thresholds
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Plugin import JSON
    Plugin,
    /// Standalone SVG document
    Svg,
    /// Absolutely positioned HTML
    Html,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a DOM snapshot into an export format
    Export {
        /// DOM snapshot JSON
        snapshot: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Plugin)]
        format: Format,
        /// Document name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
        /// Stylesheet embedded in SVG output
        #[arg(short, long)]
        stylesheet: Option<PathBuf>,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report structural problems in a parsed snapshot
    Lint {
        snapshot: PathBuf,
    },
    /// Dry-run a plugin import against an in-memory host
    Import {
        /// Plugin export JSON
        export: PathBuf,
        /// Fonts the host has, as FAMILY:STYLE (all fonts when omitted)
        #[arg(long = "font")]
        fonts: Vec<String>,
    },
    /// List a project's prototype links
    Links {
        project: String,
        /// Directory holding `prototype-links-<project>.json`
        #[arg(short, long, default_value = ".")]
        store: PathBuf,
    },
}

/// What a command produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub stdout: String,
    /// The command ran but found a problem (lint warnings, rejected import).
    pub failed: bool,
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let config = match &cli.config {
        Some(path) => XdConfig::from_file(path)?,
        None => XdConfig::default(),
    };
    match &cli.command {
        Command::Export {
            snapshot,
            format,
            name,
            stylesheet,
            output,
        } => {
            let stylesheet = match stylesheet {
                Some(path) => read(path)?,
                None => String::new(),
            };
            let name = name.clone().unwrap_or_else(|| file_stem(snapshot));
            let text = export(&read(snapshot)?, *format, &name, &stylesheet, &config)?;
            match output {
                Some(path) => {
                    std::fs::write(path, &text).map_err(|source| CliError::Write {
                        path: path.clone(),
                        source,
                    })?;
                    log::info!("wrote {}", path.display());
                    Ok(Report::default())
                }
                None => Ok(Report {
                    stdout: text,
                    failed: false,
                }),
            }
        }
        Command::Lint { snapshot } => lint(&read(snapshot)?, &config),
        Command::Import { export, fonts } => import(&read(export)?, fonts).await,
        Command::Links { project, store } => links(project, store),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Screen".to_string())
}

pub fn export(
    snapshot: &str,
    format: Format,
    name: &str,
    stylesheet: &str,
    config: &XdConfig,
) -> Result<String, CliError> {
    Ok(match format {
        Format::Plugin => {
            let tree = xd_core::parse_snapshot_json(snapshot, &config.parser)?;
            xd_core::export_json(&tree, name)?
        }
        Format::Svg => {
            let root = DomNode::from_json(snapshot)?;
            xd_core::export_svg_with(&root, stylesheet, &config.parser)
        }
        Format::Html => {
            let tree = xd_core::parse_snapshot_json(snapshot, &config.parser)?;
            xd_core::render_html(&tree)
        }
    })
}

pub fn lint(snapshot: &str, config: &XdConfig) -> Result<Report, CliError> {
    let tree = xd_core::parse_snapshot_json(snapshot, &config.parser)?;
    let diagnostics = xd_core::lint_tree(&tree, &config.parser);
    let mut report = Report::default();
    for d in &diagnostics {
        let level = match d.severity {
            LintSeverity::Warning => {
                report.failed = true;
                "warning"
            }
            LintSeverity::Info => "info",
        };
        let _ = writeln!(report.stdout, "{level}[{}] {}: {}", d.rule, d.node_id.as_str(), d.message);
    }
    if diagnostics.is_empty() {
        report.stdout.push_str("no issues\n");
    }
    Ok(report)
}

pub async fn import(json: &str, fonts: &[String]) -> Result<Report, CliError> {
    let mut host = if fonts.is_empty() {
        InMemoryHost::new()
    } else {
        let pairs = fonts
            .iter()
            .map(|f| f.split_once(':').ok_or_else(|| CliError::Font(f.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        InMemoryHost::with_fonts(pairs)
    };
    let outcome = handle_message(
        &mut host,
        UiMessage::ImportJson {
            json: json.to_string(),
        },
    )
    .await;

    let mut report = Report {
        stdout: host.outline(),
        failed: outcome.is_error(),
    };
    if let ImportOutcome::Imported { warnings, .. } = &outcome {
        for w in warnings {
            let _ = writeln!(report.stdout, "warning: {w}");
        }
    }
    let _ = writeln!(report.stdout, "{}", outcome.notice());
    Ok(report)
}

pub fn links(project: &str, dir: &Path) -> Result<Report, CliError> {
    let store = FileStore::new(dir);
    let graph = LinkGraph::from_links(project, store.load(project)?);
    let mut report = Report::default();
    for link in graph.links() {
        let _ = writeln!(
            report.stdout,
            "{}  {}/{} -> {}",
            link.id, link.from_screen_id, link.from_element_id, link.to_screen_id
        );
    }
    let _ = writeln!(report.stdout, "{} link(s) in {project}", graph.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_arguments() {
        let cli = Cli::try_parse_from(["xd", "export", "screen.json", "--format", "svg", "-o", "out.svg"]).unwrap();
        let Command::Export { format, output, .. } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(format, Format::Svg);
        assert_eq!(output, Some(PathBuf::from("out.svg")));
    }

    #[test]
    fn repeated_fonts_collect() {
        let cli = Cli::try_parse_from(["xd", "import", "doc.json", "--font", "Inter:Regular", "--font", "Inter:Bold"])
            .unwrap();
        let Command::Import { fonts, .. } = cli.command else {
            panic!("expected import");
        };
        assert_eq!(fonts, vec!["Inter:Regular", "Inter:Bold"]);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["xd", "export", "s.json", "--format", "pdf"]).is_err());
    }

    #[tokio::test]
    async fn malformed_font_is_an_error() {
        let err = import("{}", &["Inter".to_string()]).await.unwrap_err();
        assert!(matches!(err, CliError::Font(f) if f == "Inter"));
    }
}
