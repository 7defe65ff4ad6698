//! `sdt` - semantic diff tool.
//!
//! Lists files changed in git and shows which of their changes alter the
//! parse tree rather than only formatting or comments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod options;
mod output;

use options::{Target, DEFAULT_SOURCE};
use output::RevisionListing;
use sdt_api::{FileChange, RenderStyle, ReportKind, ReportOptions};
use sdt_core::{Comparer, PathFilter, Repository};

/// Show semantic changes between file versions.
#[derive(Debug, Parser)]
#[command(name = "sdt")]
#[command(author, version)]
#[command(about = "Compare files by their parse trees instead of their text")]
#[command(after_help = "Sources:
  -A HEAD: -B <nothing>   HEAD against staged and unstaged changes (default)
  -A main: -B dev:        two branches or revisions (note the trailing colon)
  -A main:                a branch or revision against the working tree
  -A old.py -B new.py     two local files

Examples:
  sdt status -g '*.py'
  sdt semantic -A v1.2: -m
  sdt parsetree -A before.sql -B after.sql -d")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Only consider paths matching this git pathspec
    #[arg(short, long, global = true)]
    glob: Option<String>,

    /// Show only changed lines and headers
    #[arg(short, long, global = true)]
    minimal: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Mark changes with {{+ }} / {{- }} instead of color
    #[arg(short, long, global = true)]
    dumbterm: bool,

    /// No color and no change markers
    #[arg(long, global = true, conflicts_with = "dumbterm")]
    plain: bool,

    /// Source: a branch/revision ending in ':' or a local file
    #[arg(short = 'A', long, global = true, default_value = DEFAULT_SOURCE)]
    src: String,

    /// Destination: a branch/revision ending in ':' or a local file
    #[arg(short = 'B', long, global = true)]
    dst: Option<String>,

    /// Seconds an external parser may run (overrides config)
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Commands {
    /// List changed files
    #[command(visible_alias = "st")]
    Status,
    /// List changed files with the source hunks that alter the parse tree
    #[command(visible_alias = "sem")]
    Semantic,
    /// List changed files with a diff of their parse trees
    #[command(visible_alias = "pt")]
    Parsetree,
}

impl Commands {
    const fn kind(self) -> Option<ReportKind> {
        match self {
            Self::Status => None,
            Self::Semantic => Some(ReportKind::Semantic),
            Self::Parsetree => Some(ReportKind::ParseTree),
        }
    }
}

impl Cli {
    fn style(&self, ci: bool) -> RenderStyle {
        if self.dumbterm || ci {
            RenderStyle::Dumbterm
        } else if self.plain {
            RenderStyle::Plain
        } else {
            RenderStyle::Color
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    setup_logging(cli.verbose);

    let target = options::resolve(&cli.src, cli.dst.as_deref(), cli.glob.as_deref())?;

    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut loaded = config::load(Path::new("."), home.as_deref());
    if let Some(secs) = cli.timeout {
        loaded.config.timeout_secs = Some(secs);
    }
    let glob = cli.glob.clone().or_else(|| loaded.config.glob.clone());

    let style = cli.style(std::env::var("CI").is_ok_and(|value| value == "true"));
    if style != RenderStyle::Color {
        colored::control::set_override(false);
    }

    tracing::debug!(
        description = loaded.description(),
        source = %loaded.source,
        ?command,
        ?glob,
        minimal = cli.minimal,
        ?style,
        src = %cli.src,
        dst = ?cli.dst,
        timeout = ?loaded.config.timeout_secs,
        "effective settings"
    );
    for (id, spec) in &loaded.config.commands {
        tracing::debug!(language = %id, command = %spec.display(), "configured command");
    }

    let report = ReportOptions {
        kind: command.kind(),
        style,
        minimal: cli.minimal,
    };
    let comparer = Comparer::from_config(&loaded.config, report)
        .context("failed to load language commands")?;

    match target {
        Target::Files { before, after } => {
            tracing::info!(
                "Comparing local files: {} -> {}",
                before.display(),
                after.display()
            );
            output::report(comparer.compare_files(&before, &after));
        }
        Target::Workspace => {
            let repo = open_repository()?;
            let filter = PathFilter::new(glob.as_deref())?;
            workspace(&comparer, &repo, &filter)?;
        }
        Target::Revisions { src, dst } => {
            let repo = open_repository()?;
            let filter = PathFilter::new(glob.as_deref())?;
            revisions(&comparer, &repo, &filter, &src, dst.as_deref())?;
        }
    }

    Ok(())
}

fn open_repository() -> anyhow::Result<Repository> {
    Repository::open(".").context("you are probably not in a git directory")
}

/// `HEAD` against staged, unstaged and untracked changes.
fn workspace(comparer: &Comparer, repo: &Repository, filter: &PathFilter) -> anyhow::Result<()> {
    tracing::info!("Comparing HEAD to current changes on-disk");
    if let Some(branch) = repo.current_branch()? {
        tracing::debug!(%branch, root = %repo.root().display(), "repository");
    }
    let changes = repo.workspace_changes()?;
    let compare = comparer.options().kind.is_some();
    let mut pending: BTreeMap<&str, &FileChange> = changes
        .comparable()
        .into_iter()
        .map(|change| (change.path.as_str(), change))
        .collect();

    let mut section = |title: &str, entries: &[FileChange], print: fn(&FileChange)| {
        let entries: Vec<&FileChange> = entries
            .iter()
            .filter(|change| filter.matches(&change.path))
            .collect();
        if entries.is_empty() {
            return;
        }
        output::header(title);
        for change in entries {
            print(change);
            if !compare {
                continue;
            }
            if let Some(comparable) = pending.remove(change.path.as_str()) {
                output::report(comparer.compare_change(repo, "HEAD", None, comparable));
            }
        }
    };
    section("Changes to be committed:", &changes.staged, output::staged);
    section("Changes not staged for commit:", &changes.unstaged, output::unstaged);

    let untracked: Vec<&String> = changes
        .untracked
        .iter()
        .filter(|path| filter.matches(path))
        .collect();
    if !untracked.is_empty() {
        output::header("Untracked files:");
        for path in untracked {
            output::untracked(path);
        }
    }
    Ok(())
}

/// A revision against another revision or against the working tree.
fn revisions(
    comparer: &Comparer,
    repo: &Repository,
    filter: &PathFilter,
    src: &str,
    dst: Option<&str>,
) -> anyhow::Result<()> {
    match dst {
        Some(dst) => tracing::info!("Comparing branches/revisions {src} to {dst}"),
        None => tracing::info!("Comparing branch/revision {src} to on-disk files"),
    }
    let changes = match repo.changes_between(src, dst) {
        Ok(changes) => changes,
        Err(err) => {
            let message = match dst {
                Some(dst) => format!("One or both branches/revisions are unavailable: {src}, {dst}"),
                None => format!("The indicated source branch/revision is unavailable: {src}"),
            };
            return Err(anyhow::Error::new(err).context(message));
        }
    };
    let listing = RevisionListing::group(
        changes
            .iter()
            .filter(|change| filter.matches(&change.path)),
    );
    if listing.is_empty() {
        output::header("No changes detected");
        return Ok(());
    }

    listing.print_summary();
    if !listing.changed.is_empty() {
        output::header(output::changed_header(dst.is_some()));
    }
    let compare = comparer.options().kind.is_some();
    for change in &listing.changed {
        output::changed(&change.path);
        if compare {
            output::report(comparer.compare_change(repo, src, dst, change));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compare_head_with_color() {
        let cli = Cli::try_parse_from(["sdt", "semantic"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Semantic));
        assert_eq!(cli.src, DEFAULT_SOURCE);
        assert!(cli.dst.is_none());
        assert_eq!(cli.style(false), RenderStyle::Color);
        assert_eq!(cli.style(true), RenderStyle::Dumbterm);
    }

    #[test]
    fn test_global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "sdt", "parsetree", "-A", "main:", "-B", "dev:", "-g", "*.sql", "-m", "--plain",
            "--timeout", "5",
        ])
        .unwrap();
        assert_eq!(cli.command.and_then(Commands::kind), Some(ReportKind::ParseTree));
        assert_eq!(cli.src, "main:");
        assert_eq!(cli.dst.as_deref(), Some("dev:"));
        assert_eq!(cli.glob.as_deref(), Some("*.sql"));
        assert!(cli.minimal);
        assert_eq!(cli.style(false), RenderStyle::Plain);
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_plain_conflicts_with_dumbterm() {
        assert!(Cli::try_parse_from(["sdt", "status", "-d", "--plain"]).is_err());
    }

    #[test]
    fn test_status_requests_no_report() {
        let cli = Cli::try_parse_from(["sdt", "st"]).unwrap();
        assert_eq!(cli.command.and_then(Commands::kind), None);
    }

    #[test]
    fn test_no_subcommand_is_accepted() {
        let cli = Cli::try_parse_from(["sdt"]).unwrap();
        assert!(cli.command.is_none());
    }
}
