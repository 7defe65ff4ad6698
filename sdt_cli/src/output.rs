//! Terminal listings of changed files and comparison reports.

use colored::Colorize;
use sdt_api::{FileChange, FileStatus};
use sdt_core::Error;

/// Printed when a file's language has no usable analyzer.
pub const NO_ANALYZER: &str = "| No available semantic analyzer for this format";

pub fn header(text: &str) {
    println!("{}", text.white().bold());
}

/// `git status` style line for one change.
pub fn status_line(change: &FileChange) -> String {
    match &change.old_path {
        Some(old) => format!("    {}:   {} -> {}", change.status.label(), old, change.path),
        None => format!("    {}:   {}", change.status.label(), change.path),
    }
}

pub fn staged(change: &FileChange) {
    println!("{}", status_line(change).green());
}

pub fn unstaged(change: &FileChange) {
    println!("{}", status_line(change).red());
}

pub fn untracked(path: &str) {
    println!("{}", format!("    {path}").cyan());
}

/// Changes between revisions, grouped by kind.
#[derive(Debug, Default)]
pub struct RevisionListing<'a> {
    pub added: Vec<&'a FileChange>,
    pub removed: Vec<&'a FileChange>,
    pub moved: Vec<&'a FileChange>,
    pub changed: Vec<&'a FileChange>,
}

impl<'a> RevisionListing<'a> {
    pub fn group(changes: impl IntoIterator<Item = &'a FileChange>) -> Self {
        let mut listing = Self::default();
        for change in changes {
            match change.status {
                FileStatus::Added | FileStatus::Copied => listing.added.push(change),
                FileStatus::Deleted => listing.removed.push(change),
                FileStatus::Renamed => listing.moved.push(change),
                FileStatus::Modified | FileStatus::TypeChange => listing.changed.push(change),
            }
        }
        listing
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.changed.is_empty()
    }

    /// Print the added, removed and moved sections.
    pub fn print_summary(&self) {
        if !self.added.is_empty() {
            header("New files created:");
        }
        for change in &self.added {
            println!("{}", format!("   {}", change.path).green());
        }
        if !self.removed.is_empty() {
            header("Files removed from branch/revision:");
        }
        for change in &self.removed {
            println!("{}", format!("   {}", change.path).red());
        }
        if !self.moved.is_empty() {
            header("Files moved between branches/revisions:");
        }
        for change in &self.moved {
            println!(
                "{}",
                format!("   {} => {}", change.source_path(), change.path).magenta()
            );
        }
    }
}

/// Header opening the list of changed files.
pub const fn changed_header(to_revision: bool) -> &'static str {
    if to_revision {
        "Changes between branches/revisions:"
    } else {
        "Changes between branch/revision and current:"
    }
}

pub fn changed(path: &str) {
    println!("{}", format!("    {path}").cyan());
}

/// Print one comparison outcome. Failures become a single `| ` line.
pub fn report(result: Result<String, Error>) {
    match result {
        Ok(report) => println!("{}", paint(&report)),
        Err(Error::UnsupportedLanguage { path }) => {
            tracing::debug!(%path, "no analyzer");
            println!("{}", NO_ANALYZER.yellow());
        }
        Err(err) => {
            tracing::warn!(error = %err, "comparison failed");
            println!("{}", format!("| ERROR: {err}").yellow());
        }
    }
}

/// Color a report's first line yellow unless the report already carries
/// its own escapes. Sentinels are single plain lines.
fn paint(report: &str) -> String {
    let (first, rest) = match report.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (report, None),
    };
    let first = if first.contains('\x1b') {
        first.to_owned()
    } else {
        first.yellow().to_string()
    };
    match rest {
        Some(rest) => format!("{first}\n{rest}"),
        None => first,
    }
}
