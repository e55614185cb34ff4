//! Conservative merge of a tooling file into an existing project file.
//!
//! Used when bootstrapping spec tooling into a project that may already carry
//! its own copy of a file. Nothing is ever overwritten without a backup:
//!
//! 1. `dest` missing: copy `src` to `dest`.
//! 2. `dest` present: back it up to `dest.bak.<timestamp>`, then
//!    - if `dest` is tracked in a git work tree, 3-way merge with `HEAD` as
//!      the base (`git merge-file`);
//!    - otherwise, if both files are text, append the lines of `src` that
//!      `dest` does not already contain;
//!    - otherwise leave `dest` alone.

use crate::error::{KiroError, Result};
use crate::{io, paths};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Bytes inspected when deciding whether a file is text.
const TEXT_SAMPLE_LEN: usize = 4096;

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MergeAction {
    Copied,
    WouldCopy,
    GitMerged { conflicts: bool, output: String },
    WouldGitMerge { repo: PathBuf, relpath: PathBuf },
    Appended { lines: usize },
    WouldAppend,
    NothingToAppend,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub src: PathBuf,
    pub dest: PathBuf,
    /// Backup written (or, on a dry run, that would be written).
    pub backup: Option<PathBuf>,
    #[serde(flatten)]
    pub action: MergeAction,
    pub dry_run: bool,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (src, dest) = (self.src.display(), self.dest.display());
        if let Some(backup) = &self.backup {
            if self.dry_run {
                writeln!(f, "[dry-run] would backup: {dest} -> {}", backup.display())?;
            } else {
                writeln!(f, "Backed up: {dest} -> {}", backup.display())?;
            }
        }
        match &self.action {
            MergeAction::Copied => write!(f, "Copied: {dest}"),
            MergeAction::WouldCopy => write!(f, "[dry-run] would copy: {src} -> {dest}"),
            MergeAction::GitMerged { conflicts: false, .. } => {
                write!(f, "Applied git 3-way merge for: {dest}")
            }
            MergeAction::GitMerged {
                conflicts: true,
                output,
            } => {
                write!(
                    f,
                    "Applied git 3-way merge with conflicts for: {dest} (conflict markers may be present)"
                )?;
                if !output.is_empty() {
                    write!(f, "\n{}", output.trim_end())?;
                }
                Ok(())
            }
            MergeAction::WouldGitMerge { repo, relpath } => write!(
                f,
                "[dry-run] would perform git 3-way merge (HEAD base) for {} in repo {}",
                relpath.display(),
                repo.display()
            ),
            MergeAction::Appended { lines } => write!(
                f,
                "Merged (unique-append): {src} -> {dest} (appended {lines} lines)"
            ),
            MergeAction::WouldAppend => {
                write!(f, "[dry-run] would smart-merge (unique lines) {src} -> {dest}")
            }
            MergeAction::NothingToAppend => {
                write!(f, "No new unique lines to append: {src} -> {dest}")
            }
            MergeAction::Skipped => write!(f, "Skipped merge (binary or non-text): {dest}"),
        }
    }
}

/// Merge `src` into `dest`. See the module docs for the strategy.
pub fn merge_file(src: &Path, dest: &Path, opts: &MergeOptions) -> Result<MergeReport> {
    if !src.exists() {
        return Err(KiroError::SourceNotFound(src.to_path_buf()));
    }

    let report = |backup: Option<PathBuf>, action: MergeAction| MergeReport {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        backup,
        action,
        dry_run: opts.dry_run,
    };

    if !dest.exists() {
        if opts.dry_run {
            return Ok(report(None, MergeAction::WouldCopy));
        }
        io::copy_file(src, dest)?;
        tracing::debug!(src = %src.display(), dest = %dest.display(), "copied");
        return Ok(report(None, MergeAction::Copied));
    }

    let backup = paths::backup_path(dest, &timestamp());
    if !opts.dry_run {
        std::fs::copy(dest, &backup)?;
        tracing::debug!(backup = %backup.display(), "backed up destination");
    }

    if let Some(tracked) = tracked_in_git(dest) {
        if opts.dry_run {
            return Ok(report(
                Some(backup),
                MergeAction::WouldGitMerge {
                    repo: tracked.repo,
                    relpath: tracked.relpath,
                },
            ));
        }
        match git_three_way(src, dest, &tracked) {
            Ok(action) => return Ok(report(Some(backup), action)),
            Err(e) => {
                tracing::warn!(error = %e, "git-based merge failed; falling back to unique-line append");
            }
        }
    }

    if !(is_text_file(src)? && is_text_file(dest)?) {
        return Ok(report(Some(backup), MergeAction::Skipped));
    }
    if opts.dry_run {
        return Ok(report(Some(backup), MergeAction::WouldAppend));
    }

    let lines = append_unique_lines(src, dest)?;
    let action = if lines == 0 {
        MergeAction::NothingToAppend
    } else {
        MergeAction::Appended { lines }
    };
    Ok(report(Some(backup), action))
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%dT%H%M%S").to_string()
}

/// A file is text when its leading sample is valid UTF-8. A multi-byte
/// sequence cut off by the end of the sample still counts as text.
pub fn is_text_file(path: &Path) -> Result<bool> {
    use std::io::Read;
    let mut sample = Vec::with_capacity(TEXT_SAMPLE_LEN);
    std::fs::File::open(path)?
        .take(TEXT_SAMPLE_LEN as u64)
        .read_to_end(&mut sample)?;
    Ok(match std::str::from_utf8(&sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && sample.len() == TEXT_SAMPLE_LEN,
    })
}

/// Append to `dest` every line of `src` not already present in `dest`,
/// under a marker header. Returns the number of lines appended.
/// A line without its terminator, so `\n` and `\r\n` files compare equal.
fn line_key(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn append_unique_lines(src: &Path, dest: &Path) -> Result<usize> {
    let existing = String::from_utf8_lossy(&std::fs::read(dest)?).into_owned();
    let seen: HashSet<&str> = existing.split_inclusive('\n').map(line_key).collect();

    // Appended lines keep their original endings.
    let incoming = String::from_utf8_lossy(&std::fs::read(src)?).into_owned();
    let to_append: Vec<&str> = incoming
        .split_inclusive('\n')
        .filter(|line| !seen.contains(line_key(line)))
        .collect();

    if to_append.is_empty() {
        return Ok(0);
    }

    let mut text = format!(
        "\n\n# --- MERGE APPEND (unique lines) from: {} ---\n",
        src.display()
    );
    for line in &to_append {
        text.push_str(line);
    }
    io::append_text(dest, &text)?;
    Ok(to_append.len())
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct TrackedFile {
    repo: PathBuf,
    relpath: PathBuf,
}

/// Repository root and repo-relative path of `dest`, when git is installed
/// and `dest` is tracked.
fn tracked_in_git(dest: &Path) -> Option<TrackedFile> {
    which::which("git").ok()?;

    let dest = dest.canonicalize().ok()?;
    let dir = dest.parent()?;

    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "--show-toplevel"])
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let repo = PathBuf::from(String::from_utf8_lossy(&out.stdout).trim())
        .canonicalize()
        .ok()?;
    let relpath = dest.strip_prefix(&repo).ok()?.to_path_buf();

    let out = Command::new("git")
        .arg("-C")
        .arg(&repo)
        .args(["ls-files", "--error-unmatch"])
        .arg(&relpath)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        tracing::debug!(path = %relpath.display(), "not tracked by git");
        return None;
    }
    Some(TrackedFile { repo, relpath })
}

/// Merge `src` into `dest` with the `HEAD` version of `dest` as the base.
fn git_three_way(src: &Path, dest: &Path, tracked: &TrackedFile) -> Result<MergeAction> {
    let work = tempfile::Builder::new().prefix("kiro_merge_").tempdir()?;
    let base = work.path().join("base");
    let current = work.path().join("current");
    let other = work.path().join("other");

    // git wants forward slashes in `<rev>:<path>`.
    let spec = format!(
        "HEAD:{}",
        tracked.relpath.to_string_lossy().replace('\\', "/")
    );
    let show = Command::new("git")
        .arg("-C")
        .arg(&tracked.repo)
        .args(["show", spec.as_str()])
        .stdin(Stdio::null())
        .output()?;
    if !show.status.success() {
        return Err(KiroError::Io(std::io::Error::other(format!(
            "could not read base from HEAD for {}: {}",
            tracked.relpath.display(),
            String::from_utf8_lossy(&show.stderr).trim()
        ))));
    }
    std::fs::write(&base, &show.stdout)?;
    std::fs::copy(dest, &current)?;
    std::fs::copy(src, &other)?;

    let merged = Command::new("git")
        .arg("merge-file")
        .arg(&current)
        .arg(&base)
        .arg(&other)
        .current_dir(work.path())
        .stdin(Stdio::null())
        .output()?;

    // merge-file exits with the number of conflicts (capped at 127); anything
    // above that is a negative status, i.e. a real failure.
    match merged.status.code() {
        Some(code) if (0..=127).contains(&code) => {}
        _ => {
            return Err(KiroError::Io(std::io::Error::other(format!(
                "git merge-file failed: {}",
                String::from_utf8_lossy(&merged.stderr).trim()
            ))))
        }
    }

    std::fs::copy(&current, dest)?;

    let conflicts = !merged.status.success();
    let mut output = String::from_utf8_lossy(&merged.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&merged.stderr));
    Ok(MergeAction::GitMerged { conflicts, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn backups(dir: &TempDir, name: &str) -> Vec<PathBuf> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&format!("{name}.bak.")))
            })
            .collect()
    }

    #[test]
    fn missing_src_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = merge_file(
            &dir.path().join("nope"),
            &dir.path().join("dest"),
            &MergeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, KiroError::SourceNotFound(_)));
    }

    #[test]
    fn copies_when_dest_missing() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\n");
        let dest = dir.path().join("nested/dest.md");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert_eq!(report.action, MergeAction::Copied);
        assert!(report.backup.is_none());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "alpha\n");
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\nbeta\n");

        let missing = dir.path().join("missing.md");
        let report = merge_file(&src, &missing, &MergeOptions { dry_run: true }).unwrap();
        assert_eq!(report.action, MergeAction::WouldCopy);
        assert!(!missing.exists());

        let dest = write(&dir, "dest.md", b"alpha\n");
        let report = merge_file(&src, &dest, &MergeOptions { dry_run: true }).unwrap();
        assert_eq!(report.action, MergeAction::WouldAppend);
        assert!(report.backup.is_some());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "alpha\n");
        assert!(backups(&dir, "dest.md").is_empty());
    }

    #[test]
    fn appends_only_unique_lines_after_backup() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\nbeta\ngamma\n");
        let dest = write(&dir, "dest.md", b"alpha\ngamma\n");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert_eq!(report.action, MergeAction::Appended { lines: 1 });
        let merged = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(
            merged,
            format!(
                "alpha\ngamma\n\n\n# --- MERGE APPEND (unique lines) from: {} ---\nbeta\n",
                src.display()
            )
        );

        let saved = backups(&dir, "dest.md");
        assert_eq!(saved.len(), 1);
        assert_eq!(std::fs::read_to_string(&saved[0]).unwrap(), "alpha\ngamma\n");
        assert_eq!(report.backup.as_ref(), Some(&saved[0]));
    }

    #[test]
    fn nothing_new_leaves_dest_unchanged() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\n");
        let dest = write(&dir, "dest.md", b"alpha\nbeta\n");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert_eq!(report.action, MergeAction::NothingToAppend);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "alpha\nbeta\n");
    }

    #[test]
    fn last_line_without_newline_is_kept_as_is() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\nomega");
        let dest = write(&dir, "dest.md", b"alpha\n");

        merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert!(std::fs::read_to_string(&dest).unwrap().ends_with("---\nomega"));
    }

    #[test]
    fn crlf_copy_of_dest_has_nothing_to_append() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\r\nbeta\r\n");
        let dest = write(&dir, "dest.md", b"alpha\r\nbeta\r\n");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert_eq!(report.action, MergeAction::NothingToAppend);
        assert_eq!(std::fs::read(&dest).unwrap(), b"alpha\r\nbeta\r\n");
    }

    #[test]
    fn mixed_line_endings_compare_by_content() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.md", b"alpha\r\nbeta\r\ngamma\r\n");
        let dest = write(&dir, "dest.md", b"alpha\nbeta\n");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert_eq!(report.action, MergeAction::Appended { lines: 1 });
        let merged = std::fs::read_to_string(&dest).unwrap();
        assert!(merged.starts_with("alpha\nbeta\n"));
        assert!(merged.ends_with("---\ngamma\r\n"));
    }

    #[test]
    fn binary_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let src = write(&dir, "src.bin", &[0xff, 0xfe, 0x00, 0x01]);
        let dest = write(&dir, "dest.bin", b"text\n");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert_eq!(report.action, MergeAction::Skipped);
        assert_eq!(std::fs::read(&dest).unwrap(), b"text\n");
        assert!(report.to_string().contains("Skipped merge"));
    }

    #[test]
    fn utf8_split_at_sample_boundary_is_text() {
        let dir = TempDir::new().unwrap();
        let mut body = vec![b'a'; TEXT_SAMPLE_LEN - 1];
        body.extend_from_slice("é".as_bytes());
        let path = write(&dir, "long.txt", &body);
        assert!(is_text_file(&path).unwrap());
    }

    #[test]
    fn tracked_file_gets_three_way_merge() {
        if which::which("git").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let run = |args: &[&str]| {
            let ok = Command::new("git")
                .args(["-c", "user.name=kiro", "-c", "user.email=kiro@example.com"])
                .args(args)
                .current_dir(dir.path())
                .output()
                .unwrap()
                .status
                .success();
            assert!(ok, "git {args:?} failed");
        };
        run(&["init", "-q"]);
        let dest = write(&dir, "AGENTS.md", b"one\ntwo\n");
        run(&["add", "AGENTS.md"]);
        run(&["commit", "-q", "-m", "base"]);

        let src_dir = TempDir::new().unwrap();
        let src = write(&src_dir, "AGENTS.md", b"one\ntwo\nthree\n");

        let report = merge_file(&src, &dest, &MergeOptions::default()).unwrap();

        assert!(matches!(
            report.action,
            MergeAction::GitMerged {
                conflicts: false,
                ..
            }
        ));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "one\ntwo\nthree\n");
        assert_eq!(backups(&dir, "AGENTS.md").len(), 1);
    }
}
