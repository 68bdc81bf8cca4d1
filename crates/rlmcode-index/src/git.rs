//! Git command-line backend for [`VersionControl`].
//!
//! Every git call runs under a deadline. A missing binary, a non-repository
//! root, a failing command or an expired deadline all read as "no version
//! control information" rather than an error.

use rlmcode_core::{DiffEntry, DiffStatus, GitConfig, VersionControl};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `git` in the project root.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    head_timeout: Duration,
    diff_timeout: Duration,
}

impl GitCli {
    pub fn new(root: &Path, config: &GitConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            head_timeout: Duration::from_secs(config.head_timeout_secs),
            diff_timeout: Duration::from_secs(config.diff_timeout_secs),
        }
    }

    /// Stdout of a successful `git <args>`, or `None`.
    fn run(&self, args: &[&str], timeout: Duration) -> Option<String> {
        let mut child = match Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("git unavailable: {e}");
                return None;
            }
        };

        // Drain stdout concurrently so a large diff cannot block the child.
        let mut stdout = child.stdout.take()?;
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    tracing::warn!("git {} timed out after {:?}", args.join(" "), timeout);
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    tracing::warn!("git {} failed: {e}", args.join(" "));
                    return None;
                }
            }
        };

        let output = reader.join().ok()?.ok()?;
        if !status.success() {
            tracing::debug!("git {} exited with {status}", args.join(" "));
            return None;
        }
        Some(output)
    }
}

impl VersionControl for GitCli {
    fn current_head(&self) -> Option<String> {
        let out = self.run(&["rev-parse", "HEAD"], self.head_timeout)?;
        let sha = out.trim();
        (!sha.is_empty()).then(|| sha.to_string())
    }

    fn diff(&self, since: &str, head: &str) -> Option<Vec<DiffEntry>> {
        // Paths relative to the project root, unquoted.
        let out = self.run(
            &["diff", "--name-status", "--relative", "-z", since, head],
            self.diff_timeout,
        )?;
        Some(parse_name_status(&out))
    }
}

/// Parse `git diff --name-status -z` output.
///
/// Records are NUL-separated: a status field, then one path, or two for
/// renames and copies.
pub fn parse_name_status(output: &str) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0');
    while let Some(status) = fields.next() {
        let Some(code) = status.trim().chars().next() else {
            continue;
        };
        let Some(path) = fields.next() else {
            break;
        };
        let path = path.to_string();
        let entry = match code {
            'R' | 'C' => {
                let Some(new_path) = fields.next() else {
                    break;
                };
                if new_path.is_empty() {
                    continue;
                }
                DiffEntry {
                    status: if code == 'R' {
                        DiffStatus::Renamed
                    } else {
                        DiffStatus::Copied
                    },
                    path,
                    new_path: Some(new_path.to_string()),
                }
            }
            'D' => DiffEntry {
                status: DiffStatus::Deleted,
                path,
                new_path: None,
            },
            'A' => DiffEntry {
                status: DiffStatus::Added,
                path,
                new_path: None,
            },
            // M, T (type change) and anything unexpected count as modified.
            _ => DiffEntry {
                status: DiffStatus::Modified,
                path,
                new_path: None,
            },
        };
        if !entry.path.is_empty() {
            entries.push(entry);
        }
    }
    entries
}
