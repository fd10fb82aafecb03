//! Trash-based removal of fully imported bundle sources.
//!
//! Deletion goes through an external platform utility with recycle-bin
//! semantics, never a permanent erase. The call is fire-and-forget: the
//! batch moves on immediately, the utility's outcome is reported through the
//! same event stream as everything else, and deletion errors are never
//! escalated past a log line.

use crate::events::{ReportLevel, Reporter};
use std::path::Path;
use std::process::Stdio;
use std::str;
use tokio::process::Command;

/// Send `parent` to the platform trash via the configured utility.
///
/// `command` is the utility plus its fixed arguments; the directory is
/// appended as the final argument.
pub(crate) fn trash_parent(command: &[String], parent: &Path, reporter: &Reporter) {
    let Some((program, args)) = command.split_first() else {
        reporter.log(
            ReportLevel::Warning,
            format!(
                "no trash utility configured; leaving source folder {} in place",
                parent.display()
            ),
        );
        return;
    };

    let program = program.clone();
    let args = args.to_vec();
    let parent = parent.to_path_buf();
    let reporter = reporter.clone();

    tokio::spawn(async move {
        let result = Command::new(&program)
            .args(&args)
            .arg(&parent)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) => {
                let stderr = str::from_utf8(&output.stderr).unwrap_or_default().trim();
                if output.status.success() && stderr.is_empty() {
                    reporter.log(
                        ReportLevel::Info,
                        format!("moved source folder to trash: {}", parent.display()),
                    );
                } else {
                    let detail = if stderr.is_empty() {
                        output.status.to_string()
                    } else {
                        stderr.to_string()
                    };
                    reporter.log(
                        ReportLevel::Error,
                        format!("trash utility failed for {}: {}", parent.display(), detail),
                    );
                }
            }
            Err(err) => {
                reporter.log(
                    ReportLevel::Error,
                    format!("failed to launch trash utility {program}: {err}"),
                );
            }
        }
    });
}
