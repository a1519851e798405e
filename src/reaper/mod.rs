//! Find and kill stray daemon processes by name and command line.

use crate::Result;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::Path;

const PROC_ROOT: &str = "/proc";

/// A running process as seen in `/proc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    pub name: String,
    pub cmdline: Vec<String>,
}

/// Which processes to reap
#[derive(Debug, Clone)]
pub struct ProcessMatcher {
    /// Case-insensitive prefix of the executable name.
    pub name_prefix: String,
    /// Substring of the space-joined command line.
    pub cmdline_substring: String,
}

impl ProcessMatcher {
    pub fn new(name_prefix: impl Into<String>, cmdline_substring: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            cmdline_substring: cmdline_substring.into(),
        }
    }

    pub fn matches(&self, process: &ProcessInfo) -> bool {
        process
            .name
            .to_lowercase()
            .starts_with(&self.name_prefix.to_lowercase())
            && process.cmdline.join(" ").contains(&self.cmdline_substring)
    }
}

/// Enumerate processes from `/proc`
///
/// Entries that vanish or can't be read mid-scan are skipped.
pub fn scan_processes() -> Result<Vec<ProcessInfo>> {
    scan_proc_root(Path::new(PROC_ROOT))
}

fn scan_proc_root(root: &Path) -> Result<Vec<ProcessInfo>> {
    let mut processes = Vec::new();

    for entry in fs::read_dir(root)? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<i32>().ok())
        else {
            continue;
        };

        if let Some(process) = read_process(&entry.path(), pid) {
            processes.push(process);
        }
    }

    Ok(processes)
}

fn read_process(dir: &Path, pid: i32) -> Option<ProcessInfo> {
    let name = fs::read_to_string(dir.join("comm")).ok()?;
    let raw_cmdline = fs::read(dir.join("cmdline")).ok()?;

    let cmdline = raw_cmdline
        .split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect();

    Some(ProcessInfo {
        pid,
        name: name.trim_end().to_string(),
        cmdline,
    })
}

/// Kill every matching process except this one
///
/// Returns the pids that were signalled.
pub fn reap(matcher: &ProcessMatcher) -> Result<Vec<i32>> {
    let own_pid = std::process::id() as i32;
    let mut killed = Vec::new();

    for process in scan_processes()? {
        if process.pid == own_pid || !matcher.matches(&process) {
            continue;
        }

        match kill(Pid::from_raw(process.pid), Signal::SIGKILL) {
            Ok(()) => {
                tracing::info!(pid = process.pid, name = %process.name, "Killed process");
                killed.push(process.pid);
            }
            Err(Errno::ESRCH) => {
                tracing::debug!(pid = process.pid, "Process exited before it could be killed");
            }
            Err(Errno::EPERM) => {
                tracing::warn!(pid = process.pid, "Permission denied killing process");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(killed)
}
