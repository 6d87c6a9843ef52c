//! Probes that only look at the local host

use super::{ProbeFailure, ProbeResult};
use std::process::Command;
use sysinfo::System;
use tracing::debug;

const FILE_NR_PATH: &str = "/proc/sys/fs/file-nr";
pub const OPEN_FILES_LIMIT_PERCENT: f64 = 90.0;

/// Passes when a process with any of `names` is running.
pub fn process_running(names: &[&str], label: &str) -> ProbeResult {
    let mut system = System::new();
    system.refresh_processes();

    let found = names
        .iter()
        .any(|name| system.processes_by_exact_name(name).next().is_some());

    if found {
        debug!("{} is running", label);
        Ok(())
    } else {
        Err(ProbeFailure::new(format!("{} is not running", label)))
    }
}

pub fn open_file_count() -> ProbeResult {
    let raw = std::fs::read_to_string(FILE_NR_PATH)
        .map_err(|e| ProbeFailure::new(format!("Could not read {}: {}", FILE_NR_PATH, e)))?;

    let (allocated, max) = parse_file_nr(&raw)
        .ok_or_else(|| ProbeFailure::new(format!("Unexpected content in {}: '{}'", FILE_NR_PATH, raw.trim())))?;

    check_open_files(allocated, max)
}

/// `file-nr` holds "allocated unused max".
fn parse_file_nr(raw: &str) -> Option<(u64, u64)> {
    let fields: Vec<u64> = raw
        .split_whitespace()
        .map(|field| field.parse().ok())
        .collect::<Option<Vec<_>>>()?;

    match fields.as_slice() {
        [allocated, _unused, max] if *max > 0 => Some((*allocated, *max)),
        _ => None,
    }
}

fn check_open_files(allocated: u64, max: u64) -> ProbeResult {
    let usage = allocated as f64 / max as f64 * 100.0;

    if usage > OPEN_FILES_LIMIT_PERCENT {
        Err(ProbeFailure::new(format!(
            "Open file count is at {:.0}% ({} of {})",
            usage, allocated, max
        )))
    } else {
        Ok(())
    }
}

/// Fails when any certificate expires within `days` days.
///
/// `openssl x509 -checkend` exits 1 both for an expiring certificate and for
/// one it cannot load, so unreadable files are reported before openssl runs
/// and an exit of 1 only counts as expiry when openssl says so.
pub fn certificate_expiry(paths: &[String], days: u32) -> ProbeResult {
    let seconds = (u64::from(days) * 24 * 60 * 60).to_string();
    let mut problems = Vec::new();

    for path in paths {
        if let Err(e) = std::fs::File::open(path) {
            problems.push(format!("Could not read certificate {}: {}", path, e));
            continue;
        }

        let output = Command::new("openssl")
            .args(["x509", "-checkend", seconds.as_str(), "-noout", "-in", path.as_str()])
            .output()
            .map_err(|e| {
                ProbeFailure::new(format!("Could not run openssl to check certificates: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        match classify_checkend(output.status.code(), &stdout) {
            CheckendOutcome::Valid => {
                debug!("Certificate {} valid for more than {} days", path, days)
            }
            CheckendOutcome::Expiring => {
                problems.push(format!("Certificate {} expires within {} days", path, days))
            }
            CheckendOutcome::Unreadable => problems.push(format!(
                "Could not read certificate {}: {}",
                path,
                stderr.trim()
            )),
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ProbeFailure::new(problems.join("; ")))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CheckendOutcome {
    Valid,
    Expiring,
    Unreadable,
}

fn classify_checkend(code: Option<i32>, stdout: &str) -> CheckendOutcome {
    match code {
        Some(0) => CheckendOutcome::Valid,
        Some(1) if stdout.contains("Certificate will expire") => CheckendOutcome::Expiring,
        _ => CheckendOutcome::Unreadable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_nr() {
        assert_eq!(parse_file_nr("9344\t0\t3247953\n"), Some((9344, 3247953)));
        assert_eq!(parse_file_nr("1 2"), None);
        assert_eq!(parse_file_nr("a b c"), None);
        assert_eq!(parse_file_nr("10 0 0"), None);
    }

    #[test]
    fn test_check_open_files() {
        assert!(check_open_files(100, 1000).is_ok());
        assert!(check_open_files(900, 1000).is_ok());

        let err = check_open_files(950, 1000).unwrap_err();
        assert_eq!(err.message(), "Open file count is at 95% (950 of 1000)");
    }

    #[test]
    fn test_missing_process() {
        let err = process_running(&["no-such-daemon-xyz"], "no-such-daemon").unwrap_err();
        assert_eq!(err.message(), "no-such-daemon is not running");
    }

    #[test]
    fn test_certificate_expiry_without_paths() {
        assert!(certificate_expiry(&[], 30).is_ok());
    }

    #[test]
    fn test_missing_certificate_is_not_reported_as_expiring() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.crt").to_string_lossy().to_string();

        let err = certificate_expiry(&[path.clone()], 30).unwrap_err();

        assert!(err
            .message()
            .starts_with(&format!("Could not read certificate {}: ", path)));
        assert!(!err.message().contains("expires within"));
    }

    #[test]
    fn test_classify_checkend() {
        assert_eq!(
            classify_checkend(Some(0), "Certificate will not expire\n"),
            CheckendOutcome::Valid
        );
        assert_eq!(
            classify_checkend(Some(1), "Certificate will expire\n"),
            CheckendOutcome::Expiring
        );
        assert_eq!(classify_checkend(Some(1), ""), CheckendOutcome::Unreadable);
        assert_eq!(classify_checkend(None, ""), CheckendOutcome::Unreadable);
    }
}
