//! Legacy Word 97-2003 (.doc) support through a platform converter
//!
//! The binary format has no portable parser here. Text comes from an
//! installed word processor: `textutil` on macOS, LibreOffice elsewhere.
//! When neither is present the capability is simply absent.

use crate::error::{ExtractError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Optional capability: convert a legacy .doc blob into plain text
pub trait LegacyDocConverter: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Whether the converter can run right now
    fn is_available(&self) -> bool;

    /// Convert the document, giving up with [`ExtractError::Timeout`] once
    /// `timeout` has passed
    fn convert_to_text(&self, bytes: &[u8], timeout: Duration) -> Result<String>;
}

/// Converter that shells out to an office tool found on `PATH`
#[derive(Debug, Clone)]
pub struct OfficeCommandConverter {
    program: PathBuf,
    args: Vec<&'static str>,
}

impl OfficeCommandConverter {
    /// Find the platform's converter, if installed
    #[must_use]
    pub fn detect() -> Option<Self> {
        let (program, args): (&str, &[&'static str]) = if cfg!(target_os = "macos") {
            ("textutil", &["-convert", "txt", "-stdout"])
        } else {
            ("soffice", &["--headless", "--cat"])
        };
        which::which(program).ok().map(|program| Self {
            program,
            args: args.to_vec(),
        })
    }
}

impl LegacyDocConverter for OfficeCommandConverter {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("office")
    }

    fn is_available(&self) -> bool {
        self.program.is_file()
    }

    fn convert_to_text(&self, bytes: &[u8], timeout: Duration) -> Result<String> {
        let unavailable =
            |e: std::io::Error| ExtractError::UnsupportedFormat(format!("{}: {e}", self.name()));

        let mut input = tempfile::Builder::new()
            .prefix("email-harvest-")
            .suffix(".doc")
            .tempfile()
            .map_err(unavailable)?;
        input.write_all(bytes).map_err(unavailable)?;
        input.flush().map_err(unavailable)?;

        // Output goes to files so a chatty converter cannot stall on a full pipe
        let mut stdout = tempfile::tempfile().map_err(unavailable)?;
        let mut stderr = tempfile::tempfile().map_err(unavailable)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(input.path())
            .stdin(Stdio::null())
            .stdout(stdout.try_clone().map_err(unavailable)?)
            .stderr(stderr.try_clone().map_err(unavailable)?)
            .spawn()
            .map_err(unavailable)?;

        let Some(status) = wait_with_deadline(&mut child, timeout).map_err(unavailable)? else {
            return Err(ExtractError::Timeout {
                seconds: timeout.as_secs(),
            });
        };

        if !status.success() {
            let message = read_back(&mut stderr).unwrap_or_default();
            return Err(ExtractError::CorruptFile(format!(
                "{} exited with {status}: {}",
                self.name(),
                message.trim()
            )));
        }

        read_back(&mut stdout).map_err(unavailable)
    }
}

/// Wait for `child` until `timeout`; past it the child is killed and reaped
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // Already exited between the two checks is fine
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn read_back(file: &mut File) -> std::io::Result<String> {
    let mut raw = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &'static str) -> OfficeCommandConverter {
        OfficeCommandConverter {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c", script],
        }
    }

    #[test]
    fn vanished_program_is_unavailable() {
        let converter = OfficeCommandConverter {
            program: PathBuf::from("/nonexistent/soffice"),
            args: vec!["--headless", "--cat"],
        };
        assert!(!converter.is_available());
        assert_eq!(converter.name(), "soffice");
        assert!(matches!(
            converter.convert_to_text(b"doc", Duration::from_secs(1)),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn converter_output_is_returned() {
        // The document path arrives as $0
        let converter = shell("cat \"$0\"");
        let text = converter
            .convert_to_text(b"reach bob@legacy.org", Duration::from_secs(10))
            .unwrap();
        assert_eq!(text, "reach bob@legacy.org");
    }

    #[cfg(unix)]
    #[test]
    fn failing_converter_is_corrupt() {
        let converter = shell("echo broken >&2; exit 3");
        let err = converter
            .convert_to_text(b"doc", Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, ExtractError::CorruptFile(ref m) if m.contains("broken")));
    }

    #[cfg(unix)]
    #[test]
    fn hung_converter_is_killed_at_deadline() {
        let converter = shell("sleep 30");
        let started = Instant::now();
        let err = converter
            .convert_to_text(b"doc", Duration::from_millis(300))
            .unwrap_err();
        assert_eq!(err, ExtractError::Timeout { seconds: 0 });
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
