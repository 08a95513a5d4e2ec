use anyhow::{Context, Result};
use std::process::{Command, Stdio};

use super::invocation::Invocation;

/// Standard stream plan for the container process.
///
/// Shell launches inherit the calling process's streams; command launches
/// may substitute piped handles so callers can talk to the in-container
/// process programmatically.
pub struct Streams {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

impl Default for Streams {
    fn default() -> Self {
        Self {
            stdin: Stdio::inherit(),
            stdout: Stdio::inherit(),
            stderr: Stdio::inherit(),
        }
    }
}

/// Spawn the container runtime with the assembled argument vector and block
/// until it exits.
///
/// The child's exit code is returned verbatim and never interpreted. A
/// signal-terminated child maps to `128 + signal`, the usual shell
/// convention.
pub fn run(invocation: &Invocation, verbose: bool, streams: Streams) -> Result<i32> {
    let docker = which::which("docker")
        .context("docker not found in PATH. Is Docker installed and available?")?;
    let argv = invocation.argv();

    if verbose {
        let mut full = vec![docker.to_string_lossy().into_owned()];
        full.extend(argv.iter().cloned());
        eprintln!("{:#?}", full);
    }
    tracing::debug!(image = %invocation.image, "starting container");

    let status = Command::new(&docker)
        .args(&argv)
        .stdin(streams.stdin)
        .stdout(streams.stdout)
        .stderr(streams.stderr)
        .status()
        .with_context(|| format!("failed to spawn {}", docker.display()))?;

    Ok(exit_code(status))
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                128 + status.signal().unwrap_or(0)
            }
            #[cfg(not(unix))]
            {
                1
            }
        }
    }
}
