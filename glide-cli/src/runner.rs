//! Child process execution for declared and passthrough commands.

use anyhow::Context;
use glide_core::declared::shell_quote;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Append quoted arguments to a program line.
pub fn passthrough_line(exec: &str, args: &[String]) -> String {
    let mut line = exec.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg));
    }
    line
}

/// Run `script` through `sh -c` in `dir` with inherited stdio.
///
/// Returns the child's exit code. Ctrl-C is delivered to the child by the
/// terminal; the parent keeps waiting so the child's own exit status wins.
pub async fn run_shell(script: &str, dir: &Path) -> anyhow::Result<i32> {
    debug!(script, dir = %dir.display(), "Running shell command");
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(script)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start: {script}"))?;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status.context("failed to wait for command")?,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupt received, waiting for child to exit");
            }
        }
    };
    Ok(exit_code(status))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
