//! Subprocess helpers for tool self-tests and invocations.

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, ToolError};

/// Captured output of a finished subprocess.
#[derive(Debug)]
pub struct ExecOutput {
    pub code: i32,
    /// Combined stdout and stderr, split into lines.
    pub lines: Vec<String>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run a command to completion, capturing both output streams.
pub async fn run<S, I, A>(program: S, args: I) -> Result<ExecOutput>
where
    S: AsRef<OsStr>,
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let program = program.as_ref();
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect();
    lines.extend(
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string),
    );

    let code = output.status.code().unwrap_or(-1);
    debug!(program = %program.to_string_lossy(), code, "subprocess finished");
    Ok(ExecOutput { code, lines })
}

/// Run `program args..` and require a zero exit status.
pub async fn self_test<S, I, A>(name: &str, program: S, args: I) -> Result<ExecOutput>
where
    S: AsRef<OsStr>,
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let output = run(program, args).await?;
    if !output.success() {
        return Err(ToolError::SelfTest {
            name: name.to_string(),
            code: output.code,
        });
    }
    Ok(output)
}
