use std::{io::ErrorKind, path::PathBuf, process::Stdio, time::Instant};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, warn};

use crate::application::render::{EngineError, TypesetOptions, TypesetResult, Typesetter};

/// Typesets by running an external renderer: options as JSON on stdin, the result
/// object as JSON on stdout. One process per call, so concurrent calls never share state.
#[derive(Debug, Clone)]
pub struct CommandTypesetter {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTypesetter {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

#[async_trait]
impl Typesetter for CommandTypesetter {
    async fn typeset(&self, options: TypesetOptions) -> Result<TypesetResult, EngineError> {
        let started_at = Instant::now();
        let input =
            serde_json::to_vec(&options).map_err(|err| EngineError::Protocol(err.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                warn!(
                    target = "mathoid::engine",
                    op = "engine::typeset",
                    result = "error",
                    error_code = "spawn",
                    program = %self.program.display(),
                    error = %err,
                    "Failed to spawn typesetting engine"
                );
                if err.kind() == ErrorKind::NotFound {
                    EngineError::NotFound(err)
                } else {
                    EngineError::Io(err)
                }
            })?;

        // stdin is written while stdout and stderr drain.
        let stdin = child.stdin.take();
        let feed_input = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed_input, child.wait_with_output());
        let output = output?;
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(
                target = "mathoid::engine",
                op = "engine::typeset",
                result = "error",
                error_code = "exit",
                elapsed_ms,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                stderr = %stderr,
                "Typesetting engine exited unsuccessfully"
            );
            return Err(EngineError::Exit { exit_code, stderr });
        }

        if let Err(err) = fed {
            if err.kind() != ErrorKind::BrokenPipe {
                return Err(EngineError::Io(err));
            }
            debug!(
                target = "mathoid::engine",
                op = "engine::typeset",
                elapsed_ms,
                "Typesetting engine exited before reading all of its input"
            );
        }

        let result: TypesetResult = serde_json::from_slice(&output.stdout).map_err(|err| {
            warn!(
                target = "mathoid::engine",
                op = "engine::typeset",
                result = "error",
                error_code = "protocol",
                elapsed_ms,
                stdout_bytes = output.stdout.len(),
                error = %err,
                "Typesetting engine produced unreadable output"
            );
            EngineError::Protocol(err.to_string())
        })?;

        debug!(
            target = "mathoid::engine",
            op = "engine::typeset",
            result = "ok",
            elapsed_ms,
            "Typesetting engine finished"
        );

        Ok(result)
    }
}
