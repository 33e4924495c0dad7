// Command executor
//
// Expands a tool's argument templates against call-time values and runs the
// command as a subprocess, capturing combined stdout/stderr. Cancellation
// kills the child; it is never left running.

use serde_json::{Map, Value};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("template error in argument '{template}': {source}")]
    Template {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to launch command '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command exited with status {code}")]
    ProcessExit { code: i32, output: Vec<u8> },

    #[error("command cancelled")]
    Cancelled,

    #[error("i/o error while reading command output: {0}")]
    Io(#[from] std::io::Error),
}

/// Expand each argument template against the call arguments.
///
/// Pure: the same templates and values always yield the same argv. Only
/// named substitution ({{ name }}) is exercised; undefined placeholders are
/// an error rather than an empty string.
pub fn expand_args(
    templates: &[String],
    vars: &Map<String, Value>,
) -> Result<Vec<String>, ExecError> {
    let mut env = minijinja::Environment::new();
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

    templates
        .iter()
        .map(|template| {
            env.render_str(template, vars).map_err(|source| ExecError::Template {
                template: template.clone(),
                source,
            })
        })
        .collect()
}

/// Expand argument templates and run the command, returning the combined
/// stdout/stderr bytes.
///
/// Interleaving between the two streams is best-effort: the combined buffer
/// is stdout bytes followed by stderr bytes. On non-zero exit the captured
/// output is preserved in the error so callers can surface diagnostics.
pub async fn run_command(
    command: &str,
    templates: &[String],
    vars: &Map<String, Value>,
    cancel: CancellationToken,
) -> Result<Vec<u8>, ExecError> {
    let args = expand_args(templates, vars)?;

    let mut child = Command::new(command)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecError::Launch {
            command: command.to_string(),
            source,
        })?;

    // Stream handles are taken out of the child so the read future and the
    // cancellation arm below don't contend for it.
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Both pipes are drained concurrently; a child filling one while we
    // block on the other must not deadlock.
    let read_streams = async {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let (out_res, err_res) = tokio::join!(
            async {
                match stdout {
                    Some(ref mut pipe) => pipe.read_to_end(&mut out).await.map(|_| ()),
                    None => Ok(()),
                }
            },
            async {
                match stderr {
                    Some(ref mut pipe) => pipe.read_to_end(&mut err).await.map(|_| ()),
                    None => Ok(()),
                }
            }
        );
        out_res?;
        err_res?;
        Ok::<_, std::io::Error>((out, err))
    };

    tokio::select! {
        result = read_streams => {
            let (mut output, err) = result?;
            output.extend_from_slice(&err);

            let status = child.wait().await?;
            if status.success() {
                Ok(output)
            } else {
                Err(ExecError::ProcessExit {
                    code: status.code().unwrap_or(-1),
                    output,
                })
            }
        }
        _ = cancel.cancelled() => {
            // Kill and reap so no orphan survives the call
            let _ = child.start_kill();
            let _ = child.wait().await;
            Err(ExecError::Cancelled)
        }
    }
}
