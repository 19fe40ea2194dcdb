//! Pipe rendered markdown through an external viewer.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Viewer '{0}' not found. Install it or set `viewer` in sessionlens.toml")]
    NotFound(String),

    #[error("Viewer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Viewer '{program}' exited with status {code}")]
    Failed { program: String, code: i32 },
}

/// Spawn `command` (program followed by arguments), write `text` to its
/// stdin and wait for it to exit. The viewer inherits stdout and stderr.
pub async fn pipe_to_viewer(command: &[String], text: &str) -> Result<(), ViewerError> {
    let Some((program, args)) = command.split_first() else {
        return Err(ViewerError::NotFound(String::new()));
    };

    debug!(program = %program, args = ?args, "Spawning viewer");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ViewerError::NotFound(program.clone()),
            _ => ViewerError::Io(e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        let written = async {
            stdin.write_all(text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.shutdown().await
        }
        .await;

        // A viewer that quits before reading everything is not an error.
        match written {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }
    }

    let status = child.wait().await?;
    debug!(exit_code = status.code().unwrap_or(-1), "Viewer exited");

    if status.success() {
        Ok(())
    } else {
        Err(ViewerError::Failed {
            program: program.clone(),
            code: status.code().unwrap_or(-1),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_viewer_reads_stdin() {
        let result = pipe_to_viewer(&cmd(&["sh", "-c", "cat > /dev/null"]), "# Title").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_viewer_sees_text() {
        let result = pipe_to_viewer(&cmd(&["grep", "-q", "Uabc12345"]), "---\nUabc12345\n").await;
        assert!(result.is_ok());

        let result = pipe_to_viewer(&cmd(&["grep", "-q", "missing"]), "Uabc12345").await;
        assert!(matches!(result, Err(ViewerError::Failed { code: 1, .. })));
    }

    #[tokio::test]
    async fn test_viewer_not_found() {
        let result = pipe_to_viewer(&cmd(&["sessionlens-no-such-viewer"]), "x").await;
        assert!(matches!(result, Err(ViewerError::NotFound(ref p)) if p == "sessionlens-no-such-viewer"));

        let result = pipe_to_viewer(&[], "x").await;
        assert!(matches!(result, Err(ViewerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_viewer_nonzero_exit() {
        let result = pipe_to_viewer(&cmd(&["sh", "-c", "cat > /dev/null; exit 3"]), "x").await;
        match result {
            Err(ViewerError::Failed { program, code }) => {
                assert_eq!(program, "sh");
                assert_eq!(code, 3);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
