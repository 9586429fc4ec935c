//! `guestfish` remote-control session.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::error::{HypervisorError, Result};
use crate::traits::GuestFs;

/// Attempts for the first remote command. The listen socket may not exist
/// yet when `guestfish --listen` returns.
const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// A libguestfs session controlled through a background guestfish server.
pub struct GuestfishSession {
    program: PathBuf,
    libvirt_uri: Option<String>,
    pid: u32,
    closed: bool,
}

impl GuestfishSession {
    /// Start a guestfish server in listen mode.
    ///
    /// `libvirt_uri` is passed to `add-domain` so domains are resolved on the
    /// same connection the hypervisor backend uses.
    #[instrument(skip(program))]
    pub async fn start(program: impl AsRef<Path>, libvirt_uri: Option<&str>) -> Result<Self> {
        let program = program.as_ref().to_path_buf();

        // The forked server keeps the inherited stderr open until `exit`, so
        // only stdout is piped and only up to the PID line.
        let mut child = Command::new(&program)
            .arg("--listen")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| HypervisorError::GuestFs(
                format!("failed to run {}: {}", program.display(), e)
            ))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            HypervisorError::Internal("guestfish stdout was not captured".to_string())
        })?;

        let mut line = String::new();
        BufReader::new(stdout)
            .read_line(&mut line)
            .await
            .map_err(|e| HypervisorError::GuestFs(format!("failed to read guestfish --listen output: {}", e)))?;

        let status = child
            .wait()
            .await
            .map_err(|e| HypervisorError::GuestFs(format!("failed to wait for guestfish: {}", e)))?;

        if !status.success() {
            return Err(HypervisorError::GuestFs(format!("guestfish --listen failed: {}", status)));
        }

        let pid = parse_listen_output(&line).ok_or_else(|| HypervisorError::GuestFs(
            format!("unexpected guestfish --listen output: {}", line.trim())
        ))?;

        info!(pid, "Guestfish server started");

        Ok(Self {
            program,
            libvirt_uri: libvirt_uri.map(str::to_string),
            pid,
            closed: false,
        })
    }

    /// Run one command against the server and return its raw stdout.
    async fn remote(&self, args: &[&str]) -> Result<Vec<u8>> {
        if self.closed {
            return Err(HypervisorError::InvalidState("session closed".to_string()));
        }

        debug!(pid = self.pid, command = ?args, "guestfish remote");

        let output = Command::new(&self.program)
            .arg(format!("--remote={}", self.pid))
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| HypervisorError::GuestFs(
                format!("failed to run {}: {}", self.program.display(), e)
            ))?;

        if !output.status.success() {
            return Err(HypervisorError::GuestFs(format!(
                "{}: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }

    /// Run a command whose output is plain text (device names, booleans).
    async fn remote_text(&self, args: &[&str]) -> Result<String> {
        let out = self.remote(args).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Like [`remote`](Self::remote), retrying while the server comes up.
    async fn remote_with_retry(&self, args: &[&str]) -> Result<Vec<u8>> {
        let mut attempt = 1;
        loop {
            match self.remote(args).await {
                Err(HypervisorError::GuestFs(e)) if attempt < CONNECT_ATTEMPTS => {
                    debug!(attempt, error = %e, "guestfish server not ready, retrying");
                    tokio::time::sleep(CONNECT_BACKOFF * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl GuestFs for GuestfishSession {
    #[instrument(skip(self))]
    async fn add_domain(&mut self, name: &str, readonly: bool) -> Result<()> {
        let mut args = vec![
            "add-domain".to_string(),
            name.to_string(),
            format!("readonly:{}", readonly),
        ];
        if let Some(uri) = &self.libvirt_uri {
            args.push(format!("libvirturi:{}", uri));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        // First command of the session.
        self.remote_with_retry(&args).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn launch(&mut self) -> Result<()> {
        info!("Launching libguestfs appliance");
        self.remote(&["run"]).await?;
        Ok(())
    }

    async fn inspect_os(&self) -> Result<Vec<String>> {
        let out = self.remote_text(&["inspect-os"]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn inspect_get_distro(&self, root: &str) -> Result<String> {
        let out = self.remote_text(&["inspect-get-distro", root]).await?;
        Ok(out.trim().to_string())
    }

    #[instrument(skip(self))]
    async fn mount(&mut self, device: &str, mountpoint: &str) -> Result<()> {
        self.remote(&["mount", device, mountpoint]).await?;
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.remote(&["read-file", path]).await
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        // Contents go through a local file so no guestfish quoting applies.
        let mut staged = tempfile::NamedTempFile::new()
            .map_err(|e| HypervisorError::Internal(format!("Failed to create temp file: {}", e)))?;
        staged
            .write_all(content)
            .and_then(|_| staged.flush())
            .map_err(|e| HypervisorError::Internal(format!("Failed to stage {}: {}", path, e)))?;

        let local = staged.path().to_str().ok_or_else(|| {
            HypervisorError::Internal("temp file path is not UTF-8".to_string())
        })?;

        self.remote(&["upload", local, path]).await?;
        Ok(())
    }

    async fn is_file(&self, path: &str) -> Result<bool> {
        let out = self.remote_text(&["is-file", path]).await?;
        parse_bool(&out)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.remote(&["exit"]).await?;
        self.closed = true;
        info!(pid = self.pid, "Guestfish server stopped");
        Ok(())
    }
}

impl Drop for GuestfishSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let status = std::process::Command::new(&self.program)
            .arg(format!("--remote={}", self.pid))
            .arg("exit")
            .stdin(Stdio::null())
            .status();
        if let Err(e) = status {
            warn!(pid = self.pid, error = %e, "Failed to stop guestfish server");
        }
    }
}

/// Extract the server PID from `guestfish --listen` output
/// (`GUESTFISH_PID=1234; export GUESTFISH_PID`).
fn parse_listen_output(out: &str) -> Option<u32> {
    out.split(';')
        .find_map(|part| part.trim().strip_prefix("GUESTFISH_PID="))
        .and_then(|pid| pid.trim().parse().ok())
}

fn parse_bool(out: &str) -> Result<bool> {
    match out.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(HypervisorError::GuestFs(format!("expected boolean, got {:?}", other))),
    }
}
