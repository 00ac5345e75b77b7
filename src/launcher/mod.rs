//! Launch wrapper for the external whisper.cpp server binary.
//!
//! The recognition engine is not part of this crate — the server machine
//! runs a prebuilt `whisper-server` binary and the voice server forwards
//! audio to it.  [`WhisperServerLauncher`] spawns that binary with the
//! configured model/host/port and polls its `/health` endpoint until it is
//! ready to accept inference requests.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};

// ---------------------------------------------------------------------------
// LauncherError
// ---------------------------------------------------------------------------

/// Errors from spawning or readiness-probing the whisper server.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// The model file does not exist at the configured path.
    #[error("model file not found: {0}")]
    ModelMissing(PathBuf),

    /// The binary could not be started.
    #[error("failed to spawn whisper server: {0}")]
    Spawn(String),

    /// The process exited before reporting healthy.
    #[error("whisper server exited during startup (status {0})")]
    Exited(String),

    /// The server did not answer its health endpoint in time.
    #[error("whisper server not ready after {0} seconds")]
    NotReady(u64),

    /// Killing the child process failed.
    #[error("failed to stop whisper server: {0}")]
    Stop(String),
}

// ---------------------------------------------------------------------------
// LaunchOptions
// ---------------------------------------------------------------------------

/// Everything needed to start one whisper.cpp server instance.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Path to the `whisper-server` binary.
    pub binary: PathBuf,
    /// Path to the GGML model file.
    pub model: PathBuf,
    /// Listen address handed to the server.
    pub host: String,
    /// Listen port handed to the server.
    pub port: u16,
    /// Worker thread count; `None` lets the binary pick.
    pub threads: Option<u32>,
    /// Seconds to wait for the health endpoint before giving up.
    pub ready_timeout_secs: u64,
}

impl LaunchOptions {
    /// Argument vector passed to the binary, in whisper.cpp server syntax.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--model".to_string(),
            self.model.display().to_string(),
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ];
        if let Some(threads) = self.threads {
            args.push("--threads".to_string());
            args.push(threads.to_string());
        }
        args
    }

    /// Base URL the running server will answer on.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// WhisperServerLauncher
// ---------------------------------------------------------------------------

/// Owns a spawned whisper server process.
///
/// The child is killed when the launcher is dropped (`kill_on_drop`), so a
/// crashing wrapper never leaves an orphaned inference server behind.
#[derive(Debug)]
pub struct WhisperServerLauncher {
    child: Child,
    base_url: String,
}

impl WhisperServerLauncher {
    /// Spawn the server process.  Fails fast when the model file is missing
    /// — the binary's own error for that case is notoriously unhelpful.
    pub fn spawn(options: &LaunchOptions) -> Result<Self, LauncherError> {
        if !options.model.exists() {
            return Err(LauncherError::ModelMissing(options.model.clone()));
        }

        log::info!(
            "starting whisper server: {} {}",
            options.binary.display(),
            options.args().join(" ")
        );

        let child = Command::new(&options.binary)
            .args(options.args())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LauncherError::Spawn(e.to_string()))?;

        Ok(Self {
            child,
            base_url: options.base_url(),
        })
    }

    /// URL the server answers on once ready.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Poll `GET {base}/health` until the server answers 200, the process
    /// dies, or `ready_timeout_secs` elapses.
    pub async fn wait_ready(&mut self, ready_timeout_secs: u64) -> Result<(), LauncherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let health_url = format!("{}/health", self.base_url);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(ready_timeout_secs);

        loop {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(LauncherError::Exited(status.to_string()));
            }

            match client.get(&health_url).send().await {
                Ok(response) if response.status().is_success() => {
                    log::info!("whisper server ready at {}", self.base_url);
                    return Ok(());
                }
                Ok(response) => {
                    log::debug!("health check answered {}", response.status());
                }
                Err(e) => {
                    log::debug!("health check failed: {e}");
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(LauncherError::NotReady(ready_timeout_secs));
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }

    /// Wait for the server process to exit on its own, returning the exit
    /// status description.
    pub async fn wait(&mut self) -> Result<String, LauncherError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| LauncherError::Stop(e.to_string()))?;
        Ok(status.to_string())
    }

    /// Terminate the server process.
    pub async fn stop(mut self) -> Result<(), LauncherError> {
        self.child
            .kill()
            .await
            .map_err(|e| LauncherError::Stop(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn options(model: PathBuf) -> LaunchOptions {
        LaunchOptions {
            binary: PathBuf::from("/usr/local/bin/whisper-server"),
            model,
            host: "127.0.0.1".into(),
            port: 8080,
            threads: None,
            ready_timeout_secs: 30,
        }
    }

    #[test]
    fn args_follow_whisper_server_syntax() {
        let opts = options(PathBuf::from("/models/ggml-base.bin"));
        assert_eq!(
            opts.args(),
            vec![
                "--model",
                "/models/ggml-base.bin",
                "--host",
                "127.0.0.1",
                "--port",
                "8080"
            ]
        );
    }

    #[test]
    fn threads_flag_is_appended_when_set() {
        let mut opts = options(PathBuf::from("/models/ggml-base.bin"));
        opts.threads = Some(4);
        let args = opts.args();
        assert_eq!(&args[args.len() - 2..], &["--threads", "4"]);
    }

    #[test]
    fn base_url_uses_host_and_port() {
        let opts = options(PathBuf::from("/models/ggml-base.bin"));
        assert_eq!(opts.base_url(), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn spawn_fails_fast_on_missing_model() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("no-such-model.bin");

        let err = WhisperServerLauncher::spawn(&options(missing.clone())).unwrap_err();
        match err {
            LauncherError::ModelMissing(path) => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
