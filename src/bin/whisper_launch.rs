//! `whisper-launch` — start the external whisper.cpp server and wait until
//! it is ready.
//!
//! The voice server forwards audio to a whisper.cpp `whisper-server`
//! instance; this wrapper starts that binary with the right model/port and
//! blocks until its health endpoint answers, so init systems and shell
//! pipelines can depend on readiness.
//!
//! ```text
//! whisper-launch --model /models/ggml-base.bin --port 8080
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use voice_admin::launcher::{LaunchOptions, WhisperServerLauncher};

/// Launch a whisper.cpp server and wait for it to become healthy.
#[derive(Parser, Debug)]
#[command(name = "whisper-launch", version, about)]
struct Cli {
    /// Path to the whisper-server binary.
    #[arg(long, env = "WHISPER_SERVER_BIN", default_value = "whisper-server")]
    binary: PathBuf,

    /// Path to the GGML model file.
    #[arg(long, env = "WHISPER_MODEL")]
    model: PathBuf,

    /// Listen address for the server.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Listen port for the server.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Worker threads; omit to let the binary decide.
    #[arg(long)]
    threads: Option<u32>,

    /// Seconds to wait for the health endpoint before giving up.
    #[arg(long, default_value_t = 60)]
    ready_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let options = LaunchOptions {
        binary: cli.binary,
        model: cli.model,
        host: cli.host,
        port: cli.port,
        threads: cli.threads,
        ready_timeout_secs: cli.ready_timeout,
    };

    let mut launcher = WhisperServerLauncher::spawn(&options)?;
    launcher.wait_ready(options.ready_timeout_secs).await?;
    log::info!("whisper server healthy at {}", launcher.base_url());

    // Stay attached: forward the child's lifetime to ours so a supervisor
    // watching this process sees the server die.
    let exited = tokio::select! {
        _ = tokio::signal::ctrl_c() => None,
        result = launcher.wait() => Some(result?),
    };

    match exited {
        Some(status) => anyhow::bail!("whisper server exited unexpectedly (status {status})"),
        None => {
            log::info!("interrupt received; stopping whisper server");
            launcher.stop().await?;
            Ok(())
        }
    }
}
