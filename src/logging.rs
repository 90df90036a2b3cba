//! File-backed logging. The terminal belongs to the TUI, so log records go to
//! `RAG_CHAT_LOG` or `<cache_dir>/rag-chat/rag-chat.log`.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use env_logger::{Env, Target};

pub const LOG_FILE_VAR: &str = "RAG_CHAT_LOG";

pub fn log_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(LOG_FILE_VAR).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(cache_dir.join("rag-chat").join("rag-chat.log"))
}

/// Installs the global logger. Level comes from `RUST_LOG`, default `info`.
pub fn init() -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;

    Ok(path)
}
