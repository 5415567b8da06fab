use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// How accepted uploads are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Spawn onto the runtime; the upload request returns immediately.
    Background,
    /// Process before the upload request returns. For tests and small
    /// single-process deployments.
    Inline,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub dispatch_mode: DispatchMode,
    pub db_row_locking: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
            dispatch_mode: parse_dispatch_mode(
                &std::env::var("DISPATCH_MODE").unwrap_or_else(|_| "background".to_string()),
            )?,
            db_row_locking: match std::env::var("DB_ROW_LOCKING") {
                Ok(value) => parse_flag("DB_ROW_LOCKING", &value)?,
                Err(_) => true,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_dispatch_mode(value: &str) -> Result<DispatchMode> {
    match value.to_lowercase().as_str() {
        "background" => Ok(DispatchMode::Background),
        "inline" => Ok(DispatchMode::Inline),
        _ => bail!("DISPATCH_MODE must be 'background' or 'inline', got {value:?}"),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be a boolean, got {value:?}"),
    }
}
