use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub questions_file: PathBuf,
    pub submissions_file: PathBuf,
    pub python_bin: String,
    pub execution_timeout: Duration,
    pub public_rps: u32,
    pub seed_sample_questions: bool,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let timeout_ms: u64 = get_env_parse_or("EXECUTION_TIMEOUT_MS", 2000)?;
        if timeout_ms == 0 {
            return Err(Error::Config(
                "EXECUTION_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8000"),
            questions_file: PathBuf::from(get_env_or("QUESTIONS_FILE", "data/questions.json")),
            submissions_file: PathBuf::from(get_env_or(
                "SUBMISSIONS_FILE",
                "data/submissions.json",
            )),
            python_bin: get_env_or("PYTHON_BIN", "python3"),
            execution_timeout: Duration::from_millis(timeout_ms),
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            seed_sample_questions: get_env_parse_or("SEED_SAMPLE_QUESTIONS", true)?,
            log_format: get_env_parse_or("LOG_FORMAT", LogFormat::Text)?,
        })
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
