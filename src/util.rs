use std::{env, path::{Path, PathBuf}, str::FromStr, time::Duration};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};

use crate::error::ConfigError;

pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";

pub const VAR_API_BASE_URL: &str = "API_BASE_URL";
pub const VAR_API_IDENTIFIER: &str = "API_IDENTIFIER";
pub const VAR_API_PASSWORD: &str = "API_PASSWORD";
pub const VAR_API_USERNAME: &str = "API_USERNAME";
pub const VAR_TOKEN_STORE_PATH: &str = "TOKEN_STORE_PATH";
pub const VAR_STEP_SAMPLES_PATH: &str = "STEP_SAMPLES_PATH";
pub const VAR_HISTORY_DAYS: &str = "HISTORY_DAYS";
pub const VAR_REFRESH_INTERVAL_S: &str = "REFRESH_INTERVAL_S";

pub const LOG_CONFIG_PATH: &str = "log4rs.yaml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 9899;
const DEFAULT_TOKEN_STORE_PATH: &str = "token_store.json";
const DEFAULT_HISTORY_DAYS: u32 = 30;
const DEFAULT_REFRESH_INTERVAL_S: u64 = 300;

/// Service configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub identifier: String,
    pub password: String,
    pub username: String,
    pub token_store_path: PathBuf,
    pub step_samples_path: PathBuf,
    pub history_days: u32,
    pub refresh_interval: Duration,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let identifier = required(VAR_API_IDENTIFIER)?;
        Ok(Config {
            api_base_url: required(VAR_API_BASE_URL)?,
            password: required(VAR_API_PASSWORD)?,
            username: env::var(VAR_API_USERNAME).unwrap_or_else(|_| identifier.clone()),
            identifier,
            token_store_path: env::var(VAR_TOKEN_STORE_PATH)
                .unwrap_or(String::from(DEFAULT_TOKEN_STORE_PATH))
                .into(),
            step_samples_path: required(VAR_STEP_SAMPLES_PATH)?.into(),
            history_days: parsed(VAR_HISTORY_DAYS, DEFAULT_HISTORY_DAYS)?,
            refresh_interval: Duration::from_secs(parsed(VAR_REFRESH_INTERVAL_S, DEFAULT_REFRESH_INTERVAL_S)?),
            host: env::var(HOST).unwrap_or(String::from(DEFAULT_HOST)),
            port: parsed(PORT, DEFAULT_PORT)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Loads `log4rs.yaml` when it exists, otherwise logs to the console at info.
pub fn init_logging() {
    if Path::new(LOG_CONFIG_PATH).exists() {
        match log4rs::init_file(LOG_CONFIG_PATH, Default::default()) {
            Ok(_) => return,
            Err(e) => eprintln!("Failed to load {LOG_CONFIG_PATH}, falling back to console logging: {e}"),
        }
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Failed to initialize logging: {e}");
            }
        }
        Err(e) => eprintln!("Invalid logging config: {e}"),
    }
}

/// Last few characters of a token, safe for logs.
pub fn get_short_token(token: &str) -> &str {
    let start = token.char_indices().rev().nth(5).map(|(i, _)| i).unwrap_or(0);
    &token[start..]
}
