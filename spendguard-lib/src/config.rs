use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs};

#[derive(Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Includes internal error detail in 500 responses.
    #[serde(default)]
    pub development: bool,
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = fs::read_to_string(path).context("Unable to read config file")?;
        let config: Config =
            toml::from_str(config.as_str()).with_context(|| "Unable to parse config")?;
        Ok(config)
    }

    pub fn from_env() -> Result<Config, anyhow::Error> {
        let database_url = read_env("DATABASE_URL")?;
        let max_pool_size = match env::var("MAX_POOL_SIZE") {
            Ok(value) => value.parse().context("Unable to parse MAX_POOL_SIZE value")?,
            Err(_) => default_max_pool_size(),
        };
        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("Unable to parse PORT value")?,
            Err(_) => default_port(),
        };
        let frontend_url = env::var("FRONTEND_URL").unwrap_or_else(|_| default_frontend_url());
        let development = match env::var("DEVELOPMENT") {
            Ok(value) => value.parse().context("Unable to parse DEVELOPMENT value")?,
            Err(_) => false,
        };

        let config = Config {
            database_url,
            max_pool_size,
            port,
            frontend_url,
            development,
        };
        Ok(config)
    }
}

fn read_env(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).with_context(|| format!("Unable to read env var: {}", key))
}

fn default_max_pool_size() -> u32 {
    10
}

fn default_port() -> u16 {
    3000
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}
