use crate::opts::Opts;
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CLOUDFLARE_API_TOKEN environment variable is missing or empty")]
    MissingToken,
}

/// Everything the updater needs for one run.
///
/// The API token is resolved here, once, so the rest of the program never has
/// to reach into the environment.
#[derive(Debug)]
pub struct Config {
    pub domain: String,
    pub api_token: String,
    pub timeout: Duration,
}

pub fn load_config(opts: &Opts) -> Result<Config, ConfigError> {
    let api_token = env::var("CLOUDFLARE_API_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or(ConfigError::MissingToken)?;
    Ok(Config {
        domain: opts.dns_domain.clone(),
        api_token,
        timeout: Duration::from_secs(opts.timeout),
    })
}
