use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub match_webhook_url: Option<String>,
    pub room_base_url: Option<String>,
    pub automation_poll_secs: u64,
    pub automation_batch_size: i64,
    pub event_bus_capacity: usize,
    pub api_rps: u32,
    pub db_max_connections: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            match_webhook_url: env::var("MATCH_WEBHOOK_URL").ok(),
            room_base_url: env::var("ROOM_BASE_URL").ok(),
            automation_poll_secs: get_env_or("AUTOMATION_POLL_SECS", 15)?,
            automation_batch_size: get_env_or("AUTOMATION_BATCH_SIZE", 25)?,
            event_bus_capacity: get_env_or("EVENT_BUS_CAPACITY", 256)?,
            api_rps: get_env_or("API_RPS", 50)?,
            db_max_connections: get_env_or("DB_MAX_CONNECTIONS", 50)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
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
