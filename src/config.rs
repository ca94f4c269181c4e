use std::env;

/// Server configuration, read from the environment with local-dev defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address, e.g. "127.0.0.1:3000".
    pub addr: String,
    /// SQLite database file.
    pub db_path: String,
    /// Root directory of the photo object store.
    pub storage_root: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            addr: env_or("SUBLETHUB_ADDR", "127.0.0.1:3000"),
            db_path: env_or("SUBLETHUB_DB", "sublethub.sqlite3"),
            storage_root: env_or("SUBLETHUB_STORAGE", "storage"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
