use anyhow::Result;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        // DATABASE_URL wins; otherwise build an sqlite URL from DB_PATH.
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let db_path = env::var("DB_PATH").unwrap_or_else(|_| "mobility.db".to_string());
                format!("sqlite://{}?mode=rwc", db_path)
            }
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            log_level,
        })
    }
}
