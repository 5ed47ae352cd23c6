//! Configuration for commission-service.

use anyhow::Result;
use clinic_core::config::Config as CoreConfig;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct CommissionConfig {
    pub common: CoreConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl CommissionConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let port = env::var("COMMISSION_SERVICE_PORT")
            .unwrap_or_else(|_| "3011".to_string())
            .parse()?;

        let database_url =
            env::var("COMMISSION_DATABASE_URL").expect("COMMISSION_DATABASE_URL must be set");
        let max_connections = env::var("COMMISSION_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("COMMISSION_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let log_level = env::var("COMMISSION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let otlp_endpoint = env::var("COMMISSION_OTLP_ENDPOINT").ok();

        Ok(Self {
            common: CoreConfig { port },
            service_name: "commission-service".to_string(),
            log_level,
            otlp_endpoint,
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
            },
        })
    }
}
