use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, bail};

use crate::pagination::PageLimits;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub request_timeout: Duration,
    pub page_limits: PageLimits,
    pub migrate_on_start: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        dotenvy::from_filename("app.env").ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset keys fall back to defaults,
    /// malformed ones are errors.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&var, "PORT", 8000)?;

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => match var("POSTGRES_HOST") {
                Some(pg_host) => {
                    let pg_port: u16 = parse_or(&var, "POSTGRES_PORT", 5432)?;
                    let user = var("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string());
                    let password = var("POSTGRES_PASSWORD").unwrap_or_default();
                    let db_name = var("POSTGRES_DB").unwrap_or_else(|| "movies".to_string());
                    format!("postgres://{user}:{password}@{pg_host}:{pg_port}/{db_name}")
                },
                None => "sqlite://movies.db?mode=rwc".to_string(),
            },
        };

        let db_max_connections: u32 = parse_or(&var, "DB_MAX_CONNECTIONS", 10)?;
        let db_connect_timeout_secs: u64 = parse_or(&var, "DB_CONNECT_TIMEOUT_SECS", 5)?;
        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;

        let default_limit: u64 = parse_or(&var, "PAGE_LIMIT_DEFAULT", 10)?;
        let max_limit: u64 = parse_or(&var, "PAGE_LIMIT_MAX", 100)?;
        if default_limit == 0 || default_limit > max_limit {
            bail!("PAGE_LIMIT_DEFAULT must be between 1 and PAGE_LIMIT_MAX ({max_limit})");
        }

        let migrate_on_start: bool = parse_or(&var, "MIGRATE_ON_START", false)?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections: db_max_connections.max(1),
            db_connect_timeout: Duration::from_secs(db_connect_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            page_limits: PageLimits { default_limit, max_limit },
            migrate_on_start,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key}={raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.database_url, "sqlite://movies.db?mode=rwc");
        assert_eq!(config.page_limits, PageLimits { default_limit: 10, max_limit: 100 });
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.migrate_on_start);
    }

    #[test]
    fn postgres_url_is_built_from_parts() {
        let config = config_from(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_USER", "movie"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "catalog"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "postgres://movie:secret@db:5432/catalog");
    }

    #[test]
    fn database_url_wins_over_parts() {
        let config =
            config_from(&[("DATABASE_URL", "sqlite::memory:"), ("POSTGRES_HOST", "db")]).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(format!("{err:#}").contains("PORT"));

        assert!(config_from(&[("MIGRATE_ON_START", "yes")]).is_err());
    }

    #[test]
    fn default_limit_must_fit_under_max() {
        assert!(config_from(&[("PAGE_LIMIT_DEFAULT", "50"), ("PAGE_LIMIT_MAX", "20")]).is_err());
        assert!(config_from(&[("PAGE_LIMIT_DEFAULT", "0")]).is_err());
    }
}
