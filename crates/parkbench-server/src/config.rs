use std::env;

use tracing::{info, warn};

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Public origin used when building magic-link and verification URLs.
    pub base_url: String,
    pub brevo_api_key: Option<String>,
    pub brevo_sender_email: Option<String>,
    pub brevo_sender_name: Option<String>,
    /// Seconds between maintenance sweeps.
    pub maintenance_interval_secs: u64,
}

pub fn normalize_env_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

pub fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(normalize_env_value)
        .filter(|s| !s.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_string(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {key} value {raw:?}, using default");
            default
        }),
        None => default,
    }
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: env_parse_or("PORT", 8080),
            database_url: env_or("DATABASE_URL", "sqlite://parkbench.db?mode=rwc"),
            base_url: env_or("BASE_URL", "http://localhost:8080"),
            brevo_api_key: env_string("BREVO_API_KEY"),
            brevo_sender_email: env_string("BREVO_SENDER_EMAIL"),
            brevo_sender_name: env_string("BREVO_SENDER_NAME"),
            maintenance_interval_secs: env_parse_or("MAINTENANCE_INTERVAL_SECS", 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_quotes_and_whitespace() {
        assert_eq!(normalize_env_value("  plain  ".to_string()), "plain");
        assert_eq!(normalize_env_value("\"quoted\"".to_string()), "quoted");
        assert_eq!(normalize_env_value("' spaced '".to_string()), "spaced");
    }
}
